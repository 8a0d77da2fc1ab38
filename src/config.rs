//! Configuration for the mask pipeline.
//!
//! A configuration file is JSON; every field is optional and falls back to
//! the defaults of the corresponding parameter struct:
//!
//! ```json
//! {
//!   "agnostic": { "dilation_kernel_size": 31 },
//!   "guidance": { "surface_labels": [1, 2, 11, 12, 13, 14, 19, 20, 21, 22] },
//!   "label_encoding": "palette",
//!   "surface_encoding": "indexed"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, MaskError};
use crate::tryon_masks::agnostic::AgnosticParams;
use crate::tryon_masks::guidance::GuidanceParams;
use crate::tryon_masks::label_io::LabelEncoding;
use crate::tryon_masks::surface::SurfaceEstimateParams;

/// Parameters for every stage of the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub agnostic: AgnosticParams,
    pub guidance: GuidanceParams,
    pub surface_estimate: SurfaceEstimateParams,
    /// Layout expected for parsing map files.
    pub label_encoding: LabelEncoding,
    /// Layout expected for surface map files. DensePose writes index maps.
    pub surface_encoding: LabelEncoding,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            agnostic: AgnosticParams::default(),
            guidance: GuidanceParams::default(),
            surface_estimate: SurfaceEstimateParams::default(),
            label_encoding: LabelEncoding::Auto,
            surface_encoding: LabelEncoding::Indexed,
        }
    }
}

impl MaskConfig {
    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// * `LoadError::MissingInput` - when the file does not exist
    /// * `LoadError::Io` - when the file cannot be read
    /// * `LoadError::Config` - when the JSON does not match the schema
    /// * `LoadError::Mask` - when the parameters fail validation
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::MissingInput(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validates the agnostic and guidance parameters.
    ///
    /// # Errors
    ///
    /// * any error from [`AgnosticParams::validate`] or [`GuidanceParams::validate`]
    /// * `MaskError::InvalidKernel` - when the surface estimate kernel is even or zero
    pub fn validate(&self) -> Result<(), MaskError> {
        self.agnostic.validate()?;
        self.guidance.validate()?;
        self.surface_estimate.spread.validate()
    }
}
