use image::Luma;
use imageproc::map::map_colors;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MaskError;
use crate::tryon_masks::labels::{surface, LabelSet};
use crate::tryon_masks::mask::{count_on, is_on, LabelMembershipExt};
use crate::tryon_masks::morphology::{SquareKernel, SquareMorphologyExt};
use crate::utils::validate_non_empty_image;
use crate::LabelMap;

/// Parameters for approximating a body-surface map from a parsing map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceEstimateParams {
    /// Parsing codes taken as body surface.
    pub body_labels: LabelSet,
    /// Dilation widening the parsed body to cover the skin under loose clothes.
    pub spread: SquareKernel,
    /// Surface code written into the estimated region.
    pub surface_label: u8,
}

impl Default for SurfaceEstimateParams {
    fn default() -> Self {
        Self {
            body_labels: LabelSet::parsed_upper_body(),
            spread: SquareKernel {
                size: 7,
                iterations: 3,
            },
            surface_label: surface::TORSO_1,
        }
    }
}

/// Trait providing a coarse body-surface estimate for parsing maps
///
/// The estimate stands in for a DensePose segmentation when none is
/// available. Everything it marks gets the same surface code, so the guidance
/// surface labels must include that code.
pub trait SurfaceEstimateExt {
    /// Estimates the body surface from the parsing map.
    ///
    /// # Errors
    ///
    /// * `MaskError::EmptyImage` - when the parsing map has a zero dimension
    /// * `MaskError::InvalidKernel` - when the spread kernel size is zero or even
    fn estimate_surface(&self, params: &SurfaceEstimateParams) -> Result<LabelMap, MaskError>;
}

impl SurfaceEstimateExt for LabelMap {
    fn estimate_surface(&self, params: &SurfaceEstimateParams) -> Result<LabelMap, MaskError> {
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height, "estimate_surface")?;

        let body = self
            .membership_mask(&params.body_labels)
            .dilate_square(params.spread)?;
        debug!(surface = count_on(&body), "estimated body surface");

        let code = params.surface_label;
        Ok(map_colors(&body, |Luma([inside])| {
            Luma([if is_on(inside) {
                code
            } else {
                surface::BACKGROUND
            }])
        }))
    }
}

/// Approximates a body-surface map from a parsing map with default parameters.
///
/// # Errors
///
/// * `MaskError::EmptyImage` - when the parsing map has a zero dimension
pub fn estimate_surface_map(label_map: &LabelMap) -> Result<LabelMap, MaskError> {
    label_map.estimate_surface(&SurfaceEstimateParams::default())
}
