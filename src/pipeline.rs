//! File-to-file preparation of a single person.
//!
//! Everything is computed in memory first, and outputs are staged in
//! temporary files before being renamed into place, so neither a failing
//! input nor a failing write leaves a partial set behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempPath;
use tracing::{debug, info, warn};

use crate::config::MaskConfig;
use crate::error::LoadError;
use crate::tryon_masks::agnostic::{AgnosticPerson, AgnosticPersonExt};
use crate::tryon_masks::guidance::{Guidance, GuidanceMapExt};
use crate::tryon_masks::label_io::{
    load_label_map, load_person_image, save_image, save_label_map, LabelEncoding,
};
use crate::tryon_masks::mask::LabelMembershipExt;
use crate::tryon_masks::surface::SurfaceEstimateExt;

/// Where the guidance target comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidanceSource {
    /// A DensePose segmentation file.
    Surface(PathBuf),
    /// A surface estimated from the parsing map.
    EstimatedSurface,
    /// The smoothed garment region of the parsing map.
    Garment,
    /// No guidance map is produced.
    Skip,
}

/// Input files for one person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonInputs {
    pub image: PathBuf,
    pub label_map: PathBuf,
    pub guidance: GuidanceSource,
}

impl PersonInputs {
    pub fn new(image: impl Into<PathBuf>, label_map: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            label_map: label_map.into(),
            guidance: GuidanceSource::Skip,
        }
    }

    #[must_use]
    pub fn with_guidance(mut self, guidance: GuidanceSource) -> Self {
        self.guidance = guidance;
        self
    }

    /// File stem of the person image, used to name the outputs.
    pub fn stem(&self) -> String {
        self.image
            .file_stem()
            .map_or_else(|| "person".to_owned(), |stem| stem.to_string_lossy().into_owned())
    }
}

/// Pixel counts describing one prepared person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaskStats {
    pub width: u32,
    pub height: u32,
    /// Label pixels cleared to background in the agnostic label map.
    pub cleared_labels: usize,
    /// Image pixels painted neutral in the agnostic image.
    pub erased_pixels: usize,
    /// Pixels drawn as the guidance target, when guidance was produced.
    pub guidance_target: Option<usize>,
}

/// All outputs for one person, held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPerson {
    pub agnostic: AgnosticPerson,
    pub guidance: Option<Guidance>,
    pub stats: MaskStats,
}

/// Paths written by [`PreparedPerson::write_to`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub agnostic_image: PathBuf,
    pub agnostic_label_map: PathBuf,
    pub guidance: Option<PathBuf>,
}

impl PreparedPerson {
    /// Writes the outputs as `<stem>_agnostic.png`, `<stem>_agnostic_parse.png`
    /// and, when present, `<stem>_guidance.png` inside `dir`.
    ///
    /// Every output is first encoded to a temporary file in `dir`; the files
    /// are renamed into place only once all of them encoded. If a rename
    /// fails, the outputs already renamed are removed again.
    ///
    /// # Errors
    ///
    /// * `LoadError::Io` - when the directory cannot be created or an output
    ///   cannot be moved into place
    /// * `LoadError::Write` - when an image cannot be encoded
    pub fn write_to(
        &self,
        dir: &Path,
        stem: &str,
        encoding: LabelEncoding,
    ) -> Result<OutputPaths, LoadError> {
        fs::create_dir_all(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let paths = OutputPaths {
            agnostic_image: dir.join(format!("{stem}_agnostic.png")),
            agnostic_label_map: dir.join(format!("{stem}_agnostic_parse.png")),
            guidance: self
                .guidance
                .as_ref()
                .map(|_| dir.join(format!("{stem}_guidance.png"))),
        };

        let mut staged = vec![
            (
                stage(dir, |path| save_image(&self.agnostic.image, path))?,
                paths.agnostic_image.clone(),
            ),
            (
                stage(dir, |path| {
                    save_label_map(&self.agnostic.label_map, path, encoding)
                })?,
                paths.agnostic_label_map.clone(),
            ),
        ];
        if let (Some(guidance), Some(target)) = (&self.guidance, &paths.guidance) {
            staged.push((
                stage(dir, |path| save_label_map(&guidance.label_map, path, encoding))?,
                target.clone(),
            ));
        }
        commit(staged)?;

        info!(dir = %dir.display(), stem, "outputs written");
        Ok(paths)
    }
}

/// Encodes one output into a fresh temporary PNG inside `dir`.
///
/// The temporary file is deleted when the returned path is dropped.
fn stage(
    dir: &Path,
    write: impl FnOnce(&Path) -> Result<(), LoadError>,
) -> Result<TempPath, LoadError> {
    let staged = tempfile::Builder::new()
        .prefix(".tryon-masks-")
        .suffix(".png")
        .tempfile_in(dir)
        .map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .into_temp_path();
    let path: &Path = &staged;
    write(path)?;
    Ok(staged)
}

/// Moves staged outputs into place, undoing earlier moves on failure.
fn commit(staged: Vec<(TempPath, PathBuf)>) -> Result<(), LoadError> {
    let mut committed: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (temp, target) in staged {
        if let Err(error) = temp.persist(&target) {
            for path in &committed {
                if let Err(source) = fs::remove_file(path) {
                    warn!(path = %path.display(), %source, "could not remove partial output");
                }
            }
            return Err(LoadError::Io {
                path: target,
                source: error.error,
            });
        }
        debug!(path = %target.display(), "committed output");
        committed.push(target);
    }
    Ok(())
}

/// Loads one person's files and computes the agnostic and guidance outputs.
///
/// # Errors
///
/// * `LoadError::MissingInput` - when an input file does not exist
/// * `LoadError::Decode` and the label format errors - when an input cannot be read
/// * `LoadError::Mask` - when the inputs disagree in size or the parameters are invalid
pub fn prepare_person(
    inputs: &PersonInputs,
    config: &MaskConfig,
) -> Result<PreparedPerson, LoadError> {
    let image = load_person_image(&inputs.image)?;
    let label_map = load_label_map(&inputs.label_map, config.label_encoding)?;
    debug!(
        image = %inputs.image.display(),
        label_map = %inputs.label_map.display(),
        "loaded person"
    );

    let agnostic = image.agnostic_person(&label_map, &config.agnostic)?;

    let guidance = match &inputs.guidance {
        GuidanceSource::Surface(path) => {
            let surface_map = load_label_map(path, config.surface_encoding)?;
            Some(label_map.guidance_from_surface(&surface_map, &config.guidance)?)
        }
        GuidanceSource::EstimatedSurface => {
            let surface_map = label_map.estimate_surface(&config.surface_estimate)?;
            Some(label_map.guidance_from_surface(&surface_map, &config.guidance)?)
        }
        GuidanceSource::Garment => Some(label_map.guidance_from_garment(&config.guidance)?),
        GuidanceSource::Skip => None,
    };

    let (width, height) = label_map.dimensions();
    let stats = MaskStats {
        width,
        height,
        cleared_labels: label_map.count_labels(&config.agnostic.agnostic_labels),
        erased_pixels: agnostic.erased_pixels(),
        guidance_target: guidance.as_ref().map(Guidance::target_pixels),
    };
    info!(
        person = %inputs.stem(),
        cleared = stats.cleared_labels,
        erased = stats.erased_pixels,
        guidance = ?stats.guidance_target,
        "prepared person"
    );

    Ok(PreparedPerson {
        agnostic,
        guidance,
        stats,
    })
}
