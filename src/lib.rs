//! # tryon-masks
//!
//! Mask generation for virtual try-on inputs, computed over human-parsing
//! label maps.
//!
//! - **Agnostic person**: erases garment and arm regions from a person image
//!   and its parsing map, growing the erased area past the garment outline
//!   while never touching the head region
//! - **Guidance map**: replaces the garment region of a parsing map with a
//!   target silhouette taken from body-surface geometry instead of the worn
//!   garment
//! - **Label maps**: decoding of index and palette-coded parsing files
//!
//! ## Example Usage
//!
//! ```no_run
//! use tryon_masks::{
//!     generate_agnostic, generate_guidance, load_label_map, load_person_image, LabelEncoding,
//!     LabelSet,
//! };
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let image = load_person_image(Path::new("image/00041_00.jpg"))?;
//! let parse = load_label_map(Path::new("image-parse/00041_00.png"), LabelEncoding::Auto)?;
//! let surface = load_label_map(Path::new("densepose/00041_00.png"), LabelEncoding::Indexed)?;
//!
//! let (agnostic_image, agnostic_parse) =
//!     generate_agnostic(&image, &parse, &LabelSet::agnostic(), &LabelSet::preserve(), 25)?;
//! let guidance = generate_guidance(
//!     &parse,
//!     &surface,
//!     &LabelSet::torso_and_upper_arms(),
//!     &LabelSet::preserve(),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `cli` (default): builds the `tryon-masks` command-line tool

mod config;
mod error;
mod pipeline;
mod tryon_masks;
mod utils;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(test)]
mod test_utils;

use image::{ImageBuffer, Luma, Pixel};

pub use config::MaskConfig;
pub use error::{LoadError, MaskError};
pub use pipeline::{
    prepare_person, GuidanceSource, MaskStats, OutputPaths, PersonInputs, PreparedPerson,
};
pub use tryon_masks::agnostic::{
    generate_agnostic, AgnosticParams, AgnosticPerson, AgnosticPersonExt,
    DEFAULT_DILATION_KERNEL_SIZE, NEUTRAL_GRAY,
};
pub use tryon_masks::guidance::{
    generate_garment_guidance, generate_guidance, Guidance, GuidanceMapExt, GuidanceParams,
};
pub use tryon_masks::label_io::{
    colorize_label_map, decode_label_map, load_label_map, load_person_image, palette_code,
    palette_color, save_image, save_label_map, LabelEncoding,
};
pub use tryon_masks::labels::{parsing, surface, LabelSet};
pub use tryon_masks::mask::{count_on, is_subset, LabelMembershipExt, MASK_OFF, MASK_ON};
pub use tryon_masks::morphology::{SquareKernel, SquareMorphologyExt};
pub use tryon_masks::surface::{estimate_surface_map, SurfaceEstimateExt, SurfaceEstimateParams};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Per-pixel class codes of a human-parsing or body-surface model.
pub type LabelMap = Image<Luma<u8>>;

/// Binary mask: `MASK_ON` inside, `MASK_OFF` outside.
pub type Mask = Image<Luma<u8>>;
