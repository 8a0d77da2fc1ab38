use std::path::PathBuf;

use image::ColorType;
use thiserror::Error;

/// Error type for mask operations
///
/// Returned by the pure mask operations (membership, morphology, agnostic
/// and guidance generation). None of these variants carry I/O state, so the
/// type stays `Clone` and comparable in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    /// Two inputs that must cover the same pixels have different sizes
    ///
    /// The person image, its label map and the surface map must all share
    /// spatial dimensions.
    #[error("Image dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// A structuring element size that is zero or even
    #[error("Kernel size must be a positive odd number, got {size}")]
    InvalidKernel { size: u32 },

    /// A label code appears both in a set to erase and in the preserve set
    #[error("Label {code} cannot be both erased and preserved")]
    OverlappingLabelSets { code: u8 },

    /// An operation received an image with a zero dimension
    #[error("{context}: image dimensions must be non-zero")]
    EmptyImage { context: &'static str },

    /// Invalid parameter provided to the operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Error type for reading and writing label maps, images and configuration
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file does not exist
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// The file exists but could not be decoded as an image
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The decoded colour layout cannot be interpreted under the chosen encoding
    #[error("Label map with color type {color_type:?} cannot be read as {encoding}")]
    UnsupportedLabelFormat {
        color_type: ColorType,
        encoding: &'static str,
    },

    /// A colour-coded label map contains a colour outside the palette
    #[error("Color {color:?} at ({x}, {y}) is not part of the label palette")]
    UnknownPaletteColor { color: [u8; 3], x: u32, y: u32 },

    /// A 16-bit label map holds a code that does not fit in a byte
    #[error("Label value {value} at ({x}, {y}) exceeds 255")]
    LabelOutOfRange { value: u16, x: u32, y: u32 },

    /// Writing an output image failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem error outside of image encoding
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed
    #[error("Invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The loaded data was rejected by a mask operation
    #[error(transparent)]
    Mask(#[from] MaskError),
}
