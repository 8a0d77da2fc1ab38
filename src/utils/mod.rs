//! Internal utility functions for tryon-masks.
//!
//! This module contains the input validation shared by the mask operations.

use image::GenericImageView;

use crate::error::MaskError;

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
/// * `context` - A description of the context for error messages
///
/// # Returns
///
/// `Ok(())` if the dimensions are valid, otherwise an error
pub fn validate_non_empty_image(
    width: u32,
    height: u32,
    context: &'static str,
) -> Result<(), MaskError> {
    if width == 0 || height == 0 {
        Err(MaskError::EmptyImage { context })
    } else {
        Ok(())
    }
}

/// Validates that two images cover the same pixel grid.
///
/// The first image is treated as the reference, so the error reports its
/// size as `expected`.
#[inline]
pub fn validate_matching_dimensions<I1, I2>(reference: &I1, other: &I2) -> Result<(), MaskError>
where
    I1: GenericImageView,
    I2: GenericImageView,
{
    let expected = reference.dimensions();
    let actual = other.dimensions();

    if expected == actual {
        Ok(())
    } else {
        Err(MaskError::DimensionMismatch { expected, actual })
    }
}
