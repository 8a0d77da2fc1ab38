use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate_mut, erode_mut};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::MaskError;
use crate::tryon_masks::mask::{is_blank, is_full};
use crate::Mask;

/// Largest chessboard radius handed to a single imageproc pass.
///
/// imageproc stores distances in `u8` and saturates at 255, so each pass
/// stays one below that and larger reaches are split into several passes.
const MAX_PASS_RADIUS: u32 = 254;

/// Square structuring element applied a number of times
///
/// `size` is the side length of the square and must be odd so the element
/// has a centre pixel. Applying a `size`×`size` square `iterations` times is
/// the same as applying a single square with side
/// `(size - 1) * iterations + 1`.
///
/// Fields missing from a serialized kernel fall back to a single 3×3 pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareKernel {
    pub size: u32,
    pub iterations: u32,
}

impl Default for SquareKernel {
    fn default() -> Self {
        Self {
            size: 3,
            iterations: 1,
        }
    }
}

impl SquareKernel {
    /// Creates a validated kernel.
    ///
    /// # Errors
    ///
    /// * `MaskError::InvalidKernel` - when `size` is zero or even
    pub fn new(size: u32, iterations: u32) -> Result<Self, MaskError> {
        let kernel = Self { size, iterations };
        kernel.validate()?;
        Ok(kernel)
    }

    /// A single pass of a `size`×`size` square.
    pub fn single(size: u32) -> Result<Self, MaskError> {
        Self::new(size, 1)
    }

    pub fn validate(&self) -> Result<(), MaskError> {
        if self.size == 0 || self.size % 2 == 0 {
            return Err(MaskError::InvalidKernel { size: self.size });
        }
        Ok(())
    }

    /// Chessboard distance covered by all iterations together.
    pub const fn reach(&self) -> u32 {
        (self.size / 2).saturating_mul(self.iterations)
    }
}

/// Trait providing binary morphology with square structuring elements
///
/// Pixels outside the image never contribute: dilation does not grow from
/// beyond the border and erosion does not eat in from it.
pub trait SquareMorphologyExt: Sized {
    /// Grows the mask by the kernel's reach in every direction.
    ///
    /// # Errors
    ///
    /// * `MaskError::InvalidKernel` - when the kernel size is zero or even
    fn dilate_square(&self, kernel: SquareKernel) -> Result<Self, MaskError>;

    /// Shrinks the mask by the kernel's reach in every direction.
    ///
    /// # Errors
    ///
    /// * `MaskError::InvalidKernel` - when the kernel size is zero or even
    fn erode_square(&self, kernel: SquareKernel) -> Result<Self, MaskError>;

    /// Dilation followed by erosion with the same kernel.
    ///
    /// Fills gaps and notches narrower than the kernel, such as the space
    /// between an arm held close to the torso, without growing the outline.
    ///
    /// # Errors
    ///
    /// * `MaskError::InvalidKernel` - when the kernel size is zero or even
    fn close_square(&self, kernel: SquareKernel) -> Result<Self, MaskError> {
        self.dilate_square(kernel)?.erode_square(kernel)
    }
}

impl SquareMorphologyExt for Mask {
    fn dilate_square(&self, kernel: SquareKernel) -> Result<Self, MaskError> {
        kernel.validate()?;
        let mut mask = self.clone();
        // Nothing to grow from.
        if is_blank(&mask) {
            return Ok(mask);
        }
        for radius in passes(kernel.reach()) {
            trace!(radius, "dilate pass");
            dilate_mut(&mut mask, Norm::LInf, radius);
        }
        Ok(mask)
    }

    fn erode_square(&self, kernel: SquareKernel) -> Result<Self, MaskError> {
        kernel.validate()?;
        let mut mask = self.clone();
        if is_full(&mask) {
            return Ok(mask);
        }
        for radius in passes(kernel.reach()) {
            trace!(radius, "erode pass");
            erode_mut(&mut mask, Norm::LInf, radius);
        }
        Ok(mask)
    }
}

/// Splits a total reach into per-pass radii no larger than `MAX_PASS_RADIUS`.
fn passes(reach: u32) -> impl Iterator<Item = u8> {
    let full = reach / MAX_PASS_RADIUS;
    let rest = reach % MAX_PASS_RADIUS;
    std::iter::repeat(MAX_PASS_RADIUS)
        .take(full as usize)
        .chain((rest > 0).then_some(rest))
        .filter_map(|radius| u8::try_from(radius).ok())
}
