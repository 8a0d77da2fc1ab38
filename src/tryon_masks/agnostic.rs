use image::{Luma, Rgb};
use imageproc::map::map_colors2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MaskError;
use crate::tryon_masks::labels::{parsing, LabelSet};
use crate::tryon_masks::mask::{count_on, is_on, subtract, LabelMembershipExt};
use crate::tryon_masks::morphology::{SquareKernel, SquareMorphologyExt};
use crate::utils::{validate_matching_dimensions, validate_non_empty_image};
use crate::{Image, LabelMap, Mask};

/// Default side length of the square used to grow the erased region.
pub const DEFAULT_DILATION_KERNEL_SIZE: u32 = 25;

/// Colour painted over erased pixels.
pub const NEUTRAL_GRAY: [u8; 3] = [128, 128, 128];

/// Parameters of the agnostic-person generator
///
/// The defaults erase upper-body garments and both arms, protect the head
/// region and grow the erased area by 12 pixels on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgnosticParams {
    /// Codes of the regions to erase.
    pub agnostic_labels: LabelSet,
    /// Codes of the regions that are never overwritten.
    pub preserve_labels: LabelSet,
    /// Side length of the square dilation kernel, positive and odd.
    pub dilation_kernel_size: u32,
    /// Colour written into the erased region of the image.
    pub neutral_color: [u8; 3],
    /// Code written over erased labels.
    pub background_label: u8,
}

impl Default for AgnosticParams {
    fn default() -> Self {
        Self {
            agnostic_labels: LabelSet::agnostic(),
            preserve_labels: LabelSet::preserve(),
            dilation_kernel_size: DEFAULT_DILATION_KERNEL_SIZE,
            neutral_color: NEUTRAL_GRAY,
            background_label: parsing::BACKGROUND,
        }
    }
}

impl AgnosticParams {
    pub fn new(
        agnostic_labels: LabelSet,
        preserve_labels: LabelSet,
        dilation_kernel_size: u32,
    ) -> Self {
        Self {
            agnostic_labels,
            preserve_labels,
            dilation_kernel_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_kernel_size(mut self, dilation_kernel_size: u32) -> Self {
        self.dilation_kernel_size = dilation_kernel_size;
        self
    }

    /// Checks the kernel size and the label sets.
    ///
    /// # Errors
    ///
    /// * `MaskError::InvalidKernel` - when the kernel size is zero or even
    /// * `MaskError::OverlappingLabelSets` - when a code is both erased and preserved
    pub fn validate(&self) -> Result<(), MaskError> {
        SquareKernel::single(self.dilation_kernel_size)?;
        let overlap = self.agnostic_labels.intersection(&self.preserve_labels);
        if let Some(code) = overlap.codes().next() {
            return Err(MaskError::OverlappingLabelSets { code });
        }
        Ok(())
    }
}

/// Output of the agnostic-person generator
#[derive(Debug, Clone, PartialEq)]
pub struct AgnosticPerson {
    /// Person image with the erased region painted in the neutral colour.
    pub image: Image<Rgb<u8>>,
    /// Label map with the agnostic codes set to background.
    pub label_map: LabelMap,
    /// Pixels painted in the image (dilated region minus preserved pixels).
    pub erase_mask: Mask,
}

impl AgnosticPerson {
    pub fn into_parts(self) -> (Image<Rgb<u8>>, LabelMap) {
        (self.image, self.label_map)
    }

    pub fn erased_pixels(&self) -> usize {
        count_on(&self.erase_mask)
    }
}

/// Trait providing agnostic-person generation for person images
pub trait AgnosticPersonExt {
    /// Erases garment and arm regions from the image and its label map.
    ///
    /// The regions whose codes are in `params.agnostic_labels` are grown by a
    /// square dilation, the pixels whose codes are in
    /// `params.preserve_labels` are removed from the grown region, and the
    /// rest is painted with `params.neutral_color`. In the label map only the
    /// undilated regions are cleared to `params.background_label`.
    ///
    /// # Errors
    ///
    /// * `MaskError::DimensionMismatch` - when the image and label map differ in size
    /// * `MaskError::EmptyImage` - when the image has a zero dimension
    /// * any error from [`AgnosticParams::validate`]
    ///
    /// # Examples
    ///
    /// ```
    /// use tryon_masks::{AgnosticParams, AgnosticPersonExt, Image, LabelMap};
    /// use image::{Luma, Rgb};
    ///
    /// # fn example() -> Result<(), tryon_masks::MaskError> {
    /// let image: Image<Rgb<u8>> = Image::from_pixel(8, 8, Rgb([10, 20, 30]));
    /// let mut parse: LabelMap = LabelMap::new(8, 8);
    /// parse.put_pixel(4, 4, Luma([5]));
    ///
    /// let person = image.agnostic_person(&parse, &AgnosticParams::default().with_kernel_size(3))?;
    /// assert_eq!(person.image.get_pixel(3, 3), &Rgb([128, 128, 128]));
    /// assert_eq!(person.label_map.get_pixel(4, 4), &Luma([0]));
    /// # Ok(())
    /// # }
    /// # example().unwrap();
    /// ```
    fn agnostic_person(
        &self,
        label_map: &LabelMap,
        params: &AgnosticParams,
    ) -> Result<AgnosticPerson, MaskError>;
}

impl AgnosticPersonExt for Image<Rgb<u8>> {
    fn agnostic_person(
        &self,
        label_map: &LabelMap,
        params: &AgnosticParams,
    ) -> Result<AgnosticPerson, MaskError> {
        params.validate()?;
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height, "agnostic_person")?;
        validate_matching_dimensions(self, label_map)?;

        let preserve_mask = label_map.membership_mask(&params.preserve_labels);
        let agnostic_mask = label_map.membership_mask(&params.agnostic_labels);
        let dilated =
            agnostic_mask.dilate_square(SquareKernel::single(params.dilation_kernel_size)?)?;
        let erase_mask = subtract(&dilated, &preserve_mask);

        let neutral = Rgb(params.neutral_color);
        let image = map_colors2(self, &erase_mask, |pixel, Luma([erase])| {
            if is_on(erase) {
                neutral
            } else {
                pixel
            }
        });

        let background = params.background_label;
        let cleared = map_colors2(label_map, &agnostic_mask, |Luma([code]), Luma([clear])| {
            Luma([if is_on(clear) { background } else { code }])
        });

        debug!(
            width,
            height,
            kernel = params.dilation_kernel_size,
            cleared = count_on(&agnostic_mask),
            erased = count_on(&erase_mask),
            "generated agnostic person"
        );

        Ok(AgnosticPerson {
            image,
            label_map: cleared,
            erase_mask,
        })
    }
}

/// Produces the agnostic image and label map for a person.
///
/// Uses the neutral gray and background code 0; see
/// [`AgnosticPersonExt::agnostic_person`] for the full parameter set.
///
/// # Errors
///
/// * `MaskError::DimensionMismatch` - when the image and label map differ in size
/// * `MaskError::InvalidKernel` - when the kernel size is zero or even
/// * `MaskError::OverlappingLabelSets` - when the two label sets share a code
pub fn generate_agnostic(
    image: &Image<Rgb<u8>>,
    label_map: &LabelMap,
    agnostic_labels: &LabelSet,
    preserve_labels: &LabelSet,
    dilation_kernel_size: u32,
) -> Result<(Image<Rgb<u8>>, LabelMap), MaskError> {
    let params = AgnosticParams::new(*agnostic_labels, *preserve_labels, dilation_kernel_size);
    image
        .agnostic_person(label_map, &params)
        .map(AgnosticPerson::into_parts)
}
