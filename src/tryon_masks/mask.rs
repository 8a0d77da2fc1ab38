//! Binary masks derived from label maps.

use image::Luma;
use imageproc::map::{map_colors, map_colors2};

use crate::tryon_masks::labels::LabelSet;
use crate::{LabelMap, Mask};

/// Value of a pixel inside a mask.
pub const MASK_ON: u8 = u8::MAX;
/// Value of a pixel outside a mask.
pub const MASK_OFF: u8 = 0;

/// Trait providing set-membership tests over a label map
pub trait LabelMembershipExt {
    /// Builds a mask that is on wherever the pixel's code is in `labels`.
    ///
    /// The mask has the same dimensions as the label map.
    ///
    /// # Examples
    ///
    /// ```
    /// use tryon_masks::{LabelMap, LabelMembershipExt, LabelSet};
    /// use image::Luma;
    ///
    /// let mut parse: LabelMap = LabelMap::new(2, 1);
    /// parse.put_pixel(1, 0, Luma([5]));
    ///
    /// let mask = parse.membership_mask(&LabelSet::from_codes(&[5]));
    /// assert_eq!(mask.get_pixel(0, 0)[0], 0);
    /// assert_eq!(mask.get_pixel(1, 0)[0], 255);
    /// ```
    fn membership_mask(&self, labels: &LabelSet) -> Mask;

    /// Counts the pixels whose code is in `labels`.
    fn count_labels(&self, labels: &LabelSet) -> usize;
}

impl LabelMembershipExt for LabelMap {
    fn membership_mask(&self, labels: &LabelSet) -> Mask {
        map_colors(self, |Luma([code])| {
            Luma([if labels.contains(code) {
                MASK_ON
            } else {
                MASK_OFF
            }])
        })
    }

    fn count_labels(&self, labels: &LabelSet) -> usize {
        self.pixels()
            .filter(|Luma([code])| labels.contains(*code))
            .count()
    }
}

/// Returns `true` when the pixel value counts as inside a mask.
#[inline]
pub const fn is_on(value: u8) -> bool {
    value != MASK_OFF
}

/// Pixels on in `mask` and off in `exclude`.
///
/// Both masks must have the same dimensions.
pub fn subtract(mask: &Mask, exclude: &Mask) -> Mask {
    map_colors2(mask, exclude, |Luma([keep]), Luma([drop])| {
        Luma([if is_on(keep) && !is_on(drop) {
            MASK_ON
        } else {
            MASK_OFF
        }])
    })
}

/// Number of pixels that are on.
pub fn count_on(mask: &Mask) -> usize {
    mask.pixels().filter(|Luma([value])| is_on(*value)).count()
}

pub fn is_blank(mask: &Mask) -> bool {
    mask.pixels().all(|Luma([value])| !is_on(*value))
}

pub fn is_full(mask: &Mask) -> bool {
    mask.pixels().all(|Luma([value])| is_on(*value))
}

/// Returns `true` when every pixel on in `inner` is also on in `outer`.
pub fn is_subset(inner: &Mask, outer: &Mask) -> bool {
    inner.dimensions() == outer.dimensions()
        && inner
            .pixels()
            .zip(outer.pixels())
            .all(|(Luma([a]), Luma([b]))| !is_on(*a) || is_on(*b))
}
