//! Test utilities for tryon-masks
//!
//! This module provides common fixtures for testing the mask operations.
//! It is only compiled when running tests.

use image::{Luma, Rgb};

use crate::tryon_masks::mask::MASK_ON;
use crate::{Image, LabelMap, Mask};

/// Creates a label map filled with background and a square block of `code`.
///
/// The block covers `x..x + size` by `y..y + size`, clipped to the map.
pub fn create_block_label_map(
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    size: u32,
    code: u8,
) -> LabelMap {
    let mut parse: LabelMap = LabelMap::new(width, height);
    fill_block(&mut parse, x, y, size, size, code);
    parse
}

/// Writes `code` into the rectangle `x..x + w` by `y..y + h`, clipped to the map.
pub fn fill_block(parse: &mut LabelMap, x: u32, y: u32, w: u32, h: u32, code: u8) {
    let (width, height) = parse.dimensions();
    for py in y..(y + h).min(height) {
        for px in x..(x + w).min(width) {
            parse.put_pixel(px, py, Luma([code]));
        }
    }
}

/// Creates a binary mask with a single square block switched on.
pub fn create_block_mask(width: u32, height: u32, x: u32, y: u32, size: u32) -> Mask {
    create_block_label_map(width, height, x, y, size, MASK_ON)
}

/// Creates an RGB image whose pixels all differ from the neutral gray.
///
/// Each pixel encodes its coordinates so that accidental copies or shifts
/// show up in comparisons.
pub fn create_person_image(width: u32, height: u32) -> Image<Rgb<u8>> {
    Image::from_fn(width, height, |x, y| {
        Rgb([(x % 100) as u8 + 10, (y % 100) as u8 + 10, 200])
    })
}

/// Creates a small upper-body parsing map.
///
/// Layout on a 40x40 grid:
/// - hair (2) at rows 0..4, face (13) at rows 4..10, columns 15..25
/// - neck (10) at rows 10..12, columns 17..23
/// - upper-clothes (5) at rows 12..28, columns 10..30
/// - left arm (14) columns 5..10 and right arm (15) columns 30..35, rows 12..26
/// - pants (9) at rows 28..40, columns 12..28
pub fn create_upper_body_label_map() -> LabelMap {
    let mut parse: LabelMap = LabelMap::new(40, 40);
    fill_block(&mut parse, 15, 0, 10, 4, 2);
    fill_block(&mut parse, 15, 4, 10, 6, 13);
    fill_block(&mut parse, 17, 10, 6, 2, 10);
    fill_block(&mut parse, 10, 12, 20, 16, 5);
    fill_block(&mut parse, 5, 12, 5, 14, 14);
    fill_block(&mut parse, 30, 12, 5, 14, 15);
    fill_block(&mut parse, 12, 28, 16, 12, 9);
    parse
}

/// Creates a surface map matching `create_upper_body_label_map`.
///
/// Torso (2) at rows 12..28, columns 10..30; arms (13 and 14) beside it
/// with a one-pixel gap to the torso, as happens with arms held at the sides.
pub fn create_upper_body_surface_map() -> LabelMap {
    let mut surface: LabelMap = LabelMap::new(40, 40);
    fill_block(&mut surface, 10, 12, 20, 16, 2);
    fill_block(&mut surface, 4, 12, 5, 14, 13);
    fill_block(&mut surface, 31, 12, 5, 14, 14);
    surface
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_block_label_map_with_clipping_creates_map() {
        let parse = create_block_label_map(4, 4, 2, 2, 5, 7);
        assert_eq!(parse.dimensions(), (4, 4));
        assert_eq!(parse.get_pixel(3, 3), &Luma([7]));
        assert_eq!(parse.get_pixel(1, 1), &Luma([0]));
    }

    #[test]
    fn create_person_image_avoids_neutral_gray() {
        let image = create_person_image(120, 120);
        assert!(image.pixels().all(|pixel| *pixel != Rgb([128, 128, 128])));
        assert_eq!(image.get_pixel(3, 4), &Rgb([13, 14, 200]));
    }

    #[test]
    fn create_upper_body_label_map_places_regions() {
        let parse = create_upper_body_label_map();
        assert_eq!(parse.get_pixel(20, 2), &Luma([2]));
        assert_eq!(parse.get_pixel(20, 6), &Luma([13]));
        assert_eq!(parse.get_pixel(20, 20), &Luma([5]));
        assert_eq!(parse.get_pixel(7, 20), &Luma([14]));
        assert_eq!(parse.get_pixel(32, 20), &Luma([15]));
        assert_eq!(parse.get_pixel(20, 35), &Luma([9]));
        assert_eq!(parse.get_pixel(0, 0), &Luma([0]));
    }
}
