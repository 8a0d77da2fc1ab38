//! Reading and writing label maps and person images.
//!
//! Human-parsing maps reach this crate in two layouts: single-channel index
//! maps, where each pixel holds its class code, and colour-coded maps saved
//! with the PASCAL VOC palette that SCHP uses. Because the `image` decoder
//! expands palette PNGs to RGB, the palette has to be reversed here. Which
//! layout to expect is an explicit [`LabelEncoding`] choice.

use std::path::Path;

use image::{DynamicImage, Luma, Rgb};
use imageproc::map::map_colors;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LoadError;
use crate::{Image, LabelMap};

/// How the pixels of a label map file encode class codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelEncoding {
    /// Grayscale files are index maps. Colour files are palette-coded when
    /// every pixel is a palette colour; otherwise they are read as index maps
    /// if every pixel has identical channels.
    #[default]
    Auto,
    /// Every pixel holds its class code. Colour files are accepted only when
    /// all channels are identical, in which case the first channel is used.
    Indexed,
    /// Pixels hold PASCAL VOC palette colours.
    Palette,
}

impl LabelEncoding {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Indexed => "indexed",
            Self::Palette => "palette",
        }
    }
}

/// Colour assigned to `code` by the PASCAL VOC palette.
///
/// The bits of the code are spread over the three channels, most significant
/// channel bit first: bit 0 to red, bit 1 to green, bit 2 to blue, then the
/// next three bits one position lower, and so on.
pub const fn palette_color(code: u8) -> [u8; 3] {
    let mut color = [0u8; 3];
    let mut label = code;
    let mut shift = 7;
    while label != 0 {
        color[0] |= (label & 1) << shift;
        color[1] |= ((label >> 1) & 1) << shift;
        color[2] |= ((label >> 2) & 1) << shift;
        label >>= 3;
        shift -= 1;
    }
    color
}

/// Class code whose palette colour is `color`, if any.
pub fn palette_code(color: [u8; 3]) -> Option<u8> {
    let mut code = 0u32;
    for bit in 0..3u32 {
        let shift = 7 - bit;
        code |= u32::from((color[0] >> shift) & 1) << (3 * bit);
        code |= u32::from((color[1] >> shift) & 1) << (3 * bit + 1);
        code |= u32::from((color[2] >> shift) & 1) << (3 * bit + 2);
    }
    u8::try_from(code)
        .ok()
        .filter(|&code| palette_color(code) == color)
}

/// Renders a label map with the palette colours.
pub fn colorize_label_map(label_map: &LabelMap) -> Image<Rgb<u8>> {
    map_colors(label_map, |Luma([code])| Rgb(palette_color(code)))
}

/// Converts a decoded image into a label map under the given encoding.
///
/// # Errors
///
/// * `LoadError::UnsupportedLabelFormat` - when the colour layout cannot hold
///   labels under `encoding`
/// * `LoadError::UnknownPaletteColor` - when a palette-coded map holds a
///   colour outside the palette
/// * `LoadError::LabelOutOfRange` - when a 16-bit map holds a code above 255
pub fn decode_label_map(
    image: DynamicImage,
    encoding: LabelEncoding,
) -> Result<LabelMap, LoadError> {
    let color_type = image.color();
    let unsupported = || LoadError::UnsupportedLabelFormat {
        color_type,
        encoding: encoding.name(),
    };

    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
            if encoding == LabelEncoding::Palette =>
        {
            Err(unsupported())
        }
        DynamicImage::ImageLuma8(gray) => Ok(gray),
        DynamicImage::ImageLumaA8(_) => Ok(image.into_luma8()),
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            narrow_wide_labels(&image.into_luma16())
        }
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
            let rgb = image.into_rgb8();
            match encoding {
                LabelEncoding::Palette => reverse_palette(&rgb),
                LabelEncoding::Indexed => first_channel(&rgb).ok_or_else(unsupported),
                // Gray palette colours (code 7 is 128,128,128) take precedence.
                LabelEncoding::Auto => reverse_palette(&rgb)
                    .or_else(|palette_error| first_channel(&rgb).ok_or(palette_error)),
            }
        }
        _ => Err(unsupported()),
    }
}

fn narrow_wide_labels(wide: &Image<Luma<u16>>) -> Result<LabelMap, LoadError> {
    if let Some((x, y, Luma([value]))) = wide
        .enumerate_pixels()
        .find(|(_, _, Luma([value]))| *value > u16::from(u8::MAX))
    {
        return Err(LoadError::LabelOutOfRange {
            value: *value,
            x,
            y,
        });
    }
    Ok(map_colors(wide, |Luma([value])| {
        Luma([u8::try_from(value).unwrap_or(u8::MAX)])
    }))
}

/// Index map from a colour map whose pixels all have identical channels.
fn first_channel(rgb: &Image<Rgb<u8>>) -> Option<LabelMap> {
    rgb.pixels()
        .all(|Rgb([r, g, b])| r == g && g == b)
        .then(|| map_colors(rgb, |Rgb([code, _, _])| Luma([code])))
}

fn reverse_palette(rgb: &Image<Rgb<u8>>) -> Result<LabelMap, LoadError> {
    let mut label_map: LabelMap = LabelMap::new(rgb.width(), rgb.height());
    for ((x, y, Rgb(color)), target) in rgb.enumerate_pixels().zip_eq(label_map.pixels_mut()) {
        let code =
            palette_code(*color).ok_or(LoadError::UnknownPaletteColor { color: *color, x, y })?;
        *target = Luma([code]);
    }
    Ok(label_map)
}

fn open_image(path: &Path) -> Result<DynamicImage, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingInput(path.to_path_buf()));
    }
    image::open(path).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a label map file.
///
/// # Errors
///
/// * `LoadError::MissingInput` - when the file does not exist
/// * `LoadError::Decode` - when the file is not a readable image
/// * any error from [`decode_label_map`]
pub fn load_label_map(path: &Path, encoding: LabelEncoding) -> Result<LabelMap, LoadError> {
    let image = open_image(path)?;
    debug!(path = %path.display(), color = ?image.color(), encoding = encoding.name(), "decoding label map");
    decode_label_map(image, encoding)
}

/// Reads a person image as 8-bit RGB, dropping any alpha channel.
///
/// # Errors
///
/// * `LoadError::MissingInput` - when the file does not exist
/// * `LoadError::Decode` - when the file is not a readable image
pub fn load_person_image(path: &Path) -> Result<Image<Rgb<u8>>, LoadError> {
    Ok(open_image(path)?.into_rgb8())
}

/// Writes a label map.
///
/// `LabelEncoding::Palette` writes palette colours, which is what SCHP and
/// the VITON-HD parse maps ship as; any other encoding writes a
/// single-channel index map.
///
/// # Errors
///
/// * `LoadError::Write` - when encoding or writing fails
pub fn save_label_map(
    label_map: &LabelMap,
    path: &Path,
    encoding: LabelEncoding,
) -> Result<(), LoadError> {
    match encoding {
        LabelEncoding::Palette => save(&colorize_label_map(label_map), path),
        LabelEncoding::Auto | LabelEncoding::Indexed => save(label_map, path),
    }
}

/// Writes an RGB image; the format follows the file extension.
///
/// # Errors
///
/// * `LoadError::Write` - when encoding or writing fails
pub fn save_image(image: &Image<Rgb<u8>>, path: &Path) -> Result<(), LoadError> {
    save(image, path)
}

fn save<P>(image: &Image<P>, path: &Path) -> Result<(), LoadError>
where
    P: image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
{
    image.save(path).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote image");
    Ok(())
}
