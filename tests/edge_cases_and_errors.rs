//! Edge case and error handling tests for tryon-masks
//!
//! Boundary conditions (tiny maps, masks touching the border, huge kernels)
//! and every error path of the public API.

use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use tryon_masks::{
    decode_label_map, generate_agnostic, generate_garment_guidance, generate_guidance,
    load_label_map, load_person_image, palette_color, parsing, AgnosticParams, AgnosticPersonExt,
    GuidanceMapExt, GuidanceParams, Image, LabelEncoding, LabelMap, LabelSet, LoadError,
    MaskConfig, MaskError, SquareKernel, SquareMorphologyExt, MASK_ON,
};

fn gray_image(width: u32, height: u32) -> Image<Rgb<u8>> {
    Image::from_pixel(width, height, Rgb([40, 80, 120]))
}

#[test]
fn single_pixel_agnostic_map_is_erased() {
    let image = gray_image(1, 1);
    let parse: LabelMap = LabelMap::from_pixel(1, 1, Luma([parsing::UPPER_CLOTHES]));

    let (agnostic_image, agnostic_parse) =
        generate_agnostic(&image, &parse, &LabelSet::agnostic(), &LabelSet::preserve(), 25)
            .unwrap();

    assert_eq!(agnostic_image.get_pixel(0, 0), &Rgb([128, 128, 128]));
    assert_eq!(agnostic_parse.get_pixel(0, 0), &Luma([parsing::BACKGROUND]));
}

#[test]
fn kernel_of_one_erases_exactly_the_agnostic_pixels() {
    let image = gray_image(6, 6);
    let mut parse: LabelMap = LabelMap::new(6, 6);
    parse.put_pixel(2, 3, Luma([parsing::LEFT_ARM]));

    let (agnostic_image, _) =
        generate_agnostic(&image, &parse, &LabelSet::agnostic(), &LabelSet::preserve(), 1)
            .unwrap();

    let gray: Vec<(u32, u32)> = agnostic_image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| **pixel == Rgb([128, 128, 128]))
        .map(|(x, y, _)| (x, y))
        .collect();
    assert_eq!(gray, vec![(2, 3)]);
}

#[test]
fn kernel_larger_than_image_covers_everything_but_preserved() {
    let image = gray_image(12, 12);
    let mut parse: LabelMap = LabelMap::new(12, 12);
    parse.put_pixel(0, 0, Luma([parsing::COAT]));
    parse.put_pixel(11, 11, Luma([parsing::FACE]));

    let (agnostic_image, _) =
        generate_agnostic(&image, &parse, &LabelSet::agnostic(), &LabelSet::preserve(), 51)
            .unwrap();

    assert_eq!(agnostic_image.get_pixel(11, 10), &Rgb([128, 128, 128]));
    assert_eq!(agnostic_image.get_pixel(11, 11), &Rgb([40, 80, 120]));
}

#[test]
fn region_touching_the_border_grows_inward_only() {
    let image = gray_image(10, 10);
    let mut parse: LabelMap = LabelMap::new(10, 10);
    for y in 0..10 {
        parse.put_pixel(0, y, Luma([parsing::RIGHT_ARM]));
    }

    let (agnostic_image, _) =
        generate_agnostic(&image, &parse, &LabelSet::agnostic(), &LabelSet::preserve(), 5)
            .unwrap();

    for y in 0..10 {
        assert_eq!(agnostic_image.get_pixel(2, y), &Rgb([128, 128, 128]));
        assert_eq!(agnostic_image.get_pixel(3, y), &Rgb([40, 80, 120]));
    }
}

#[test]
fn dilation_beyond_a_single_pass_keeps_growing() {
    let mut mask: LabelMap = LabelMap::new(700, 1);
    mask.put_pixel(0, 0, Luma([MASK_ON]));

    let dilated = mask
        .dilate_square(SquareKernel::new(201, 3).unwrap())
        .unwrap();

    assert_eq!(dilated.get_pixel(300, 0)[0], MASK_ON);
    assert_eq!(dilated.get_pixel(301, 0)[0], 0);
}

#[test]
fn blank_mask_stays_blank_under_dilation() {
    let mask: LabelMap = LabelMap::new(8, 8);
    let dilated = mask.dilate_square(SquareKernel::single(25).unwrap()).unwrap();
    assert!(dilated.pixels().all(|Luma([value])| *value == 0));
}

#[test]
fn full_mask_stays_full_under_erosion() {
    let mask: LabelMap = LabelMap::from_pixel(8, 8, Luma([MASK_ON]));
    let eroded = mask.erode_square(SquareKernel::new(5, 3).unwrap()).unwrap();
    assert!(eroded.pixels().all(|Luma([value])| *value == MASK_ON));
}

#[test]
fn even_and_zero_kernels_are_rejected() {
    let image = gray_image(4, 4);
    let parse: LabelMap = LabelMap::new(4, 4);

    for size in [0, 2, 24] {
        let result =
            generate_agnostic(&image, &parse, &LabelSet::agnostic(), &LabelSet::preserve(), size);
        assert_eq!(result.unwrap_err(), MaskError::InvalidKernel { size });
    }
    assert!(SquareKernel::new(4, 1).is_err());
}

#[test]
fn mismatched_sizes_are_reported_with_both_dimensions() {
    let image = gray_image(10, 8);
    let parse: LabelMap = LabelMap::new(8, 10);

    let result =
        generate_agnostic(&image, &parse, &LabelSet::agnostic(), &LabelSet::preserve(), 25);
    assert_eq!(
        result.unwrap_err(),
        MaskError::DimensionMismatch {
            expected: (10, 8),
            actual: (8, 10),
        }
    );

    let surface: LabelMap = LabelMap::new(10, 8);
    let result = generate_guidance(
        &parse,
        &surface,
        &LabelSet::torso_and_upper_arms(),
        &LabelSet::preserve(),
    );
    assert!(matches!(
        result,
        Err(MaskError::DimensionMismatch { .. })
    ));
}

#[test]
fn empty_images_are_rejected() {
    let image = gray_image(0, 0);
    let parse: LabelMap = LabelMap::new(0, 0);

    let result = image.agnostic_person(&parse, &AgnosticParams::default());
    assert!(matches!(result, Err(MaskError::EmptyImage { .. })));

    let result = parse.guidance_from_garment(&GuidanceParams::default());
    assert!(matches!(result, Err(MaskError::EmptyImage { .. })));
}

#[test]
fn overlapping_label_sets_are_rejected() {
    let image = gray_image(4, 4);
    let parse: LabelMap = LabelMap::new(4, 4);
    let preserve = LabelSet::from_codes(&[parsing::FACE, parsing::LEFT_ARM]);

    let result = generate_agnostic(&image, &parse, &LabelSet::agnostic(), &preserve, 3);
    assert_eq!(
        result.unwrap_err(),
        MaskError::OverlappingLabelSets {
            code: parsing::LEFT_ARM
        }
    );

    let preserve = LabelSet::from_codes(&[parsing::COAT]);
    let result = generate_garment_guidance(&parse, &preserve);
    assert_eq!(
        result.unwrap_err(),
        MaskError::OverlappingLabelSets {
            code: parsing::COAT
        }
    );
}

#[test]
fn empty_label_sets_leave_inputs_unchanged() {
    let image = gray_image(5, 5);
    let parse: LabelMap = LabelMap::from_pixel(5, 5, Luma([parsing::UPPER_CLOTHES]));

    let (agnostic_image, agnostic_parse) =
        generate_agnostic(&image, &parse, &LabelSet::empty(), &LabelSet::empty(), 25).unwrap();

    assert_eq!(agnostic_image, image);
    assert_eq!(agnostic_parse, parse);
}

#[test]
fn uncoded_surface_map_only_clears_garments() {
    let parse: LabelMap = LabelMap::from_pixel(6, 6, Luma([parsing::DRESS]));
    let surface: LabelMap = LabelMap::new(6, 6);

    let guidance = generate_guidance(
        &parse,
        &surface,
        &LabelSet::torso_and_upper_arms(),
        &LabelSet::preserve(),
    )
    .unwrap();

    assert!(guidance
        .pixels()
        .all(|Luma([code])| *code == parsing::BACKGROUND));
}

#[test]
fn unsupported_pixel_layouts_are_reported() {
    let rgba: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
    let result = decode_label_map(DynamicImage::ImageRgba8(rgba), LabelEncoding::Indexed);
    assert!(matches!(
        result,
        Err(LoadError::UnsupportedLabelFormat {
            encoding: "indexed",
            ..
        })
    ));

    let float = DynamicImage::ImageRgb32F(ImageBuffer::new(2, 2));
    let result = decode_label_map(float, LabelEncoding::Auto);
    assert!(matches!(
        result,
        Err(LoadError::UnsupportedLabelFormat { .. })
    ));
}

#[test]
fn palette_color_outside_palette_is_reported() {
    let mut rgb: Image<Rgb<u8>> = Image::from_pixel(3, 3, Rgb(palette_color(parsing::HAIR)));
    rgb.put_pixel(1, 2, Rgb([1, 2, 3]));

    let result = decode_label_map(DynamicImage::ImageRgb8(rgb), LabelEncoding::Palette);
    assert!(matches!(
        result,
        Err(LoadError::UnknownPaletteColor {
            color: [1, 2, 3],
            x: 1,
            y: 2
        })
    ));
}

#[test]
fn missing_files_are_reported_as_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent.png");

    assert!(matches!(
        load_person_image(&absent),
        Err(LoadError::MissingInput(path)) if path == absent
    ));
    assert!(matches!(
        load_label_map(&absent, LabelEncoding::Auto),
        Err(LoadError::MissingInput(_))
    ));
    assert!(matches!(
        MaskConfig::from_json_file(&absent),
        Err(LoadError::MissingInput(_))
    ));
}

#[test]
fn undecodable_file_is_reported_as_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not a png").unwrap();

    let result = load_person_image(&path);
    assert!(matches!(result, Err(LoadError::Decode { .. })));
}

#[test]
fn invalid_configuration_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    std::fs::write(&path, r#"{ "agnostic": { "dilation_kernel_size": 24 } }"#).unwrap();
    assert!(matches!(
        MaskConfig::from_json_file(&path),
        Err(LoadError::Mask(MaskError::InvalidKernel { size: 24 }))
    ));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        MaskConfig::from_json_file(&path),
        Err(LoadError::Config { .. })
    ));
}

#[test]
fn errors_render_readable_messages() {
    let error = MaskError::DimensionMismatch {
        expected: (768, 1024),
        actual: (384, 512),
    };
    let message = error.to_string();
    assert!(message.contains("768"));
    assert!(message.contains("384"));

    let error = LoadError::MissingInput("image/00041_00.jpg".into());
    assert!(error.to_string().contains("00041_00.jpg"));
}
