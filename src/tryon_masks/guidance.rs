//! Guidance label maps for flow estimation.
//!
//! A guidance map replaces the garment region of a parsing map with a target
//! silhouette that does not follow the outline of the garment being worn.
//! The target comes either from a body-surface segmentation (the preferred
//! source) or, when none is available, from a heavily smoothed version of
//! the garment region itself.

use image::Luma;
use imageproc::map::map_colors2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MaskError;
use crate::tryon_masks::labels::{parsing, LabelSet};
use crate::tryon_masks::mask::{count_on, is_on, subtract, LabelMembershipExt};
use crate::tryon_masks::morphology::{SquareKernel, SquareMorphologyExt};
use crate::utils::{validate_matching_dimensions, validate_non_empty_image};
use crate::{LabelMap, Mask};

/// Parameters of the guidance-map synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceParams {
    /// Surface-map codes that form the target region.
    pub surface_labels: LabelSet,
    /// Parsing codes the target region never covers.
    pub preserve_labels: LabelSet,
    /// Parsing codes cleared before the target is drawn.
    pub garment_labels: LabelSet,
    /// Code the target region is drawn with.
    pub target_label: u8,
    /// Code written over cleared garments.
    pub background_label: u8,
    /// Closing applied to the surface mask.
    pub closing: SquareKernel,
    /// Closing applied to the garment mask when no surface map is used.
    pub garment_closing: SquareKernel,
    /// Dilation padding the closed target.
    pub padding: SquareKernel,
}

impl Default for GuidanceParams {
    fn default() -> Self {
        Self {
            surface_labels: LabelSet::torso_and_upper_arms(),
            preserve_labels: LabelSet::preserve(),
            garment_labels: LabelSet::garments(),
            target_label: parsing::UPPER_CLOTHES,
            background_label: parsing::BACKGROUND,
            closing: SquareKernel {
                size: 5,
                iterations: 3,
            },
            garment_closing: SquareKernel {
                size: 5,
                iterations: 5,
            },
            padding: SquareKernel {
                size: 5,
                iterations: 2,
            },
        }
    }
}

impl GuidanceParams {
    pub fn new(surface_labels: LabelSet, preserve_labels: LabelSet) -> Self {
        Self {
            surface_labels,
            preserve_labels,
            ..Self::default()
        }
    }

    /// Targets the torso and full arms, so that a person wearing a
    /// sleeveless top still receives long-sleeve guidance.
    pub fn sleeved() -> Self {
        Self {
            surface_labels: LabelSet::torso_and_arms(),
            ..Self::default()
        }
    }

    /// Checks every kernel and the label sets.
    ///
    /// # Errors
    ///
    /// * `MaskError::InvalidKernel` - when any kernel size is zero or even
    /// * `MaskError::OverlappingLabelSets` - when a garment or the target code is preserved
    pub fn validate(&self) -> Result<(), MaskError> {
        self.validate_with(self.closing)?;
        self.garment_closing.validate()
    }

    /// Checks the parameters one guidance source uses, `closing` being the
    /// closing kernel of that source.
    fn validate_with(&self, closing: SquareKernel) -> Result<(), MaskError> {
        closing.validate()?;
        self.padding.validate()?;

        let overlap = self.garment_labels.intersection(&self.preserve_labels);
        if let Some(code) = overlap.codes().next() {
            return Err(MaskError::OverlappingLabelSets { code });
        }
        if self.preserve_labels.contains(self.target_label) {
            return Err(MaskError::OverlappingLabelSets {
                code: self.target_label,
            });
        }
        Ok(())
    }
}

/// A synthesized guidance map
#[derive(Debug, Clone, PartialEq)]
pub struct Guidance {
    /// Parsing map with garments cleared and the target drawn in.
    pub label_map: LabelMap,
    /// Pixels drawn with the target code.
    pub target: Mask,
}

impl Guidance {
    pub fn into_label_map(self) -> LabelMap {
        self.label_map
    }

    pub fn target_pixels(&self) -> usize {
        count_on(&self.target)
    }
}

/// Trait providing guidance-map synthesis for parsing maps
pub trait GuidanceMapExt {
    /// Builds a guidance map whose target comes from a body-surface map.
    ///
    /// The pixels of `surface_map` whose codes are in
    /// `params.surface_labels` are closed with `params.closing`, padded with
    /// `params.padding`, stripped of preserved pixels and drawn with
    /// `params.target_label` over a copy of the parsing map from which the
    /// garment codes have been cleared.
    ///
    /// # Errors
    ///
    /// * `MaskError::DimensionMismatch` - when the two maps differ in size
    /// * `MaskError::EmptyImage` - when the parsing map has a zero dimension
    /// * `MaskError::InvalidKernel` - when `params.closing` or `params.padding` is invalid
    /// * `MaskError::OverlappingLabelSets` - when a garment or the target code is preserved
    fn guidance_from_surface(
        &self,
        surface_map: &LabelMap,
        params: &GuidanceParams,
    ) -> Result<Guidance, MaskError>;

    /// Builds a guidance map whose target is the smoothed garment region.
    ///
    /// Used when no surface map is available: the garment mask is closed
    /// with `params.garment_closing` and padded with `params.padding`, then
    /// drawn in the same way as [`GuidanceMapExt::guidance_from_surface`].
    ///
    /// # Errors
    ///
    /// * `MaskError::EmptyImage` - when the parsing map has a zero dimension
    /// * `MaskError::InvalidKernel` - when `params.garment_closing` or `params.padding` is invalid
    /// * `MaskError::OverlappingLabelSets` - when a garment or the target code is preserved
    fn guidance_from_garment(&self, params: &GuidanceParams) -> Result<Guidance, MaskError>;
}

impl GuidanceMapExt for LabelMap {
    fn guidance_from_surface(
        &self,
        surface_map: &LabelMap,
        params: &GuidanceParams,
    ) -> Result<Guidance, MaskError> {
        params.validate_with(params.closing)?;
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height, "guidance_from_surface")?;
        validate_matching_dimensions(self, surface_map)?;

        let source = surface_map.membership_mask(&params.surface_labels);
        draw_guidance(self, &source, params.closing, params)
    }

    fn guidance_from_garment(&self, params: &GuidanceParams) -> Result<Guidance, MaskError> {
        params.validate_with(params.garment_closing)?;
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height, "guidance_from_garment")?;

        let source = self.membership_mask(&params.garment_labels);
        draw_guidance(self, &source, params.garment_closing, params)
    }
}

fn draw_guidance(
    label_map: &LabelMap,
    source: &Mask,
    closing: SquareKernel,
    params: &GuidanceParams,
) -> Result<Guidance, MaskError> {
    let smoothed = source.close_square(closing)?.dilate_square(params.padding)?;
    let preserve_mask = label_map.membership_mask(&params.preserve_labels);
    let target = subtract(&smoothed, &preserve_mask);

    let garments = params.garment_labels;
    let target_label = params.target_label;
    let background = params.background_label;
    let guidance = map_colors2(label_map, &target, |Luma([code]), Luma([inside])| {
        Luma([if is_on(inside) {
            target_label
        } else if garments.contains(code) {
            background
        } else {
            code
        }])
    });

    debug!(
        source = count_on(source),
        target = count_on(&target),
        cleared = label_map.count_labels(&garments),
        "generated guidance map"
    );

    Ok(Guidance {
        label_map: guidance,
        target,
    })
}

/// Produces a guidance map from a parsing map and a body-surface map.
///
/// Garments (upper-clothes, dress, coat) are cleared and the target is drawn
/// as upper-clothes, using the default 5×5 closing and padding.
///
/// # Errors
///
/// * `MaskError::DimensionMismatch` - when the two maps differ in size
/// * `MaskError::OverlappingLabelSets` - when a garment code is preserved
pub fn generate_guidance(
    label_map: &LabelMap,
    surface_map: &LabelMap,
    surface_labels: &LabelSet,
    preserve_labels: &LabelSet,
) -> Result<LabelMap, MaskError> {
    let params = GuidanceParams::new(*surface_labels, *preserve_labels);
    label_map
        .guidance_from_surface(surface_map, &params)
        .map(Guidance::into_label_map)
}

/// Produces a guidance map from the parsing map alone.
///
/// # Errors
///
/// * `MaskError::OverlappingLabelSets` - when a garment code is preserved
pub fn generate_garment_guidance(
    label_map: &LabelMap,
    preserve_labels: &LabelSet,
) -> Result<LabelMap, MaskError> {
    let params = GuidanceParams {
        preserve_labels: *preserve_labels,
        ..GuidanceParams::default()
    };
    label_map
        .guidance_from_garment(&params)
        .map(Guidance::into_label_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        create_block_label_map, create_upper_body_label_map, create_upper_body_surface_map,
        fill_block,
    };
    use crate::tryon_masks::labels::surface;
    use crate::tryon_masks::mask::{is_subset, MASK_ON};

    #[test]
    fn surface_target_replaces_garment_outline() {
        let parse = create_upper_body_label_map();
        let surface_map = create_upper_body_surface_map();

        let guidance = parse
            .guidance_from_surface(&surface_map, &GuidanceParams::default())
            .unwrap();

        // The gap between the arms and the torso is closed.
        assert_eq!(guidance.label_map.get_pixel(9, 20)[0], parsing::UPPER_CLOTHES);
        assert_eq!(guidance.label_map.get_pixel(30, 20)[0], parsing::UPPER_CLOTHES);
        // Padding reaches two kernel radii past the surface.
        assert_eq!(guidance.label_map.get_pixel(20, 31)[0], parsing::UPPER_CLOTHES);
        assert_eq!(guidance.label_map.get_pixel(20, 33)[0], parsing::PANTS);
    }

    #[test]
    fn garment_codes_only_remain_inside_target() {
        let parse = create_upper_body_label_map();
        let mut surface_map: LabelMap = LabelMap::new(40, 40);
        // A narrow torso leaves part of the worn garment outside the target.
        fill_block(&mut surface_map, 16, 14, 8, 8, surface::TORSO_2);

        let guidance = parse
            .guidance_from_surface(&surface_map, &GuidanceParams::default())
            .unwrap();

        for (x, y, Luma([code])) in guidance.label_map.enumerate_pixels() {
            if LabelSet::garments().contains(*code) {
                assert_eq!(guidance.target.get_pixel(x, y)[0], MASK_ON);
            }
        }
        assert_eq!(guidance.label_map.get_pixel(11, 26)[0], parsing::BACKGROUND);
    }

    #[test]
    fn preserved_pixels_are_never_targeted() {
        let parse = create_upper_body_label_map();
        let mut surface_map = create_upper_body_surface_map();
        // Surface that reaches over the face and neck.
        fill_block(&mut surface_map, 10, 2, 20, 10, surface::TORSO_1);

        let guidance = parse
            .guidance_from_surface(&surface_map, &GuidanceParams::default())
            .unwrap();

        for (x, y, Luma([code])) in parse.enumerate_pixels() {
            if LabelSet::preserve().contains(*code) {
                assert_eq!(guidance.label_map.get_pixel(x, y)[0], *code);
                assert_ne!(guidance.target.get_pixel(x, y)[0], MASK_ON);
            }
        }
    }

    #[test]
    fn sleeved_variant_covers_lower_arms() {
        let parse = create_upper_body_label_map();
        let mut surface_map = create_upper_body_surface_map();
        fill_block(&mut surface_map, 0, 30, 4, 6, surface::LOWER_ARM_LEFT_19);

        let default = parse
            .guidance_from_surface(&surface_map, &GuidanceParams::default())
            .unwrap();
        let sleeved = parse
            .guidance_from_surface(&surface_map, &GuidanceParams::sleeved())
            .unwrap();

        assert_ne!(default.label_map.get_pixel(1, 33)[0], parsing::UPPER_CLOTHES);
        assert_eq!(sleeved.label_map.get_pixel(1, 33)[0], parsing::UPPER_CLOTHES);
        assert!(is_subset(&default.target, &sleeved.target));
    }

    #[test]
    fn empty_surface_clears_garments_only() {
        let parse = create_upper_body_label_map();
        let surface_map: LabelMap = LabelMap::new(40, 40);

        let guidance =
            generate_guidance(&parse, &surface_map, &LabelSet::torso(), &LabelSet::preserve())
                .unwrap();

        for (x, y, Luma([code])) in parse.enumerate_pixels() {
            let expected = if LabelSet::garments().contains(*code) {
                parsing::BACKGROUND
            } else {
                *code
            };
            assert_eq!(guidance.get_pixel(x, y)[0], expected);
        }
    }

    #[test]
    fn garment_guidance_smooths_garment_region() {
        let mut parse = create_block_label_map(60, 60, 20, 20, 20, parsing::UPPER_CLOTHES);
        // A notch in the garment, as left by a fold or a hand in front of it.
        fill_block(&mut parse, 29, 20, 2, 6, parsing::BACKGROUND);

        let guidance = generate_garment_guidance(&parse, &LabelSet::preserve()).unwrap();

        assert_eq!(guidance.get_pixel(30, 22)[0], parsing::UPPER_CLOTHES);
        assert_eq!(guidance.get_pixel(17, 30)[0], parsing::UPPER_CLOTHES);
        assert_eq!(guidance.get_pixel(14, 30)[0], parsing::BACKGROUND);
    }

    #[test]
    fn mismatched_surface_is_rejected() {
        let parse = create_upper_body_label_map();
        let surface_map: LabelMap = LabelMap::new(20, 40);

        let result = parse.guidance_from_surface(&surface_map, &GuidanceParams::default());
        assert_eq!(
            result,
            Err(MaskError::DimensionMismatch {
                expected: (40, 40),
                actual: (20, 40),
            })
        );
    }

    #[test]
    fn params_validation_rejects_bad_configurations() {
        let mut params = GuidanceParams::default();
        params.padding.size = 4;
        assert_eq!(params.validate(), Err(MaskError::InvalidKernel { size: 4 }));

        let params = GuidanceParams {
            target_label: parsing::FACE,
            ..GuidanceParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(MaskError::OverlappingLabelSets { code: parsing::FACE })
        );

        let params = GuidanceParams {
            garment_labels: LabelSet::from_codes(&[parsing::UPPER_CLOTHES, parsing::HAIR]),
            ..GuidanceParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(MaskError::OverlappingLabelSets { code: parsing::HAIR })
        );
    }

    #[test]
    fn each_source_checks_only_its_own_closing() {
        let parse = create_upper_body_label_map();
        let surface_map = create_upper_body_surface_map();
        let mut params = GuidanceParams::default();
        params.garment_closing.size = 4;

        assert!(parse.guidance_from_surface(&surface_map, &params).is_ok());
        assert_eq!(
            parse.guidance_from_garment(&params),
            Err(MaskError::InvalidKernel { size: 4 })
        );
        assert_eq!(params.validate(), Err(MaskError::InvalidKernel { size: 4 }));

        let mut params = GuidanceParams::default();
        params.closing.size = 6;
        assert!(parse.guidance_from_garment(&params).is_ok());
        assert_eq!(
            parse.guidance_from_surface(&surface_map, &params),
            Err(MaskError::InvalidKernel { size: 6 })
        );
    }

    #[test]
    fn background_may_be_a_garment_code() {
        let parse = create_upper_body_label_map();
        let params = GuidanceParams {
            garment_labels: LabelSet::from_codes(&[parsing::BACKGROUND, parsing::UPPER_CLOTHES]),
            ..GuidanceParams::default()
        };

        let guidance = parse.guidance_from_garment(&params).unwrap();
        assert_eq!(guidance.label_map.get_pixel(0, 39)[0], parsing::BACKGROUND);
        assert_eq!(guidance.label_map.get_pixel(20, 20)[0], parsing::UPPER_CLOTHES);
    }
}
