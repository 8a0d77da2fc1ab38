//! Label codes and label sets.
//!
//! Parsing codes follow the LIP schema as used by SCHP and by the VITON-HD
//! `image-parse-v3` maps, where code 10 marks the neck. Surface codes are
//! DensePose part indices as found in `dp_segm` maps.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Human-parsing class codes (LIP / VITON-HD parse-v3).
pub mod parsing {
    pub const BACKGROUND: u8 = 0;
    pub const HAT: u8 = 1;
    pub const HAIR: u8 = 2;
    pub const GLOVE: u8 = 3;
    pub const SUNGLASSES: u8 = 4;
    pub const UPPER_CLOTHES: u8 = 5;
    pub const DRESS: u8 = 6;
    pub const COAT: u8 = 7;
    pub const SOCKS: u8 = 8;
    pub const PANTS: u8 = 9;
    pub const NECK: u8 = 10;
    pub const SCARF: u8 = 11;
    pub const SKIRT: u8 = 12;
    pub const FACE: u8 = 13;
    pub const LEFT_ARM: u8 = 14;
    pub const RIGHT_ARM: u8 = 15;
    pub const LEFT_LEG: u8 = 16;
    pub const RIGHT_LEG: u8 = 17;
    pub const LEFT_SHOE: u8 = 18;
    pub const RIGHT_SHOE: u8 = 19;

    /// Number of classes in the schema, background included.
    pub const CLASS_COUNT: usize = 20;
}

/// DensePose part codes of a `dp_segm` map.
///
/// Torso is 1 and 2. The arm codes 11 to 14 are the ones the try-on dataset
/// scripts target for short-sleeve guidance (11 and 13 left, 12 and 14 right).
/// Codes 15 to 22 are the arm parts of the 24-part DensePose `I` channel and
/// extend the target to full sleeves.
pub mod surface {
    pub const BACKGROUND: u8 = 0;
    pub const TORSO_1: u8 = 1;
    pub const TORSO_2: u8 = 2;
    pub const LEFT_ARM_11: u8 = 11;
    pub const RIGHT_ARM_12: u8 = 12;
    pub const LEFT_ARM_13: u8 = 13;
    pub const RIGHT_ARM_14: u8 = 14;
    pub const UPPER_ARM_LEFT_15: u8 = 15;
    pub const UPPER_ARM_RIGHT_16: u8 = 16;
    pub const UPPER_ARM_LEFT_17: u8 = 17;
    pub const UPPER_ARM_RIGHT_18: u8 = 18;
    pub const LOWER_ARM_LEFT_19: u8 = 19;
    pub const LOWER_ARM_RIGHT_20: u8 = 20;
    pub const LOWER_ARM_LEFT_21: u8 = 21;
    pub const LOWER_ARM_RIGHT_22: u8 = 22;
}

/// A set of label codes with constant-time membership.
///
/// Serialized as a sorted list of codes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct LabelSet {
    members: [bool; 256],
}

impl LabelSet {
    /// Creates an empty label set.
    pub const fn empty() -> Self {
        Self {
            members: [false; 256],
        }
    }

    /// Creates a label set from a list of codes. Duplicates are ignored.
    pub const fn from_codes(codes: &[u8]) -> Self {
        let mut members = [false; 256];
        let mut i = 0;
        while i < codes.len() {
            members[codes[i] as usize] = true;
            i += 1;
        }
        Self { members }
    }

    /// Garment and arm regions erased for an agnostic person:
    /// upper-clothes, dress, coat, left arm, right arm.
    pub const fn agnostic() -> Self {
        Self::from_codes(&[
            parsing::UPPER_CLOTHES,
            parsing::DRESS,
            parsing::COAT,
            parsing::LEFT_ARM,
            parsing::RIGHT_ARM,
        ])
    }

    /// Regions that are never overwritten: hat, hair, glove, sunglasses,
    /// neck and face.
    pub const fn preserve() -> Self {
        Self::from_codes(&[
            parsing::HAT,
            parsing::HAIR,
            parsing::GLOVE,
            parsing::SUNGLASSES,
            parsing::NECK,
            parsing::FACE,
        ])
    }

    /// Upper-body garment codes cleared from a guidance map.
    pub const fn garments() -> Self {
        Self::from_codes(&[parsing::UPPER_CLOTHES, parsing::DRESS, parsing::COAT])
    }

    /// Torso surface only.
    pub const fn torso() -> Self {
        Self::from_codes(&[surface::TORSO_1, surface::TORSO_2])
    }

    /// Torso and the short-sleeve arm codes, the default guidance target.
    pub const fn torso_and_upper_arms() -> Self {
        Self::from_codes(&[
            surface::TORSO_1,
            surface::TORSO_2,
            surface::LEFT_ARM_11,
            surface::RIGHT_ARM_12,
            surface::LEFT_ARM_13,
            surface::RIGHT_ARM_14,
        ])
    }

    /// The default guidance target plus every `I`-channel arm part, used to
    /// give long-sleeve guidance to a person photographed in a short-sleeved
    /// or sleeveless top.
    pub const fn torso_and_arms() -> Self {
        Self::from_codes(&[
            surface::TORSO_1,
            surface::TORSO_2,
            surface::LEFT_ARM_11,
            surface::RIGHT_ARM_12,
            surface::LEFT_ARM_13,
            surface::RIGHT_ARM_14,
            surface::UPPER_ARM_LEFT_15,
            surface::UPPER_ARM_RIGHT_16,
            surface::UPPER_ARM_LEFT_17,
            surface::UPPER_ARM_RIGHT_18,
            surface::LOWER_ARM_LEFT_19,
            surface::LOWER_ARM_RIGHT_20,
            surface::LOWER_ARM_LEFT_21,
            surface::LOWER_ARM_RIGHT_22,
        ])
    }

    /// Parsing regions that approximate the body surface when no DensePose
    /// map is available: upper-clothes and both arms.
    pub const fn parsed_upper_body() -> Self {
        Self::from_codes(&[
            parsing::UPPER_CLOTHES,
            parsing::LEFT_ARM,
            parsing::RIGHT_ARM,
        ])
    }

    #[inline]
    pub const fn contains(&self, code: u8) -> bool {
        self.members[code as usize]
    }

    pub fn insert(&mut self, code: u8) {
        self.members[usize::from(code)] = true;
    }

    pub fn remove(&mut self, code: u8) {
        self.members[usize::from(code)] = false;
    }

    /// Returns the codes present in both sets.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = Self::empty();
        for code in self.codes().filter(|&code| other.contains(code)) {
            result.insert(code);
        }
        result
    }

    /// Returns the codes present in either set.
    pub fn union(&self, other: &Self) -> Self {
        let mut result = *self;
        for code in other.codes() {
            result.insert(code);
        }
        result
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.members.iter().any(|&present| present)
    }

    pub fn len(&self) -> usize {
        self.members.iter().filter(|&&present| present).count()
    }

    /// Iterates the codes in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&code| self.contains(code))
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.codes()).finish()
    }
}

impl FromIterator<u8> for LabelSet {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut set = Self::empty();
        for code in iter {
            set.insert(code);
        }
        set
    }
}

impl From<&[u8]> for LabelSet {
    fn from(codes: &[u8]) -> Self {
        Self::from_codes(codes)
    }
}

impl From<Vec<u8>> for LabelSet {
    fn from(codes: Vec<u8>) -> Self {
        Self::from_codes(&codes)
    }
}

impl From<LabelSet> for Vec<u8> {
    fn from(set: LabelSet) -> Self {
        set.codes().collect()
    }
}
