//! The set of independently toggleable variants active in a game.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr, VariantArray};

use crate::model::topology::Topology;

/// One chess variant.
///
/// Names parse from and display as kebab-case, e.g. `king-of-the-hill`.
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString,
    IntoStaticStr, VariantArray, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(into = "&'static str", try_from = "String")]
#[repr(u8)]
pub enum Variant {
    CHESS960,
    ATOMIC,
    CIRCE,
    CRAZYHOUSE,
    DARK_CHESS,
    ALICE_CHESS,
    ABSORPTION,
    FRANKFURT,
    BENEDICT,
    MADRASI,
    PATROL,
    THREE_CHECK,
    KING_OF_THE_HILL,
    ANTICHESS,
    HORDE,
    HEXAGONAL,
    CIRCULAR,
    CYLINDER,
    TWO_FAMILIES,
    CAPABLANCA,
    RETREAT,
    COMPENSATION,
    MONSTER,
}

impl Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}

impl TryFrom<String> for Variant {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Variant::from_str(&value)
    }
}

/// An immutable set of [`Variant`]s, fixed for the lifetime of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Variant>", from = "Vec<Variant>")]
pub struct VariantSet(u32);

impl From<Vec<Variant>> for VariantSet {
    fn from(value: Vec<Variant>) -> Self {
        value.into_iter().collect()
    }
}

impl From<VariantSet> for Vec<Variant> {
    fn from(value: VariantSet) -> Self {
        value.iter().collect()
    }
}

impl FromIterator<Variant> for VariantSet {
    fn from_iter<T: IntoIterator<Item = Variant>>(iter: T) -> Self {
        iter.into_iter().fold(Self(0), |s, v| s.with(v))
    }
}

impl VariantSet {
    /// Orthodox chess.
    pub const STANDARD: VariantSet = VariantSet(0);

    #[inline]
    pub fn with(self, v: Variant) -> Self {
        Self(self.0 | 1 << v as u32)
    }

    #[inline]
    pub fn has(self, v: Variant) -> bool {
        self.0 & 1 << v as u32 != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Variant> {
        Variant::VARIANTS.iter().copied().filter(move |&v| self.has(v))
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Variants without a concept of check: royal pieces may be left
    /// attacked, and losing one ends the game.
    pub fn no_checks(self) -> bool {
        use Variant::*;
        [ATOMIC, DARK_CHESS, MONSTER, BENEDICT, ANTICHESS]
            .into_iter()
            .any(|v| self.has(v))
    }

    /// Variants in which captured pieces can come back.
    pub fn resurrects(self) -> bool {
        use Variant::*;
        [CIRCE, CRAZYHOUSE, COMPENSATION]
            .into_iter()
            .any(|v| self.has(v))
    }

    /// Variants in which pieces change type or color as a side effect.
    pub fn changes_pieces(self) -> bool {
        use Variant::*;
        [ABSORPTION, FRANKFURT, BENEDICT]
            .into_iter()
            .any(|v| self.has(v))
    }

    /// Variants with pockets to drop pieces from.
    pub fn has_pockets(self) -> bool {
        self.has(Variant::CRAZYHOUSE) || self.has(Variant::COMPENSATION)
    }

    /// Kings are ordinary pieces under Antichess.
    pub fn kings_are_royal(self) -> bool {
        !self.has(Variant::ANTICHESS)
    }

    /// Castling exists only on rectangular boards and not under
    /// Antichess or with two kings a side.
    pub fn allows_castling(self) -> bool {
        use Variant::*;
        ![HEXAGONAL, CIRCULAR, TWO_FAMILIES, ANTICHESS]
            .into_iter()
            .any(|v| self.has(v))
    }

    /// Board shape implied by the variants.
    ///
    /// Shape variants take precedence in the order hexagonal, circular,
    /// cylinder, then the ten-file boards.
    pub fn topology(self) -> Topology {
        use Variant::*;
        let base = if self.has(HEXAGONAL) {
            Topology::hexagonal()
        } else if self.has(CIRCULAR) {
            Topology::circular()
        } else if self.has(CYLINDER) {
            Topology::cylinder(8, 8)
        } else if self.has(CAPABLANCA) || self.has(TWO_FAMILIES) {
            Topology::rectangular(10, 8)
        } else {
            Topology::STANDARD
        };
        if self.has(ALICE_CHESS) {
            base.with_boards(2)
        } else {
            base
        }
    }
}

impl Display for VariantSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("standard");
        }
        let names: Vec<&'static str> = self.iter().map(Into::into).collect();
        f.write_str(&names.join(","))
    }
}

#[test]
fn variant_names() {
    assert_eq!(Variant::KING_OF_THE_HILL.to_string(), "king-of-the-hill");
    assert_eq!(Variant::CHESS960.to_string(), "chess960");
    assert_eq!(Variant::from_str("alice-chess"), Ok(Variant::ALICE_CHESS));
    assert_eq!(Variant::from_str("three-check"), Ok(Variant::THREE_CHECK));
    assert!(Variant::from_str("suicide").is_err());
}

#[test]
fn set_membership() {
    let set: VariantSet = [Variant::ATOMIC, Variant::CIRCE].into_iter().collect();
    assert!(set.has(Variant::ATOMIC));
    assert!(!set.has(Variant::CRAZYHOUSE));
    assert!(set.no_checks());
    assert!(set.resurrects());
    assert_eq!(set.iter().count(), 2);
    assert_eq!(set.to_string(), "atomic,circe");
    assert!(!VariantSet::STANDARD.no_checks());
}

#[test]
fn topology_from_variants() {
    use crate::model::topology::Shape;
    let alice_capa = VariantSet::STANDARD
        .with(Variant::ALICE_CHESS)
        .with(Variant::CAPABLANCA)
        .topology();
    assert_eq!(alice_capa.boards, 2);
    assert_eq!(alice_capa.width, 10);
    assert_eq!(
        VariantSet::STANDARD.with(Variant::HEXAGONAL).topology().shape,
        Shape::HEXAGONAL
    );
}
