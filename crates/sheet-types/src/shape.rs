use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// The topological family of a base shape. Determines how many walls are
/// folded up from the flat blank and whether a flange stage follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeArchetype {
    Flat,
    #[default]
    #[serde(rename = "L-Shape")]
    LShape,
    #[serde(rename = "U-Shape")]
    UShape,
    Tub,
    Hat,
    Box,
}

impl ShapeArchetype {
    pub const ALL: [ShapeArchetype; 6] = [
        ShapeArchetype::Flat,
        ShapeArchetype::LShape,
        ShapeArchetype::UShape,
        ShapeArchetype::Tub,
        ShapeArchetype::Hat,
        ShapeArchetype::Box,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeArchetype::Flat => "Flat",
            ShapeArchetype::LShape => "L-Shape",
            ShapeArchetype::UShape => "U-Shape",
            ShapeArchetype::Tub => "Tub",
            ShapeArchetype::Hat => "Hat",
            ShapeArchetype::Box => "Box",
        }
    }

    /// Number of lateral faces of the blank that receive a wall.
    pub fn fold_count(self) -> u8 {
        match self {
            ShapeArchetype::Flat => 0,
            ShapeArchetype::LShape => 1,
            ShapeArchetype::UShape => 2,
            ShapeArchetype::Tub | ShapeArchetype::Hat | ShapeArchetype::Box => 4,
        }
    }

    /// Hat and Box fold a second flange off the top of every wall.
    pub fn has_flange_stage(self) -> bool {
        matches!(self, ShapeArchetype::Hat | ShapeArchetype::Box)
    }

    /// Hat flanges turn outward, the opposite way to a Box lip.
    pub fn flips_flange(self) -> bool {
        self == ShapeArchetype::Hat
    }
}

impl fmt::Display for ShapeArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeArchetype {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ShapeArchetype::ALL
            .into_iter()
            .find(|a| a.name() == trimmed)
            .ok_or_else(|| ParseError::UnrecognizedArchetype {
                name: s.to_string(),
            })
    }
}

/// Which extreme (or the center) of the blank along one axis sits on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorSide {
    Negative,
    #[default]
    Center,
    Positive,
}

impl AnchorSide {
    pub const ALL: [AnchorSide; 3] = [AnchorSide::Negative, AnchorSide::Center, AnchorSide::Positive];

    pub fn symbol(self) -> char {
        match self {
            AnchorSide::Negative => '-',
            AnchorSide::Center => '0',
            AnchorSide::Positive => '+',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '-' => Some(AnchorSide::Negative),
            '0' => Some(AnchorSide::Center),
            '+' => Some(AnchorSide::Positive),
            _ => None,
        }
    }

    /// Parse one half of an anchor such as `+X`, `-Y`, `0` or a bare `+`.
    fn parse_axis(part: &str, axis: char) -> Option<Self> {
        let mut chars = part.trim().chars();
        let side = AnchorSide::from_symbol(chars.next()?)?;
        match (side, chars.next()) {
            (_, None) => Some(side),
            (AnchorSide::Center, Some(_)) => None,
            (_, Some(c)) if c.eq_ignore_ascii_case(&axis) && chars.next().is_none() => Some(side),
            _ => None,
        }
    }

    fn label(self, axis: char) -> String {
        match self {
            AnchorSide::Center => "0".to_string(),
            side => format!("{}{}", side.symbol(), axis),
        }
    }
}

/// Per-axis choice of which corner, edge midpoint or center of the flat
/// blank coincides with the coordinate origin. Exactly nine combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OriginAnchor {
    pub x: AnchorSide,
    pub y: AnchorSide,
}

impl OriginAnchor {
    pub const ALL: [OriginAnchor; 9] = [
        OriginAnchor::new(AnchorSide::Negative, AnchorSide::Negative),
        OriginAnchor::new(AnchorSide::Negative, AnchorSide::Center),
        OriginAnchor::new(AnchorSide::Negative, AnchorSide::Positive),
        OriginAnchor::new(AnchorSide::Center, AnchorSide::Negative),
        OriginAnchor::new(AnchorSide::Center, AnchorSide::Center),
        OriginAnchor::new(AnchorSide::Center, AnchorSide::Positive),
        OriginAnchor::new(AnchorSide::Positive, AnchorSide::Negative),
        OriginAnchor::new(AnchorSide::Positive, AnchorSide::Center),
        OriginAnchor::new(AnchorSide::Positive, AnchorSide::Positive),
    ];

    pub const fn new(x: AnchorSide, y: AnchorSide) -> Self {
        Self { x, y }
    }

    pub const fn centered() -> Self {
        Self::new(AnchorSide::Center, AnchorSide::Center)
    }
}

impl fmt::Display for OriginAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x.label('X'), self.y.label('Y'))
    }
}

impl FromStr for OriginAnchor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidOriginAnchor {
            text: s.to_string(),
        };
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = AnchorSide::parse_axis(x, 'X').ok_or_else(invalid)?;
        let y = AnchorSide::parse_axis(y, 'Y').ok_or_else(invalid)?;
        Ok(Self { x, y })
    }
}

// Anchors persist in their text form, e.g. "+X,-Y".
impl Serialize for OriginAnchor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OriginAnchor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
