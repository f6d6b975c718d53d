use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::group::{NO_HIT, OTHER, UNDEF};

/// ColorBrewer Set2.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

pub const GREY: &str = "#d3d3d3";
pub const WHITE: &str = "#ffffff";
pub const DARK_GREY: &str = "#4d4d4d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Colour(String);

impl Colour {
    /// Accepts `#rrggbb` (case-insensitive), stored lowercase.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(s.to_ascii_lowercase()))
    }

    fn fixed(hex: &'static str) -> Self {
        Self(hex.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit label/group colour table supplied by the user.
pub type ColourTable = BTreeMap<String, Colour>;

pub fn reserved_colour(label: &str) -> Option<Colour> {
    match label {
        NO_HIT => Some(Colour::fixed(GREY)),
        OTHER => Some(Colour::fixed(WHITE)),
        UNDEF => Some(Colour::fixed(DARK_GREY)),
        _ => None,
    }
}

pub fn palette_colour(idx: usize) -> Option<Colour> {
    DEFAULT_PALETTE.get(idx).copied().map(Colour::fixed)
}

pub fn fallback_colour() -> Colour {
    Colour::fixed(DARK_GREY)
}
