//! Conversions between the host's packed interface color and RGB/hex.
//!
//! The packed form holds four bytes `0xRRGGBBAA` in one `u32`. Channel extraction
//! uses shifts of 24/16/8 everywhere so the sentinel comparisons below stay exact.

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, Result};

/// Background of regular popup buttons, also the display color of uncolored connectors.
pub const BUTTON_REGULAR_COLOR: u32 = 0x2828_28FF;
/// Background of the "Create New Parent..." button.
pub const BUTTON_REGULAR_DARK_COLOR: u32 = 0x1C1F_22FF;
/// Hover color of every popup button.
pub const BUTTON_HIGHLIGHT_COLOR: u32 = 0xC671_0CFF;
/// Color written onto proxies unless they are colorized after their connector.
pub const PROXY_NEUTRAL_COLOR: u32 = 0x5050_50FF;
/// Value the host reports for a node left on automatic coloring.
pub const AUTO_COLOR: u32 = 0;
/// Alternative automatic value some node classes report.
pub const AUTO_COLOR_ALT: u32 = 0xCCCC_CC00;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteColor {
    Packed(u32),
    /// Resolves to the host's default color for the node's class.
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub name: &'static str,
    pub color: PaletteColor,
}

pub const PALETTE: [PaletteEntry; 10] = [
    PaletteEntry { name: "Red", color: PaletteColor::Packed(0x4C24_23FF) },
    PaletteEntry { name: "Orange", color: PaletteColor::Packed(0x7843_00FF) },
    PaletteEntry { name: "Yellow", color: PaletteColor::Packed(0x806B_21FF) },
    PaletteEntry { name: "Green", color: PaletteColor::Packed(0x2F4C_23FF) },
    PaletteEntry { name: "Dark Green", color: PaletteColor::Packed(0x1228_1DFF) },
    PaletteEntry { name: "Cyan", color: PaletteColor::Packed(0x234A_4CFF) },
    PaletteEntry { name: "Blue", color: PaletteColor::Packed(0x212B_3FFF) },
    PaletteEntry { name: "Dark Blue", color: PaletteColor::Packed(0x131A_2AFF) },
    PaletteEntry { name: "Purple", color: PaletteColor::Packed(0x3A23_3EFF) },
    PaletteEntry { name: "Default", color: PaletteColor::Default },
];

impl PaletteEntry {
    /// Color used to paint the palette button itself.
    pub fn display_color(&self) -> u32 {
        match self.color {
            PaletteColor::Packed(c) => c,
            PaletteColor::Default => BUTTON_REGULAR_COLOR,
        }
    }
}

/// A packed `0xRRGGBBAA` interface color.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub fn rgb8(self) -> [u8; 3] {
        packed_to_rgb8(self.0)
    }

    pub fn rgb(self) -> [f32; 3] {
        packed_to_rgb(self.0)
    }

    pub fn alpha(self) -> u8 {
        packed_alpha(self.0)
    }

    pub fn to_hex(self) -> String {
        packed_to_hex(self.0)
    }
}

impl From<u32> for PackedColor {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for PackedColor {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        hex_to_packed(s).map(Self)
    }
}

pub fn packed_to_rgb8(packed: u32) -> [u8; 3] {
    [
        (packed >> 24 & 0xFF) as u8,
        (packed >> 16 & 0xFF) as u8,
        (packed >> 8 & 0xFF) as u8,
    ]
}

pub fn packed_alpha(packed: u32) -> u8 {
    (packed & 0xFF) as u8
}

/// Packed interface color to normalized RGB; alpha is dropped.
pub fn packed_to_rgb(packed: u32) -> [f32; 3] {
    packed_to_rgb8(packed).map(|c| c as f32 / 255.0)
}

/// Normalized RGB to a packed interface color with opaque alpha.
pub fn rgb_to_packed(rgb: [f32; 3]) -> u32 {
    let [r, g, b] = rgb.map(unit_to_byte);
    rgb8_to_packed([r, g, b])
}

pub fn rgb8_to_packed(rgb: [u8; 3]) -> u32 {
    rgba8_to_packed(rgb, 0xFF)
}

pub fn rgba8_to_packed(rgb: [u8; 3], alpha: u8) -> u32 {
    (rgb[0] as u32) << 24 | (rgb[1] as u32) << 16 | (rgb[2] as u32) << 8 | alpha as u32
}

/// Normalized RGB to `#rrggbb`.
pub fn rgb_to_hex(rgb: [f32; 3]) -> String {
    let [r, g, b] = rgb.map(unit_to_byte);
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Parses `#rrggbb` or `rrggbb` into byte channels.
pub fn hex_to_rgb(hex: &str) -> Result<[u8; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConnectorError::invalid_format(format!(
            "expected six hex digits, got '{}'",
            hex
        )));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|e| ConnectorError::invalid_format(e.to_string()))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

pub fn packed_to_hex(packed: u32) -> String {
    rgb_to_hex(packed_to_rgb(packed))
}

pub fn hex_to_packed(hex: &str) -> Result<u32> {
    hex_to_rgb(hex).map(rgb8_to_packed)
}

/// True when the host reports this tile color as "not set by the user".
pub fn is_automatic(color: u32, class_default: u32) -> bool {
    color == AUTO_COLOR || color == AUTO_COLOR_ALT || color == class_default
}

/// Color a connector's button is painted with.
pub fn display_color(tile_color: u32, class_default: u32) -> u32 {
    if is_automatic(tile_color, class_default) {
        BUTTON_REGULAR_COLOR
    } else {
        tile_color
    }
}

fn unit_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_to_rgb_uses_byte_boundaries() {
        let rgb = packed_to_rgb(0xFF80_00FF);
        assert_eq!(rgb[0], 1.0);
        assert!((rgb[1] - 128.0 / 255.0).abs() < f32::EPSILON);
        assert_eq!(rgb[2], 0.0);
    }

    #[test]
    fn rgb_channels_round_trip() {
        for packed in [
            0x0000_00FF,
            0x4C24_23FF,
            BUTTON_HIGHLIGHT_COLOR,
            0x0102_03FF,
            0xFEFD_FCFF,
        ] {
            assert_eq!(rgb_to_packed(packed_to_rgb(packed)), packed);
        }
    }

    #[test]
    fn alpha_is_discarded_and_reapplied_opaque() {
        assert_eq!(rgb_to_packed(packed_to_rgb(0x1234_5600)), 0x1234_56FF);
        assert_eq!(packed_alpha(0x1234_5600), 0);
    }

    #[test]
    fn neutral_proxy_color_matches_grey_80() {
        assert_eq!(rgb8_to_packed([80, 80, 80]), PROXY_NEUTRAL_COLOR);
    }

    #[test]
    fn hex_conversions() {
        assert_eq!(rgb_to_hex([1.0, 0.0, 0.5]), "#ff0080");
        assert_eq!(hex_to_rgb("#ff0080").unwrap(), [255, 0, 128]);
        assert_eq!(hex_to_rgb("282828").unwrap(), [40, 40, 40]);
        assert_eq!(packed_to_hex(BUTTON_REGULAR_COLOR), "#282828");
        assert_eq!(hex_to_packed("#282828").unwrap(), BUTTON_REGULAR_COLOR);
    }

    #[test]
    fn malformed_hex_is_invalid_format() {
        for bad in ["", "#12345", "#1234567", "#zz0000"] {
            assert!(matches!(
                hex_to_rgb(bad),
                Err(ConnectorError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn automatic_colors_display_as_regular_button() {
        let class_default = 0x7F7F_7FFF;
        assert_eq!(display_color(AUTO_COLOR, class_default), BUTTON_REGULAR_COLOR);
        assert_eq!(display_color(AUTO_COLOR_ALT, class_default), BUTTON_REGULAR_COLOR);
        assert_eq!(display_color(class_default, class_default), BUTTON_REGULAR_COLOR);
        assert_eq!(display_color(0x4C24_23FF, class_default), 0x4C24_23FF);
    }

    #[test]
    fn packed_color_helpers() {
        let color: PackedColor = "#4c2423".parse().unwrap();
        assert_eq!(color, PackedColor(0x4C24_23FF));
        assert_eq!(color.rgb8(), [0x4C, 0x24, 0x23]);
        assert_eq!(color.alpha(), 0xFF);
        assert_eq!(color.to_hex(), "#4c2423");
        assert!("nope".parse::<PackedColor>().is_err());
    }

    #[test]
    fn palette_default_entry_is_last() {
        assert_eq!(PALETTE.last().map(|e| e.color), Some(PaletteColor::Default));
        assert_eq!(PALETTE[9].display_color(), BUTTON_REGULAR_COLOR);
    }
}
