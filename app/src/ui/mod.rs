pub mod graph_view;
pub mod popup_view;

use egui::Color32;
use label_connector::color::{BUTTON_REGULAR_COLOR, hex_to_rgb, packed_to_rgb8};

pub fn packed_color32(packed: u32) -> Color32 {
    let [r, g, b] = packed_to_rgb8(packed);
    Color32::from_rgb(r, g, b)
}

/// `#rrggbb` to a color; unparsable text falls back to the regular button color.
pub fn hex_color32(hex: &str) -> Color32 {
    match hex_to_rgb(hex) {
        Ok([r, g, b]) => Color32::from_rgb(r, g, b),
        Err(e) => {
            log::debug!("Bad button color '{}': {}", hex, e);
            packed_color32(BUTTON_REGULAR_COLOR)
        }
    }
}

/// Black or white, whichever reads better on `fill`.
pub fn text_color_on(fill: Color32) -> Color32 {
    let luma = 0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}
