use serde::{Deserialize, Serialize};

use crate::model::classes;

/// Session options. Every field falls back to its default when missing from a
/// config file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Create thumbnail proxies (`PostageStamp`) instead of `NoOp` proxies.
    pub use_thumbnails: bool,
    /// Paint proxies with their connector's color instead of neutral grey.
    pub colorize_connected: bool,
    /// Bold the on-canvas label of connectors.
    pub bold_labels: bool,
    /// Add the jump button and the hidden connector reference to new proxies.
    pub proxy_controls: bool,
    /// Recolor dependent proxies without a custom color when a connector is recolored.
    pub cascade_color: bool,
    /// Classes never offered as connection targets.
    pub ignore_classes: Vec<String>,
    pub label_font_size: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_thumbnails: true,
            colorize_connected: false,
            bold_labels: false,
            proxy_controls: true,
            cascade_color: false,
            ignore_classes: vec![classes::VIEWER.to_string()],
            label_font_size: 22,
        }
    }
}

impl Settings {
    /// Node class new proxies are created as.
    pub fn proxy_class(&self) -> &'static str {
        if self.use_thumbnails {
            classes::POSTAGE_STAMP
        } else {
            classes::NOOP
        }
    }

    pub fn is_ignored_class(&self, class: &str) -> bool {
        self.ignore_classes.iter().any(|c| c == class)
    }
}
