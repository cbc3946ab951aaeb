/// Class to display color mapping
///
/// The renderer asks a `ColorResolver` for every box. The default resolver is
/// `ClassPalette`, a table loaded from configuration: each entry lists the
/// class names (compared case-insensitively) that share one color, and
/// anything unlisted uses the default color.

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Warning color used for weeds
pub const WARNING: [u8; 4] = [255, 80, 80, 242];
/// Info color used for every other class
pub const INFO: [u8; 4] = [80, 150, 255, 242];

/// Decides the display color of a class label
pub trait ColorResolver: Send + Sync {
    fn color_for(&self, class: &str) -> Rgba<u8>;
}

impl<F> ColorResolver for F
where
    F: Fn(&str) -> Rgba<u8> + Send + Sync,
{
    fn color_for(&self, class: &str) -> Rgba<u8> {
        self(class)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Class names that map to this color, e.g. ["weed", "1"]
    pub names: Vec<String>,
    /// RGBA color
    pub color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassPalette {
    pub classes: Vec<PaletteEntry>,
    pub default_color: [u8; 4],
}

impl Default for ClassPalette {
    /// Weeds ("weed", or class id "1") in warning red, everything else in info blue
    fn default() -> Self {
        Self {
            classes: vec![PaletteEntry {
                names: vec!["weed".into(), "1".into()],
                color: WARNING,
            }],
            default_color: INFO,
        }
    }
}

impl ClassPalette {
    /// Legend entries for the UI, e.g. ("weed / 1", WARNING)
    pub fn legend(&self) -> Vec<(String, [u8; 4])> {
        self.classes
            .iter()
            .map(|entry| (entry.names.join(" / "), entry.color))
            .collect()
    }
}

impl ColorResolver for ClassPalette {
    fn color_for(&self, class: &str) -> Rgba<u8> {
        let class = class.trim();
        self.classes
            .iter()
            .find(|entry| entry.names.iter().any(|name| name.eq_ignore_ascii_case(class)))
            .map(|entry| Rgba(entry.color))
            .unwrap_or(Rgba(self.default_color))
    }
}
