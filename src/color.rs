use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Group → colour
// ---------------------------------------------------------------------------

/// Stable colour per group so every chart agrees.
#[derive(Debug, Clone, Default)]
pub struct GroupColors {
    mapping: BTreeMap<String, Color32>,
}

impl GroupColors {
    /// Assign colours in the given order (mapping order for a stable legend).
    pub fn new<'a>(groups: impl IntoIterator<Item = &'a str>) -> Self {
        let groups: Vec<&str> = groups.into_iter().collect();
        let mapping = groups
            .iter()
            .zip(generate_palette(groups.len()))
            .map(|(g, c)| (g.to_string(), c))
            .collect();
        GroupColors { mapping }
    }

    pub fn color_for(&self, group: &str) -> Color32 {
        self.mapping.get(group).copied().unwrap_or(Color32::GRAY)
    }
}
