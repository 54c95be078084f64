use eframe::egui::Color32;
use palette::{Darken, Hsl, IntoColor, Srgb};

use crate::data::label::Gender;

// ---------------------------------------------------------------------------
// Fixed colours per gender
// ---------------------------------------------------------------------------

/// Chart fill for each canonical gender: green for male, orange for female.
pub fn gender_color(gender: Gender) -> Color32 {
    match gender {
        Gender::Male => Color32::from_rgb(0x4C, 0xAF, 0x50),
        Gender::Female => Color32::from_rgb(0xFF, 0x98, 0x00),
    }
}

/// Colour for a label cell in the result table, `None` for unrecognised labels.
pub fn label_color(label: &str) -> Option<Color32> {
    Gender::from_display_label(label).map(gender_color)
}

// ---------------------------------------------------------------------------
// Derived shades
// ---------------------------------------------------------------------------

/// A darker shade of `color` in HSL space, for slice outlines.
pub fn outline_color(color: Color32) -> Color32 {
    let rgb = Srgb::new(color.r(), color.g(), color.b()).into_format::<f32>();
    let hsl: Hsl = rgb.into_color();
    let darker: Srgb = hsl.darken(0.35).into_color();
    let darker = darker.into_format::<u8>();
    Color32::from_rgb(darker.red, darker.green, darker.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luma(c: Color32) -> u32 {
        c.r() as u32 * 299 + c.g() as u32 * 587 + c.b() as u32 * 114
    }

    #[test]
    fn outline_is_darker_than_fill() {
        for g in Gender::ALL {
            let fill = gender_color(g);
            assert!(luma(outline_color(fill)) < luma(fill));
        }
    }

    #[test]
    fn only_canonical_labels_are_coloured() {
        assert_eq!(label_color("Perempuan"), Some(gender_color(Gender::Female)));
        assert_eq!(label_color("X"), None);
    }
}
