use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// formatted as `#rrggbb` for the charting runtime.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// Colour of overlay group `group`, cycling through `palette`.
pub fn cycle<'a>(palette: &'a [String], group: usize) -> Option<&'a str> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[group % palette.len()].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_distinct_hex() {
        let palette = generate_palette(8);
        assert_eq!(palette.len(), 8);
        for c in &palette {
            assert_eq!(c.len(), 7);
            assert!(c.starts_with('#'));
            assert!(c[1..].chars().all(|ch| ch.is_ascii_hexdigit()));
        }
        let unique: std::collections::BTreeSet<_> = palette.iter().collect();
        assert_eq!(unique.len(), 8);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn first_hue_is_red() {
        let palette = generate_palette(3);
        let red = u8::from_str_radix(&palette[0][1..3], 16).unwrap();
        let green = u8::from_str_radix(&palette[0][3..5], 16).unwrap();
        assert!(red > green);
    }

    #[test]
    fn cycling_wraps_around() {
        let palette = generate_palette(3);
        assert_eq!(cycle(&palette, 4), Some(palette[1].as_str()));
        assert_eq!(cycle(&[], 0), None);
    }
}
