//! Studio colour palette used by the editor presets

pub const BLUE: [u8; 4] = [59, 130, 246, 255];
pub const BLUE_LIGHT: [u8; 4] = [147, 197, 253, 255];
pub const PURPLE: [u8; 4] = [139, 92, 246, 255];
pub const PURPLE_LIGHT: [u8; 4] = [196, 181, 253, 255];
pub const ACCENT: [u8; 4] = [236, 72, 153, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// `color` at `opacity` (0.0-1.0), like Tailwind's `/20` suffix
pub fn with_alpha(color: [u8; 4], opacity: f32) -> [u8; 4] {
    let alpha = (color[3] as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    [color[0], color[1], color[2], alpha]
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
pub fn parse_hex(value: &str) -> Option<[u8; 4]> {
    let hex = value.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [255u8; 4];
            for i in 0..hex.len() / 2 {
                out[i] = channel(hex.get(i * 2..i * 2 + 2)?)?;
            }
            Some(out)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_alpha() {
        assert_eq!(with_alpha(BLUE, 0.2)[3], 51);
        assert_eq!(with_alpha(BLUE, 2.0)[3], 255);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#fff"), Some([255, 255, 255, 255]));
        assert_eq!(parse_hex("#3b82f6"), Some([59, 130, 246, 255]));
        assert_eq!(parse_hex("#00000080"), Some([0, 0, 0, 128]));
        assert_eq!(parse_hex("3b82f6"), None);
        assert_eq!(parse_hex("#12345"), None);
    }
}
