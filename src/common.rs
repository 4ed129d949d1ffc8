use serde::{Deserialize, Serialize};

use crate::{
    error::{NclrError, Result},
    helpers::{scale_color, unscale_color},
};

pub type ColorValue = u8; // Color value (0-31)
pub type ColorRGB = [ColorValue; 3];

/// One palette entry, stored as 5-bit channels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: ColorValue,
    pub green: ColorValue,
    pub blue: ColorValue,
}

impl Color {
    pub fn new(red: ColorValue, green: ColorValue, blue: ColorValue) -> Self {
        Self {
            red: red & 31,
            green: green & 31,
            blue: blue & 31,
        }
    }

    // The top bit is unused by the hardware and is dropped here.
    pub fn from_bgr555(c: u16) -> Self {
        Self {
            red: (c & 31) as ColorValue,
            green: ((c >> 5) & 31) as ColorValue,
            blue: ((c >> 10) & 31) as ColorValue,
        }
    }

    pub fn to_bgr555(self) -> u16 {
        (self.red as u16 & 31) | (self.green as u16 & 31) << 5 | (self.blue as u16 & 31) << 10
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        [
            scale_color(self.red),
            scale_color(self.green),
            scale_color(self.blue),
        ]
    }

    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self {
            red: unscale_color(rgb[0]),
            green: unscale_color(rgb[1]),
            blue: unscale_color(rgb[2]),
        }
    }

    pub fn rgb(self) -> ColorRGB {
        [self.red, self.green, self.blue]
    }

    pub fn from_rgb(c: ColorRGB) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// Decodes a buffer of packed little-endian colors, 2 bytes each.
pub fn colors_from_bgr555(data: &[u8]) -> Result<Vec<Color>> {
    if data.len() % 2 != 0 {
        return Err(NclrError::Format(format!(
            "palette data length {} is not a multiple of 2",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(2)
        .map(|b| Color::from_bgr555(u16::from_le_bytes([b[0], b[1]])))
        .collect())
}

pub fn colors_to_bgr555(colors: &[Color]) -> Vec<u8> {
    colors
        .iter()
        .flat_map(|c| c.to_bgr555().to_le_bytes())
        .collect()
}

pub const DEPTH_CODE_16: u32 = 3;
pub const DEPTH_CODE_256: u32 = 4;

/// Bit depth of the palette data, as declared by the depth code of a `PLTT` block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorDepth {
    Depth16,
    Depth256,
    Unknown(u32),
}

impl ColorDepth {
    pub fn from_code(code: u32) -> Self {
        match code {
            DEPTH_CODE_16 => ColorDepth::Depth16,
            DEPTH_CODE_256 => ColorDepth::Depth256,
            _ => ColorDepth::Unknown(code),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            ColorDepth::Depth16 => DEPTH_CODE_16,
            ColorDepth::Depth256 => DEPTH_CODE_256,
            ColorDepth::Unknown(code) => code,
        }
    }

    pub fn colors_per_palette(self) -> Option<usize> {
        match self {
            ColorDepth::Depth16 => Some(16),
            ColorDepth::Depth256 => Some(256),
            ColorDepth::Unknown(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x0000, Color::new(0, 0, 0))]
    #[case(0x001F, Color::new(31, 0, 0))]
    #[case(0x03E0, Color::new(0, 31, 0))]
    #[case(0x7C00, Color::new(0, 0, 31))]
    #[case(0xFFFF, Color::new(31, 31, 31))]
    fn decodes_packed_colors(#[case] packed: u16, #[case] expected: Color) {
        assert_eq!(Color::from_bgr555(packed), expected);
    }

    #[test]
    fn packing_clears_unused_bit() {
        assert_eq!(Color::from_bgr555(0xFFFF).to_bgr555(), 0x7FFF);
    }

    #[test]
    fn buffer_decode_is_little_endian() {
        let colors = colors_from_bgr555(&[0x1F, 0x00, 0x00, 0x7C]).unwrap();
        assert_eq!(colors, vec![Color::new(31, 0, 0), Color::new(0, 0, 31)]);
        assert_eq!(colors_to_bgr555(&colors), vec![0x1F, 0x00, 0x00, 0x7C]);
    }

    #[test]
    fn odd_buffer_is_format_error() {
        assert!(matches!(
            colors_from_bgr555(&[1, 2, 3]),
            Err(NclrError::Format(_))
        ));
    }

    #[test]
    fn rgb8_conversion_is_stable() {
        for v in 0..32 {
            let c = Color::new(v, 31 - v, v / 2);
            assert_eq!(Color::from_rgb8(c.to_rgb8()), c);
        }
    }

    #[rstest]
    #[case(3, Some(16))]
    #[case(4, Some(256))]
    #[case(0, None)]
    #[case(5, None)]
    fn colors_per_palette_by_code(#[case] code: u32, #[case] expected: Option<usize>) {
        let depth = ColorDepth::from_code(code);
        assert_eq!(depth.colors_per_palette(), expected);
        assert_eq!(depth.code(), code);
    }
}
