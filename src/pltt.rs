// PLTT: the palette data block of an NCLR file
use std::io::{Read, Seek};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use log::debug;

use crate::{
    common::{colors_from_bgr555, colors_to_bgr555, Color, ColorDepth},
    diagnostics::{Diagnostic, Diagnostics},
    error::{NclrError, Result},
    helpers::{read_bytes, seek_within},
    nitro::BlockTag,
};

pub const PLTT: BlockTag = BlockTag::new(b"PLTT");

pub const PALETTE_OFFSET: u32 = 0x10;

// Block header (tag and size) plus the four 32-bit fields before the colors.
const PLTT_OVERHEAD: u32 = 0x08 + 0x10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteData {
    pub depth: ColorDepth,
    /// Opaque flag, written back as read. Games don't seem to read it.
    pub multi_palette_flag: u32,
    pub colors: Vec<Color>,
}

impl PaletteData {
    /// Reads the block whose data starts at `block_start` and whose header
    /// declares `block_size` bytes in total.
    ///
    /// The palette size field is unreliable when the file also carries a
    /// `PCMP` block, so the color count comes from `block_size` instead.
    pub fn parse(
        block_start: u64,
        block_size: u32,
        s: &mut (impl Read + Seek),
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        seek_within(s, block_start, "PLTT")?;
        let depth_code = s.read_u32::<LE>()?;
        let depth = ColorDepth::from_code(depth_code);
        let multi_palette_flag = s.read_u32::<LE>()?;
        let pal_size = s.read_u32::<LE>()?;
        let pal_offset = s.read_u32::<LE>()?;

        let actual_size = block_size.checked_sub(PLTT_OVERHEAD).ok_or_else(|| {
            NclrError::Format(format!("PLTT: block size 0x{block_size:X} is too small"))
        })?;
        if actual_size % 2 != 0 {
            return Err(NclrError::Format(format!(
                "PLTT: palette size 0x{actual_size:X} is odd"
            )));
        }
        let data_pos = block_start
            .checked_add(u64::from(pal_offset))
            .ok_or_else(|| NclrError::Format("PLTT: palette offset overflows".to_string()))?;
        seek_within(s, data_pos, "PLTT")?;
        let colors = colors_from_bgr555(&read_bytes(s, u64::from(actual_size), "PLTT")?)?;
        debug!("PLTT: depth {depth_code}, {} colors", colors.len());

        if pal_size != actual_size {
            diagnostics.push(Diagnostic::PayloadSizeMismatch {
                declared: pal_size,
                actual: actual_size,
            });
        }
        if pal_offset != PALETTE_OFFSET {
            diagnostics.push(Diagnostic::PayloadOffset { found: pal_offset });
        }
        if let ColorDepth::Unknown(code) = depth {
            diagnostics.push(Diagnostic::UnknownDepth { code });
        }
        if multi_palette_flag == 1 && depth != ColorDepth::Depth256 && colors.len() < 256 {
            diagnostics.push(Diagnostic::MultiPaletteFlag {
                flag: multi_palette_flag,
                colors: colors.len(),
            });
        }

        Ok(Self {
            depth,
            multi_palette_flag,
            colors,
        })
    }

    /// Block data for the given colors. The offset field is always 0x10.
    pub fn serialize(colors: &[Color], depth: ColorDepth, multi_palette_flag: u32) -> Result<Vec<u8>> {
        let palette_bytes = colors_to_bgr555(colors);
        let pal_size: u32 = palette_bytes
            .len()
            .try_into()
            .map_err(|_| NclrError::Format("PLTT: too many colors".to_string()))?;

        let mut out = Vec::with_capacity(palette_bytes.len() + PALETTE_OFFSET as usize);
        out.write_u32::<LE>(depth.code())?;
        out.write_u32::<LE>(multi_palette_flag)?;
        out.write_u32::<LE>(pal_size)?;
        out.write_u32::<LE>(PALETTE_OFFSET)?;
        out.extend_from_slice(&palette_bytes);
        Ok(out)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Self::serialize(&self.colors, self.depth, self.multi_palette_flag)
    }
}
