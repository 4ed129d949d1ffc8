// NCLR palette files: a PLTT block and an optional PCMP block in a Nitro container
use std::{
    fs,
    io::{Cursor, Read, Write},
    path::Path,
};

use log::{debug, info};

use crate::{
    common::{Color, ColorDepth},
    diagnostics::{Diagnostic, Diagnostics},
    error::{NclrError, Result},
    nitro::{Block, BlockTag, NitroFile},
    pcmp::{IndexTable, PCMP},
    pltt::{PaletteData, PLTT},
    split::{flatten, infer_depth, num_palettes, split, PaletteSet},
};

pub const NCLR: BlockTag = BlockTag::new(b"NCLR");
pub const NCLR_VERSION: u16 = 0x0100;

pub struct Nclr {
    nitro: NitroFile,
    pltt: PaletteData,
    pcmp: Option<IndexTable>,
    palettes: PaletteSet,
    diagnostics: Diagnostics,
}

impl Nclr {
    /// A new file holding `palettes`, with no PCMP block.
    pub fn from_palettes(palettes: PaletteSet) -> Result<Self> {
        let mut nitro = NitroFile::new(NCLR, NCLR_VERSION);
        let pltt = PaletteData {
            depth: infer_depth(&palettes),
            multi_palette_flag: 0,
            colors: flatten(&palettes),
        };
        nitro.push_block(PLTT, pltt.to_bytes()?);
        Ok(Self {
            nitro,
            pltt,
            pcmp: None,
            palettes,
            diagnostics: Diagnostics::new(),
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        info!("Loading {}", path.display());
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn read(s: &mut impl Read) -> Result<Self> {
        let mut data = vec![];
        s.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut diagnostics = Diagnostics::new();
        let nitro = NitroFile::read(&mut Cursor::new(data), &mut diagnostics)?;
        for tag in [PLTT, PCMP] {
            let count = nitro.count(tag);
            if count > 1 {
                diagnostics.push(Diagnostic::DuplicateBlock { tag, count });
            }
        }

        let block = nitro.block(PLTT, 0).ok_or(NclrError::MissingBlock(PLTT))?;
        let block_size = block
            .size()
            .ok_or_else(|| NclrError::Format(format!("{PLTT}: block is too large")))?;
        let pltt = PaletteData::parse(
            block.offset,
            block_size,
            &mut block_window(data, block),
            &mut diagnostics,
        )?;
        let pcmp = match nitro.block(PCMP, 0) {
            Some(block) => Some(IndexTable::parse(
                block.offset,
                &mut block_window(data, block),
                &mut diagnostics,
            )?),
            None => None,
        };
        let palettes = load(&pltt, pcmp.as_ref())?;

        Ok(Self {
            nitro,
            pltt,
            pcmp,
            palettes,
            diagnostics,
        })
    }

    pub fn palettes(&self) -> &PaletteSet {
        &self.palettes
    }

    pub fn palettes_mut(&mut self) -> &mut PaletteSet {
        &mut self.palettes
    }

    pub fn set_palettes(&mut self, palettes: PaletteSet) {
        self.palettes = palettes;
    }

    pub fn palette(&self, idx: usize) -> Option<&[Color]> {
        self.palettes.get(idx).map(Vec::as_slice)
    }

    /// Depth as last read or written.
    pub fn depth(&self) -> ColorDepth {
        self.pltt.depth
    }

    pub fn multi_palette_flag(&self) -> u32 {
        self.pltt.multi_palette_flag
    }

    /// Sets the flag written by the next `store`.
    pub fn set_multi_palette_flag(&mut self, flag: u32) {
        self.pltt.multi_palette_flag = flag;
    }

    pub fn index_table(&self) -> Option<&IndexTable> {
        self.pcmp.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn nitro(&self) -> &NitroFile {
        &self.nitro
    }

    /// Regenerates the PLTT block from the current palettes.
    ///
    /// The PCMP block is not rebuilt: its meaning is not well enough known,
    /// so it is written back exactly as read even if the palettes changed.
    pub fn store(&mut self) -> Result<()> {
        let colors = flatten(&self.palettes);
        let depth = infer_depth(&self.palettes);
        let data = PaletteData::serialize(&colors, depth, self.pltt.multi_palette_flag)?;
        self.nitro.set_block_data(PLTT, 0, data)?;
        debug!("PLTT: stored {} colors, depth {}", colors.len(), depth.code());
        self.pltt.depth = depth;
        self.pltt.colors = colors;
        Ok(())
    }

    pub fn write(&mut self, out: &mut impl Write) -> Result<()> {
        self.store()?;
        self.nitro.write(out)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = vec![];
        self.write(&mut out)?;
        Ok(out)
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        info!("Saving {}", path.display());
        let data = self.to_bytes()?;
        fs::write(path, data)?;
        Ok(())
    }
}

// The block's own bytes end the stream, so nothing past the block can be read.
fn block_window<'a>(data: &'a [u8], block: &Block) -> Cursor<&'a [u8]> {
    Cursor::new(&data[..block.end() as usize])
}

/// Divides the PLTT colors into palettes, through the PCMP table if there is one.
/// An unknown depth code is divided as 16-color palettes.
pub fn load(pltt: &PaletteData, pcmp: Option<&IndexTable>) -> Result<PaletteSet> {
    let colors_per_palette = pltt.depth.colors_per_palette().unwrap_or(16);
    match pcmp {
        Some(table) => split(
            colors_per_palette,
            table.num_palettes(),
            &pltt.colors,
            Some(table.indices.as_slice()),
        ),
        None => split(
            colors_per_palette,
            num_palettes(pltt.colors.len(), colors_per_palette),
            &pltt.colors,
            None,
        ),
    }
}
