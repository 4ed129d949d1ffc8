use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use anyhow::{bail, ensure, Context, Result};
use itertools::Itertools;
use json_pretty_compact::PrettyCompactFormatter;
use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Serializer;

use crate::{
    common::{Color, ColorRGB},
    nclr::Nclr,
    split::PaletteSet,
};

pub fn save_json<T: Serialize>(path: &Path, data: &T, pretty: bool) -> Result<()> {
    info!("Saving {}", path.display());
    let mut data_bytes = vec![];
    if pretty {
        let formatter = PrettyCompactFormatter::new();
        let mut ser = Serializer::with_formatter(&mut data_bytes, formatter);
        data.serialize(&mut ser)?;
    } else {
        serde_json::to_writer(&mut data_bytes, data)?;
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &data_bytes)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    info!("Loading {}", path.display());
    let data_bytes = fs::read(path)?;
    let data: T = serde_json::from_slice(&data_bytes)?;
    Ok(data)
}

/// Editable JSON form of an NCLR file. Colors use 5-bit components.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaletteDocument {
    pub depth: u32,
    pub multi_palette_flag: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_table: Option<Vec<u16>>,
    pub palettes: Vec<Vec<ColorRGB>>,
}

impl PaletteDocument {
    pub fn from_nclr(nclr: &Nclr) -> Self {
        Self {
            depth: nclr.depth().code(),
            multi_palette_flag: nclr.multi_palette_flag(),
            index_table: nclr.index_table().map(|t| t.indices.clone()),
            palettes: nclr
                .palettes()
                .iter()
                .map(|p| p.iter().map(|c| c.rgb()).collect())
                .collect(),
        }
    }

    pub fn palette_set(&self) -> Result<PaletteSet> {
        let mut palettes = PaletteSet::with_capacity(self.palettes.len());
        for (i, pal) in self.palettes.iter().enumerate() {
            let mut colors = Vec::with_capacity(pal.len());
            for (j, &c) in pal.iter().enumerate() {
                ensure!(
                    c.iter().all(|&v| v < 32),
                    "palette {i} color {j}: components must be 0-31, got {c:?}"
                );
                colors.push(Color::from_rgb(c));
            }
            palettes.push(colors);
        }
        Ok(palettes)
    }

    /// Puts the document's palettes into `template`, keeping its other blocks
    /// and metadata, or builds a new file when there is no template.
    pub fn apply(&self, template: Option<Nclr>) -> Result<Nclr> {
        let palettes = self.palette_set()?;
        match template {
            Some(mut nclr) => {
                if self.index_table.as_ref() != nclr.index_table().map(|t| &t.indices) {
                    warn!("Index table in document differs from template; the template's is kept");
                }
                if self.multi_palette_flag != nclr.multi_palette_flag() {
                    warn!(
                        "Multi-palette flag {} in document differs from template; the template's {} is kept",
                        self.multi_palette_flag,
                        nclr.multi_palette_flag()
                    );
                }
                nclr.set_palettes(palettes);
                Ok(nclr)
            }
            None => {
                if self.index_table.is_some() {
                    warn!("Index table in document is ignored for a new file");
                }
                let mut nclr = Nclr::from_palettes(palettes)?;
                nclr.set_multi_palette_flag(self.multi_palette_flag);
                Ok(nclr)
            }
        }
    }
}

// PNG dimensions are limited to 2^31 - 1.
const MAX_PNG_DIMENSION: u32 = 0x7FFF_FFFF;
const MAX_SWATCH_BYTES: usize = 1 << 28;

/// Writes one row of `scale`-sized cells per palette slot.
pub fn save_palette_png(path: &Path, palettes: &[Vec<Color>], scale: u32) -> Result<()> {
    info!("Saving {}", path.display());
    ensure!(scale > 0, "swatch scale must be positive");
    let cols = palettes.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let rows = palettes.len().max(1);
    let side = |cells: usize| {
        u32::try_from(cells)
            .ok()
            .and_then(|n| n.checked_mul(scale))
            .filter(|&n| n <= MAX_PNG_DIMENSION)
    };
    let (Some(width), Some(height)) = (side(cols), side(rows)) else {
        bail!("swatch of {cols}x{rows} cells at scale {scale} is too large for a PNG");
    };
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .filter(|&n| n <= MAX_SWATCH_BYTES)
        .with_context(|| format!("swatch of {width}x{height} pixels is too large"))?;

    let mut data = vec![0u8; len];
    let scale = scale as usize;
    for (row, pal) in palettes.iter().enumerate() {
        for (col, color) in pal.iter().enumerate() {
            let rgb = color.to_rgb8();
            for (y, x) in (0..scale).cartesian_product(0..scale) {
                let py = row * scale + y;
                let px = col * scale + x;
                let i = (py * width as usize + px) * 3;
                data[i..i + 3].copy_from_slice(&rgb);
            }
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    Ok(())
}
