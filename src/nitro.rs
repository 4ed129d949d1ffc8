// Generic container shared by the Nitro file formats (NCLR, NCGR, NSCR, ...):
// a small header followed by tagged, length-prefixed blocks.
use std::{
    fmt::{self, Debug, Display},
    io::{Read, Seek, Write},
};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use log::debug;

use crate::{
    diagnostics::{Diagnostic, Diagnostics},
    error::{NclrError, Result},
    helpers::{read_bytes, seek_within, stream_len},
};

pub const BYTE_ORDER_MARK: u16 = 0xFEFF;
pub const HEADER_SIZE: u16 = 0x10;
pub const BLOCK_HEADER_SIZE: u32 = 0x08;

/// A four character tag, kept in reading order (`PLTT`). On disk the
/// characters are stored reversed (`TTLP`).
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockTag([u8; 4]);

impl BlockTag {
    pub const fn new(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }

    pub fn from_disk(raw: [u8; 4]) -> Self {
        Self([raw[3], raw[2], raw[1], raw[0]])
    }

    pub fn to_disk(self) -> [u8; 4] {
        let t = self.0;
        [t[3], t[2], t[1], t[0]]
    }
}

impl Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }
        Ok(())
    }
}

impl Debug for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockTag({self})")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub tag: BlockTag,
    // Stream offset of the first data byte (just past the block header) when read.
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Block {
    /// Total size as written in the block header (header included), or
    /// `None` when it does not fit the 32-bit size field.
    pub fn size(&self) -> Option<u32> {
        block_size(self.data.len())
    }

    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

fn block_size(data_len: usize) -> Option<u32> {
    u32::try_from(data_len).ok()?.checked_add(BLOCK_HEADER_SIZE)
}

#[derive(Clone, Debug)]
pub struct NitroFile {
    pub magic: BlockTag,
    pub version: u16,
    blocks: Vec<Block>,
}

impl NitroFile {
    pub fn new(magic: BlockTag, version: u16) -> Self {
        Self {
            magic,
            version,
            blocks: vec![],
        }
    }

    pub fn read(s: &mut (impl Read + Seek), diagnostics: &mut Diagnostics) -> Result<Self> {
        let start = s.stream_position()?;
        let stream_end = stream_len(s)?;

        let mut magic = [0; 4];
        s.read_exact(&mut magic)?;
        let magic = BlockTag::from_disk(magic);
        let bom = s.read_u16::<LE>()?;
        if bom != BYTE_ORDER_MARK {
            return Err(NclrError::Format(format!(
                "{magic}: bad byte order mark 0x{bom:04X}"
            )));
        }
        let version = s.read_u16::<LE>()?;
        let file_size = s.read_u32::<LE>()?;
        let header_size = s.read_u16::<LE>()?;
        let num_blocks = s.read_u16::<LE>()?;
        if header_size < HEADER_SIZE {
            return Err(NclrError::Format(format!(
                "{magic}: header size 0x{header_size:X} is too small"
            )));
        }
        if u64::from(file_size) != stream_end - start {
            diagnostics.push(Diagnostic::FileSizeMismatch {
                declared: file_size,
                actual: stream_end - start,
            });
        }
        debug!("{magic}: version 0x{version:04X}, {num_blocks} blocks");

        seek_within(s, start + u64::from(header_size), "header")?;
        let mut blocks = Vec::with_capacity(num_blocks as usize);
        for _ in 0..num_blocks {
            let pos = s.stream_position()?;
            let mut tag = [0; 4];
            s.read_exact(&mut tag)?;
            let tag = BlockTag::from_disk(tag);
            let size = s.read_u32::<LE>()?;
            if size < BLOCK_HEADER_SIZE || pos + u64::from(size) > stream_end {
                return Err(NclrError::Format(format!(
                    "{tag}: bad block size 0x{size:X} at 0x{pos:X}"
                )));
            }
            let data = read_bytes(s, u64::from(size - BLOCK_HEADER_SIZE), &tag.to_string())?;
            debug!("{tag}: block at 0x{pos:X}, size 0x{size:X}");
            blocks.push(Block {
                tag,
                offset: pos + u64::from(BLOCK_HEADER_SIZE),
                data,
            });
        }

        Ok(Self {
            magic,
            version,
            blocks,
        })
    }

    pub fn write(&self, out: &mut impl Write) -> Result<()> {
        let sizes = self
            .blocks
            .iter()
            .map(|b| {
                b.size()
                    .ok_or_else(|| NclrError::Format(format!("{}: block is too large", b.tag)))
            })
            .collect::<Result<Vec<u32>>>()?;
        let file_size = sizes
            .iter()
            .try_fold(u32::from(HEADER_SIZE), |acc, &size| acc.checked_add(size))
            .ok_or_else(|| NclrError::Format("file is too large".to_string()))?;
        let num_blocks: u16 = self
            .blocks
            .len()
            .try_into()
            .map_err(|_| NclrError::Format("too many blocks".to_string()))?;

        out.write_all(&self.magic.to_disk())?;
        out.write_u16::<LE>(BYTE_ORDER_MARK)?;
        out.write_u16::<LE>(self.version)?;
        out.write_u32::<LE>(file_size)?;
        out.write_u16::<LE>(HEADER_SIZE)?;
        out.write_u16::<LE>(num_blocks)?;
        for (block, size) in self.blocks.iter().zip(sizes) {
            out.write_all(&block.tag.to_disk())?;
            out.write_u32::<LE>(size)?;
            out.write_all(&block.data)?;
        }
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn contains(&self, tag: BlockTag) -> bool {
        self.blocks.iter().any(|b| b.tag == tag)
    }

    pub fn count(&self, tag: BlockTag) -> usize {
        self.blocks.iter().filter(|b| b.tag == tag).count()
    }

    /// The `n`-th block carrying `tag`, in file order.
    pub fn block(&self, tag: BlockTag, n: usize) -> Option<&Block> {
        self.blocks.iter().filter(|b| b.tag == tag).nth(n)
    }

    pub fn set_block_data(&mut self, tag: BlockTag, n: usize, data: Vec<u8>) -> Result<()> {
        let block = self
            .blocks
            .iter_mut()
            .filter(|b| b.tag == tag)
            .nth(n)
            .ok_or(NclrError::MissingBlock(tag))?;
        block.data = data;
        Ok(())
    }

    pub fn push_block(&mut self, tag: BlockTag, data: Vec<u8>) {
        let offset = self
            .blocks
            .last()
            .map_or(u64::from(HEADER_SIZE), Block::end)
            + u64::from(BLOCK_HEADER_SIZE);
        self.blocks.push(Block { tag, offset, data });
    }
}
