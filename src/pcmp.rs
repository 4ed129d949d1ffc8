// PCMP: optional table placing each physical palette into a logical slot
use std::io::{Read, Seek};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use log::debug;

use crate::{
    diagnostics::{Diagnostic, Diagnostics},
    error::{NclrError, Result},
    helpers::{read_bytes, seek_within},
    nitro::BlockTag,
};

pub const PCMP: BlockTag = BlockTag::new(b"PCMP");

pub const INDEX_SENTINEL: u16 = 0xBEEF;
pub const INDEX_OFFSET: u32 = 0x08;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexTable {
    /// Usually 0xBEEF. Written back as read.
    pub sentinel: u16,
    pub indices: Vec<u16>,
}

impl IndexTable {
    pub fn new(indices: Vec<u16>) -> Self {
        Self {
            sentinel: INDEX_SENTINEL,
            indices,
        }
    }

    pub fn num_palettes(&self) -> usize {
        self.indices.len()
    }

    pub fn parse(
        block_start: u64,
        s: &mut (impl Read + Seek),
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        seek_within(s, block_start, "PCMP")?;
        let count = s.read_u16::<LE>()?;
        let sentinel = s.read_u16::<LE>()?;
        let data_offset = s.read_u32::<LE>()?;

        let data_pos = block_start
            .checked_add(u64::from(data_offset))
            .ok_or_else(|| NclrError::Format("PCMP: data offset overflows".to_string()))?;
        seek_within(s, data_pos, "PCMP")?;
        let data = read_bytes(s, u64::from(count) * 2, "PCMP")?;
        let indices = data
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        debug!("PCMP: {count} palettes");

        if count == 0 {
            diagnostics.push(Diagnostic::EmptyIndexTable);
        }
        if sentinel != INDEX_SENTINEL {
            diagnostics.push(Diagnostic::IndexSentinel { found: sentinel });
        }

        Ok(Self { sentinel, indices })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let count: u16 = self
            .indices
            .len()
            .try_into()
            .map_err(|_| NclrError::Format("PCMP: too many palettes".to_string()))?;

        let mut out = Vec::with_capacity(INDEX_OFFSET as usize + self.indices.len() * 2);
        out.write_u16::<LE>(count)?;
        out.write_u16::<LE>(self.sentinel)?;
        out.write_u32::<LE>(INDEX_OFFSET)?;
        for &idx in &self.indices {
            out.write_u16::<LE>(idx)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn block_bytes(count: u16, sentinel: u16, offset: u32, indices: &[u16]) -> Vec<u8> {
        let mut out = b"PMCP".to_vec();
        out.extend_from_slice(&(0x10 + indices.len() as u32 * 2).to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&sentinel.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        for i in indices {
            out.extend_from_slice(&i.to_le_bytes());
        }
        out
    }

    fn parse(bytes: &[u8]) -> (Result<IndexTable>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let res = IndexTable::parse(8, &mut Cursor::new(bytes), &mut diagnostics);
        (res, diagnostics)
    }

    #[test]
    fn parses_index_table() {
        let (res, diagnostics) = parse(&block_bytes(3, 0xBEEF, 8, &[2, 0, 5]));
        assert_eq!(res.unwrap().indices, vec![2, 0, 5]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn empty_table_is_diagnostic_not_error() {
        let (res, diagnostics) = parse(&block_bytes(0, 0xBEEF, 8, &[]));
        let table = res.unwrap();
        assert!(table.indices.is_empty());
        assert!(diagnostics.contains(&Diagnostic::EmptyIndexTable));
    }

    #[test]
    fn unexpected_sentinel_is_kept() {
        let (res, diagnostics) = parse(&block_bytes(1, 0x1234, 8, &[0]));
        let table = res.unwrap();
        assert_eq!(table.sentinel, 0x1234);
        assert!(diagnostics.contains(&Diagnostic::IndexSentinel { found: 0x1234 }));
        assert_eq!(&table.serialize().unwrap()[2..4], &[0x34, 0x12]);
    }

    #[test]
    fn data_offset_is_relative_to_block() {
        let mut bytes = block_bytes(2, 0xBEEF, 0x0C, &[0xFFFF, 0xFFFF]);
        bytes.extend_from_slice(&[7, 0, 9, 0]);
        let (res, _) = parse(&bytes);
        assert_eq!(res.unwrap().indices, vec![7, 9]);

        let (res, _) = parse(&block_bytes(2, 0xBEEF, 0x0C, &[1, 2, 3, 4]));
        assert_eq!(res.unwrap().indices, vec![3, 4]);
    }

    #[test]
    fn count_past_end_is_format_error() {
        let (res, _) = parse(&block_bytes(4, 0xBEEF, 8, &[0, 1]));
        assert!(matches!(res, Err(NclrError::Format(_))));
    }

    #[test]
    fn offset_past_end_is_format_error() {
        let (res, _) = parse(&block_bytes(1, 0xBEEF, 0x100, &[0]));
        assert!(matches!(res, Err(NclrError::Format(_))));
    }

    #[test]
    fn serializes_with_standard_offset() {
        let table = IndexTable::new(vec![1, 0]);
        assert_eq!(
            table.serialize().unwrap(),
            vec![2, 0, 0xEF, 0xBE, 8, 0, 0, 0, 1, 0, 0, 0]
        );
    }
}
