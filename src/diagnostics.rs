// Non-fatal findings recorded while reading a container
use std::fmt::{self, Display};

use log::warn;

use crate::nitro::BlockTag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    FileSizeMismatch { declared: u32, actual: u64 },
    DuplicateBlock { tag: BlockTag, count: usize },
    PayloadSizeMismatch { declared: u32, actual: u32 },
    PayloadOffset { found: u32 },
    UnknownDepth { code: u32 },
    MultiPaletteFlag { flag: u32, colors: usize },
    EmptyIndexTable,
    IndexSentinel { found: u16 },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FileSizeMismatch { declared, actual } => write!(
                f,
                "header: file size is 0x{declared:X} but stream holds 0x{actual:X} bytes"
            ),
            Diagnostic::DuplicateBlock { tag, count } => {
                write!(f, "{tag}: {count} blocks found, only the first is used")
            }
            Diagnostic::PayloadSizeMismatch { declared, actual } => write!(
                f,
                "PLTT: palette size 0x{declared:X} is different to actual size 0x{actual:X}"
            ),
            Diagnostic::PayloadOffset { found } => {
                write!(f, "PLTT: palette offset 0x{found:X} is different to 0x10")
            }
            Diagnostic::UnknownDepth { code } => write!(f, "PLTT: unknown color format {code}"),
            Diagnostic::MultiPaletteFlag { flag, colors } => write!(
                f,
                "PLTT: multi-palette flag {flag} set but depth is not 256 colors and only {colors} colors present"
            ),
            Diagnostic::EmptyIndexTable => write!(f, "PCMP: index table holds 0 palettes"),
            Diagnostic::IndexSentinel { found } => {
                write!(f, "PCMP: constant 0x{found:04X} is different to 0xBEEF")
            }
        }
    }
}

/// Collects diagnostics for one read, mirroring each to the log as it arrives.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn contains(&self, diagnostic: &Diagnostic) -> bool {
        self.0.contains(diagnostic)
    }
}
