pub mod common;
pub mod config;
pub mod diagnostics;
pub mod error;
mod helpers;
pub mod nclr;
pub mod nitro;
pub mod pcmp;
pub mod persist;
pub mod pltt;
pub mod split;

pub use crate::{
    common::{Color, ColorDepth},
    diagnostics::{Diagnostic, Diagnostics},
    error::{NclrError, Result},
    nclr::Nclr,
    split::PaletteSet,
};
