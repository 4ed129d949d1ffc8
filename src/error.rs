use std::io;

use thiserror::Error;

use crate::nitro::BlockTag;

#[derive(Error, Debug)]
pub enum NclrError {
    #[error("format error: {0}")]
    Format(String),
    #[error("missing required block {0}")]
    MissingBlock(BlockTag),
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error(transparent)]
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, NclrError>;

// Running out of bytes mid-block is a property of the file, not of the stream.
impl From<io::Error> for NclrError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            NclrError::Format(format!("unexpected end of stream: {e}"))
        } else {
            NclrError::Io(e)
        }
    }
}
