use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{NclrError, Result};

pub fn scale_color(c: u8) -> u8 {
    ((c as u16 & 31) * 255 / 31) as u8
}

pub fn unscale_color(c: u8) -> u8 {
    ((c as u16 * 31 + 127) / 255) as u8
}

pub fn stream_len(s: &mut impl Seek) -> io::Result<u64> {
    let pos = s.stream_position()?;
    let len = s.seek(SeekFrom::End(0))?;
    s.seek(SeekFrom::Start(pos))?;
    Ok(len)
}

// Seeking past the end is legal for std streams, so bounds are checked by hand.
pub fn seek_within(s: &mut (impl Read + Seek), pos: u64, what: &str) -> Result<()> {
    let len = stream_len(s)?;
    if pos > len {
        return Err(NclrError::Format(format!(
            "{what}: offset 0x{pos:X} is beyond end of stream (0x{len:X})"
        )));
    }
    s.seek(SeekFrom::Start(pos))?;
    Ok(())
}

pub fn read_bytes(s: &mut (impl Read + Seek), n: u64, what: &str) -> Result<Vec<u8>> {
    let pos = s.stream_position()?;
    let len = stream_len(s)?;
    if pos.checked_add(n).map_or(true, |end| end > len) {
        return Err(NclrError::Format(format!(
            "{what}: reading 0x{n:X} bytes at 0x{pos:X} runs past end of stream (0x{len:X})"
        )));
    }
    let mut buf = vec![0; n as usize];
    s.read_exact(&mut buf)?;
    Ok(buf)
}
