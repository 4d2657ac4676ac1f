//! Length-prefixed sub-block framing.
//!
//! Variable-length payloads (compressed pixel data, extension bodies) are stored as a run of
//! `[len][len bytes]` chunks with `1 <= len <= 255`, closed by a zero-length chunk.

use std::io::Write;

use crate::foundation::error::FormatError;

/// Largest payload carried by one sub-block.
pub const MAX_SUB_BLOCK: usize = 255;

/// Skip a sub-block run starting at `pos`, returning the offset just past its terminator.
pub fn skip_sub_blocks(bytes: &[u8], mut pos: usize) -> Result<usize, FormatError> {
    loop {
        let len = *bytes.get(pos).ok_or(FormatError::Truncated("sub-block"))? as usize;
        pos += 1;
        if len == 0 {
            return Ok(pos);
        }
        if pos + len > bytes.len() {
            return Err(FormatError::Truncated("sub-block"));
        }
        pos += len;
    }
}

/// Reassemble the payload of a sub-block run starting at `pos`.
///
/// Returns the concatenated payload and the offset just past the terminator.
pub fn read_sub_blocks(bytes: &[u8], mut pos: usize) -> Result<(Vec<u8>, usize), FormatError> {
    let mut out = Vec::new();
    loop {
        let len = *bytes.get(pos).ok_or(FormatError::Truncated("sub-block"))? as usize;
        pos += 1;
        if len == 0 {
            return Ok((out, pos));
        }
        let chunk = bytes
            .get(pos..pos + len)
            .ok_or(FormatError::Truncated("sub-block"))?;
        out.extend_from_slice(chunk);
        pos += len;
    }
}

/// Write `payload` as a sub-block run, including the zero-length terminator.
pub fn write_sub_blocks<W: Write>(w: &mut W, payload: &[u8]) -> std::io::Result<()> {
    for chunk in payload.chunks(MAX_SUB_BLOCK) {
        w.write_all(&[chunk.len() as u8])?;
        w.write_all(chunk)?;
    }
    w.write_all(&[0])
}

#[cfg(test)]
#[path = "../../tests/unit/codec/blocks.rs"]
mod tests;
