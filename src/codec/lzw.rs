//! Variable-width LZW as used for GIF pixel-index streams.
//!
//! Codes are packed LSB-first. The table starts at `2^min_code_size + 2` entries (roots plus
//! the Clear and End-of-Information codes), grows one entry per emitted code and widens the
//! code size up to 12 bits. Neither direction touches canvas or colour state.

use std::collections::HashMap;

use crate::foundation::error::FormatError;

const MAX_CODES: usize = 4096;
const MAX_WIDTH: u8 = 12;

/// Validate an LZW minimum code size as stored in an image data block.
pub fn check_min_code_size(min_code_size: u8) -> Result<(), FormatError> {
    if (1..=11).contains(&min_code_size) {
        Ok(())
    } else {
        Err(FormatError::InvalidCodeSize(min_code_size))
    }
}

/// Smallest legal minimum code size able to address a colour table of `table_len` entries.
pub fn min_code_size_for(table_len: usize) -> u8 {
    let mut bits = 2u8;
    while (1usize << bits) < table_len && bits < 8 {
        bits += 1;
    }
    bits
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    bits: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    fn read(&mut self, width: u8) -> Option<u16> {
        while self.bits < width {
            let b = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc |= u32::from(b) << self.bits;
            self.bits += 8;
        }
        let code = (self.acc & ((1u32 << width) - 1)) as u16;
        self.acc >>= width;
        self.bits -= width;
        Some(code)
    }
}

#[derive(Default)]
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl BitWriter {
    fn write(&mut self, code: u16, width: u8) {
        self.acc |= u32::from(code) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// String table for decompression; entry strings are stored as prefix chains.
struct DecodeTable {
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    first: Vec<u8>,
    len: Vec<u16>,
}

impl DecodeTable {
    fn new(clear: u16) -> Self {
        let mut t = Self {
            prefix: vec![0; MAX_CODES],
            suffix: vec![0; MAX_CODES],
            first: vec![0; MAX_CODES],
            len: vec![0; MAX_CODES],
        };
        for code in 0..clear as usize {
            t.suffix[code] = code as u8;
            t.first[code] = code as u8;
            t.len[code] = 1;
        }
        t
    }

    fn push_string(&self, code: u16, out: &mut Vec<u8>) {
        let len = self.len[code as usize] as usize;
        let start = out.len();
        out.resize(start + len, 0);
        let mut c = code as usize;
        for slot in out[start..].iter_mut().rev() {
            *slot = self.suffix[c];
            c = self.prefix[c] as usize;
        }
    }

    fn add(&mut self, at: u16, prefix: u16, suffix: u8) {
        let (at, p) = (at as usize, prefix as usize);
        self.prefix[at] = prefix;
        self.suffix[at] = suffix;
        self.first[at] = self.first[p];
        self.len[at] = self.len[p] + 1;
    }
}

/// Decompress a reassembled LZW stream into at most `expected` indices.
///
/// Stops at the End-of-Information code, at the end of input, or once `expected` indices are
/// produced. A short result is returned as-is; callers decide whether that is a truncation.
pub fn decompress(data: &[u8], min_code_size: u8, expected: usize) -> Result<Vec<u8>, FormatError> {
    check_min_code_size(min_code_size)?;

    let clear = 1u16 << min_code_size;
    let eoi = clear + 1;
    let mut table = DecodeTable::new(clear);
    let mut width = min_code_size + 1;
    let mut next = eoi + 1;
    let mut prev: Option<u16> = None;

    let mut reader = BitReader::new(data);
    let mut out = Vec::with_capacity(expected);

    while out.len() < expected {
        let Some(code) = reader.read(width) else {
            break;
        };
        if code == clear {
            width = min_code_size + 1;
            next = eoi + 1;
            prev = None;
            continue;
        }
        if code == eoi {
            break;
        }

        let Some(p) = prev else {
            if code >= clear {
                return Err(FormatError::InvalidCode { code });
            }
            out.push(code as u8);
            prev = Some(code);
            continue;
        };

        let first = if code < next {
            table.push_string(code, &mut out);
            table.first[code as usize]
        } else if code == next {
            let first = table.first[p as usize];
            table.push_string(p, &mut out);
            out.push(first);
            first
        } else {
            return Err(FormatError::InvalidCode { code });
        };

        if (next as usize) < MAX_CODES {
            table.add(next, p, first);
            next += 1;
            if next >= (1u16 << width) && width < MAX_WIDTH {
                width += 1;
            }
        }
        prev = Some(code);
    }

    out.truncate(expected);
    Ok(out)
}

/// Compress `indices` into an LZW stream with a fresh code table.
///
/// Every index must be below `2^min_code_size`. When the table fills, a Clear code is emitted
/// and the dictionary restarts.
pub fn compress(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let eoi = clear + 1;
    let mut width = min_code_size + 1;
    let mut next = eoi + 1;
    let mut dict: HashMap<(u16, u8), u16> = HashMap::new();
    let mut w = BitWriter::default();

    w.write(clear, width);

    let mut iter = indices.iter();
    let Some(&head) = iter.next() else {
        w.write(eoi, width);
        return w.finish();
    };

    let mut cur = u16::from(head);
    for &b in iter {
        if let Some(&code) = dict.get(&(cur, b)) {
            cur = code;
            continue;
        }
        w.write(cur, width);
        if (next as usize) < MAX_CODES {
            dict.insert((cur, b), next);
            next += 1;
            if next > (1u16 << width) && width < MAX_WIDTH {
                width += 1;
            }
        } else {
            w.write(clear, width);
            dict.clear();
            next = eoi + 1;
            width = min_code_size + 1;
        }
        cur = u16::from(b);
    }

    w.write(cur, width);
    w.write(eoi, width);
    w.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/codec/lzw.rs"]
mod tests;
