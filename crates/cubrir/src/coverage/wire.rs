//! Bounds-checked little-endian cursor over raw file bytes.

use crate::result::{CubrirError, CubrirResult};

/// Reads scalar fields and length-prefixed strings out of a byte buffer.
///
/// Every read names the field it decodes so truncation errors point at the
/// exact structure that fell off the end of the file.
#[derive(Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize, what: &'static str) -> CubrirResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CubrirError::Truncated {
                what,
                offset: self.pos,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self, what: &'static str) -> CubrirResult<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub(crate) fn read_u32(&mut self, what: &'static str) -> CubrirResult<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_u64(&mut self, what: &'static str) -> CubrirResult<u64> {
        let bytes = self.take(8, what)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Read a u32 length followed by that many UTF-8 bytes.
    pub(crate) fn read_string(&mut self, what: &'static str) -> CubrirResult<String> {
        let len = self.read_u32(what)? as usize;
        let offset = self.pos;
        let bytes = self.take(len, what)?;
        std::str::from_utf8(bytes)
            .map(String::from)
            .map_err(|_| CubrirError::InvalidUtf8 { what, offset })
    }
}
