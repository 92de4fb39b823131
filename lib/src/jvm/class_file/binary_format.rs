use super::decode_modified_utf8;
use crate::jvm::Error;
use byteorder::{BigEndian, ByteOrder};

/// Sequential reader over the bytes of a class file (or of one of its attributes)
///
/// Everything in a class file is big-endian. Every read is bounds checked against the end of the
/// underlying slice: running out of input is an [`Error::UnexpectedEof`] that callers should
/// propagate, since there is no point retrying a read on an in-memory buffer.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    position: usize,

    /// Set right after a single byte read, cleared by any other operation
    can_push_back: bool,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor::at(bytes, 0)
    }

    /// Cursor that starts reading at some position in the input
    pub fn at(bytes: &'a [u8], position: usize) -> ByteCursor<'a> {
        ByteCursor {
            bytes,
            position,
            can_push_back: false,
        }
    }

    /// Current position in the input
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes left to read
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    /// Have all bytes been read?
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Read the next `len` bytes
    pub fn read_fully(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.can_push_back = false;
        if len > self.remaining() {
            return Err(Error::UnexpectedEof {
                position: self.position,
                requested: len,
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&self.bytes[start..self.position])
    }

    /// Skip over the next `len` bytes
    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.read_fully(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let byte = self.read_fully(1)?[0];
        self.can_push_back = true;
        Ok(byte)
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        self.read_u8().map(|byte| byte as i8)
    }

    /// Undo the last read, provided it was a single byte read
    ///
    /// This is only enough for a one byte lookahead: pushing back twice in a row, or after a
    /// wider read, is an error.
    pub fn push_back(&mut self) -> Result<(), Error> {
        if !self.can_push_back {
            return Err(Error::InvalidPushBack(self.position));
        }
        self.can_push_back = false;
        self.position -= 1;
        Ok(())
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.read_fully(2).map(BigEndian::read_u16)
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        self.read_fully(2).map(BigEndian::read_i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.read_fully(4).map(BigEndian::read_u32)
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.read_fully(4).map(BigEndian::read_i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.read_fully(8).map(BigEndian::read_u64)
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.read_fully(8).map(BigEndian::read_i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.read_u32().map(f32::from_bits)
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.read_u64().map(f64::from_bits)
    }

    /// Read a `u16` length-prefixed modified UTF-8 string
    pub fn read_utf8(&mut self) -> Result<String, Error> {
        let len = self.read_u16()? as usize;
        decode_modified_utf8(self.read_fully(len)?)
    }

    /// Read a line of modified UTF-8 text terminated by `\n`, `\r`, or `\r\n`
    ///
    /// The terminator is not included in the line. Returns `None` once the input is exhausted.
    /// A final line without a terminator is still returned.
    pub fn read_line(&mut self) -> Result<Option<String>, Error> {
        if self.is_exhausted() {
            return Ok(None);
        }

        let start = self.position;
        let mut end = start;
        while !self.is_exhausted() {
            match self.read_u8()? {
                b'\n' => break,
                b'\r' => {
                    // Swallow the `\n` of a `\r\n`, but leave anything else for the next line
                    if !self.is_exhausted() && self.read_u8()? != b'\n' {
                        self.push_back()?;
                    }
                    break;
                }
                _ => end = self.position,
            }
        }
        self.can_push_back = false;

        decode_modified_utf8(&self.bytes[start..end]).map(Some)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn big_endian_reads() {
        let bytes = [
            0xCA, 0xFE, 0xBA, 0xBE, 0xFF, 0xFE, 0x3F, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x2A,
        ];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u32().unwrap(), 0xCAFEBABE);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_f32().unwrap(), 1.0);
        assert_eq!(cursor.read_i64().unwrap(), 42);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn reading_past_the_end_fails() {
        let bytes = [0x00, 0x01, 0x02];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.skip(1).unwrap();
        match cursor.read_u32() {
            Err(Error::UnexpectedEof {
                position: 1,
                requested: 4,
            }) => (),
            other => panic!("expected end of input, got {:?}", other),
        }

        // Failed reads don't consume anything
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert!(cursor.read_u8().is_err());
    }

    #[test]
    fn only_one_byte_can_be_pushed_back() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        cursor.push_back().unwrap();
        assert!(cursor.push_back().is_err());
        assert_eq!(cursor.read_u8().unwrap(), 0x01);

        assert_eq!(cursor.read_u16().unwrap(), 0x0203);
        assert!(cursor.push_back().is_err());
    }

    #[test]
    fn lines_with_every_terminator() {
        let text = b"first\nsecond\r\nthird\rfourth";
        let mut cursor = ByteCursor::new(text);
        assert_eq!(cursor.read_line().unwrap().as_deref(), Some("first"));
        assert_eq!(cursor.read_line().unwrap().as_deref(), Some("second"));
        assert_eq!(cursor.read_line().unwrap().as_deref(), Some("third"));
        assert_eq!(cursor.read_line().unwrap().as_deref(), Some("fourth"));
        assert_eq!(cursor.read_line().unwrap(), None);
    }

    #[test]
    fn empty_lines_are_kept() {
        let mut cursor = ByteCursor::new(b"\r\n\n\r");
        assert_eq!(cursor.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(cursor.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(cursor.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(cursor.read_line().unwrap(), None);
    }
}
