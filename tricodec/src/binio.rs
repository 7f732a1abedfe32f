//! Fixed-width big-endian records shared by the image and audio artifacts.
//!
//! Every integer is written big-endian, and every variable-length byte
//! string is prefixed with its length as a `u16`.

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, BE};

use crate::error::{Error, Result};

pub struct RecordWriter<'a, O: Write + WriteBytesExt> {
    output: &'a mut O,

    byte_size: usize,
}

impl<'a, O: Write + WriteBytesExt> RecordWriter<'a, O> {
    pub fn new(output: &'a mut O) -> Self {
        Self {
            output,
            byte_size: 0,
        }
    }

    /// Number of bytes written so far
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn write_u16(&mut self, value: u16) -> io::Result<()> {
        self.output.write_u16::<BE>(value)?;
        self.byte_size += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.output.write_u32::<BE>(value)?;
        self.byte_size += 4;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.output.write_i32::<BE>(value)?;
        self.byte_size += 4;
        Ok(())
    }

    /// Write a fixed-width tag verbatim, with no length prefix
    pub fn write_tag(&mut self, tag: &[u8]) -> io::Result<()> {
        self.output.write_all(tag)?;
        self.byte_size += tag.len();
        Ok(())
    }

    /// Write a `u16` length followed by the bytes themselves
    pub fn write_blob(&mut self, blob: &[u8]) -> io::Result<()> {
        let len = u16::try_from(blob.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "blob longer than 65535 bytes")
        })?;

        self.write_u16(len)?;
        self.write_tag(blob)
    }
}

/// Reads the records written by [`RecordWriter`].
///
/// Running out of input part way through a record is reported as
/// [`Error::CorruptArtifact`], naming the field that was cut short.
pub struct RecordReader<'a, I: Read + ReadBytesExt> {
    input: &'a mut I,

    byte_offset: usize,
}

impl<'a, I: Read + ReadBytesExt> RecordReader<'a, I> {
    pub fn new(input: &'a mut I) -> Self {
        Self {
            input,
            byte_offset: 0,
        }
    }

    /// Number of bytes consumed so far
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn read_u8(&mut self, field: &str) -> Result<u8> {
        let value = self.input.read_u8().map_err(|e| self.truncated(e, field))?;
        self.byte_offset += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self, field: &str) -> Result<u16> {
        let value = self.input.read_u16::<BE>().map_err(|e| self.truncated(e, field))?;
        self.byte_offset += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self, field: &str) -> Result<u32> {
        let value = self.input.read_u32::<BE>().map_err(|e| self.truncated(e, field))?;
        self.byte_offset += 4;
        Ok(value)
    }

    pub fn read_i32(&mut self, field: &str) -> Result<i32> {
        let value = self.input.read_i32::<BE>().map_err(|e| self.truncated(e, field))?;
        self.byte_offset += 4;
        Ok(value)
    }

    pub fn read_tag<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut tag = [0u8; N];
        self.input.read_exact(&mut tag).map_err(|e| self.truncated(e, field))?;
        self.byte_offset += N;
        Ok(tag)
    }

    pub fn read_blob(&mut self, field: &str) -> Result<Vec<u8>> {
        let len = self.read_u16(field)? as usize;

        let mut blob = vec![0u8; len];
        self.input.read_exact(&mut blob).map_err(|e| self.truncated(e, field))?;
        self.byte_offset += len;
        Ok(blob)
    }

    /// Succeeds only if the input has been fully consumed
    pub fn expect_end(&mut self) -> Result<()> {
        let mut rest = Vec::new();
        self.input.read_to_end(&mut rest)?;

        if !rest.is_empty() {
            return Err(Error::CorruptArtifact(format!(
                "{} unexpected trailing bytes at offset {}",
                rest.len(),
                self.byte_offset
            )));
        }

        Ok(())
    }

    fn truncated(&self, error: io::Error, field: &str) -> Error {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Error::CorruptArtifact(format!(
                "truncated while reading {field} at offset {}",
                self.byte_offset
            ))
        } else {
            Error::Io(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn records_are_big_endian() {
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        writer.write_u32(0x0102_0304).unwrap();
        writer.write_u16(0x0506).unwrap();
        writer.write_blob(b"RGB").unwrap();
        writer.write_i32(-2).unwrap();
        assert_eq!(writer.byte_size(), 4 + 2 + 5 + 4);

        assert_eq!(
            buf,
            [1, 2, 3, 4, 5, 6, 0, 3, b'R', b'G', b'B', 0xFF, 0xFF, 0xFF, 0xFE]
        );

        let mut input = Cursor::new(buf);
        let mut reader = RecordReader::new(&mut input);
        assert_eq!(reader.read_u32("a").unwrap(), 0x0102_0304);
        assert_eq!(reader.read_u16("b").unwrap(), 0x0506);
        assert_eq!(reader.read_blob("c").unwrap(), b"RGB");
        assert_eq!(reader.read_i32("d").unwrap(), -2);
        reader.expect_end().unwrap();
    }

    #[test]
    fn short_read_is_corrupt_artifact() {
        let mut input = Cursor::new(vec![0u8, 0, 1]);
        let mut reader = RecordReader::new(&mut input);

        let err = reader.read_u32("width").unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact(msg) if msg.contains("width")));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut input = Cursor::new(vec![0u8, 7, 9]);
        let mut reader = RecordReader::new(&mut input);
        reader.read_u16("count").unwrap();

        assert!(matches!(reader.expect_end(), Err(Error::CorruptArtifact(_))));
    }
}
