//! Bitstream reading utilities for DAB signalling data.
//!
//! Wraps [`bitstream_io::BitReader`] with bounds-reported reads for the
//! bit-packed FIG and MOT header layouts. All multi-bit fields in DAB are
//! big-endian bit order.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            )),
            Err(e) => Err(e),
        }
    }

    /// Reads `buf.len()` whole bytes. Only valid on a byte boundary.
    #[inline(always)]
    pub fn get_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.available().and_then(|avail| {
            if (buf.len() as u64) << 3 > avail {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("get_bytes({}): out of bounds bits", buf.len()),
                ))
            } else {
                self.bs.read_bytes(buf)
            }
        })
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        if n <= 64 {
            self.bs.skip(n)
        } else {
            self.available().and_then(|avail| {
                if n as u64 > avail {
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "skip_n: out of bounds bits",
                    ))
                } else {
                    self.bs.skip(n)
                }
            })
        }
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len - pos)
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::BsIoSliceReader;

    #[test]
    fn reads_big_endian_bit_fields() {
        // 0b101_00110 0b1xxxxxxx
        let mut r = BsIoSliceReader::from_slice(&[0xA6, 0x80]);
        assert_eq!(r.get_n::<u8>(3).unwrap(), 0b101);
        assert_eq!(r.get_n::<u8>(5).unwrap(), 0b00110);
        assert!(r.get().unwrap());
        assert_eq!(r.available().unwrap(), 7);
    }

    #[test]
    fn overrun_reports_eof() {
        let mut r = BsIoSliceReader::from_slice(&[0xFF]);
        assert!(r.get_n::<u16>(9).is_err());
    }
}
