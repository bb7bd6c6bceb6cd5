//! Fast Information Group framing (ETSI EN 300 401, 5.2).
//!
//! A FIB carries a sequence of FIGs, each introduced by one byte packing a
//! 3-bit type and a 5-bit length. Type 0 adds a second header byte with
//! the extension number; type 1 adds the character set and label extension.

use anyhow::Result;

use crate::utils::bitstream_io::BsIoSliceReader;

/// End marker: a padding byte of all ones terminates the FIG sequence.
pub const FIG_PADDING: u8 = 0xFF;

/// FIG type 0 header: change/other-ensemble flags, the programme/data flag
/// and the extension number selecting the payload layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fig0Header {
    pub cn: bool,
    pub oe: bool,
    pub pd: bool,
    pub extension: u8,
}

impl Fig0Header {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        Ok(Self {
            cn: reader.get()?,
            oe: reader.get()?,
            pd: reader.get()?,
            extension: reader.get_n(5)?,
        })
    }
}

/// FIG type 1 header: character set and label extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fig1Header {
    pub charset: u8,
    pub oe: bool,
    pub extension: u8,
}

impl Fig1Header {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        Ok(Self {
            charset: reader.get_n(4)?,
            oe: reader.get()?,
            extension: reader.get_n(3)?,
        })
    }
}
