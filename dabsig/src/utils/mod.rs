//! Utility functions and supporting infrastructure.
//!
//! - **Bitstream I/O** ([`bitstream_io`]): Bit-level reading of FIG and MOT headers
//! - **CRC Validation** ([`crc`]): DAB CRC-16/CCITT
//! - **Character Sets** ([`charset`]): EBU Latin, UCS-2 and UTF-8 label text
//! - **Error Handling** ([`errors`]): Error types

pub mod bitstream_io;
pub mod charset;
pub mod crc;
pub mod errors;
