//! MOT header core and extension parameters (ETSI EN 301 234).
//!
//! The header entity starts with a fixed 56-bit core:
//!
//! `body size (28) | header size (13) | content type (6) | content subtype (9)`
//!
//! followed by a list of TLV extension parameters. Each parameter byte
//! packs a 2-bit parameter length indicator (PLI) and a 6-bit parameter id;
//! PLI 3 carries an explicit length with an optional 16-bit extension.

use anyhow::{Result, bail};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::charset::{self, CharacterSet};
use crate::utils::errors::MotHeaderError;

const PARAM_CONTENT_NAME: u8 = 0x0C;
const PARAM_CATEGORY_TITLE: u8 = 0x26;
const PARAM_CLICK_THROUGH_URL: u8 = 0x27;

/// Decoded MOT header: core fields plus the recognized extension
/// parameters.
#[derive(Debug, Clone, Default)]
pub struct MotHeader {
    pub body_size: usize,
    pub header_size: usize,
    pub content_type: u8,
    pub content_sub_type: u16,
    pub content_name: Option<String>,
    pub category_title: Option<String>,
    pub click_through_url: Option<String>,
}

impl MotHeader {
    /// Parses a complete header entity.
    ///
    /// The announced header and body sizes must match the byte counts the
    /// caller accumulated for the two entities; a mismatch voids the whole
    /// header. A parameter overrunning the entity does too — broadcast
    /// retransmission is the retry path, a partially applied header is not.
    pub fn parse(data: &[u8], actual_header_size: usize, actual_body_size: usize) -> Result<Self> {
        if data.len() < 7 {
            bail!(MotHeaderError::CoreTooShort(data.len()));
        }

        let mut reader = BsIoSliceReader::from_slice(&data[..7]);
        let mut header = Self {
            body_size: reader.get_n::<u32>(28)? as usize,
            header_size: reader.get_n::<u16>(13)? as usize,
            content_type: reader.get_n(6)?,
            content_sub_type: reader.get_n(9)?,
            ..Default::default()
        };

        if header.header_size != actual_header_size {
            bail!(MotHeaderError::HeaderSizeMismatch {
                announced: header.header_size,
                actual: actual_header_size,
            });
        }
        if header.body_size != actual_body_size {
            bail!(MotHeaderError::BodySizeMismatch {
                announced: header.body_size,
                actual: actual_body_size,
            });
        }

        header.parse_extension(&data[7..])?;

        Ok(header)
    }

    fn parse_extension(&mut self, mut ext: &[u8]) -> Result<()> {
        while let [first, rest @ ..] = ext {
            let pli = first >> 6;
            let param_id = first & 0x3F;
            ext = rest;

            let value_len = match pli {
                0b00 => 0,
                0b01 => 1,
                0b10 => 4,
                _ => {
                    let [len_byte, rest @ ..] = ext else {
                        bail!(MotHeaderError::TruncatedLengthIndicator(param_id));
                    };
                    ext = rest;

                    let len = (len_byte & 0x7F) as usize;
                    if len_byte & 0x80 != 0 {
                        let [ext_byte, rest @ ..] = ext else {
                            bail!(MotHeaderError::TruncatedLengthIndicator(param_id));
                        };
                        ext = rest;
                        (len << 8) + *ext_byte as usize
                    } else {
                        len
                    }
                }
            };

            if value_len > ext.len() {
                bail!(MotHeaderError::ParameterOverrun {
                    param_id,
                    len: value_len,
                });
            }
            let (value, rest) = ext.split_at(value_len);
            ext = rest;

            match param_id {
                PARAM_CONTENT_NAME => {
                    let [charset_byte, name @ ..] = value else {
                        bail!(MotHeaderError::EmptyContentName);
                    };
                    let charset = CharacterSet::from(charset_byte >> 4);
                    self.content_name = Some(charset::convert_to_utf8(name, charset));
                }
                // already UTF-8 on the wire
                PARAM_CATEGORY_TITLE => {
                    self.category_title = Some(String::from_utf8_lossy(value).into_owned());
                }
                PARAM_CLICK_THROUGH_URL => {
                    self.click_through_url = Some(String::from_utf8_lossy(value).into_owned());
                }
                other => {
                    log::trace!("MOT parameter 0x{other:02X} ({value_len} bytes) skipped");
                }
            }
        }

        Ok(())
    }
}

/// A completed MOT object: decoded header fields plus the reassembled body.
#[derive(Debug, Clone, Default)]
pub struct MotObject {
    pub content_type: u8,
    pub content_sub_type: u16,
    pub content_name: Option<String>,
    pub category_title: Option<String>,
    pub click_through_url: Option<String>,
    pub body: Vec<u8>,
}

impl MotObject {
    pub fn from_parts(header: MotHeader, body: Vec<u8>) -> Self {
        Self {
            content_type: header.content_type,
            content_sub_type: header.content_sub_type,
            content_name: header.content_name,
            category_title: header.category_title,
            click_through_url: header.click_through_url,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds the 7-byte header core for the given sizes and types.
    fn header_core(body_size: u32, header_size: u16, content_type: u8, sub_type: u16) -> Vec<u8> {
        let packed: u64 = ((body_size as u64) << 28)
            | ((header_size as u64) << 15)
            | ((content_type as u64) << 9)
            | sub_type as u64;
        packed.to_be_bytes()[1..].to_vec()
    }

    #[test]
    fn core_fields_round_trip() {
        let data = header_core(1000, 7, 2, 1);
        let header = MotHeader::parse(&data, 7, 1000).unwrap();
        assert_eq!(header.body_size, 1000);
        assert_eq!(header.header_size, 7);
        assert_eq!(header.content_type, 2);
        assert_eq!(header.content_sub_type, 1);
    }

    #[test]
    fn size_mismatch_is_fatal() {
        let data = header_core(1000, 7, 2, 1);
        assert!(MotHeader::parse(&data, 7, 999).is_err());
        assert!(MotHeader::parse(&data, 8, 1000).is_err());
    }

    #[test]
    fn content_name_with_charset_nibble() {
        let mut data = header_core(0, 15, 2, 1);
        // PLI 3, ContentName, length 6: charset byte + "image"
        data.extend_from_slice(&[0xCC, 0x06, 0x00]);
        data.extend_from_slice(b"image");
        let header = MotHeader::parse(&data, 15, 0).unwrap();
        assert_eq!(header.content_name.as_deref(), Some("image"));
    }

    #[test]
    fn extended_length_indicator() {
        let url: Vec<u8> = std::iter::repeat(b'u').take(300).collect();
        let mut data = header_core(0, (7 + 3 + 300) as u16, 5, 0);
        // PLI 3, ClickThroughURL, extended 16-bit length 300
        data.extend_from_slice(&[0xE7, 0x81, 0x2C]);
        data.extend_from_slice(&url);
        let header = MotHeader::parse(&data, 7 + 3 + 300, 0).unwrap();
        assert_eq!(header.click_through_url.as_deref().map(str::len), Some(300));
    }

    #[test]
    fn overrunning_parameter_aborts_parse() {
        let mut data = header_core(0, 12, 2, 1);
        // CategoryTitle announces 9 bytes, only 2 present
        data.extend_from_slice(&[0xE6, 0x09, b'h', b'i']);
        assert!(MotHeader::parse(&data, 12, 0).is_err());
    }

    #[test]
    fn unknown_parameters_are_skipped() {
        let mut data = header_core(0, 13, 2, 1);
        // unknown id 0x10 with PLI 2 (4 bytes), then a zero-length CategoryTitle
        data.extend_from_slice(&[0x90, 1, 2, 3, 4]);
        data.extend_from_slice(&[0x26]);
        let header = MotHeader::parse(&data, 13, 0).unwrap();
        assert_eq!(header.category_title.as_deref(), Some(""));
    }
}
