//! MSC data group headers (ETSI EN 300 401, 5.3.3).
//!
//! An MOT data group is framed as:
//!
//! `[data group header][session header][segmentation header][payload][CRC]`
//!
//! Each header carries its own flag and length checks; a group failing any
//! of them is discarded whole, nothing downstream sees a partial unit.

use anyhow::{Result, bail};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::DataGroupError;

/// Data group types carrying MOT transport streams.
pub const DG_TYPE_MOT_HEADER: u8 = 3;
pub const DG_TYPE_MOT_BODY: u8 = 4;

/// Leading data group header: flags, type and continuity indices.
#[derive(Debug, Clone, Default)]
pub struct DataGroupHeader {
    pub extension_flag: bool,
    pub crc_flag: bool,
    pub segment_flag: bool,
    pub user_access_flag: bool,
    pub dg_type: u8,
    pub continuity_index: u8,
    pub repetition_index: u8,
}

impl DataGroupHeader {
    /// Reads and validates the header. MOT requires the CRC, segment and
    /// user access fields to be present, and accepts only the MOT
    /// header/body group types.
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        if reader.available()? < 16 {
            bail!(DataGroupError::TooShort((reader.available()? / 8) as usize));
        }

        let dg = Self {
            extension_flag: reader.get()?,
            crc_flag: reader.get()?,
            segment_flag: reader.get()?,
            user_access_flag: reader.get()?,
            dg_type: reader.get_n(4)?,
            continuity_index: reader.get_n(4)?,
            repetition_index: reader.get_n(4)?,
        };

        if dg.extension_flag {
            reader.skip_n(16)?;
        }

        if !dg.crc_flag {
            bail!(DataGroupError::CrcFlagUnset);
        }
        if !dg.segment_flag {
            bail!(DataGroupError::SegmentFlagUnset);
        }
        if !dg.user_access_flag {
            bail!(DataGroupError::UserAccessFlagUnset);
        }
        if dg.dg_type != DG_TYPE_MOT_HEADER && dg.dg_type != DG_TYPE_MOT_BODY {
            bail!(DataGroupError::UnsupportedType(dg.dg_type));
        }

        Ok(dg)
    }

    pub fn is_mot_header(&self) -> bool {
        self.dg_type == DG_TYPE_MOT_HEADER
    }
}

/// Session header: segment number plus the user access field holding the
/// transport id.
#[derive(Debug, Clone, Default)]
pub struct SessionHeader {
    pub last_segment: bool,
    pub segment_number: u16,
    pub transport_id: u16,
}

impl SessionHeader {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        if reader.available()? < 24 {
            bail!(DataGroupError::TooShort((reader.available()? / 8) as usize));
        }

        let last_segment = reader.get()?;
        let segment_number = reader.get_n(15)?;

        reader.skip_n(3)?;
        let transport_id_flag = reader.get()?;
        let length_indicator: u8 = reader.get_n(4)?;

        if !transport_id_flag {
            bail!(DataGroupError::MissingTransportId);
        }
        if length_indicator < 2 {
            bail!(DataGroupError::UserAccessFieldTooShort(length_indicator));
        }
        if reader.available()? < (length_indicator as u64) << 3 {
            bail!(DataGroupError::TooShort((reader.available()? / 8) as usize));
        }

        let transport_id = reader.get_n(16)?;
        // The remainder of the user access field is an optional end user
        // address; MOT does not use it.
        reader.skip_n((length_indicator as u32 - 2) << 3)?;

        Ok(Self {
            last_segment,
            segment_number,
            transport_id,
        })
    }
}

/// Segmentation header announcing the payload size of this segment.
#[derive(Debug, Clone, Default)]
pub struct SegmentationHeader {
    pub repetition_count: u8,
    pub segment_size: usize,
}

impl SegmentationHeader {
    /// Reads the header and cross-checks the announced size against the
    /// bytes actually left in the group, net of the trailing CRC word.
    pub fn read(reader: &mut BsIoSliceReader, trailing_len: usize) -> Result<Self> {
        if reader.available()? < 16 {
            bail!(DataGroupError::TooShort((reader.available()? / 8) as usize));
        }

        let sh = Self {
            repetition_count: reader.get_n(3)?,
            segment_size: reader.get_n::<u16>(13)? as usize,
        };

        let remaining = (reader.available()? / 8) as usize;
        let Some(actual) = remaining.checked_sub(trailing_len) else {
            bail!(DataGroupError::TooShort(remaining));
        };
        if sh.segment_size != actual {
            bail!(DataGroupError::SegmentSizeMismatch {
                announced: sh.segment_size,
                actual,
            });
        }

        Ok(sh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crc::CRC_LEN;

    fn reader_for(bytes: &[u8]) -> BsIoSliceReader<'_> {
        BsIoSliceReader::from_slice(bytes)
    }

    #[test]
    fn rejects_missing_flags() {
        // crc flag unset
        let mut r = reader_for(&[0x34, 0x00]);
        assert!(DataGroupHeader::read(&mut r).is_err());

        // segment flag unset
        let mut r = reader_for(&[0x54, 0x00]);
        assert!(DataGroupHeader::read(&mut r).is_err());

        // user access flag unset
        let mut r = reader_for(&[0x64, 0x00]);
        assert!(DataGroupHeader::read(&mut r).is_err());
    }

    #[test]
    fn rejects_non_mot_types() {
        // all three flags set, type 5
        let mut r = reader_for(&[0x75, 0x00]);
        assert!(DataGroupHeader::read(&mut r).is_err());
    }

    #[test]
    fn accepts_mot_header_type_with_extension() {
        let mut r = reader_for(&[0xF3, 0x00, 0xAA, 0xBB, 0x00]);
        let dg = DataGroupHeader::read(&mut r).unwrap();
        assert!(dg.is_mot_header());
        // extension bytes consumed
        assert_eq!(r.available().unwrap(), 8);
    }

    #[test]
    fn session_header_extracts_transport_id() {
        // last segment, segment 5, transport id field of 3 bytes
        let mut r = reader_for(&[0x80, 0x05, 0x13, 0x12, 0x34, 0xEE]);
        let sh = SessionHeader::read(&mut r).unwrap();
        assert!(sh.last_segment);
        assert_eq!(sh.segment_number, 5);
        assert_eq!(sh.transport_id, 0x1234);
        // excess end user address byte consumed
        assert_eq!(r.available().unwrap(), 0);
    }

    #[test]
    fn session_header_requires_transport_id() {
        let mut r = reader_for(&[0x00, 0x01, 0x02, 0x12, 0x34]);
        assert!(SessionHeader::read(&mut r).is_err());
    }

    #[test]
    fn segmentation_size_cross_check() {
        // size 4, then 4 payload bytes + 2 CRC bytes
        let mut r = reader_for(&[0x00, 0x04, 1, 2, 3, 4, 0xAA, 0xBB]);
        let sh = SegmentationHeader::read(&mut r, CRC_LEN).unwrap();
        assert_eq!(sh.segment_size, 4);

        // announced 5, only 4 present
        let mut r = reader_for(&[0x00, 0x05, 1, 2, 3, 4, 0xAA, 0xBB]);
        assert!(SegmentationHeader::read(&mut r, CRC_LEN).is_err());
    }

    #[test]
    fn rejects_group_shorter_than_crc_field() {
        // announced size 0 but nothing behind the header where the CRC
        // word belongs
        let mut r = reader_for(&[0x00, 0x00]);
        assert!(SegmentationHeader::read(&mut r, CRC_LEN).is_err());

        // one byte of CRC is just as truncated
        let mut r = reader_for(&[0x00, 0x00, 0xAA]);
        assert!(SegmentationHeader::read(&mut r, CRC_LEN).is_err());
    }
}
