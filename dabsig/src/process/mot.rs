//! MOT object reassembly from MSC data groups.
//!
//! One MOT transport is a pair of independently segmented entities, header
//! and body, tied together by a transport id. Segments arrive out of
//! order, duplicated and interleaved; the [`MotManager`] validates each
//! data group, routes its payload into the current [`MotAssembler`] and
//! reports when a complete, self-consistent object is available.

use std::collections::BTreeMap;

use anyhow::Result;
use log::{debug, trace};

use crate::structs::data_group::{DataGroupHeader, SegmentationHeader, SessionHeader};
use crate::structs::mot::{MotHeader, MotObject};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::crc::CRC_LEN;

/// Accumulates the segments of one MOT entity (header or body).
///
/// First writer wins per segment index: duplicate deliveries from the
/// broadcast carousel never overwrite stored data.
#[derive(Debug, Default)]
pub struct MotEntity {
    segments: BTreeMap<u16, Vec<u8>>,
    last_segment_number: Option<u16>,
    size: usize,
}

impl MotEntity {
    pub fn add_segment(&mut self, segment_number: u16, last_segment: bool, data: &[u8]) {
        if last_segment {
            self.last_segment_number = Some(segment_number);
        }

        if self.segments.contains_key(&segment_number) {
            return;
        }

        self.segments.insert(segment_number, data.to_vec());
        self.size += data.len();
    }

    /// True once the last segment is known and every index up to it is
    /// present.
    pub fn is_finished(&self) -> bool {
        match self.last_segment_number {
            Some(last) => (0..=last).all(|i| self.segments.contains_key(&i)),
            None => false,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Concatenates segments 0..=last in index order. Only meaningful when
    /// [`is_finished`](Self::is_finished) holds.
    pub fn data(&self) -> Vec<u8> {
        let Some(last) = self.last_segment_number else {
            return Vec::new();
        };

        let mut result = Vec::with_capacity(self.size);
        for i in 0..=last {
            if let Some(segment) = self.segments.get(&i) {
                result.extend_from_slice(segment);
            }
        }
        result
    }
}

/// Reassembles one MOT transport: a header entity, a body entity and the
/// at-most-once emission latch.
#[derive(Debug, Default)]
pub struct MotAssembler {
    header: MotEntity,
    body: MotEntity,
    shown: bool,
    object: Option<MotObject>,
}

impl MotAssembler {
    pub fn add_segment(
        &mut self,
        header_entity: bool,
        segment_number: u16,
        last_segment: bool,
        data: &[u8],
    ) {
        let entity = if header_entity {
            &mut self.header
        } else {
            &mut self.body
        };
        entity.add_segment(segment_number, last_segment, data);
    }

    /// Checks whether a fresh object just became complete.
    ///
    /// Returns true exactly once per transport: after both entities are
    /// finished and the header passes its self-consistency checks, the
    /// decoded object is latched and later calls return false. A header
    /// failing the checks leaves the latch unset, so a consistent
    /// retransmission may still complete the transport.
    pub fn is_to_be_shown(&mut self) -> bool {
        if self.shown {
            return false;
        }

        if !self.header.is_finished() || !self.body.is_finished() {
            return false;
        }

        let header_data = self.header.data();
        match MotHeader::parse(&header_data, self.header.size(), self.body.size()) {
            Ok(header) => {
                self.object = Some(MotObject::from_parts(header, self.body.data()));
                self.shown = true;
                true
            }
            Err(e) => {
                debug!("MOT header rejected: {e}");
                false
            }
        }
    }

    /// The completed object, once [`is_to_be_shown`](Self::is_to_be_shown)
    /// has returned true.
    pub fn object(&self) -> Option<&MotObject> {
        self.object.as_ref()
    }
}

/// Demultiplexes MOT data groups of one service component into completed
/// objects.
///
/// Only one transport is tracked at a time; a data group with a different
/// transport id discards any partial state for the previous one, the
/// carousel's own repetition being the recovery path.
#[derive(Debug, Default)]
pub struct MotManager {
    assembler: MotAssembler,
    current_transport_id: Option<u16>,
}

impl MotManager {
    /// Feeds one MSC data group; returns true when a new object became
    /// ready.
    ///
    /// The data group, session and segmentation headers are validated
    /// before any state is touched; a group failing any check is dropped
    /// whole and the call returns false.
    pub fn handle_data_group(&mut self, dg: &[u8]) -> bool {
        match self.parse_data_group(dg) {
            Ok(ready) => ready,
            Err(e) => {
                debug!("MOT data group rejected: {e}");
                false
            }
        }
    }

    fn parse_data_group(&mut self, dg: &[u8]) -> Result<bool> {
        let reader = &mut BsIoSliceReader::from_slice(dg);

        let dg_header = DataGroupHeader::read(reader)?;
        let session = SessionHeader::read(reader)?;
        let segmentation = SegmentationHeader::read(reader, CRC_LEN)?;

        let mut payload = vec![0u8; segmentation.segment_size];
        reader.get_bytes(&mut payload)?;

        // a new transport id always starts from scratch
        if self.current_transport_id != Some(session.transport_id) {
            if self.current_transport_id.is_some() {
                trace!(
                    "MOT transport {} replaces {:?}",
                    session.transport_id, self.current_transport_id
                );
            }
            self.current_transport_id = Some(session.transport_id);
            self.assembler = MotAssembler::default();
        }

        self.assembler.add_segment(
            dg_header.is_mot_header(),
            session.segment_number,
            session.last_segment,
            &payload,
        );

        Ok(self.assembler.is_to_be_shown())
    }

    /// The most recently completed object.
    pub fn current_object(&self) -> Option<&MotObject> {
        self.assembler.object()
    }

    /// Drops all reassembly state, e.g. on retune.
    pub fn reset(&mut self) {
        self.assembler = MotAssembler::default();
        self.current_transport_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs the 7-byte MOT header core.
    fn header_core(body_size: u32, header_size: u16, content_type: u8, sub_type: u16) -> Vec<u8> {
        let packed: u64 = ((body_size as u64) << 28)
            | ((header_size as u64) << 15)
            | ((content_type as u64) << 9)
            | sub_type as u64;
        packed.to_be_bytes()[1..].to_vec()
    }

    /// Builds a well-formed MOT data group around one segment payload.
    fn data_group(
        dg_type: u8,
        transport_id: u16,
        segment_number: u16,
        last_segment: bool,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut dg = Vec::new();
        dg.push(0x70 | (dg_type & 0x0F));
        dg.push(0x00);

        let seg_word = ((last_segment as u16) << 15) | (segment_number & 0x7FFF);
        dg.extend_from_slice(&seg_word.to_be_bytes());
        dg.push(0x12); // transport id field, 2 bytes
        dg.extend_from_slice(&transport_id.to_be_bytes());

        let size_word = payload.len() as u16 & 0x1FFF;
        dg.extend_from_slice(&size_word.to_be_bytes());
        dg.extend_from_slice(payload);
        dg.extend_from_slice(&[0x00, 0x00]); // CRC field, checked upstream
        dg
    }

    fn feed_object(manager: &mut MotManager, transport_id: u16, body: &[u8]) -> bool {
        let header = header_core(body.len() as u32, 7, 2, 1);
        let mut ready = manager.handle_data_group(&data_group(3, transport_id, 0, true, &header));
        ready |= manager.handle_data_group(&data_group(4, transport_id, 0, true, body));
        ready
    }

    #[test]
    fn entity_completes_in_any_order() {
        let mut entity = MotEntity::default();
        entity.add_segment(2, true, b"cc");
        assert!(!entity.is_finished());
        entity.add_segment(0, false, b"aa");
        entity.add_segment(1, false, b"bb");
        assert!(entity.is_finished());
        assert_eq!(entity.data(), b"aabbcc");
    }

    #[test]
    fn entity_duplicates_are_first_writer_wins() {
        let mut entity = MotEntity::default();
        entity.add_segment(0, false, b"first");
        entity.add_segment(0, true, b"again");
        entity.add_segment(1, true, b"x");
        assert!(entity.is_finished());
        assert_eq!(entity.size(), 6);
        assert_eq!(entity.data(), b"firstx");
    }

    #[test]
    fn object_emitted_exactly_once() {
        let mut manager = MotManager::default();
        let header = header_core(4, 7, 2, 1);

        assert!(!manager.handle_data_group(&data_group(3, 9, 0, true, &header)));
        assert!(manager.handle_data_group(&data_group(4, 9, 0, true, b"body")));

        let object = manager.current_object().unwrap();
        assert_eq!(object.body, b"body");
        assert_eq!(object.content_type, 2);

        // the carousel repeats; nothing further is emitted
        assert!(!manager.handle_data_group(&data_group(4, 9, 0, true, b"body")));
        assert!(!manager.handle_data_group(&data_group(3, 9, 0, true, &header)));
    }

    #[test]
    fn multi_segment_body_out_of_order() {
        let mut manager = MotManager::default();
        let header = header_core(6, 7, 2, 1);

        assert!(!manager.handle_data_group(&data_group(4, 1, 1, false, b"cd")));
        assert!(!manager.handle_data_group(&data_group(4, 1, 2, true, b"ef")));
        assert!(!manager.handle_data_group(&data_group(3, 1, 0, true, &header)));
        assert!(manager.handle_data_group(&data_group(4, 1, 0, false, b"ab")));
        assert_eq!(manager.current_object().unwrap().body, b"abcdef");
    }

    #[test]
    fn size_mismatch_voids_object() {
        let mut manager = MotManager::default();
        // header announces a 5-byte body, 4 bytes arrive
        let header = header_core(5, 7, 2, 1);
        assert!(!manager.handle_data_group(&data_group(3, 2, 0, true, &header)));
        assert!(!manager.handle_data_group(&data_group(4, 2, 0, true, b"body")));
        assert!(manager.current_object().is_none());
    }

    #[test]
    fn transport_switch_discards_partial_state() {
        let mut manager = MotManager::default();
        let header = header_core(4, 7, 2, 1);

        // transport A: header only
        assert!(!manager.handle_data_group(&data_group(3, 0xA, 0, true, &header)));
        // transport B interleaves
        assert!(!manager.handle_data_group(&data_group(4, 0xB, 0, true, b"body")));
        // A reappears: its header is gone, the body alone completes nothing
        assert!(!manager.handle_data_group(&data_group(4, 0xA, 0, true, b"body")));
        // a fresh header for A completes the new assembler
        assert!(manager.handle_data_group(&data_group(3, 0xA, 0, true, &header)));
    }

    #[test]
    fn gatekeeping_rejects_bad_groups_without_state_change() {
        let mut manager = MotManager::default();
        assert!(feed_object(&mut manager, 7, b"body"));

        // type 5 with all flags set
        let mut dg = data_group(5, 7, 0, true, b"zz");
        assert!(!manager.handle_data_group(&dg));

        // CRC flag unset
        dg = data_group(4, 7, 0, true, b"zz");
        dg[0] &= !0x40;
        assert!(!manager.handle_data_group(&dg));

        // segment size lies by one
        dg = data_group(4, 7, 0, true, b"zz");
        let announced = u16::from_be_bytes([dg[7], dg[8]]) + 1;
        dg[7..9].copy_from_slice(&announced.to_be_bytes());
        assert!(!manager.handle_data_group(&dg));

        // tracked transport survived all of it
        assert_eq!(manager.current_object().unwrap().body, b"body");
        assert_eq!(manager.current_transport_id, Some(7));
    }

    #[test]
    fn group_without_crc_field_commits_nothing() {
        let mut manager = MotManager::default();
        // valid flags, announced size 0, but the trailing CRC word is absent
        let group = [0x74, 0x00, 0x80, 0x00, 0x12, 0x00, 0x07, 0x00, 0x00];
        assert!(!manager.handle_data_group(&group));

        // had the empty last segment been committed, this consistent
        // zero-byte-body header would complete an object
        let header = header_core(0, 7, 2, 1);
        assert!(!manager.handle_data_group(&data_group(3, 7, 0, true, &header)));
        assert!(manager.current_object().is_none());
    }

    #[test]
    fn truncated_group_is_rejected() {
        let mut manager = MotManager::default();
        let dg = data_group(4, 7, 0, true, b"zz");
        assert!(!manager.handle_data_group(&dg[..3]));
        assert!(!manager.handle_data_group(&[]));
    }

    #[test]
    fn reset_forgets_transport() {
        let mut manager = MotManager::default();
        assert!(feed_object(&mut manager, 7, b"body"));
        manager.reset();
        assert!(manager.current_object().is_none());
        assert_eq!(manager.current_transport_id, None);
        // the same object completes again after a reset
        assert!(feed_object(&mut manager, 7, b"body"));
    }
}
