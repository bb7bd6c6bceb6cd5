//! Ensemble configuration entities built up from FIG broadcasts.
//!
//! Services, service components and subchannels arrive in separate FIGs
//! that are retransmitted continuously; every entity here is upserted by
//! its id and refined as later FIGs confirm or extend earlier ones.

/// Label text plus the 16-bit character flag field selecting the
/// abbreviated form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DabLabel {
    pub label: String,
    pub mask: u16,
}

impl DabLabel {
    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }
}

/// A service announced in FIG0/2 and labelled by FIG1.
#[derive(Debug, Clone, Default)]
pub struct Service {
    pub service_id: u32,
    pub label: DabLabel,
    pub program_number: Option<u16>,
    pub language: Option<u8>,
    pub program_type: u8,
}

/// Transport-mode specific part of a service component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentPayload {
    /// TMId 0: MSC stream audio.
    Audio { subchannel_id: u8, ascty: u8 },
    /// TMId 3: MSC packet data. The subchannel binding and packet address
    /// arrive later via FIG0/3.
    Packet {
        scid: u16,
        ca_flag: bool,
        dscty: u8,
        dg_flag: bool,
        subchannel_id: Option<u8>,
        packet_address: Option<u16>,
    },
}

/// One service component, linking a service to the subchannel carrying it.
#[derive(Debug, Clone)]
pub struct ServiceComponent {
    pub service_id: u32,
    pub component_nr: u8,
    pub ps_flag: bool,
    pub payload: ComponentPayload,
}

/// Protection variants for a subchannel capacity allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Short form: an index into the UEP table (ETSI EN 300 401, table 8).
    Uep { table_index: u8 },
    /// Long form: EEP option (0 = EEP-A, 1 = EEP-B) and protection level.
    Eep { option: u8, level: u8 },
}

impl Default for Protection {
    fn default() -> Self {
        Protection::Uep { table_index: 0 }
    }
}

/// A subchannel capacity allocation from FIG0/1.
#[derive(Debug, Clone, Default)]
pub struct Subchannel {
    pub subchannel_id: u8,
    pub start_address: u16,
    /// Size in capacity units. For short form this comes from the UEP table.
    pub length: u16,
    pub protection: Protection,
    pub language: Option<u8>,
    /// 0 = none, 1 = applied; from FIG0/14, packet mode only.
    pub fec_scheme: u8,
}

/// UEP table row: subchannel size (CU), protection level, bitrate (kbit/s).
struct UepEntry {
    subchannel_size: u16,
    protection_level: u8,
    bitrate: u16,
}

const fn uep(subchannel_size: u16, protection_level: u8, bitrate: u16) -> UepEntry {
    UepEntry {
        subchannel_size,
        protection_level,
        bitrate,
    }
}

/// ETSI EN 300 401, table 8: UEP subchannel organization.
const UEP_TABLE: [UepEntry; 64] = [
    uep(16, 5, 32),
    uep(21, 4, 32),
    uep(24, 3, 32),
    uep(29, 2, 32),
    uep(35, 1, 32),
    uep(24, 5, 48),
    uep(29, 4, 48),
    uep(35, 3, 48),
    uep(42, 2, 48),
    uep(52, 1, 48),
    uep(29, 5, 56),
    uep(35, 4, 56),
    uep(42, 3, 56),
    uep(52, 2, 56),
    uep(32, 5, 64),
    uep(42, 4, 64),
    uep(48, 3, 64),
    uep(58, 2, 64),
    uep(70, 1, 64),
    uep(40, 5, 80),
    uep(52, 4, 80),
    uep(58, 3, 80),
    uep(70, 2, 80),
    uep(84, 1, 80),
    uep(48, 5, 96),
    uep(58, 4, 96),
    uep(70, 3, 96),
    uep(84, 2, 96),
    uep(104, 1, 96),
    uep(58, 5, 112),
    uep(70, 4, 112),
    uep(84, 3, 112),
    uep(104, 2, 112),
    uep(64, 5, 128),
    uep(84, 4, 128),
    uep(96, 3, 128),
    uep(116, 2, 128),
    uep(140, 1, 128),
    uep(80, 5, 160),
    uep(104, 4, 160),
    uep(116, 3, 160),
    uep(140, 2, 160),
    uep(168, 1, 160),
    uep(96, 5, 192),
    uep(116, 4, 192),
    uep(140, 3, 192),
    uep(168, 2, 192),
    uep(208, 1, 192),
    uep(116, 5, 224),
    uep(140, 4, 224),
    uep(168, 3, 224),
    uep(208, 2, 224),
    uep(232, 1, 224),
    uep(128, 5, 256),
    uep(168, 4, 256),
    uep(192, 3, 256),
    uep(232, 2, 256),
    uep(280, 1, 256),
    uep(160, 5, 320),
    uep(208, 4, 320),
    uep(280, 2, 320),
    uep(192, 5, 384),
    uep(280, 3, 384),
    uep(416, 1, 384),
];

impl Subchannel {
    /// Subchannel size in capacity units for the short form, taken from
    /// the UEP table.
    pub fn uep_length(table_index: u8) -> u16 {
        UEP_TABLE[(table_index & 0x3F) as usize].subchannel_size
    }

    /// Effective protection level (1 = strongest).
    pub fn protection_level(&self) -> u8 {
        match self.protection {
            Protection::Uep { table_index } => {
                UEP_TABLE[(table_index & 0x3F) as usize].protection_level
            }
            Protection::Eep { level, .. } => level + 1,
        }
    }

    /// Effective audio/data bitrate in kbit/s derived from the capacity
    /// allocation and protection profile. Reserved EEP options yield 0.
    pub fn bitrate(&self) -> u32 {
        let length = self.length as u32;
        match self.protection {
            Protection::Uep { table_index } => {
                UEP_TABLE[(table_index & 0x3F) as usize].bitrate as u32
            }
            Protection::Eep { option: 0, level } => {
                // EEP-A: bitrate n*8 occupies n*{12,8,6,4} CU
                length * 8 / [12, 8, 6, 4][(level & 0x3) as usize]
            }
            Protection::Eep { option: 1, level } => {
                // EEP-B: bitrate n*32 occupies n*{27,21,18,15} CU
                length * 32 / [27, 21, 18, 15][(level & 0x3) as usize]
            }
            Protection::Eep { .. } => 0,
        }
    }
}

/// UTC date and time from FIG0/10, with the ensemble's local time offset
/// from FIG0/9 in half-hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DabDateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub lto_half_hours: i8,
}

/// Service classification derived from the bound component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Audio,
    Packet,
    Unknown,
}

/// Snapshot of the parameters an audio pipeline needs to tune one service.
#[derive(Debug, Clone)]
pub struct AudioData {
    pub subchannel_id: u8,
    pub start_address: u16,
    pub length: u16,
    pub protection: Protection,
    pub bitrate: u32,
    pub ascty: u8,
    pub language: Option<u8>,
    pub program_type: u8,
}

/// Snapshot of the parameters a packet decoder needs for one data service.
#[derive(Debug, Clone)]
pub struct PacketData {
    pub subchannel_id: u8,
    pub start_address: u16,
    pub length: u16,
    pub protection: Protection,
    pub bitrate: u32,
    pub scid: u16,
    pub dscty: u8,
    pub dg_flag: bool,
    pub packet_address: u16,
    pub fec_scheme: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uep_bitrate_from_table() {
        let subchannel = Subchannel {
            length: Subchannel::uep_length(4),
            protection: Protection::Uep { table_index: 4 },
            ..Default::default()
        };
        assert_eq!(subchannel.length, 35);
        assert_eq!(subchannel.protection_level(), 1);
        assert_eq!(subchannel.bitrate(), 32);
    }

    #[test]
    fn eep_a_bitrate_formula() {
        // 3-A: 96 kbit/s occupy 72 CU
        let subchannel = Subchannel {
            length: 72,
            protection: Protection::Eep {
                option: 0,
                level: 2,
            },
            ..Default::default()
        };
        assert_eq!(subchannel.bitrate(), 96);
    }

    #[test]
    fn eep_b_bitrate_formula() {
        // 4-B: 32 kbit/s occupy 15 CU
        let subchannel = Subchannel {
            length: 15,
            protection: Protection::Eep {
                option: 1,
                level: 3,
            },
            ..Default::default()
        };
        assert_eq!(subchannel.bitrate(), 32);
    }
}
