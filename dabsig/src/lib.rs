#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Decoder for DAB/DAB+ ensemble signalling according to ETSI EN 300 401,
//! with MOT object transfer per ETSI EN 301 234.
//!
//! ### Signalling Organization
//!
//! **FIC**: Fast Information Blocks carrying FIGs that describe the
//! ensemble: subchannels, services, components, labels, date and time.
//! **MSC data groups**: segmented MOT objects (slides, EPG files)
//! reassembled across header and body transfer sessions.
//!
//! ## Quick Start
//!
//! 1. Feed FIBs into a [`process::fic::FibProcessor`] until
//!    [`sync_reached`](process::fic::FibProcessor::sync_reached)
//! 2. Query services with
//!    [`service_list`](process::fic::FibProcessor::service_list) and
//!    [`audio_service_data`](process::fic::FibProcessor::audio_service_data)
//! 3. Feed that service's data groups into a
//!    [`process::mot::MotManager`]; each call returning `true` means a new
//!    object is ready via
//!    [`current_object`](process::mot::MotManager::current_object)

/// Processing functionality for DAB signalling streams.
///
/// 1. **FIC Decoding** ([`process::fic`]): Folds Fast Information Blocks
///    into the ensemble configuration database.
///
/// 2. **MOT Reassembly** ([`process::mot`]): Rebuilds segmented objects
///    from MSC data groups.
pub mod process;

/// Data structures representing DAB signalling components.
///
/// - **Data Groups** ([`structs::data_group`]): MSC data group framing
/// - **MOT Headers** ([`structs::mot`]): Object headers and completed objects
/// - **FIG Framing** ([`structs::fig`]): Fast Information Group headers
/// - **Ensemble Model** ([`structs::ensemble`]): Services, components, subchannels
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **CRC Validation** ([`utils::crc`]): Error detection
/// - **Character Sets** ([`utils::charset`]): Label and name conversion
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
