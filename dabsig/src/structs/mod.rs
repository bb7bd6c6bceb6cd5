//! Data structures representing DAB signalling components.
//!
//! - **Data Groups** ([`data_group`]): MSC data group framing for MOT
//! - **MOT Headers** ([`mot`]): Object headers and completed objects
//! - **FIG Framing** ([`fig`]): Fast Information Group headers
//! - **Ensemble Model** ([`ensemble`]): Services, components, subchannels

pub mod data_group;
pub mod ensemble;
pub mod fig;
pub mod mot;
