//! Fast Information Channel decoding.
//!
//! The FIC carries the ensemble's configuration as a stream of Fast
//! Information Blocks. The [`FibProcessor`] validates each FIB's CRC,
//! walks its FIGs and folds them into the live ensemble database: FIG0
//! extensions describe subchannels, services and their bindings, FIG1
//! carries labels. FIGs repeat continuously on air, so every mutation is
//! an upsert and a corrupt FIG only costs its own content.
//!
//! The database is read by a consumer context (UI, audio pipeline) while
//! the demodulator context feeds [`process_fib`](FibProcessor::process_fib);
//! one mutex serializes both sides, taken per call.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use log::{debug, info, trace};

use crate::structs::ensemble::{
    AudioData, ComponentPayload, DabDateTime, DabLabel, PacketData, Protection, Service,
    ServiceComponent, ServiceKind, Subchannel,
};
use crate::structs::fig::{FIG_PADDING, Fig0Header, Fig1Header};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::charset::{self, CharacterSet};
use crate::utils::crc::{CRC_CCITT_ALG, CRC_LEN, Crc16};
use crate::utils::errors::FibError;

/// A FIB is 30 bytes of FIG data followed by a 16-bit CRC.
pub const FIB_LEN: usize = 32;
const FIB_DATA_LEN: usize = FIB_LEN - CRC_LEN;

/// Decodes FIBs into the live ensemble configuration and answers queries
/// against it.
pub struct FibProcessor {
    database: Mutex<EnsembleDatabase>,
    crc: Crc16,
}

impl Default for FibProcessor {
    fn default() -> Self {
        Self {
            database: Mutex::new(EnsembleDatabase::default()),
            crc: Crc16::new(&CRC_CCITT_ALG),
        }
    }
}

impl FibProcessor {
    /// Feeds one 32-byte FIB from the demodulator; returns whether the
    /// block was accepted.
    ///
    /// A FIB failing its CRC is dropped whole; a malformed FIG inside a
    /// valid FIB is skipped without disturbing the other FIGs' effects.
    pub fn process_fib(&self, fib: &[u8]) -> bool {
        if fib.len() != FIB_LEN {
            debug!("{}", FibError::InvalidLength(fib.len()));
            return false;
        }

        let read = u16::from_be_bytes([fib[FIB_DATA_LEN], fib[FIB_DATA_LEN + 1]]);
        let calculated = self.crc.checksum(&fib[..FIB_DATA_LEN]);
        if calculated != read {
            debug!("{}", FibError::CrcMismatch { calculated, read });
            return false;
        }

        let mut db = self.db();
        db.process_figs(&fib[..FIB_DATA_LEN]);

        if !db.first_time_done && db.is_synced() {
            db.first_time_done = true;
            info!("ensemble \"{}\" configuration complete", db.ensemble_label.label);
        }

        true
    }

    /// Wipes every decoded entity, e.g. on retune. All-or-nothing.
    pub fn clear_ensemble(&self) {
        *self.db() = EnsembleDatabase::default();
    }

    /// True once a minimum viable configuration has been seen: the
    /// ensemble label plus at least one service whose component is bound
    /// to a known subchannel.
    pub fn sync_reached(&self) -> bool {
        self.db().is_synced()
    }

    /// Classifies a named service by its bound component.
    pub fn kind_of_service(&self, label: &str) -> ServiceKind {
        let db = self.db();
        let Some(service) = db.find_service_by_label(label) else {
            return ServiceKind::Unknown;
        };
        match db.find_component(service.service_id).map(|c| &c.payload) {
            Some(ComponentPayload::Audio { .. }) => ServiceKind::Audio,
            Some(ComponentPayload::Packet { .. }) => ServiceKind::Packet,
            None => ServiceKind::Unknown,
        }
    }

    /// Subchannel and component parameters for a named audio service.
    /// `None` until the service, its component and its subchannel have
    /// all been observed.
    pub fn audio_service_data(&self, label: &str) -> Option<AudioData> {
        let db = self.db();
        let service = db.find_service_by_label(label)?;
        let component = db.find_component(service.service_id)?;
        let ComponentPayload::Audio {
            subchannel_id,
            ascty,
        } = component.payload
        else {
            return None;
        };
        let subchannel = db.find_subchannel(subchannel_id)?;

        Some(AudioData {
            subchannel_id,
            start_address: subchannel.start_address,
            length: subchannel.length,
            protection: subchannel.protection,
            bitrate: subchannel.bitrate(),
            ascty,
            language: service.language.or(subchannel.language),
            program_type: service.program_type,
        })
    }

    /// Subchannel and component parameters for a named packet data
    /// service.
    pub fn packet_service_data(&self, label: &str) -> Option<PacketData> {
        let db = self.db();
        let service = db.find_service_by_label(label)?;
        let component = db.find_component(service.service_id)?;
        let ComponentPayload::Packet {
            scid,
            dscty,
            dg_flag,
            subchannel_id,
            packet_address,
            ..
        } = component.payload
        else {
            return None;
        };
        let subchannel = db.find_subchannel(subchannel_id?)?;

        Some(PacketData {
            subchannel_id: subchannel.subchannel_id,
            start_address: subchannel.start_address,
            length: subchannel.length,
            protection: subchannel.protection,
            bitrate: subchannel.bitrate(),
            scid,
            dscty,
            dg_flag,
            packet_address: packet_address?,
            fec_scheme: subchannel.fec_scheme,
        })
    }

    /// The ensemble label, once FIG1/0 has been seen.
    pub fn ensemble_name(&self) -> Option<String> {
        let db = self.db();
        (!db.ensemble_label.is_empty()).then(|| db.ensemble_label.label.clone())
    }

    pub fn ensemble_id(&self) -> Option<u16> {
        self.db().ensemble_id
    }

    /// Extended country code from FIG0/9.
    pub fn ensemble_ecc(&self) -> Option<u8> {
        self.db().ensemble_ecc
    }

    /// Programme type table selector from FIG0/9.
    pub fn international_table_id(&self) -> Option<u8> {
        self.db().international_table_id
    }

    /// UTC date and time from FIG0/10, with the local time offset from
    /// FIG0/9.
    pub fn date_time(&self) -> Option<DabDateTime> {
        self.db().date_time
    }

    /// Snapshot of all announced services.
    pub fn service_list(&self) -> Vec<Service> {
        self.db().services.clone()
    }

    fn db(&self) -> MutexGuard<'_, EnsembleDatabase> {
        self.database.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The live ensemble model, mutated incrementally as FIGs arrive.
#[derive(Debug, Default)]
struct EnsembleDatabase {
    ensemble_id: Option<u16>,
    ensemble_label: DabLabel,
    ensemble_ecc: Option<u8>,
    ensemble_lto: i8,
    international_table_id: Option<u8>,
    date_time: Option<DabDateTime>,
    services: Vec<Service>,
    components: Vec<ServiceComponent>,
    subchannels: Vec<Subchannel>,
    first_time_done: bool,
}

impl EnsembleDatabase {
    fn process_figs(&mut self, data: &[u8]) {
        let mut offset = 0;
        while offset < data.len() {
            if data[offset] == FIG_PADDING {
                break;
            }

            let fig_type = data[offset] >> 5;
            let length = (data[offset] & 0x1F) as usize;
            if length == 0 || offset + 1 + length > data.len() {
                debug!(
                    "{}",
                    FibError::FigOverrun {
                        length,
                        end: data.len(),
                    }
                );
                break;
            }

            let fig = &data[offset + 1..offset + 1 + length];
            let result = match fig_type {
                0 => self.process_fig0(fig),
                1 => self.process_fig1(fig),
                other => {
                    trace!("FIG type {other} not handled");
                    Ok(())
                }
            };
            if let Err(e) = result {
                debug!("FIG skipped: {e}");
            }

            offset += 1 + length;
        }
    }

    fn process_fig0(&mut self, fig: &[u8]) -> Result<()> {
        let reader = &mut BsIoSliceReader::from_slice(fig);
        let header = Fig0Header::read(reader)?;

        if header.oe {
            trace!("FIG0/{} for another ensemble ignored", header.extension);
            return Ok(());
        }

        match header.extension {
            0 => self.fig0_ensemble_info(reader),
            1 => self.fig0_subchannel_organization(reader),
            2 => self.fig0_service_organization(reader, header.pd),
            3 => self.fig0_packet_component(reader),
            5 => self.fig0_component_language(reader),
            9 => self.fig0_country_lto(reader),
            10 => self.fig0_date_time(reader),
            13 => self.fig0_user_applications(reader, header.pd),
            14 => self.fig0_fec_scheme(reader),
            16 => self.fig0_programme_number(reader),
            17 => self.fig0_programme_type(reader),
            other => {
                trace!("FIG0/{other} not handled");
                Ok(())
            }
        }
    }

    /// FIG0/0: ensemble identifier and CIF counter.
    fn fig0_ensemble_info(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        self.ensemble_id = Some(reader.get_n(16)?);
        let _change_flag: u8 = reader.get_n(2)?;
        let _al_flag = reader.get()?;
        let _cif_count_hi: u8 = reader.get_n(5)?;
        let _cif_count_lo: u8 = reader.get_n(8)?;
        Ok(())
    }

    /// FIG0/1: basic subchannel organization, short (UEP) or long (EEP)
    /// form.
    fn fig0_subchannel_organization(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        while reader.available()? >= 24 {
            let subchannel_id: u8 = reader.get_n(6)?;
            let start_address: u16 = reader.get_n(10)?;

            let (protection, length) = if reader.get()? {
                let option: u8 = reader.get_n(3)?;
                let level: u8 = reader.get_n(2)?;
                let length: u16 = reader.get_n(10)?;
                (Protection::Eep { option, level }, length)
            } else {
                let _table_switch = reader.get()?;
                let table_index: u8 = reader.get_n(6)?;
                (
                    Protection::Uep { table_index },
                    Subchannel::uep_length(table_index),
                )
            };

            let subchannel = self.subchannel_mut(subchannel_id);
            subchannel.start_address = start_address;
            subchannel.length = length;
            subchannel.protection = protection;
        }
        Ok(())
    }

    /// FIG0/2: basic service organization, binding components to
    /// services.
    fn fig0_service_organization(&mut self, reader: &mut BsIoSliceReader, pd: bool) -> Result<()> {
        let min_bits = if pd { 40 } else { 24 };
        while reader.available()? >= min_bits {
            let service_id: u32 = if pd {
                reader.get_n(32)?
            } else {
                reader.get_n::<u16>(16)? as u32
            };
            let _local_flag = reader.get()?;
            let _ca_id: u8 = reader.get_n(3)?;
            let components: u8 = reader.get_n(4)?;

            for component_nr in 0..components {
                let tmid: u8 = reader.get_n(2)?;
                match tmid {
                    0 => {
                        // MSC stream audio
                        let ascty: u8 = reader.get_n(6)?;
                        let subchannel_id: u8 = reader.get_n(6)?;
                        let ps_flag = reader.get()?;
                        let _ca_flag = reader.get()?;
                        self.bind_component(
                            service_id,
                            component_nr,
                            ps_flag,
                            ComponentPayload::Audio {
                                subchannel_id,
                                ascty,
                            },
                        );
                    }
                    3 => {
                        // MSC packet data, addressed by SCId
                        let scid: u16 = reader.get_n(12)?;
                        let ps_flag = reader.get()?;
                        let ca_flag = reader.get()?;
                        self.bind_component(
                            service_id,
                            component_nr,
                            ps_flag,
                            ComponentPayload::Packet {
                                scid,
                                ca_flag,
                                dscty: 0,
                                dg_flag: false,
                                subchannel_id: None,
                                packet_address: None,
                            },
                        );
                    }
                    other => {
                        trace!("service component TMId {other} not handled");
                        reader.skip_n(14)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// FIG0/3: service component in packet mode, giving the SCId its
    /// subchannel and packet address.
    fn fig0_packet_component(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        while reader.available()? >= 40 {
            let scid: u16 = reader.get_n(12)?;
            reader.skip_n(3)?;
            let ca_org_flag = reader.get()?;
            let dg_flag = reader.get()?;
            reader.skip_n(1)?;
            let dscty: u8 = reader.get_n(6)?;
            let subchannel_id: u8 = reader.get_n(6)?;
            let packet_address: u16 = reader.get_n(10)?;
            if ca_org_flag {
                let _ca_org: u16 = reader.get_n(16)?;
            }

            if let Some(component) = self.find_packet_component_mut(scid) {
                if let ComponentPayload::Packet {
                    dscty: c_dscty,
                    dg_flag: c_dg,
                    subchannel_id: c_subch,
                    packet_address: c_addr,
                    ..
                } = &mut component.payload
                {
                    *c_dscty = dscty;
                    *c_dg = dg_flag;
                    *c_subch = Some(subchannel_id);
                    *c_addr = Some(packet_address);
                }
            }
        }
        Ok(())
    }

    /// FIG0/5: service component language, short form addressing a
    /// subchannel directly.
    fn fig0_component_language(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        while reader.available()? >= 16 {
            if reader.get()? {
                // long form, addressed by SCId
                reader.skip_n(3)?;
                let _scid: u16 = reader.get_n(12)?;
                let _language: u8 = reader.get_n(8)?;
            } else {
                let msc_fic = reader.get()?;
                let subchannel_id: u8 = reader.get_n(6)?;
                let language: u8 = reader.get_n(8)?;
                if !msc_fic {
                    self.subchannel_mut(subchannel_id).language = Some(language);
                }
            }
        }
        Ok(())
    }

    /// FIG0/9: ensemble country, local time offset and international
    /// table.
    fn fig0_country_lto(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        let _ext_flag = reader.get()?;
        reader.skip_n(1)?;
        let lto: u8 = reader.get_n(6)?;
        self.ensemble_lto = if lto & 0x20 != 0 {
            -((lto & 0x1F) as i8)
        } else {
            (lto & 0x1F) as i8
        };
        self.ensemble_ecc = Some(reader.get_n(8)?);
        self.international_table_id = Some(reader.get_n(8)?);
        Ok(())
    }

    /// FIG0/10: date (MJD) and UTC time.
    fn fig0_date_time(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        reader.skip_n(1)?;
        let mjd: u32 = reader.get_n(17)?;
        let _lsi = reader.get()?;
        reader.skip_n(1)?;
        let utc_long = reader.get()?;
        let hour: u8 = reader.get_n(5)?;
        let minute: u8 = reader.get_n(6)?;
        let second: u8 = if utc_long {
            let second = reader.get_n(6)?;
            let _milliseconds: u16 = reader.get_n(10)?;
            second
        } else {
            0
        };

        let (year, month, day) = mjd_to_ymd(mjd);
        self.date_time = Some(DabDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            lto_half_hours: self.ensemble_lto,
        });
        Ok(())
    }

    /// FIG0/13: user application information. Decoded for diagnostics
    /// only; the data application wires itself by DSCTy.
    fn fig0_user_applications(&mut self, reader: &mut BsIoSliceReader, pd: bool) -> Result<()> {
        let min_bits = if pd { 40 } else { 24 };
        while reader.available()? >= min_bits {
            let service_id: u32 = if pd {
                reader.get_n(32)?
            } else {
                reader.get_n::<u16>(16)? as u32
            };
            let _scids: u8 = reader.get_n(4)?;
            let applications: u8 = reader.get_n(4)?;
            for _ in 0..applications {
                let app_type: u16 = reader.get_n(11)?;
                let data_len: u8 = reader.get_n(5)?;
                reader.skip_n((data_len as u32) << 3)?;
                trace!("service {service_id:#06X} announces user application {app_type}");
            }
        }
        Ok(())
    }

    /// FIG0/14: FEC scheme for packet mode subchannels.
    fn fig0_fec_scheme(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        while reader.available()? >= 8 {
            let subchannel_id: u8 = reader.get_n(6)?;
            let fec_scheme: u8 = reader.get_n(2)?;
            if let Some(subchannel) = self
                .subchannels
                .iter_mut()
                .find(|s| s.subchannel_id == subchannel_id)
            {
                subchannel.fec_scheme = fec_scheme;
            }
        }
        Ok(())
    }

    /// FIG0/16: programme number.
    fn fig0_programme_number(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        while reader.available()? >= 72 {
            let service_id: u32 = reader.get_n::<u16>(16)? as u32;
            let program_number: u16 = reader.get_n(16)?;
            reader.skip_n(8)?; // rfa + continuation/update flags
            reader.skip_n(32)?; // new SId + new PNum
            self.service_mut(service_id).program_number = Some(program_number);
        }
        Ok(())
    }

    /// FIG0/17: programme type and optional language.
    fn fig0_programme_type(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        while reader.available()? >= 32 {
            let service_id: u32 = reader.get_n::<u16>(16)? as u32;
            let _sd = reader.get()?;
            let _ps = reader.get()?;
            let language_flag = reader.get()?;
            let cc_flag = reader.get()?;
            reader.skip_n(4)?;

            let language: Option<u8> = if language_flag {
                Some(reader.get_n(8)?)
            } else {
                None
            };
            reader.skip_n(2)?;
            let program_type: u8 = reader.get_n(6)?;
            if cc_flag {
                reader.skip_n(8)?;
            }

            let service = self.service_mut(service_id);
            service.program_type = program_type;
            if language.is_some() {
                service.language = language;
            }
        }
        Ok(())
    }

    fn process_fig1(&mut self, fig: &[u8]) -> Result<()> {
        let reader = &mut BsIoSliceReader::from_slice(fig);
        let header = Fig1Header::read(reader)?;

        if header.oe {
            trace!("FIG1/{} for another ensemble ignored", header.extension);
            return Ok(());
        }

        let charset = CharacterSet::from(header.charset);
        match header.extension {
            0 => {
                let ensemble_id: u16 = reader.get_n(16)?;
                let label = read_label(reader, charset, header.extension)?;
                self.ensemble_id = Some(ensemble_id);
                self.ensemble_label = label;
            }
            1 => {
                let service_id = reader.get_n::<u16>(16)? as u32;
                let label = read_label(reader, charset, header.extension)?;
                self.service_mut(service_id).label = label;
            }
            5 => {
                let service_id: u32 = reader.get_n(32)?;
                let label = read_label(reader, charset, header.extension)?;
                self.service_mut(service_id).label = label;
            }
            other => {
                trace!("FIG1/{other} label not handled");
            }
        }
        Ok(())
    }

    /// True once the ensemble label and one fully bound service are known.
    fn is_synced(&self) -> bool {
        !self.ensemble_label.is_empty()
            && self
                .services
                .iter()
                .any(|service| self.is_fully_bound(service))
    }

    fn is_fully_bound(&self, service: &Service) -> bool {
        self.components
            .iter()
            .filter(|c| c.service_id == service.service_id)
            .any(|c| match c.payload {
                ComponentPayload::Audio { subchannel_id, .. } => {
                    self.find_subchannel(subchannel_id).is_some()
                }
                ComponentPayload::Packet { subchannel_id, .. } => {
                    subchannel_id.is_some_and(|id| self.find_subchannel(id).is_some())
                }
            })
    }

    /// Upserts a service by id.
    fn service_mut(&mut self, service_id: u32) -> &mut Service {
        let pos = self
            .services
            .iter()
            .position(|s| s.service_id == service_id)
            .unwrap_or_else(|| {
                self.services.push(Service {
                    service_id,
                    ..Default::default()
                });
                self.services.len() - 1
            });
        &mut self.services[pos]
    }

    /// Upserts a subchannel by id.
    fn subchannel_mut(&mut self, subchannel_id: u8) -> &mut Subchannel {
        let pos = self
            .subchannels
            .iter()
            .position(|s| s.subchannel_id == subchannel_id)
            .unwrap_or_else(|| {
                self.subchannels.push(Subchannel {
                    subchannel_id,
                    ..Default::default()
                });
                self.subchannels.len() - 1
            });
        &mut self.subchannels[pos]
    }

    /// Registers a component binding once; repeats on air are no-ops,
    /// packet details are refined by FIG0/3.
    fn bind_component(
        &mut self,
        service_id: u32,
        component_nr: u8,
        ps_flag: bool,
        payload: ComponentPayload,
    ) {
        self.service_mut(service_id);

        if self
            .components
            .iter()
            .any(|c| c.service_id == service_id && c.component_nr == component_nr)
        {
            return;
        }

        self.components.push(ServiceComponent {
            service_id,
            component_nr,
            ps_flag,
            payload,
        });
    }

    fn find_component(&self, service_id: u32) -> Option<&ServiceComponent> {
        self.components.iter().find(|c| c.service_id == service_id)
    }

    fn find_packet_component_mut(&mut self, scid: u16) -> Option<&mut ServiceComponent> {
        self.components.iter_mut().find(|c| {
            matches!(c.payload, ComponentPayload::Packet { scid: s, .. } if s == scid)
        })
    }

    fn find_subchannel(&self, subchannel_id: u8) -> Option<&Subchannel> {
        self.subchannels
            .iter()
            .find(|s| s.subchannel_id == subchannel_id)
    }

    fn find_service_by_label(&self, label: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.label.label == label)
    }
}

fn read_label(
    reader: &mut BsIoSliceReader,
    charset: CharacterSet,
    extension: u8,
) -> Result<DabLabel> {
    let mut raw = [0u8; 16];
    if reader.get_bytes(&mut raw).is_err() {
        bail!(FibError::TruncatedFig1(extension));
    }
    let mask: u16 = reader.get_n(16)?;

    Ok(DabLabel {
        label: charset::convert_label(&raw, charset),
        mask,
    })
}

/// Converts a Modified Julian Date to calendar year, month and day.
fn mjd_to_ymd(mjd: u32) -> (i32, u8, u8) {
    let mjd = mjd as f64;
    let mut year = ((mjd - 15078.2) / 365.25) as i32;
    let mut month =
        ((mjd - 14956.1 - (year as f64 * 365.25).trunc()) / 30.6001) as i32;
    let day = mjd as i32
        - 14956
        - (year as f64 * 365.25) as i32
        - (month as f64 * 30.6001) as i32;

    let leap = (month == 14 || month == 15) as i32;
    year += leap;
    month = month - 1 - leap * 12;

    (1900 + year, month as u8, day as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pads FIGs to a FIB and appends the CRC word.
    fn fib(figs: &[&[u8]]) -> Vec<u8> {
        let mut data: Vec<u8> = figs.concat();
        assert!(data.len() <= FIB_DATA_LEN);
        data.resize(FIB_DATA_LEN, FIG_PADDING);

        let crc = Crc16::new(&CRC_CCITT_ALG);
        let word = crc.checksum(&data);
        data.extend_from_slice(&word.to_be_bytes());
        data
    }

    fn fig(fig_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![(fig_type << 5) | payload.len() as u8];
        out.extend_from_slice(payload);
        out
    }

    /// FIG0/1 entry announcing subchannel 3 at CU 54, EEP 3-A, 84 CU.
    fn fig0_1_eep_subchannel() -> Vec<u8> {
        fig(0, &[0x01, 0x0C, 0x36, 0x88, 0x54])
    }

    /// FIG0/2 entry binding service 0x1234 to an audio component in
    /// subchannel 3.
    fn fig0_2_audio_service() -> Vec<u8> {
        fig(0, &[0x02, 0x12, 0x34, 0x01, 0x00, 0x0E])
    }

    fn label_bytes(text: &str) -> Vec<u8> {
        let mut raw = vec![b' '; 16];
        raw[..text.len()].copy_from_slice(text.as_bytes());
        raw.extend_from_slice(&[0xFF, 0x00]); // character flag field
        raw
    }

    fn fig1_ensemble_label(eid: u16, text: &str) -> Vec<u8> {
        let mut payload = vec![0x00];
        payload.extend_from_slice(&eid.to_be_bytes());
        payload.extend_from_slice(&label_bytes(text));
        fig(1, &payload)
    }

    fn fig1_service_label(sid: u16, text: &str) -> Vec<u8> {
        let mut payload = vec![0x01];
        payload.extend_from_slice(&sid.to_be_bytes());
        payload.extend_from_slice(&label_bytes(text));
        fig(1, &payload)
    }

    fn configured_processor() -> FibProcessor {
        let processor = FibProcessor::default();
        processor.process_fib(&fib(&[&fig0_1_eep_subchannel(), &fig0_2_audio_service()]));
        processor.process_fib(&fib(&[&fig1_ensemble_label(0x8001, "Test Mux")]));
        processor.process_fib(&fib(&[&fig1_service_label(0x1234, "Radio One")]));
        processor
    }

    #[test]
    fn decodes_minimal_ensemble() {
        let processor = configured_processor();

        assert!(processor.sync_reached());
        assert_eq!(processor.ensemble_name().as_deref(), Some("Test Mux"));
        assert_eq!(processor.ensemble_id(), Some(0x8001));

        let services = processor.service_list();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].label.label, "Radio One");
        assert_eq!(services[0].label.mask, 0xFF00);

        assert_eq!(processor.kind_of_service("Radio One"), ServiceKind::Audio);
        let audio = processor.audio_service_data("Radio One").unwrap();
        assert_eq!(audio.subchannel_id, 3);
        assert_eq!(audio.start_address, 54);
        assert_eq!(audio.length, 84);
        assert_eq!(
            audio.protection,
            Protection::Eep {
                option: 0,
                level: 2
            }
        );
        assert_eq!(audio.bitrate, 112);
    }

    #[test]
    fn unknown_service_queries_miss() {
        let processor = configured_processor();
        assert_eq!(processor.kind_of_service("Nope"), ServiceKind::Unknown);
        assert!(processor.audio_service_data("Nope").is_none());
        assert!(processor.packet_service_data("Radio One").is_none());
    }

    #[test]
    fn bad_crc_fib_is_dropped() {
        let processor = FibProcessor::default();
        let mut block = fib(&[&fig1_ensemble_label(0x8001, "Test Mux")]);
        block[31] ^= 0xFF;
        assert!(!processor.process_fib(&block));
        assert!(processor.ensemble_name().is_none());

        // wrong length
        assert!(!processor.process_fib(&block[..30]));
        assert!(processor.ensemble_name().is_none());
    }

    #[test]
    fn corrupt_fig_does_not_abort_block() {
        let processor = FibProcessor::default();
        // valid label FIG followed by a FIG whose length overruns the FIB
        let mut data: Vec<u8> = fig1_ensemble_label(0x8001, "Test Mux");
        data.push((0 << 5) | 0x1F);
        let block = fib(&[&data]);
        processor.process_fib(&block);
        assert_eq!(processor.ensemble_name().as_deref(), Some("Test Mux"));
    }

    #[test]
    fn truncated_label_fig_is_skipped() {
        let processor = FibProcessor::default();
        // FIG1/0 whose label field stops after 4 of 16 bytes
        let mut payload = vec![0x00, 0x80, 0x01];
        payload.extend_from_slice(b"Test");
        assert!(processor.process_fib(&fib(&[&fig(1, &payload)])));
        assert!(processor.ensemble_name().is_none());
        assert!(processor.ensemble_id().is_none());
    }

    #[test]
    fn sync_needs_label_and_bound_service() {
        let processor = FibProcessor::default();
        processor.process_fib(&fib(&[&fig1_ensemble_label(0x8001, "Test Mux")]));
        assert!(!processor.sync_reached());

        processor.process_fib(&fib(&[&fig0_2_audio_service()]));
        // component known but its subchannel is not
        assert!(!processor.sync_reached());

        processor.process_fib(&fib(&[&fig0_1_eep_subchannel()]));
        assert!(processor.sync_reached());
    }

    #[test]
    fn clear_ensemble_is_all_or_nothing() {
        let processor = configured_processor();
        assert!(processor.sync_reached());

        processor.clear_ensemble();
        assert!(!processor.sync_reached());
        assert!(processor.service_list().is_empty());
        assert!(processor.ensemble_name().is_none());
        assert!(processor.date_time().is_none());
    }

    #[test]
    fn packet_service_binding_via_fig0_3() {
        let processor = FibProcessor::default();

        // service 0x4321 with one packet component, SCId 0x020
        let fig0_2 = fig(0, &[0x02, 0x43, 0x21, 0x01, 0xC0, 0x82]);
        // FIG0/3: SCId 0x020, DG flag set, DSCTy 60, subchannel 3, address 0x101
        let fig0_3 = fig(0, &[0x03, 0x02, 0x00, 0xBC, 0x0D, 0x01]);
        // FIG0/14: FEC scheme 1 for subchannel 3
        let fig0_14 = fig(0, &[0x0E, 0x0D]);

        processor.process_fib(&fib(&[&fig0_2, &fig0_3]));
        processor.process_fib(&fib(&[&fig0_1_eep_subchannel(), &fig0_14]));
        processor.process_fib(&fib(&[&fig1_service_label(0x4321, "EPG")]));

        assert_eq!(processor.kind_of_service("EPG"), ServiceKind::Packet);
        let packet = processor.packet_service_data("EPG").unwrap();
        assert_eq!(packet.scid, 0x020);
        assert_eq!(packet.subchannel_id, 3);
        assert_eq!(packet.dscty, 60);
        assert!(packet.dg_flag);
        assert_eq!(packet.packet_address, 0x101);
        assert_eq!(packet.fec_scheme, 1);
    }

    #[test]
    fn date_time_from_mjd() {
        assert_eq!(mjd_to_ymd(60000), (2023, 2, 25));

        let processor = FibProcessor::default();
        // MJD 60000, UTC 12:34, short form
        let word: u32 = (60000 << 14) | (12 << 6) | 34;
        let mut payload = vec![0x0A];
        payload.extend_from_slice(&word.to_be_bytes());
        processor.process_fib(&fib(&[&fig(0, &payload)]));

        let dt = processor.date_time().unwrap();
        assert_eq!((dt.year, dt.month, dt.day), (2023, 2, 25));
        assert_eq!((dt.hour, dt.minute, dt.second), (12, 34, 0));
    }

    #[test]
    fn programme_type_updates_service() {
        let processor = configured_processor();
        // FIG0/17: SId 0x1234, language 0x08, type 10
        let payload = [0x11, 0x12, 0x34, 0x20, 0x08, 0x0A];
        processor.process_fib(&fib(&[&fig(0, &payload)]));

        let services = processor.service_list();
        assert_eq!(services[0].program_type, 10);
        assert_eq!(services[0].language, Some(0x08));
    }
}
