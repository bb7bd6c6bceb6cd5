use anyhow::Result;

use super::command::InfoArgs;
use crate::input::InputReader;
use dabsig::process::fic::{FIB_LEN, FibProcessor};
use dabsig::structs::ensemble::{Protection, ServiceKind};

pub fn cmd_info(args: &InfoArgs) -> Result<()> {
    log::info!("Analyzing FIC dump: {}", args.input.display());

    let mut input_reader = InputReader::new(&args.input)?;
    let processor = FibProcessor::default();

    let mut pending: Vec<u8> = Vec::new();
    let mut fib_count = 0usize;
    let mut accepted = 0usize;

    input_reader.process_chunks(64 * 1024, |chunk| {
        pending.extend_from_slice(chunk);

        let mut offset = 0;
        while pending.len() - offset >= FIB_LEN {
            if processor.process_fib(&pending[offset..offset + FIB_LEN]) {
                accepted += 1;
            }
            offset += FIB_LEN;
            fib_count += 1;
        }
        pending.drain(..offset);

        Ok(true)
    })?;

    if !pending.is_empty() {
        log::warn!("{} trailing bytes do not form a whole FIB", pending.len());
    }
    log::info!("Processed {fib_count} FIBs, {accepted} passed the CRC");

    if !processor.sync_reached() {
        println!("No complete ensemble configuration found.");
        println!("This doesn't appear to be a valid FIC dump.");
        return Ok(());
    }

    print_ensemble(&processor);

    Ok(())
}

fn print_ensemble(processor: &FibProcessor) {
    println!();
    if let (Some(name), Some(id)) = (processor.ensemble_name(), processor.ensemble_id()) {
        println!("Ensemble: {name} (EId 0x{id:04X})");
    }
    if let Some(ecc) = processor.ensemble_ecc() {
        println!("  ECC: 0x{ecc:02X}");
    }
    if let Some(dt) = processor.date_time() {
        println!(
            "  Time: {:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC{}",
            dt.year,
            dt.month,
            dt.day,
            dt.hour,
            dt.minute,
            dt.second,
            lto_str(dt.lto_half_hours)
        );
    }

    let mut services = processor.service_list();
    services.sort_by(|a, b| a.label.label.cmp(&b.label.label));
    println!("  Services: {}", services.len());

    for service in &services {
        let label = &service.label.label;
        println!();
        println!("  {} (SId 0x{:X})", label, service.service_id);

        match processor.kind_of_service(label) {
            ServiceKind::Audio => match processor.audio_service_data(label) {
                Some(audio) => {
                    println!("    Audio ({})", ascty_str(audio.ascty));
                    println!(
                        "    Subchannel {}: CU {}..{}, {}, {} kbit/s",
                        audio.subchannel_id,
                        audio.start_address,
                        audio.start_address + audio.length,
                        protection_str(audio.protection),
                        audio.bitrate
                    );
                    if let Some(language) = audio.language {
                        println!("    Language: 0x{language:02X}");
                    }
                }
                None => println!("    Audio component without subchannel organization"),
            },
            ServiceKind::Packet => match processor.packet_service_data(label) {
                Some(packet) => {
                    println!("    Packet data (DSCTy {})", packet.dscty);
                    println!(
                        "    Subchannel {}: CU {}..{}, {}, {} kbit/s",
                        packet.subchannel_id,
                        packet.start_address,
                        packet.start_address + packet.length,
                        protection_str(packet.protection),
                        packet.bitrate
                    );
                    println!(
                        "    SCId 0x{:03X}, address {}, data groups: {}, FEC: {}",
                        packet.scid,
                        packet.packet_address,
                        if packet.dg_flag { "yes" } else { "no" },
                        if packet.fec_scheme == 1 {
                            "applied"
                        } else {
                            "none"
                        }
                    );
                }
                None => println!("    Packet component not fully signalled"),
            },
            ServiceKind::Unknown => println!("    Component not yet bound"),
        }
    }
}

fn protection_str(protection: Protection) -> String {
    match protection {
        Protection::Uep { table_index } => format!("UEP index {table_index}"),
        Protection::Eep { option, level } => {
            let profile = if option == 0 { 'A' } else { 'B' };
            format!("EEP {}-{}", level + 1, profile)
        }
    }
}

fn ascty_str(ascty: u8) -> &'static str {
    match ascty {
        0 => "DAB audio",
        63 => "DAB+ audio",
        _ => "unknown audio coding",
    }
}

fn lto_str(half_hours: i8) -> String {
    if half_hours == 0 {
        return String::new();
    }
    let sign = if half_hours < 0 { '-' } else { '+' };
    let minutes = half_hours.unsigned_abs() as u32 * 30;
    format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
}
