use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::command::ObjectsArgs;
use crate::input::InputReader;
use dabsig::process::mot::MotManager;
use dabsig::structs::mot::MotObject;

pub fn cmd_objects(args: &ObjectsArgs) -> Result<()> {
    log::info!("Reassembling MOT objects from: {}", args.input.display());

    let data = InputReader::new(&args.input)?.read_all()?;

    if let Some(dir) = &args.output_path {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut manager = MotManager::default();
    let mut offset = 0usize;
    let mut group_count = 0usize;
    let mut object_count = 0usize;

    // records are a 16-bit big-endian length followed by one data group
    while data.len() - offset >= 2 {
        let length = u16::from_be_bytes([data[offset], data[offset + 1]]) as usize;
        offset += 2;
        if offset + length > data.len() {
            bail!("truncated data group record at byte {offset} ({length} bytes announced)");
        }
        let group = &data[offset..offset + length];
        offset += length;
        group_count += 1;

        if manager.handle_data_group(group) {
            if let Some(object) = manager.current_object() {
                object_count += 1;
                print_object(object_count, object);
                if let Some(dir) = &args.output_path {
                    save_object(dir, object_count, object)?;
                }
            }
        }
    }

    if offset != data.len() {
        log::warn!("{} trailing bytes do not form a record", data.len() - offset);
    }
    log::info!("Processed {group_count} data groups, {object_count} complete objects");

    Ok(())
}

fn print_object(index: usize, object: &MotObject) {
    let name = object.content_name.as_deref().unwrap_or("<unnamed>");
    println!(
        "#{index}: {name} ({}, {} bytes)",
        content_type_str(object.content_type, object.content_sub_type),
        object.body.len()
    );
    if let Some(title) = &object.category_title {
        println!("    Category/title: {title}");
    }
    if let Some(url) = &object.click_through_url {
        println!("    Link: {url}");
    }
}

fn save_object(dir: &Path, index: usize, object: &MotObject) -> Result<()> {
    let name = object
        .content_name
        .as_deref()
        .map(sanitize_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("object-{index}.bin"));

    let path = dir.join(name);
    fs::write(&path, &object.body).with_context(|| format!("writing {}", path.display()))?;
    log::debug!("Saved {}", path.display());
    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn content_type_str(content_type: u8, sub_type: u16) -> String {
    match (content_type, sub_type) {
        (2, 0) => "GIF image".into(),
        (2, 1) => "JPEG image".into(),
        (2, 2) => "BMP image".into(),
        (2, 3) => "PNG image".into(),
        (ct, st) => format!("type {ct}/{st}"),
    }
}
