// CLI command implementations

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use opusmux::muxer::StreamParams;
use opusmux::ogg::crc::Crc32;
use opusmux::ogg::page::{OggPage, OggPageHeader};
use opusmux::opus::{OpusHead, OPUS_HEAD_SIGNATURE, OPUS_TAGS_SIGNATURE};
use opusmux::{concatenate, MuxerSession};

use crate::cli::output::OutputFormatter;

/// Stream summary for the `info` command
#[derive(Debug, Serialize)]
struct StreamInfo {
    path: String,
    file_size: u64,
    modified: Option<String>,
    format: String,
    serial_number: u32,
    channels: Option<u8>,
    pre_skip: Option<u16>,
    input_sample_rate: Option<u32>,
    pages: usize,
    duration_seconds: Option<f64>,
}

/// Per-page summary for the `pages` command
#[derive(Debug, Serialize)]
struct PageSummary {
    sequence: u32,
    granule_position: u64,
    serial_number: u32,
    flags: String,
    segments: usize,
    payload_bytes: usize,
    checksum_ok: bool,
}

/// Show stream information for each file
pub fn command_info(files: &[String], formatter: &OutputFormatter) -> Result<()> {
    for file_path in files {
        if !Path::new(file_path).exists() {
            formatter.print_error(&format!("File not found: {}", file_path));
            continue;
        }

        match read_stream_info(file_path) {
            Ok(info) => {
                if formatter.is_json() {
                    formatter.output_report(&info)?;
                } else {
                    print_stream_info(&info);
                }
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
            }
        }
    }

    Ok(())
}

fn read_stream_info(file_path: &str) -> Result<StreamInfo> {
    let metadata = std::fs::metadata(file_path)?;
    let modified = metadata.modified().ok().and_then(format_timestamp);

    let file = File::open(file_path)?;
    let mut reader = BufReader::new(file);
    let pages = OggPage::read_all(&mut reader);
    if pages.is_empty() {
        bail!("no Ogg pages found");
    }

    let head = OpusHead::parse(&pages[0].data);
    let format = if head.is_some() { "Ogg/Opus" } else { "Ogg" };

    // Granule positions count 48 kHz samples regardless of the input rate.
    let duration_seconds = head.as_ref().map(|h| {
        let last_granule = pages[pages.len() - 1].header.granule_position;
        last_granule.saturating_sub(h.pre_skip as u64) as f64 / 48_000.0
    });

    Ok(StreamInfo {
        path: file_path.to_string(),
        file_size: metadata.len(),
        modified,
        format: format.to_string(),
        serial_number: pages[0].header.serial_number,
        channels: head.as_ref().map(|h| h.channels),
        pre_skip: head.as_ref().map(|h| h.pre_skip),
        input_sample_rate: head.as_ref().map(|h| h.input_sample_rate),
        pages: pages.len(),
        duration_seconds,
    })
}

fn format_timestamp(time: SystemTime) -> Option<String> {
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    let date = chrono::DateTime::from_timestamp(secs as i64, 0)?;
    Some(date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn print_stream_info(info: &StreamInfo) {
    println!("\n📁 {}", info.path);
    println!("{}", "─".repeat(60));
    println!("Size: {} bytes", info.file_size);
    if let Some(modified) = &info.modified {
        println!("Modified: {}", modified);
    }
    println!("Format: {}", info.format);
    println!("Serial: {:#010x}", info.serial_number);
    if let Some(channels) = info.channels {
        println!("Channels: {}", channels);
    }
    if let Some(rate) = info.input_sample_rate {
        println!("Input sample rate: {} Hz", rate);
    }
    if let Some(pre_skip) = info.pre_skip {
        println!("Pre-skip: {} samples", pre_skip);
    }
    println!("Pages: {}", info.pages);
    if let Some(duration) = info.duration_seconds {
        println!("Duration: {:.2} s", duration);
    }
}

/// List every page of a file
pub fn command_pages(file_path: &str, formatter: &OutputFormatter) -> Result<()> {
    let file = File::open(file_path).with_context(|| format!("opening {}", file_path))?;
    let mut reader = BufReader::new(file);
    let pages = OggPage::read_all(&mut reader);
    if pages.is_empty() {
        bail!("{}: no Ogg pages found", file_path);
    }

    let crc = Crc32::new();
    let summaries: Vec<PageSummary> = pages
        .iter()
        .map(|page| PageSummary {
            sequence: page.header.sequence_number,
            granule_position: page.header.granule_position,
            serial_number: page.header.serial_number,
            flags: flags_string(&page.header),
            segments: page.header.segment_table.len(),
            payload_bytes: page.data.len(),
            checksum_ok: page.checksum_valid(&crc),
        })
        .collect();

    if formatter.is_json() {
        formatter.output_report(&summaries)?;
    } else {
        println!(
            "{:>6} {:>12} {:>10} {:>5} {:>5} {:>8} {:>4}",
            "seq", "granule", "serial", "flags", "segs", "payload", "crc"
        );
        for summary in &summaries {
            println!(
                "{:>6} {:>12} {:>10x} {:>5} {:>5} {:>8} {:>4}",
                summary.sequence,
                summary.granule_position,
                summary.serial_number,
                if summary.flags.is_empty() {
                    "-"
                } else {
                    summary.flags.as_str()
                },
                summary.segments,
                summary.payload_bytes,
                if summary.checksum_ok { "ok" } else { "BAD" }
            );
        }
    }

    Ok(())
}

fn flags_string(header: &OggPageHeader) -> String {
    let mut flags = String::new();
    if header.is_continuation() {
        flags.push('C');
    }
    if header.is_bos() {
        flags.push('B');
    }
    if header.is_eos() {
        flags.push('E');
    }
    flags
}

/// Verify page checksums across files or a directory
pub fn command_verify(
    files: &[String],
    directory: Option<&str>,
    pattern: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut targets: Vec<String> = files.to_vec();

    if let Some(dir) = directory {
        // Build glob pattern
        let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
            format!("{}/{}", dir, pattern)
        } else {
            format!("{}/**/{}", dir, pattern)
        };

        for entry in glob::glob(&glob_pattern).context("invalid glob pattern")? {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        if let Some(path_str) = path.to_str() {
                            targets.push(path_str.to_string());
                        }
                    }
                }
                Err(e) => {
                    formatter.print_error(&format!("Error reading path: {}", e));
                }
            }
        }
    }

    if targets.is_empty() {
        bail!("no files specified");
    }

    let crc = Crc32::new();
    let mut passed = 0usize;
    let mut failed = 0usize;

    for file_path in &targets {
        match verify_file(file_path, &crc) {
            Ok((pages, 0)) => {
                formatter.print_success(&format!("{}: {} pages", file_path, pages));
                passed += 1;
            }
            Ok((pages, bad)) => {
                formatter.print_error(&format!(
                    "{}: {} of {} pages have checksum mismatches",
                    file_path, bad, pages
                ));
                failed += 1;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
                failed += 1;
            }
        }
    }

    formatter.print_info(&format!("Completed: {} passed, {} failed", passed, failed));
    if failed > 0 {
        bail!("{} file(s) failed verification", failed);
    }
    Ok(())
}

fn verify_file(file_path: &str, crc: &Crc32) -> Result<(usize, usize)> {
    let file = File::open(file_path)?;
    let mut reader = BufReader::new(file);
    let pages = OggPage::read_all(&mut reader);
    if pages.is_empty() {
        bail!("no Ogg pages found");
    }

    let bad = pages.iter().filter(|p| !p.checksum_valid(crc)).count();
    Ok((pages.len(), bad))
}

/// Re-stamp raw encoder output into a playable stream
pub fn command_remux(
    input: &str,
    output: &str,
    sample_rate: u32,
    channels: u8,
    pre_skip: u16,
    formatter: &OutputFormatter,
) -> Result<()> {
    let file = File::open(input).with_context(|| format!("opening {}", input))?;
    let mut reader = BufReader::new(file);
    let pages = OggPage::read_all(&mut reader);

    // Header pages the encoder may have produced are rebuilt from scratch.
    let data_pages: Vec<Vec<u8>> = pages
        .iter()
        .filter(|page| {
            !page.data.starts_with(OPUS_HEAD_SIGNATURE)
                && !page.data.starts_with(OPUS_TAGS_SIGNATURE)
        })
        .map(|page| page.as_bytes())
        .collect();

    let params = StreamParams {
        sample_rate,
        channels,
        pre_skip,
    };
    let mut session = MuxerSession::from_params(params, None);
    let restamped = session
        .normalize(&data_pages)
        .with_context(|| format!("re-stamping {}", input))?;
    let stream = concatenate(&restamped);

    std::fs::write(output, &stream).with_context(|| format!("writing {}", output))?;
    formatter.print_success(&format!(
        "{}: wrote {} pages ({} bytes, serial {:#010x})",
        output,
        restamped.len(),
        stream.len(),
        session.serial_number()
    ));
    Ok(())
}
