use clap::Parser;
use mindwave_lib::{ChecksumPolicy, HeadsetEvent, PacketReader, ReadSource, Session};
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;

/// Decode a packet capture offline and print the events it produces
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Capture file written by the capture tool
    file: PathBuf,

    /// The file holds one hex-encoded packet per line
    #[arg(long)]
    hex: bool,

    /// Drop packets with a bad checksum
    #[arg(long)]
    strict: bool,

    /// Also print every raw EEG sample
    #[arg(short, long)]
    raw: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn open_capture(args: &Args) -> Result<Box<dyn Read + Send>, Box<dyn Error>> {
    if args.hex {
        let text = fs::read_to_string(&args.file)?;
        let mut bytes = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let decoded = hex::decode(line).map_err(|e| format!("line {}: {}", n + 1, e))?;
            bytes.extend_from_slice(&decoded);
        }
        Ok(Box::new(Cursor::new(bytes)))
    } else {
        Ok(Box::new(BufReader::new(File::open(&args.file)?)))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let policy = if args.strict {
        ChecksumPolicy::Reject
    } else {
        ChecksumPolicy::Ignore
    };
    let mut reader = PacketReader::with_policy(ReadSource::new(open_capture(&args)?), policy);

    let mut session = Session::new(None);
    let show_raw = args.raw;
    session.handlers.on_event(move |_, event| match event {
        HeadsetEvent::RawValue(_) if !show_raw => {}
        other => println!("{:?}", other),
    });

    let mut rows = 0;
    for packet in reader.by_ref() {
        match packet {
            Ok(packet) => rows += session.handle_payload(&packet.payload),
            Err(e) if e.is_end_of_stream() => break,
            Err(e) => return Err(e.into()),
        }
    }

    let stats = reader.stats();
    println!("\nDecoded {} rows from {} packets", rows, stats.packets);
    println!(
        "  checksum mismatches: {} (rejected {}), oversized lengths: {}, bytes skipped: {}",
        stats.checksum_mismatches, stats.rejected, stats.oversized, stats.skipped_bytes
    );

    let state = &session.state;
    println!("Final state:");
    println!(
        "  status: {}",
        state.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  headset: {}",
        state.headset_id.as_ref().map(|id| id.to_hex()).unwrap_or_else(|| "-".to_string())
    );
    println!("  poor signal: {}", state.poor_signal);
    println!("  attention: {}, meditation: {}", state.attention, state.meditation);
    println!("  last raw sample: {}", state.raw_value);
    Ok(())
}
