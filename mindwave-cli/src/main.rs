use clap::Parser;
use mindwave_lib::constants::POOR_SIGNAL_UNKNOWN;
use mindwave_lib::{Headset, HeadsetConfig, HeadsetState, ListenerState};
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live monitor for a NeuroSky MindWave headset
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial device of the USB dongle
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Headset id as 4 hex digits; auto-connects when omitted
    #[arg(short = 'i', long)]
    headset_id: Option<String>,

    /// Duration in seconds, 0 runs until Ctrl+C
    #[arg(short, long, default_value = "60")]
    duration: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn signal_label(state: &HeadsetState) -> &'static str {
    if state.has_good_signal() {
        "good"
    } else if state.has_no_contact() {
        "no contact"
    } else if state.poor_signal == POOR_SIGNAL_UNKNOWN {
        "unknown"
    } else {
        "noisy"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let mut config = HeadsetConfig::new(&args.port).with_open_serial(false);
    if let Some(id) = &args.headset_id {
        config = config.with_headset_id(id.clone());
    }
    let mut headset = Headset::new(config)?;

    let raw_samples = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&raw_samples);
    headset.with_handlers(|handlers| {
        handlers
            .on_raw_value(move |_, _| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .on_blink(|_, strength| println!("  Blink (strength {})", strength))
            .on_headset_connected(|state| {
                let id = state.headset_id.as_ref().map(|id| id.to_hex()).unwrap_or_default();
                println!("  Connected to headset {}", id);
            })
            .on_headset_not_found(|_, id| match id {
                Some(id) => println!("  Headset {} not found", id),
                None => println!("  No headset found"),
            })
            .on_headset_disconnected(|_, id| println!("  Headset {} disconnected", id))
            .on_request_denied(|_| println!("  Request denied by dongle"))
            .on_poor_signal(|_, level| println!("  Signal lost (level {})", level))
            .on_good_signal(|_, _| println!("  Signal restored"));
    });

    println!("Opening dongle on {}...", args.port);
    headset.open_stream()?;
    headset.connect(None)?;
    println!("Monitoring, press Ctrl+C to stop\n");

    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;
    let mut last_raw = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let state = headset.state();
        let raw_total = raw_samples.load(Ordering::Relaxed);
        println!(
            "[{:>4}s] status={:<9} signal={:<10} attention={:>3} meditation={:>3} raw/s={:>4}",
            started.elapsed().as_secs(),
            state.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            signal_label(&state),
            state.attention,
            state.meditation,
            raw_total - last_raw
        );
        last_raw = raw_total;

        if headset.listener_state() == ListenerState::Stopped {
            println!("Listener stopped, exiting");
            break;
        }
        if args.duration > 0 && started.elapsed() >= Duration::from_secs(args.duration) {
            break;
        }
    }

    headset.disconnect()?;
    if let Some(exit) = headset.close_stream() {
        println!("\nStopped: {:?}", exit.reason);
        println!(
            "  {} packets, {} checksum mismatches, {} bytes skipped",
            exit.stats.packets, exit.stats.checksum_mismatches, exit.stats.skipped_bytes
        );
    }
    Ok(())
}
