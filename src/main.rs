//! Entry point for `rdt-over-udp`.
//!
//! Parses CLI arguments and dispatches into either **send** or **recv**
//! mode.  All protocol work is delegated to the library; this file owns only
//! process setup (logging, argument parsing) and result presentation.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use rdt_over_udp::stats::TransferStats;
use rdt_over_udp::{Channel, Receiver, Sender, TransportConfig, UdpChannel};

/// Reliable Go-Back-N data transfer over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Transmit the demo message to a receiver.
    Send {
        /// Receiver address (e.g. 127.0.0.1:12342).
        #[arg(short, long)]
        peer: SocketAddr,
        /// Number of space-joined integers in the demo message.
        #[arg(short, long, default_value_t = 800)]
        count: u32,
        /// Go-Back-N window size in segments.
        #[arg(short, long, default_value_t = 5)]
        window: u16,
        /// Round timeout in milliseconds.
        #[arg(short, long, default_value_t = 300)]
        timeout_ms: u64,
    },
    /// Wait for one transfer and print the reassembled message.
    Recv {
        /// Local address to bind (e.g. 0.0.0.0:12342).
        #[arg(short, long, default_value = "0.0.0.0:12342")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.mode {
        Mode::Send {
            peer,
            count,
            window,
            timeout_ms,
        } => run_send(peer, count, window, timeout_ms).await,
        Mode::Recv { bind } => run_recv(bind).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_send(
    peer: SocketAddr,
    count: u32,
    window: u16,
    timeout_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let message = (0..count)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    log::info!("sending {} byte(s) to {peer}", message.len());

    let channel = UdpChannel::bind("0.0.0.0:0".parse().unwrap()).await?;
    let config = TransportConfig {
        window_size: window,
        timeout: Duration::from_millis(timeout_ms),
        ..Default::default()
    };
    let mut sender = Sender::new(channel, peer, config, TransferStats::new());
    sender.send_message(message.as_bytes()).await?;

    print_summary(sender.stats());
    Ok(())
}

async fn run_recv(bind: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let channel = UdpChannel::bind(bind).await?;
    log::info!("listening on {}", channel.local_addr());

    let mut receiver = Receiver::new(channel, TransferStats::new());
    let message = receiver.receive_message().await?;

    let stats = receiver.stats();
    log::info!(
        "received {} byte(s); {} corrupt and {} duplicate datagram(s) discarded",
        message.len(),
        stats.corrupt_discarded,
        stats.duplicates_discarded
    );
    println!("{}", String::from_utf8_lossy(&message));
    Ok(())
}

fn print_summary(stats: &TransferStats) {
    log::info!(
        "initial transmissions: {}, retransmissions: {} ({:.2}% of all sends)",
        stats.initial_sends,
        stats.retransmissions,
        stats.retransmission_rate() * 100.0
    );
    match (stats.min_rtt(), stats.max_rtt(), stats.mean_rtt(), stats.stddev_rtt_ms()) {
        (Some(min), Some(max), Some(mean), Some(sd)) => {
            log::info!(
                "RTT min {:.2} ms, max {:.2} ms, mean {:.2} ms, stddev {sd:.2} ms",
                min.as_secs_f64() * 1000.0,
                max.as_secs_f64() * 1000.0,
                mean.as_secs_f64() * 1000.0,
            );
        }
        _ => log::info!("no RTT samples collected"),
    }
}
