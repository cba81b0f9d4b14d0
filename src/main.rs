// In src/main.rs
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tracing::warn;
use walrus_messenger::error::ChannelError;
use walrus_messenger::Core::Jitter;
use walrus_messenger::MPSC::{run, ChannelBuilder, RunConfig};

const EXIT_USAGE: u8 = 1;
const EXIT_LAUNCH: u8 = 2;
const EXIT_JOIN: u8 = 3;
const EXIT_VIOLATION: u8 = 4;
const EXIT_INTERRUPTED: u8 = 130;

fn usage(program: &str) -> ExitCode {
    eprintln!(
        "Usage: {program} <capacity> <producers> <final_sequence> [--jitter <max_spins>]"
    );
    ExitCode::from(EXIT_USAGE)
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("walrus_messenger=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("walrus");
    if args.len() < 4 {
        return usage(program);
    }

    let (Ok(capacity), Ok(producers), Ok(final_sequence)) = (
        args[1].parse::<usize>(),
        args[2].parse::<usize>(),
        args[3].parse::<u64>(),
    ) else {
        return usage(program);
    };

    let jitter = match args.get(4).map(String::as_str) {
        None => None,
        Some("--jitter") => match args.get(5).and_then(|s| s.parse::<u32>().ok()) {
            Some(max) => Some(Jitter::new(max)),
            None => return usage(program),
        },
        Some(_) => return usage(program),
    };

    init_tracing();

    let channel = match ChannelBuilder::new().with_capacity(capacity).build() {
        Ok(channel) => channel,
        Err(e) => {
            eprintln!("Failed to create channel: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let interrupt = Arc::clone(&channel);
    if let Err(e) = ctrlc::set_handler(move || interrupt.interrupt()) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }

    let mut config = RunConfig::new()
        .with_producers(producers)
        .with_final_sequence(final_sequence);
    if let Some(jitter) = jitter {
        config = config
            .with_producer_cost(Arc::new(jitter))
            .with_consumer_cost(Arc::new(jitter));
    }

    println!("Ring before run: {}", channel.snapshot());
    let start = Instant::now();
    let outcome = match run(&channel, &config) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Run failed: {e}");
            return match e {
                ChannelError::Launch { .. } => ExitCode::from(EXIT_LAUNCH),
                ChannelError::Join { .. } => ExitCode::from(EXIT_JOIN),
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };
    let elapsed = start.elapsed();

    println!("Ring after run:  {}", channel.snapshot());
    for (i, report) in outcome.producers.iter().enumerate() {
        println!(
            "Producer {i}: wrote {} messages (last {:?}, max probes {})",
            report.written, report.last_written, report.max_probes
        );
    }
    let delivery = &outcome.delivery;
    println!(
        "Consumer: delivered {} messages in {:.2?} (last {:?})",
        delivery.delivered_count, elapsed, delivery.last_delivered
    );

    if let Some(detail) = delivery.violation_detail {
        eprintln!("Ordering violation: {detail}");
        return ExitCode::from(EXIT_VIOLATION);
    }
    if channel.is_interrupted() {
        eprintln!("Interrupted before the final message was delivered");
        return ExitCode::from(EXIT_INTERRUPTED);
    }
    ExitCode::SUCCESS
}
