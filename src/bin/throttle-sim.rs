//! Replay a transmission scenario through the regulatory throttle.
//!
//! Reads a JSON scenario (region, LoRa parameters, attempted transmissions),
//! logs each decision, and prints a per-channel summary.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin throttle-sim -- scenario.json
//! cargo run --bin throttle-sim -- scenario.json --region US915
//! ```

use lora_throttle::lora::{max_dwell_time, Limit, TimeUnit};
use lora_throttle::{Region, Scenario};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage: throttle-sim <scenario.json> [--region EU868|US915]");
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut path: Option<PathBuf> = None;
    let mut region_override: Option<Region> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--region" => match args.next().map(|s| s.parse::<Region>()) {
                Some(Ok(region)) => region_override = Some(region),
                Some(Err(e)) => {
                    error!("{}", e);
                    std::process::exit(2);
                }
                None => {
                    print_usage();
                    std::process::exit(2);
                }
            },
            "-h" | "--help" => {
                print_usage();
                return;
            }
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => {
                warn!("Ignoring extra argument: {}", arg);
            }
        }
    }

    let Some(path) = path else {
        print_usage();
        std::process::exit(2);
    };

    let mut scenario = match Scenario::load(&path) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(region) = region_override {
        info!("Region overridden to {}", region);
        scenario.config.region = region;
    }

    let region = scenario.config.region;
    let rules = region.rules();
    info!(
        "=== {} : window {}ms, per-transmission cap {}ms ===",
        region,
        rules.window_ms,
        max_dwell_time(TimeUnit::Milliseconds)
    );

    let outcomes = scenario.replay();

    // frequency -> (allowed, throttled, airtime_ms)
    let mut per_channel: BTreeMap<u32, (usize, usize, f64)> = BTreeMap::new();
    for outcome in &outcomes {
        let entry = per_channel
            .entry(outcome.attempt.frequency)
            .or_insert((0, 0, 0.0));
        if outcome.allowed {
            entry.0 += 1;
            entry.2 += outcome.duration_ms;
            info!(
                "t={:>10} f={} {:>9.3}ms  allowed",
                outcome.attempt.at, outcome.attempt.frequency, outcome.duration_ms
            );
        } else {
            entry.1 += 1;
            warn!(
                "t={:>10} f={} {:>9.3}ms  throttled",
                outcome.attempt.at, outcome.attempt.frequency, outcome.duration_ms
            );
        }
    }

    println!("channel       allowed  throttled  airtime_ms");
    for (frequency, (allowed, throttled, airtime)) in &per_channel {
        println!(
            "{:<12} {:>8} {:>10} {:>11.3}",
            frequency, allowed, throttled, airtime
        );
    }

    let limit = match rules.limit {
        Limit::DutyCycle { ratio } => format!("duty cycle below {:.0}%", ratio * 100.0),
        Limit::DwellTime { max_ms } => {
            format!("dwell time up to {}ms per {}ms", max_ms, rules.window_ms)
        }
    };
    let throttled = outcomes.iter().filter(|o| !o.allowed).count();
    println!(
        "{} attempt(s), {} throttled ({}: {})",
        outcomes.len(),
        throttled,
        region,
        limit
    );
}
