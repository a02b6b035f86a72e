//! Linkwatch - WiFi link quality monitoring client
//!
//! Drives the monitor on a Linux host: periodic signal/ping ticks plus
//! one-shot HTTP, throughput, captive portal and scan checks.

mod analysis;
mod config;
mod output;
mod platform;

use anyhow::Result;
use clap::Parser;
use monitor::Monitor;
use platform::{HostNetClient, LinuxWifi};
use std::path::{Path, PathBuf};
use tracing::{error, info};

type HostMonitor = Monitor<LinuxWifi, HostNetClient>;

#[derive(Parser, Debug)]
#[command(name = "linkwatch")]
#[command(author = "Florian Schüller <schuellerf@gmail.com>")]
#[command(version)]
#[command(about = "WiFi link quality monitoring", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "linkwatch.conf")]
    config: PathBuf,

    /// Scan for nearby access points and exit
    #[arg(long)]
    scan: bool,

    /// Run a single HTTP GET check against URL and exit
    #[arg(long, value_name = "URL")]
    http_test: Option<String>,

    /// Measure download speed from URL and exit
    #[arg(long, value_name = "URL")]
    download: Option<String>,

    /// Measure upload speed to URL and exit
    #[arg(long, value_name = "URL")]
    upload: Option<String>,

    /// Check for a captive portal and exit
    #[arg(long)]
    captive_portal: bool,

    /// Stop monitoring after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Export signal history as CSV when monitoring stops
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Print the snapshot as JSON on every tick
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if args.json {
        config.output.json = true;
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Linkwatch v{} - WiFi link quality monitoring", env!("CARGO_PKG_VERSION"));

    let wifi = LinuxWifi::new(config.general.interface.clone());
    let client = HostNetClient::new()?;
    let mut monitor = Monitor::with_config(wifi, client, config.monitor_config());
    monitor.begin(&config.targets.ping_host);

    let output_handle = output::OutputManager::new(config.output.clone());

    if args.scan {
        let networks = monitor.scan_networks();
        info!("Found {} networks", networks.len());
        output_handle.networks(&networks)?;
    } else if let Some(url) = &args.http_test {
        let result = monitor.test_connection(url, config.http_timeout());
        output_handle.connection(&result)?;
    } else if let Some(url) = &args.download {
        let speed = monitor.test_download_speed(url);
        println!("Download: {:.2} KB/s", speed);
    } else if let Some(url) = &args.upload {
        let speed = monitor.test_upload_speed(url);
        println!("Upload: {:.2} KB/s", speed);
    } else if args.captive_portal {
        let active = monitor.is_captive_portal_active(&config.targets.captive_portal_url);
        println!("Captive portal: {}", if active { "detected" } else { "none" });
    } else {
        // Exporting needs a bounded run; default to one full history
        let ticks = match (&args.export, args.ticks) {
            (Some(_), None) => Some(config.general.history_size as u64),
            (_, ticks) => ticks,
        };
        run_monitoring(&mut monitor, &config, &output_handle, ticks)?;

        if let Some(path) = &args.export {
            output::export_csv(&monitor.signal_history(), path)?;
            info!("Exported {} samples to {:?}", monitor.history().len(), path);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<config::Config> {
    if !path.exists() && path == Path::new("linkwatch.conf") {
        return Ok(config::Config::default());
    }
    config::Config::load(path)
}

fn run_monitoring(
    monitor: &mut HostMonitor,
    config: &config::Config,
    output_handle: &output::OutputManager,
    ticks: Option<u64>,
) -> Result<()> {
    info!("Interface: {}", config.general.interface);
    info!("Ping target: {}:{}", config.targets.ping_host, config.targets.ping_port);
    info!("Update interval: {}ms", config.general.update_interval_ms);

    monitor.on_disconnect(|| {
        println!("[{}] WiFi link lost", chrono::Local::now().format("%H:%M:%S"));
    });
    monitor.on_reconnect(|| {
        println!("[{}] WiFi link restored", chrono::Local::now().format("%H:%M:%S"));
    });

    let alert_manager = analysis::AlertManager::new(config.alerts.clone());
    let interval = config.update_interval();

    info!("Starting monitoring loop (Press Ctrl+C to stop)");

    let mut tick: u64 = 0;
    loop {
        let started = std::time::Instant::now();
        monitor.update();

        if let Some(url) = &config.targets.http_url {
            if tick % config.targets.http_check_every == 0 {
                let result = monitor.test_connection(url, config.http_timeout());
                if !result.success {
                    error!("HTTP check {} failed: {} {}", url, result.status_code, result.error_message);
                }
            }
        }

        alert_manager.check(monitor.snapshot());

        if let Err(e) = output_handle.update(monitor.snapshot()) {
            error!("Output update failed: {}", e);
        }

        tick += 1;
        if ticks.is_some_and(|limit| tick >= limit) {
            info!(
                "Stopping after {} ticks ({} disconnects)",
                tick,
                monitor.disconnect_count()
            );
            return Ok(());
        }

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}
