// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the Modbus RTU holding register simulator
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::path::PathBuf;
use tokio::signal;

use rust_modbus_sim::config::{self, Config, ConfigOverrides, Parity};
use rust_modbus_sim::daemon::Daemon;
use rust_modbus_sim::register_map::{load_register_map, Endianness, OrderCode};

/// Modbus RTU holding register slave simulator (read-only)
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial port (e.g. /dev/ttyUSB0 or COM3)
    #[arg(long, env = "MODBUS_PORT")]
    port: Option<String>,

    /// Baud rate
    #[arg(long, env = "MODBUS_BAUD")]
    baud: Option<u32>,

    /// Data bits
    #[arg(long)]
    bytesize: Option<u8>,

    /// Parity (N, E or O)
    #[arg(long)]
    parity: Option<Parity>,

    /// Stop bits (1 or 2)
    #[arg(long)]
    stopbits: Option<u8>,

    /// Serial read timeout in seconds
    #[arg(long)]
    timeout: Option<f32>,

    /// Slave id answered by the simulator
    #[arg(long)]
    slave: Option<u8>,

    /// CSV register map path
    #[arg(long = "csv")]
    csv_path: Option<PathBuf>,

    /// Base for 4xxxx addressing (40001 or 40000)
    #[arg(long)]
    four_base: Option<u32>,

    /// Global 32-bit order code (ABCD, BADC, CDAB, DCBA), overrides byte/word order
    #[arg(long)]
    order: Option<OrderCode>,

    /// Default byte order for 32-bit types (big or little)
    #[arg(long)]
    byte_order: Option<Endianness>,

    /// Default word order for 32-bit types (big or little)
    #[arg(long)]
    word_order: Option<Endianness>,

    /// Answer reads of unmapped registers with ILLEGAL DATA ADDRESS
    #[arg(long)]
    strict_gaps: bool,

    /// Log every holding register read
    #[arg(long)]
    log_reads: bool,

    /// Reload the CSV when it changes, checking every N seconds (0 disables)
    #[arg(long)]
    reload_interval: Option<u64>,

    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Compile the register map, print it and exit
    #[arg(long)]
    preview_map: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<log::LevelFilter>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port.clone(),
            baud_rate: self.baud,
            data_bits: self.bytesize,
            parity: self.parity,
            stop_bits: self.stopbits,
            timeout: self.timeout,
            slave_id: self.slave,
            csv_path: self.csv_path.clone(),
            four_base: self.four_base,
            order: self.order,
            byte_order: self.byte_order,
            word_order: self.word_order,
            strict_gaps: self.strict_gaps.then_some(true),
            log_reads: self.log_reads.then_some(true),
            reload_interval: self.reload_interval,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if let Some(level) = args.log_level {
        level
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = &args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    // Without --config the defaults are used as is and nothing is written to disk
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_args(args.overrides());
    config::validate_specific_rules(&config)?;

    if args.preview_map {
        let map = load_register_map(
            &config.register_map.csv_path,
            &config.register_map.encoding(),
        )
        .with_context(|| {
            format!(
                "Failed to compile register map {:?}",
                config.register_map.csv_path
            )
        })?;
        println!("{}", map);
        return Ok(());
    }

    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, terminating daemon");
            daemon.shutdown();
            daemon.join().await?;
        }
        Err(err) => {
            eprintln!("Error waiting for shutdown signal: {}", err);
        }
    }

    Ok(())
}
