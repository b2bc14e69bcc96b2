// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Management Module
//!
//! Runs the simulated slave as a set of background tasks:
//!
//! - Modbus RTU server on the configured serial port
//! - Register map reloader watching the CSV modification time
//!
//! The register map is compiled before any task starts. A map that does not
//! compile aborts the launch, so the slave never answers from a partial or
//! default table.
//!
//! ## Usage
//!
//! ```no_run
//! use rust_modbus_sim::{config::Config, daemon::launch_daemon::Daemon};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!
//!     let mut daemon = Daemon::new();
//!     daemon.launch(&config).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     daemon.shutdown();
//!     daemon.join().await?;
//!
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_modbus::server::rtu::Server;
use tokio_serial::{DataBits, SerialPortBuilder, SerialStream, StopBits};

use crate::config::{Config, ModbusConfig, Parity};
use crate::modbus::{LogObserver, RegisterMapService};
use crate::register_map::{load_register_map, EncodingConfig, SharedRegisterMap};

/// Main daemon structure that manages the simulator's background tasks
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    register_map: SharedRegisterMap,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            register_map: SharedRegisterMap::default(),
        }
    }

    /// Handle to the live register map
    pub fn register_map(&self) -> SharedRegisterMap {
        self.register_map.clone()
    }

    /// Compile the register map and start every enabled task.
    ///
    /// # Errors
    ///
    /// Fails without starting anything when the map does not load or compile,
    /// and fails when the serial port cannot be opened.
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        info!("Starting daemon");
        let map_config = &config.register_map;
        let map = load_register_map(&map_config.csv_path, &map_config.encoding())
            .with_context(|| format!("Failed to load register map {:?}", map_config.csv_path))?;
        match map.span() {
            Some((first, last)) => info!(
                "Register map {:?}: {} registers populated, span HR[{}..{}]",
                map_config.csv_path,
                map.len(),
                first,
                last
            ),
            None => warn!("Register map {:?} is empty", map_config.csv_path),
        }
        self.register_map.replace(map);

        if config.modbus.enabled {
            self.start_modbus_server(config)?;
        } else {
            info!("Modbus server disabled, serial port left closed");
        }

        if map_config.reload_interval > 0 {
            self.start_map_reloader(config)?;
        }

        info!("Daemon started successfully");
        Ok(())
    }

    /// Open the serial port and serve the register map on it.
    fn start_modbus_server(&mut self, config: &Config) -> Result<()> {
        let modbus = &config.modbus;
        info!(
            "Starting Modbus RTU slave {} on {} ({} {}{}{})",
            modbus.slave_id,
            modbus.port,
            modbus.baud_rate,
            modbus.data_bits,
            modbus.parity,
            modbus.stop_bits
        );

        let builder = serial_port_builder(modbus)?;
        let serial = SerialStream::open(&builder)
            .with_context(|| format!("Failed to open serial port {}", modbus.port))?;

        let observer = Arc::new(LogObserver::new(config.register_map.log_reads));
        let service = RegisterMapService::new(
            self.register_map.clone(),
            modbus.slave_id,
            config.register_map.strict_gaps,
        )
        .with_observer(observer);
        let running = self.running.clone();

        let task = tokio::spawn(async move {
            let server = Server::new(serial);
            let server_handle = tokio::spawn(async move {
                if let Err(e) = server.serve_forever(service).await {
                    error!("Modbus server error: {}", e);
                }
            });

            while running.load(Ordering::SeqCst) && !server_handle.is_finished() {
                time::sleep(Duration::from_secs(1)).await;
            }

            info!("Shutting down Modbus server...");
            server_handle.abort();

            match time::timeout(Duration::from_secs(5), server_handle).await {
                Ok(_) => info!("Modbus server shut down successfully"),
                Err(_) => warn!("Modbus server shutdown timed out, forcing termination"),
            }

            Ok(())
        });

        self.tasks.push(task);
        info!("Modbus server started");
        Ok(())
    }

    /// Poll the CSV modification time and swap in a freshly compiled map when it changes.
    fn start_map_reloader(&mut self, config: &Config) -> Result<()> {
        let path = config.register_map.csv_path.clone();
        let encoding = config.register_map.encoding();
        let interval = Duration::from_secs(config.register_map.reload_interval);
        info!(
            "Watching register map {:?} every {}s",
            path, config.register_map.reload_interval
        );

        let shared = self.register_map.clone();
        let running = self.running.clone();
        let mut last_modified = modified_time(&path);

        let task = tokio::spawn(async move {
            let mut elapsed = Duration::ZERO;
            while running.load(Ordering::SeqCst) {
                time::sleep(Duration::from_secs(1)).await;
                elapsed += Duration::from_secs(1);
                if elapsed < interval {
                    continue;
                }
                elapsed = Duration::ZERO;

                let modified = modified_time(&path);
                if modified.is_none() || modified == last_modified {
                    continue;
                }
                last_modified = modified;

                if let Err(e) = reload_register_map(&path, &encoding, &shared) {
                    error!("Register map reload failed, keeping previous map: {:#}", e);
                }
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Signal all tasks to stop
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for all tasks to complete
    ///
    /// Call after [`shutdown`](Self::shutdown). Task failures and panics are
    /// logged; a task that does not stop within five seconds is abandoned.
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match time::timeout(Duration::from_secs(5), task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => error!("Task failed: {:#}", e),
                Ok(Err(e)) => error!("Task panicked: {}", e),
                Err(_) => warn!("Task did not complete within timeout period, may be hung"),
            }
        }
        Ok(())
    }
}

/// Serial line settings for `tokio_serial`.
pub fn serial_port_builder(config: &ModbusConfig) -> Result<SerialPortBuilder> {
    let data_bits = match config.data_bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        8 => DataBits::Eight,
        other => anyhow::bail!("Invalid data bits: {}", other),
    };
    let stop_bits = match config.stop_bits {
        1 => StopBits::One,
        2 => StopBits::Two,
        other => anyhow::bail!("Invalid stop bits: {}", other),
    };
    let parity = match config.parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Even => tokio_serial::Parity::Even,
        Parity::Odd => tokio_serial::Parity::Odd,
    };
    if !(config.timeout.is_finite() && config.timeout > 0.0) {
        anyhow::bail!("Invalid serial timeout: {}", config.timeout);
    }

    Ok(tokio_serial::new(config.port.as_str(), config.baud_rate)
        .data_bits(data_bits)
        .parity(parity)
        .stop_bits(stop_bits)
        .timeout(Duration::from_secs_f32(config.timeout)))
}

/// Load and compile `path`, then publish it through `shared`.
///
/// On any error the current map stays in place.
pub fn reload_register_map(
    path: &Path,
    encoding: &EncodingConfig,
    shared: &SharedRegisterMap,
) -> Result<()> {
    let map = load_register_map(path, encoding)
        .with_context(|| format!("Failed to load register map {:?}", path))?;
    let registers = map.len();
    shared.replace(map);
    info!(
        "Register map {:?} reloaded, {} registers populated",
        path, registers
    );
    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
}
