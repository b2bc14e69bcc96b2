// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use clap::Parser;
use tokio_modbus::prelude::*;

use rust_modbus_sim::config::{ModbusConfig, Parity};
use rust_modbus_sim::daemon::serial_port_builder;
use rust_modbus_sim::register_map::{address::DEFAULT_FOUR_BASE, resolve_address};

/// Modbus RTU master reading holding registers from a slave
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Serial port
    #[clap(long, env = "MODBUS_PORT", default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate
    #[clap(long, env = "MODBUS_BAUD", default_value = "9600")]
    baud: u32,

    /// Parity (N, E or O)
    #[clap(long, default_value = "N")]
    parity: Parity,

    /// Slave id to query
    #[clap(long, default_value = "1")]
    slave: u8,

    /// First holding register: zero-based, 0x hex or 4xxxx
    #[clap(long, default_value = "0")]
    address: String,

    /// Base for 4xxxx addresses
    #[clap(long, default_value_t = DEFAULT_FOUR_BASE)]
    four_base: u32,

    /// Number of registers to read
    #[clap(long, default_value = "10")]
    quantity: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();
    let start = resolve_address(&args.address, args.four_base)
        .with_context(|| format!("Invalid register address {}", args.address))?
        .index;

    let line = ModbusConfig {
        port: args.port.clone(),
        baud_rate: args.baud,
        parity: args.parity,
        ..Default::default()
    };
    let serial = tokio_serial::SerialStream::open(&serial_port_builder(&line)?)
        .with_context(|| format!("Failed to open serial port {}", args.port))?;
    println!("Connected to slave {} on {}", args.slave, args.port);

    let mut ctx = rtu::attach_slave(serial, Slave(args.slave));

    println!(
        "Reading {} holding registers starting at HR[{}]",
        args.quantity, start
    );
    let values = ctx
        .read_holding_registers(start, args.quantity)
        .await
        .context("Modbus transport error")?
        .map_err(|code| anyhow::anyhow!("Slave answered with exception {:?}", code))?;

    println!("Raw register values: {:?}", values);
    for (offset, value) in values.iter().enumerate() {
        println!(
            "HR[{}] = {:>5}  0x{:04X}",
            usize::from(start) + offset,
            value,
            value
        );
    }
    Ok(())
}
