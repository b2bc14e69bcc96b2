// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Compile a CSV register map and print the resulting holding registers.
//!
//! ```bash
//! map_preview map.csv --four-base 40001 --order CDAB
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rust_modbus_sim::register_map::{
    address::DEFAULT_FOUR_BASE, load_register_map, EncodingConfig, Endianness, OrderCode, Pad,
};

/// Print the compiled register table of a CSV map
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// CSV register map
    csv: PathBuf,

    /// Base for 4xxxx addressing
    #[arg(long, default_value_t = DEFAULT_FOUR_BASE)]
    four_base: u32,

    /// Global 32-bit order code, overrides byte/word order
    #[arg(long)]
    order: Option<OrderCode>,

    #[arg(long, default_value = "big")]
    byte_order: Endianness,

    #[arg(long, default_value = "big")]
    word_order: Endianness,

    /// Default ascii padding (space or null)
    #[arg(long, default_value = "space")]
    pad: Pad,

    /// List compiled entries with their source row instead of single cells
    #[arg(long)]
    entries: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let (default_byte_order, default_word_order) = match args.order {
        Some(code) => (code.byte_order(), code.word_order()),
        None => (args.byte_order, args.word_order),
    };
    let config = EncodingConfig {
        four_base: args.four_base,
        default_byte_order,
        default_word_order,
        default_pad: args.pad,
        ..Default::default()
    };

    let map = match load_register_map(&args.csv, &config) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("{}: {}", args.csv.display(), err);
            return ExitCode::FAILURE;
        }
    };

    if args.entries {
        for entry in map.entries() {
            println!(
                "HR[{}..{}] {:<6} {:04X?} ({}){}",
                entry.start_index,
                entry.end_index(),
                entry.register_type,
                entry.cells,
                entry.row,
                entry
                    .comment
                    .as_deref()
                    .map(|c| format!(" {c}"))
                    .unwrap_or_default()
            );
        }
    } else {
        println!("{}", map);
    }
    ExitCode::SUCCESS
}
