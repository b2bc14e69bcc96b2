// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use rust_modbus_sim::config::{Config, ModbusConfig, Parity, RegisterMapConfig};
use rust_modbus_sim::register_map::{Endianness, OrderCode, Pad};

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let config = Config {
        modbus: ModbusConfig {
            port: "/dev/ttyS1".to_string(),
            baud_rate: 19200,
            parity: Parity::Even,
            slave_id: 7,
            ..Default::default()
        },
        register_map: RegisterMapConfig {
            csv_path: PathBuf::from("inverter.csv"),
            four_base: 40000,
            order: Some(OrderCode::Cdab),
            default_pad: Pad::Null,
            strict_gaps: true,
            ..Default::default()
        },
    };

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;
    assert_eq!(loaded_config, config);

    // Missing file gets created with defaults
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;
    assert!(non_existent_path.exists());
    assert_eq!(default_config, Config::default());
    assert_eq!(default_config.modbus.baud_rate, 9600);
    assert_eq!(default_config.register_map.four_base, 40001);

    Ok(())
}

#[test]
fn test_partial_config_uses_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        "modbus:\n  port: COM3\n  parity: O\nregister_map:\n  word_order: little\n",
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.modbus.port, "COM3");
    assert_eq!(config.modbus.parity, Parity::Odd);
    assert_eq!(config.modbus.stop_bits, 1);
    assert_eq!(config.register_map.word_order, Endianness::Little);
    assert_eq!(config.register_map.csv_path, PathBuf::from("map.csv"));

    let empty_path = temp_dir.path().join("empty.yaml");
    fs::write(&empty_path, "")?;
    assert_eq!(Config::from_file(&empty_path)?, Config::default());
    Ok(())
}

#[test]
fn test_schema_violations_write_sample() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = tempdir()?;

    for (name, yaml) in [
        ("parity", "modbus:\n  parity: M\n"),
        ("slave", "modbus:\n  slave_id: 0\n"),
        ("order", "register_map:\n  order: ABDC\n"),
        ("unknown", "register_map:\n  colour: blue\n"),
        ("interval", "register_map:\n  reload_interval: -1\n"),
    ] {
        let config_path = temp_dir.path().join(format!("{name}.yaml"));
        fs::write(&config_path, yaml)?;

        let result = Config::from_file(&config_path);
        assert!(result.is_err(), "{name} should fail validation");
        assert!(
            temp_dir.path().join(format!("{name}.sample.yaml")).exists(),
            "{name} should leave a sample next to the file"
        );
    }
    Ok(())
}

#[test]
fn test_specific_rules_reject_bad_base() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "register_map:\n  four_base: 50001\n")?;

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("4xxxx"), "{err}");
    Ok(())
}
