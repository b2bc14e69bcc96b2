// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_modbus_sim::config::{self, Config};
use std::fs;
use std::sync::Once;
use tempfile::tempdir;

static INIT: Once = Once::new();

fn setup() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

#[test]
fn test_type_mismatch_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let invalid_yaml = r#"
modbus:
  baud_rate: "fast"     # Integer field with string value
  port: 12345           # String field with number value
  enabled: "true"       # Boolean field with string value
register_map:
  strict_gaps: []       # Array instead of boolean
"#;
    fs::write(&config_path, invalid_yaml)?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");

    let sample_path = config_path.with_extension("sample.yaml");
    assert!(sample_path.exists(), "Sample config file was not created");

    // The sample itself is a valid configuration holding the defaults
    let sample_config = Config::from_file(&sample_path)?;
    assert_eq!(sample_config, Config::default());

    Ok(())
}

#[test]
fn test_out_of_range_values_create_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("serial.yaml");

    let invalid_config = r#"
modbus:
  data_bits: 9
  stop_bits: 3
  timeout: 0
"#;
    fs::write(&config_path, invalid_config)?;

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(
        err.to_string().contains("validation failed"),
        "unexpected error: {err}"
    );
    assert!(temp_dir.path().join("serial.sample.yaml").exists());

    Ok(())
}

#[test]
fn test_malformed_yaml_is_reported() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("broken.yaml");
    fs::write(&config_path, "modbus: [unclosed\n")?;

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse YAML"), "{err}");
    Ok(())
}

#[test]
fn test_config_schema_output() -> Result<()> {
    config::output_config_schema()?;
    Ok(())
}
