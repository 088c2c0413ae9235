use std::path::Path;

use terravet_config::{load_run_config, ConfigError};

#[test]
fn load_valid_fixture() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/terravet.yml");
    let cfg = load_run_config(&path).expect("should load without error");

    assert!(cfg.module_dir.ends_with("modules/vnet"));
    assert_eq!(cfg.location, "eastus");
    assert_eq!(cfg.name_prefix, "vet");
    assert_eq!(cfg.binary, "terraform");
    assert!(!cfg.skip_provision);
}

#[test]
fn defaults_fill_optional_fields() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/minimal.yml");
    let cfg = load_run_config(&path).expect("should load without error");

    assert_eq!(cfg.location, "eastus");
    assert_eq!(cfg.name_prefix, "terravet");
    assert_eq!(cfg.binary, "terraform");
}

#[test]
fn unknown_binary_is_rejected() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/bad_binary.yml");
    let err = load_run_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "got: {err}");
}

#[test]
fn missing_file_returns_io_error() {
    let err = load_run_config(Path::new("/nonexistent/terravet.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
}
