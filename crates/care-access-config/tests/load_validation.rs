//! Config load validation tests for care-access-config.
// crates/care-access-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section validation.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use care_access_config::AuditSinkKind;
use care_access_config::CareAccessConfig;
use care_access_config::ConfigError;
use care_access_core::ResourceName;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<CareAccessConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

// ============================================================================
// SECTION: Load Guards
// ============================================================================

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(CareAccessConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        CareAccessConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&vec![b'#'; 1_048_577]).map_err(|err| err.to_string())?;
    assert_invalid(CareAccessConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(CareAccessConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reports_missing_file_as_io() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let missing = dir.path().join("absent.toml");
    assert_invalid(CareAccessConfig::load(Some(&missing)), "config io error")
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config("")?;
    let config = CareAccessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != CareAccessConfig::default() {
        return Err("empty config should equal defaults".to_string());
    }
    if config.resource() != ResourceName::analytics() {
        return Err("default resource should be analytics".to_string());
    }
    if config.row_keys().practice_key != "practice_id" {
        return Err("default practice key should be practice_id".to_string());
    }
    if !config.audit_policy().emit_passthrough {
        return Err("passthrough events should be emitted by default".to_string());
    }
    if config.cache.ttl() != Duration::from_secs(300) {
        return Err("default ttl should be five minutes".to_string());
    }
    Ok(())
}

#[test]
fn full_config_parses() -> TestResult {
    let config = CareAccessConfig::from_toml(
        r#"
[access]
resource = "reporting"
practice_key = "clinic"
provider_key = "clinician"

[audit]
sink = "file"
path = "/var/log/care-access/audit.jsonl"
emit_passthrough = false
channel_capacity = 64

[cache]
ttl_ms = 60000
max_entries = 10
"#,
    )
    .map_err(|err| err.to_string())?;
    if config.resource().as_str() != "reporting" {
        return Err("resource not applied".to_string());
    }
    if config.row_keys().provider_key != "clinician" {
        return Err("provider key not applied".to_string());
    }
    if config.audit.sink != AuditSinkKind::File
        || config.audit.path != Some(PathBuf::from("/var/log/care-access/audit.jsonl"))
    {
        return Err("file sink not applied".to_string());
    }
    if config.audit_policy().emit_passthrough {
        return Err("emit_passthrough not applied".to_string());
    }
    if config.cache.max_entries != 10 {
        return Err("max_entries not applied".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

#[test]
fn rejects_unknown_fields() -> TestResult {
    assert_invalid(CareAccessConfig::from_toml("[access]\nscope = \"all\"\n"), "config parse error")?;
    assert_invalid(CareAccessConfig::from_toml("[server]\n"), "config parse error")
}

#[test]
fn rejects_invalid_resource() -> TestResult {
    assert_invalid(
        CareAccessConfig::from_toml("[access]\nresource = \"Analytics\"\n"),
        "config parse error",
    )?;
    assert_invalid(CareAccessConfig::from_toml("[access]\nresource = \"\"\n"), "config parse error")
}

#[test]
fn rejects_bad_row_keys() -> TestResult {
    assert_invalid(
        CareAccessConfig::from_toml("[access]\npractice_key = \"\"\n"),
        "access.practice_key",
    )?;
    assert_invalid(
        CareAccessConfig::from_toml("[access]\nprovider_key = \"practice_id\"\n"),
        "must differ",
    )
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(CareAccessConfig::from_toml("[audit]\nsink = \"file\"\n"), "audit.path is required")
}

#[test]
fn path_forbidden_without_file_sink() -> TestResult {
    assert_invalid(
        CareAccessConfig::from_toml("[audit]\nsink = \"none\"\npath = \"audit.jsonl\"\n"),
        "audit.path is only allowed",
    )
}

#[test]
fn rejects_unknown_sink() -> TestResult {
    assert_invalid(CareAccessConfig::from_toml("[audit]\nsink = \"syslog\"\n"), "config parse error")
}

#[test]
fn channel_capacity_bounds() -> TestResult {
    assert_invalid(
        CareAccessConfig::from_toml("[audit]\nchannel_capacity = 0\n"),
        "audit.channel_capacity",
    )?;
    assert_invalid(
        CareAccessConfig::from_toml("[audit]\nchannel_capacity = 65537\n"),
        "audit.channel_capacity",
    )?;
    CareAccessConfig::from_toml("[audit]\nchannel_capacity = 65536\n")
        .map(|_| ())
        .map_err(|err| err.to_string())
}

#[test]
fn cache_bounds() -> TestResult {
    assert_invalid(CareAccessConfig::from_toml("[cache]\nttl_ms = 999\n"), "cache.ttl_ms")?;
    assert_invalid(CareAccessConfig::from_toml("[cache]\nttl_ms = 86400001\n"), "cache.ttl_ms")?;
    assert_invalid(CareAccessConfig::from_toml("[cache]\nmax_entries = 0\n"), "cache.max_entries")?;
    CareAccessConfig::from_toml("[cache]\nttl_ms = 1000\nmax_entries = 1048576\n")
        .map(|_| ())
        .map_err(|err| err.to_string())
}
