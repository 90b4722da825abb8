// crates/care-access-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, bounded reads, and filtering.
// Purpose: Ensure CLI inputs fail closed and audit events reach the sink.
// Dependencies: care-access-cli main helpers
// ============================================================================

//! ## Overview
//! Validates argument parsing, `read_bytes_with_limit` size enforcement, and
//! the filter path end to end, including the audit forwarder drain.
//!
//! Security posture: CLI inputs are untrusted; size limits must fail closed.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use care_access_audit::MemoryFilterAuditSink;
use care_access_config::CareAccessConfig;
use care_access_core::AccessScope;
use care_access_core::AuditSeverity;
use care_access_core::FilterOutcome;
use care_access_core::UserIdentity;
use care_access_core::ViolationKind;
use clap::Parser;
use serde_json::Value;
use serde_json::json;

use super::AuditPipeline;
use super::Cli;
use super::Commands;
use super::ReadLimitError;
use super::derive_context;
use super::filter_rows;
use super::load_config;
use super::read_bytes_with_limit;
use super::read_json_file;
use super::resolve_and_filter;
use super::verify_context;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn identity(value: &Value) -> UserIdentity {
    serde_json::from_value(value.clone()).unwrap()
}

fn clinic_manager() -> UserIdentity {
    identity(&json!({
        "user_id": "alice",
        "granted_permissions": ["analytics:read:organization"],
        "accessible_organizations": [{ "id": "org-1", "practice_ids": [1] }]
    }))
}

fn quiet_config() -> CareAccessConfig {
    CareAccessConfig::from_toml("[audit]\nsink = \"none\"\n").unwrap()
}

fn rows() -> Vec<Value> {
    vec![
        json!({ "practice_id": 1, "provider_id": 7, "revenue": 120 }),
        json!({ "practice_id": 2, "provider_id": 8, "revenue": 80 }),
        json!({ "practice_id": null, "provider_id": null, "revenue": 5 }),
    ]
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn parses_filter_with_optional_arguments() {
    let cli = Cli::try_parse_from([
        "care-access",
        "filter",
        "--identity",
        "identity.json",
        "--rows",
        "rows.json",
        "--context",
        "context.json",
        "--config",
        "care-access.toml",
    ])
    .unwrap();
    let Commands::Filter(command) = cli.command else {
        panic!("expected filter command");
    };
    assert_eq!(command.rows, PathBuf::from("rows.json"));
    assert_eq!(command.context, Some(PathBuf::from("context.json")));
    assert_eq!(command.config.config, Some(PathBuf::from("care-access.toml")));
}

#[test]
fn verify_requires_both_files() {
    assert!(Cli::try_parse_from(["care-access", "verify", "--identity", "id.json"]).is_err());
    assert!(Cli::try_parse_from(["care-access", "context"]).is_err());
    assert!(Cli::try_parse_from(["care-access"]).is_err());
}

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

#[test]
fn read_bytes_with_limit_rejects_oversized_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.json");
    fs::write(&path, vec![b' '; 17]).unwrap();
    let err = read_bytes_with_limit(&path, 16).unwrap_err();
    assert!(matches!(
        err,
        ReadLimitError::TooLarge {
            size: 17,
            limit: 16
        }
    ));
    assert_eq!(read_bytes_with_limit(&path, 17).unwrap().len(), 17);
}

#[test]
fn read_json_file_names_the_input_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("identity.json");
    fs::write(&path, br#"{"user_id":"alice","granted_permissions":["analytics:read"]}"#).unwrap();
    let err = read_json_file::<UserIdentity>(&path, "identity", 1024).unwrap_err();
    assert!(err.to_string().starts_with("invalid identity json"));

    let missing = dir.path().join("absent.json");
    let err = read_json_file::<UserIdentity>(&missing, "identity", 1024).unwrap_err();
    assert!(err.to_string().starts_with("failed to read identity file"));
}

#[test]
fn load_config_uses_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("care-access.toml");
    fs::write(&path, "[access]\nresource = \"reporting\"\n").unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.resource().as_str(), "reporting");

    fs::write(&path, "[access]\nunknown = 1\n").unwrap();
    assert!(load_config(Some(&path)).unwrap_err().to_string().contains("config parse error"));
}

// ============================================================================
// SECTION: Contexts
// ============================================================================

#[test]
fn derived_context_round_trips_through_verify() {
    let config = quiet_config();
    let identity = clinic_manager();
    let audit = MemoryFilterAuditSink::new();
    let context = derive_context(&config, &identity, 0, &audit).unwrap();
    assert_eq!(context.permission_scope(), AccessScope::Organization);

    let wire = serde_json::to_vec(&context).unwrap();
    let claimed = serde_json::from_slice(&wire).unwrap();
    let verified = verify_context(&config, claimed, &identity, 0, &audit).unwrap();
    assert_eq!(verified, context);
    assert!(audit.is_empty());
}

#[test]
fn widened_context_is_forbidden_and_audited() {
    let config = quiet_config();
    let identity = clinic_manager();
    let audit = MemoryFilterAuditSink::new();
    let mut claimed = derive_context(&config, &identity, 0, &audit).unwrap().into_unverified();
    claimed.permission_scope = AccessScope::All;
    claimed.accessible_practice_ids.clear();
    claimed.organization_ids.clear();

    let err = verify_context(&config, claimed, &identity, 3, &audit).unwrap_err();
    assert_eq!(err.to_string(), "access forbidden");
    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, FilterOutcome::Violation);
    assert_eq!(events[0].severity, AuditSeverity::Critical);
    assert_eq!(events[0].violation_kind, Some(ViolationKind::AllScopeNotGranted));
    assert_eq!(events[0].scope, AccessScope::All);
    assert_eq!(events[0].rows_in, 3);
    assert!(events[0].detail.is_some());
}

#[test]
fn filter_with_foreign_context_is_forbidden_and_audited() {
    let config = quiet_config();
    let identity = clinic_manager();
    let audit = Arc::new(MemoryFilterAuditSink::new());
    let mut claimed = derive_context(&config, &identity, 0, audit.as_ref()).unwrap().into_unverified();
    claimed.user_id = "mallory".into();

    let err = resolve_and_filter(&config, &identity, Some(claimed), &rows(), audit.clone())
        .unwrap_err();
    assert_eq!(err.to_string(), "access forbidden");
    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].violation_kind, Some(ViolationKind::IdentityMismatch));
    assert_eq!(events[0].user_id.as_str(), "mallory");
}

// ============================================================================
// SECTION: Filtering
// ============================================================================

#[test]
fn filter_keeps_practice_rows_only() {
    let config = quiet_config();
    let audit = Arc::new(MemoryFilterAuditSink::new());
    let visible =
        resolve_and_filter(&config, &clinic_manager(), None, &rows(), audit.clone()).unwrap();
    assert_eq!(visible, vec![json!({ "practice_id": 1, "provider_id": 7, "revenue": 120 })]);
    assert_eq!(audit.events()[0].outcome, FilterOutcome::Filtered);
}

#[test]
fn custom_row_keys_are_honored() {
    let config = CareAccessConfig::from_toml(
        "[access]\npractice_key = \"clinic\"\nprovider_key = \"clinician\"\n\n[audit]\nsink = \"none\"\n",
    )
    .unwrap();
    let audit = Arc::new(MemoryFilterAuditSink::new());
    let context = derive_context(&config, &clinic_manager(), 0, audit.as_ref()).unwrap();
    let rows = vec![json!({ "clinic": 1 }), json!({ "practice_id": 1 })];
    let visible = filter_rows(&config, &context, &rows, audit).unwrap();
    assert_eq!(visible, vec![json!({ "clinic": 1 })]);
}

// ============================================================================
// SECTION: Audit Pipeline
// ============================================================================

fn file_audit_config(log: &std::path::Path) -> CareAccessConfig {
    CareAccessConfig::from_toml(&format!(
        "[audit]\nsink = \"file\"\npath = \"{}\"\n",
        log.display()
    ))
    .unwrap()
}

fn read_events(log: &std::path::Path) -> Vec<Value> {
    fs::read_to_string(log)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_drains_filter_events_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");
    let config = file_audit_config(&log);
    let pipeline = AuditPipeline::start(&config).unwrap();
    let visible = resolve_and_filter(&config, &clinic_manager(), None, &rows(), pipeline.sink());
    pipeline.finish().await.unwrap();
    assert_eq!(visible.unwrap().len(), 1);

    let events = read_events(&log);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["user_id"], "alice");
    assert_eq!(events[0]["rows_in"], 3);
    assert_eq!(events[0]["rows_out"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_records_rejected_external_context() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");
    let config = file_audit_config(&log);
    let identity = clinic_manager();
    let mut claimed =
        derive_context(&config, &identity, 0, &MemoryFilterAuditSink::new()).unwrap().into_unverified();
    claimed.permission_scope = AccessScope::All;
    claimed.accessible_practice_ids.clear();

    let pipeline = AuditPipeline::start(&config).unwrap();
    let result = verify_context(&config, claimed, &identity, 0, pipeline.sink().as_ref());
    pipeline.finish().await.unwrap();
    assert!(result.is_err());

    let events = read_events(&log);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["outcome"], "violation");
    assert_eq!(events[0]["severity"], "critical");
    assert_eq!(events[0]["violation_kind"], "all_scope_not_granted");
}
