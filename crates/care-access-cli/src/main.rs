// crates/care-access-cli/src/main.rs
// ============================================================================
// Module: Care Access CLI Entry Point
// Description: Command dispatcher for offline context derivation and filtering.
// Purpose: Build, verify, and apply security contexts over JSON files.
// Dependencies: care-access-core, care-access-audit, care-access-config, clap,
//               tokio
// ============================================================================

//! ## Overview
//! The `care-access` binary reads a caller identity from JSON and either
//! prints its derived security context, verifies a context received from
//! elsewhere, or filters a JSON array of rows for that caller. Output is JSON
//! on stdout.
//!
//! Filter audit events, including contexts rejected before any filtering,
//! flow through a bounded channel into the sink selected by configuration.
//! The forwarder is drained before any output is written.
//!
//! Security posture: every input file is untrusted and size-limited. Rejected
//! contexts print only the generic "access forbidden" message; the diagnostic
//! goes to the audit sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use care_access_audit::ChannelFilterAuditSink;
use care_access_audit::FileFilterAuditSink;
use care_access_audit::StderrFilterAuditSink;
use care_access_audit::spawn_audit_forwarder;
use care_access_config::AuditConfig;
use care_access_config::AuditSinkKind;
use care_access_config::CONFIG_ENV_VAR;
use care_access_config::CareAccessConfig;
use care_access_config::DEFAULT_CONFIG_NAME;
use care_access_core::FilterAuditEvent;
use care_access_core::FilterAuditSink;
use care_access_core::NoopFilterAuditSink;
use care_access_core::RowFilterEngine;
use care_access_core::ScopeIntegrityValidator;
use care_access_core::ScopeResolver;
use care_access_core::SecurityContext;
use care_access_core::SecurityContextBuilder;
use care_access_core::SecurityViolation;
use care_access_core::UnverifiedSecurityContext;
use care_access_core::UserIdentity;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum identity file size in bytes.
const MAX_IDENTITY_BYTES: usize = 1024 * 1024;
/// Maximum context file size in bytes.
const MAX_CONTEXT_BYTES: usize = 1024 * 1024;
/// Maximum rows file size in bytes.
const MAX_ROWS_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "care-access", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive and print the security context for an identity.
    Context(ContextCommand),
    /// Verify a serialized context against the identity it claims.
    Verify(VerifyCommand),
    /// Filter a JSON array of rows for an identity.
    Filter(FilterCommand),
}

/// Shared configuration selection.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Config file path (defaults to `CARE_ACCESS_CONFIG`, then
    /// `care-access.toml`, then built-in defaults).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Arguments for `context`.
#[derive(Args, Debug)]
struct ContextCommand {
    /// Identity JSON file.
    #[arg(long, value_name = "FILE")]
    identity: PathBuf,
    /// Config selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Serialized context JSON file.
    #[arg(long, value_name = "FILE")]
    context: PathBuf,
    /// Authoritative identity JSON file.
    #[arg(long, value_name = "FILE")]
    identity: PathBuf,
    /// Config selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for `filter`.
#[derive(Args, Debug)]
struct FilterCommand {
    /// Identity JSON file.
    #[arg(long, value_name = "FILE")]
    identity: PathBuf,
    /// JSON array of rows to filter.
    #[arg(long, value_name = "FILE")]
    rows: PathBuf,
    /// Serialized context to verify and use instead of deriving one.
    #[arg(long, value_name = "FILE")]
    context: Option<PathBuf>,
    /// Config selection.
    #[command(flatten)]
    config: ConfigArgs,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<SecurityViolation> for CliError {
    fn from(violation: SecurityViolation) -> Self {
        // Display is the generic message; kind and detail stay out of output.
        Self::new(violation.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Context(command) => command_context(&command).await,
        Commands::Verify(command) => command_verify(&command).await,
        Commands::Filter(command) => command_filter(&command).await,
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Prints the derived context for an identity.
async fn command_context(command: &ContextCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let identity: UserIdentity =
        read_json_file(&command.identity, "identity", MAX_IDENTITY_BYTES)?;
    let audit = AuditPipeline::start(&config)?;
    let context = derive_context(&config, &identity, 0, audit.sink().as_ref());
    audit.finish().await?;
    write_json(&context?)?;
    Ok(ExitCode::SUCCESS)
}

/// Verifies a serialized context and prints the verified form.
async fn command_verify(command: &VerifyCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let claimed: UnverifiedSecurityContext =
        read_json_file(&command.context, "context", MAX_CONTEXT_BYTES)?;
    let identity: UserIdentity =
        read_json_file(&command.identity, "identity", MAX_IDENTITY_BYTES)?;
    let audit = AuditPipeline::start(&config)?;
    let context = verify_context(&config, claimed, &identity, 0, audit.sink().as_ref());
    audit.finish().await?;
    write_json(&context?)?;
    Ok(ExitCode::SUCCESS)
}

/// Filters rows for an identity and prints the visible rows.
async fn command_filter(command: &FilterCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let identity: UserIdentity =
        read_json_file(&command.identity, "identity", MAX_IDENTITY_BYTES)?;
    let claimed: Option<UnverifiedSecurityContext> = match &command.context {
        Some(path) => Some(read_json_file(path, "context", MAX_CONTEXT_BYTES)?),
        None => None,
    };
    let rows: Vec<Value> = read_json_file(&command.rows, "rows", MAX_ROWS_BYTES)?;
    let audit = AuditPipeline::start(&config)?;
    let visible = resolve_and_filter(&config, &identity, claimed, &rows, audit.sink());
    audit.finish().await?;
    write_json(&visible?)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Access Helpers
// ============================================================================

/// Builds a validated context for `identity`, auditing a rejection.
fn derive_context(
    config: &CareAccessConfig,
    identity: &UserIdentity,
    rows_in: usize,
    audit: &dyn FilterAuditSink,
) -> CliResult<SecurityContext> {
    SecurityContextBuilder::new(config.resource()).build(identity).map_err(|violation| {
        let scope = ScopeResolver::new(config.resource()).resolve(identity);
        audit.record(&FilterAuditEvent::rejected(
            identity.user_id.clone(),
            scope,
            rows_in,
            &violation,
        ));
        CliError::from(violation)
    })
}

/// Verifies a claimed context against the authoritative identity, auditing a
/// rejection.
fn verify_context(
    config: &CareAccessConfig,
    claimed: UnverifiedSecurityContext,
    identity: &UserIdentity,
    rows_in: usize,
    audit: &dyn FilterAuditSink,
) -> CliResult<SecurityContext> {
    let user_id = claimed.user_id.clone();
    let scope = claimed.permission_scope;
    ScopeIntegrityValidator::new(config.resource()).verify_external(claimed, identity).map_err(
        |violation| {
            audit.record(&FilterAuditEvent::rejected(user_id, scope, rows_in, &violation));
            CliError::from(violation)
        },
    )
}

/// Verifies `claimed` when present, otherwise derives a context, then filters.
fn resolve_and_filter(
    config: &CareAccessConfig,
    identity: &UserIdentity,
    claimed: Option<UnverifiedSecurityContext>,
    rows: &[Value],
    audit: Arc<dyn FilterAuditSink>,
) -> CliResult<Vec<Value>> {
    let context = match claimed {
        Some(claimed) => verify_context(config, claimed, identity, rows.len(), audit.as_ref())?,
        None => derive_context(config, identity, rows.len(), audit.as_ref())?,
    };
    filter_rows(config, &context, rows, audit)
}

/// Filters `rows` through an engine reporting to `audit`.
fn filter_rows(
    config: &CareAccessConfig,
    context: &SecurityContext,
    rows: &[Value],
    audit: Arc<dyn FilterAuditSink>,
) -> CliResult<Vec<Value>> {
    let engine = RowFilterEngine::new(config.resource(), audit).with_policy(config.audit_policy());
    Ok(engine.filter_json(rows, &config.row_keys(), context)?)
}

// ============================================================================
// SECTION: Audit Pipeline
// ============================================================================

/// Channel sink feeding the configured audit target through a forwarder.
struct AuditPipeline {
    /// Non-blocking sink handed to the access helpers.
    sink: Arc<ChannelFilterAuditSink>,
    /// Forwarder draining the channel into the target.
    forwarder: JoinHandle<u64>,
}

impl AuditPipeline {
    /// Opens the configured target and spawns the forwarder.
    fn start(config: &CareAccessConfig) -> CliResult<Self> {
        let target = audit_target(&config.audit)?;
        let (sink, receiver) = ChannelFilterAuditSink::bounded(config.audit.channel_capacity);
        Ok(Self {
            sink: Arc::new(sink),
            forwarder: spawn_audit_forwarder(receiver, target),
        })
    }

    /// Returns the sink as a trait object.
    fn sink(&self) -> Arc<dyn FilterAuditSink> {
        Arc::<ChannelFilterAuditSink>::clone(&self.sink)
    }

    /// Closes the channel and waits for every queued event to be written.
    ///
    /// Every clone returned by [`AuditPipeline::sink`] must be dropped first,
    /// otherwise the forwarder never observes the channel closing.
    async fn finish(self) -> CliResult<()> {
        let Self {
            sink,
            forwarder,
        } = self;
        let dropped = sink.dropped();
        drop(sink);
        forwarder
            .await
            .map_err(|err| CliError::new(format!("audit forwarder failed: {err}")))?;
        if dropped > 0 {
            write_stderr_line(&format!("audit events dropped: {dropped}"))
                .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        }
        Ok(())
    }
}

/// Opens the audit sink named by configuration.
fn audit_target(config: &AuditConfig) -> CliResult<Arc<dyn FilterAuditSink>> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(Arc::new(StderrFilterAuditSink)),
        AuditSinkKind::None => Ok(Arc::new(NoopFilterAuditSink)),
        AuditSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                CliError::new("audit.path is required when audit.sink is file".to_string())
            })?;
            let sink = FileFilterAuditSink::new(path).map_err(|err| {
                CliError::new(format!("failed to open audit log {}: {err}", path.display()))
            })?;
            Ok(Arc::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Config Helpers
// ============================================================================

/// Loads configuration, falling back to defaults when no source exists.
fn load_config(path: Option<&Path>) -> CliResult<CareAccessConfig> {
    let has_source = path.is_some()
        || std::env::var_os(CONFIG_ENV_VAR).is_some()
        || Path::new(DEFAULT_CONFIG_NAME).is_file();
    if !has_source {
        return Ok(CareAccessConfig::default());
    }
    CareAccessConfig::load(path).map_err(|err| CliError::new(err.to_string()))
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads and decodes a JSON input file.
fn read_json_file<T: DeserializeOwned>(path: &Path, kind: &str, max_bytes: usize) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {kind} file {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{kind} file {} exceeds size limit ({size} > {limit} bytes)",
            path.display()
        )),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid {kind} json in {}: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a value to stdout as pretty JSON followed by a newline.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| CliError::new(format!("failed to encode output: {err}")))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

#[cfg(test)]
mod main_tests;
