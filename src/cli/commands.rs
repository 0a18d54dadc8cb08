//! CLI command implementations
//!
//! Every command follows the same sequence:
//! 1. Configuration Load
//! 2. Schema Load
//! 3. Manifest Parse and Build
//! 4. Command output on stdout
//!
//! Log lines go to stderr.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::manifest::{Manifest, ManifestError};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::SchemaLoader;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_text, write_response, write_text};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory of schema files (required)
    pub schema_dir: String,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pretty-print JSON output (optional, default true)
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_pretty() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_dir.trim().is_empty() {
            return Err(CliError::config_error("schema_dir must not be empty"));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    pub fn schema_path(&self) -> &Path {
        Path::new(&self.schema_dir)
    }
}

/// Loaded config, schema catalog and built manifest for one command
pub struct Session {
    pub config: Config,
    pub schemas: SchemaLoader,
    pub source: String,
    pub manifest: Manifest,
}

impl Session {
    pub fn open(config_path: &Path, manifest_path: &Path) -> CliResult<Self> {
        let config = Config::load(config_path)?;
        Logger::set_min_severity(config.severity()?);
        let path = config_path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.as_str()), ("log_level", config.log_level.as_str())],
        );

        let mut schemas = SchemaLoader::new(config.schema_path());
        schemas.load_all()?;
        let count = schemas.schema_count().to_string();
        log_event_with_fields(Event::SchemasLoaded, &[("count", count.as_str())]);

        let source = read_text(manifest_path)?;
        let manifest = Manifest::parse(&source, &schemas)?;

        Ok(Self {
            config,
            schemas,
            source,
            manifest,
        })
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let name = cli.command.name();
    run_command(cli.command).map_err(|e| {
        log_event_with_fields(
            Event::CommandFailed,
            &[("command", name), ("code", e.code_str())],
        );
        e
    })
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { manifest, config } => check(&config, &manifest),
        Command::Fmt {
            manifest,
            config,
            write,
        } => fmt(&config, &manifest, write),
        Command::Ingress { manifest, config } => ingress(&config, &manifest),
        Command::Capabilities { manifest, config } => capabilities(&config, &manifest),
    }
}

/// Validate a manifest and print a per-policy summary
pub fn check(config_path: &Path, manifest_path: &Path) -> CliResult<()> {
    let session = Session::open(config_path, manifest_path)?;
    write_response(check_report(&session.manifest), session.config.pretty)
}

/// Print or rewrite a manifest in canonical form
pub fn fmt(config_path: &Path, manifest_path: &Path, write: bool) -> CliResult<()> {
    let session = Session::open(config_path, manifest_path)?;
    let canonical = session.manifest.to_manifest_string();
    let changed = canonical != session.source;

    log_event_with_fields(
        Event::ManifestFormatted,
        &[
            ("changed", if changed { "true" } else { "false" }),
            ("write", if write { "true" } else { "false" }),
        ],
    );

    if !write {
        return write_text(&canonical);
    }
    if changed {
        fs::write(manifest_path, canonical).map_err(|e| {
            CliError::io_error(format!("Failed to write {}: {}", manifest_path.display(), e))
        })?;
    }
    Ok(())
}

/// Print the merged ingress schemas
pub fn ingress(config_path: &Path, manifest_path: &Path) -> CliResult<()> {
    let session = Session::open(config_path, manifest_path)?;
    let report = ingress_report(&session)?;
    write_response(report, session.config.pretty)
}

/// Print capability sets per policy target
pub fn capabilities(config_path: &Path, manifest_path: &Path) -> CliResult<()> {
    let session = Session::open(config_path, manifest_path)?;
    write_response(capabilities_report(&session.manifest), session.config.pretty)
}

pub fn check_report(manifest: &Manifest) -> Value {
    let policies: Vec<Value> = manifest
        .policies()
        .iter()
        .map(|policy| {
            let targets: Vec<&str> = policy.targets.iter().map(|t| t.schema_name.as_str()).collect();
            let configs: Vec<&str> = policy.configs.iter().map(|c| c.name.as_str()).collect();
            json!({
                "name": policy.name,
                "description": policy.description,
                "egress_type": policy.egress_type,
                "targets": targets,
                "configs": configs,
                "fields": policy.all_fields().len(),
                "redaction_labels": policy.all_redaction_labels(),
            })
        })
        .collect();

    json!({ "valid": true, "policies": policies })
}

pub fn ingress_report(session: &Session) -> CliResult<Value> {
    let validation = session
        .manifest
        .ingress_validation(&session.schemas)
        .map_err(ManifestError::from)?;
    Ok(serde_json::to_value(&validation)?)
}

pub fn capabilities_report(manifest: &Manifest) -> Value {
    let mut rows = Vec::new();
    for policy in manifest.policies() {
        for target in &policy.targets {
            let sets = target.to_capabilities();
            let display: Vec<String> = sets.iter().map(ToString::to_string).collect();
            rows.push(json!({
                "policy": policy.name,
                "target": target.schema_name,
                "capabilities": sets,
                "display": display,
            }));
        }
    }
    Value::Array(rows)
}
