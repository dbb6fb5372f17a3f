//! sqlunwrap: recover the source of SQL Server modules created WITH ENCRYPTION
//!
//! Commands:
//!   decrypt <object>...   - decrypt objects from a catalog snapshot
//!   seal                  - encrypt text into an imageval (for building fixtures)
//!   config show           - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use sqlunwrap_core::config::{ConfigSource, UnwrapConfig};
use sqlunwrap_core::{FamilyId, ObjectId, SubObjectId};
use sqlunwrap_crypto::DecodeMode;
use sqlunwrap_recover::{recover_batch, BatchReport, Parallelism, RecoverOptions};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sqlunwrap",
    version,
    about = "Recover the source of encrypted SQL Server modules",
    long_about = "sqlunwrap: derive the per-object RC4 key from the database family GUID and \
                  decrypt procedures, views, functions and triggers created WITH ENCRYPTION"
)]
struct Cli {
    /// Path to config.toml
    #[arg(
        long,
        short = 'c',
        env = "SQLUNWRAP_CONFIG",
        default_value = "~/.config/sqlunwrap/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, env = "SQLUNWRAP_LOG")]
    log: Option<String>,

    /// Log format; overrides config
    #[arg(long, env = "SQLUNWRAP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decrypt one or more objects
    ///
    /// Names follow OBJECT_ID() syntax: `proc`, `schema.proc`,
    /// `db.schema.proc`, with optional [brackets].
    Decrypt {
        /// Object names
        #[arg(required = true)]
        objects: Vec<String>,
        /// Catalog snapshot file (overrides config catalog.snapshot)
        #[arg(long, short = 's', env = "SQLUNWRAP_SNAPSHOT")]
        snapshot: Option<PathBuf>,
        /// Decrypt every fragment, joined in subobjid order
        #[arg(long)]
        all_fragments: bool,
        /// Replace unpaired surrogates with U+FFFD instead of failing
        #[arg(long)]
        lossy: bool,
        /// Recover objects concurrently
        #[arg(long)]
        parallel: bool,
        /// Output format (overrides config output.format)
        #[arg(long, short = 'f')]
        format: Option<OutputFormat>,
    },

    /// Encrypt module text into an imageval, printed as 0x-hex
    Seal {
        /// Family GUID (text form) or 0x-hex binary(16)
        #[arg(long)]
        family: String,
        /// Object id
        #[arg(long)]
        id: u32,
        /// Fragment discriminator
        #[arg(long, default_value_t = 0)]
        subobjid: u16,
        /// Prefix the UTF-16 text with a byte-order mark
        #[arg(long)]
        bom: bool,
        /// File with the module text (default: stdin)
        input: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let (config, config_source) = UnwrapConfig::load(&config_path)?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(f) => f,
        None => parse_log_format(&config.log.format)?,
    };
    init_logging(&level, format);
    if config_source == ConfigSource::Defaults {
        tracing::warn!(path = %config_path.display(), "config file not found, using defaults");
    }

    match cli.command {
        Commands::Decrypt {
            objects,
            snapshot,
            all_fragments,
            lossy,
            parallel,
            format,
        } => {
            let snapshot = snapshot
                .or_else(|| config.catalog.snapshot.clone())
                .context("no catalog snapshot; use --snapshot or set catalog.snapshot in config")?;
            let format = match format {
                Some(f) => f,
                None => parse_output_format(&config.output.format)?,
            };
            let opts = RecoverOptions {
                all_fragments: all_fragments || config.recover.all_fragments,
                decode_mode: if lossy || config.recover.lossy {
                    DecodeMode::Lossy
                } else {
                    DecodeMode::Strict
                },
            };
            let parallelism = if parallel || config.recover.parallel {
                Parallelism::Parallel
            } else {
                Parallelism::Sequential
            };
            cmd_decrypt(&expand_tilde(&snapshot), &objects, opts, parallelism, format)
        }
        Commands::Seal {
            family,
            id,
            subobjid,
            bom,
            input,
        } => cmd_seal(&family, id, subobjid, bom, input.as_deref()),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path, config_source),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries recovered source only
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat> {
    LogFormat::from_str(value, true)
        .map_err(|_| anyhow::anyhow!("log.format must be \"text\" or \"json\", got \"{value}\""))
}

fn parse_output_format(value: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(value, true)
        .map_err(|_| anyhow::anyhow!("output.format must be \"text\" or \"json\", got \"{value}\""))
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

// ── `sqlunwrap decrypt` ───────────────────────────────────────────────────────

fn cmd_decrypt(
    snapshot: &Path,
    objects: &[String],
    opts: RecoverOptions,
    parallelism: Parallelism,
    format: OutputFormat,
) -> Result<()> {
    let catalog = sqlunwrap_catalog::load_snapshot(snapshot)?;
    let report = recover_batch(&catalog, objects, opts, parallelism);

    let all_ok = match format {
        OutputFormat::Text => {
            write_text_report(&report, &mut io::stdout().lock(), &mut io::stderr().lock())
                .context("writing recovered source")?
        }
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&report.summary())
                .context("serializing recovery report")?;
            println!("{rendered}");
            report.all_succeeded()
        }
    };

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Recovered source to `out`, one `sqlunwrap: <name>: <error>` line per
/// failure to `err`. Returns whether every object was recovered.
fn write_text_report(
    report: &BatchReport,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<bool> {
    let with_headers = report.outcomes.len() > 1;
    let mut all_ok = true;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(obj) => {
                if with_headers {
                    writeln!(out, "-- object: {} (id {})", obj.name, obj.object_id)?;
                }
                writeln!(out, "{}", obj.text)?;
            }
            Err(e) => {
                all_ok = false;
                writeln!(err, "sqlunwrap: {}: {e}", outcome.name)?;
            }
        }
    }
    out.flush()?;
    Ok(all_ok)
}

// ── `sqlunwrap seal` ──────────────────────────────────────────────────────────

fn cmd_seal(family: &str, id: u32, subobjid: u16, bom: bool, input: Option<&Path>) -> Result<()> {
    let family_bytes = sqlunwrap_catalog::parse_family_guid(family).context("--family")?;
    let family = FamilyId::from_slice(&family_bytes).context("--family")?;

    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    println!("0x{}", seal_hex(&family, id, subobjid, bom, &text));
    Ok(())
}

fn seal_hex(family: &FamilyId, id: u32, subobjid: u16, bom: bool, text: &str) -> String {
    let key = sqlunwrap_crypto::derive_key(family, ObjectId(id), SubObjectId(subobjid));
    let ciphertext = sqlunwrap_crypto::encrypt(key, &sqlunwrap_crypto::encode_utf16le(text, bom));
    tracing::debug!(object_id = id, subobjid, bytes = ciphertext.len(), "sealed module text");
    hex::encode(ciphertext)
}

// ── `sqlunwrap config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &UnwrapConfig, path: &Path, source: ConfigSource) -> Result<()> {
    print!("{}", render_config(config, path, source)?);
    Ok(())
}

/// Effective configuration as TOML, headed by where it came from.
fn render_config(config: &UnwrapConfig, path: &Path, source: ConfigSource) -> Result<String> {
    let origin = match source {
        ConfigSource::File => format!("# loaded from {}", path.display()),
        ConfigSource::Defaults => format!("# built-in defaults ({} not found)", path.display()),
    };
    let body = toml::to_string_pretty(config).context("serializing config to TOML")?;
    Ok(format!("# sqlunwrap effective configuration\n{origin}\n\n{body}"))
}
