use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use caveat_enforcer::{compiler, EnforcerArtifact, EnforcerKind};
use clap::{Parser, Subcommand};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Compile the caveat enforcers and keep a deployments JSON in sync.
///
/// Signing and broadcasting are left to whichever tool submits the creation transactions:
/// `build` writes the `deploy_data` to submit, and `record` stores the address it reports back.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path of the deployments JSON (eg, deployments.devnet.json).
    #[arg(long, env = "DEPLOYMENTS_PATH", default_value = "deployments.devnet.json", global = true)]
    deployments_path: PathBuf,

    /// Network name (eg, devnet, mainnet-fork).
    #[arg(long, env = "NETWORK", default_value = "devnet", global = true)]
    network: String,

    /// Log filter (trace, debug, info, warn, error, or a full `RUST_LOG` directive).
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile enforcers and write their bytecode.
    Build {
        /// Enforcer to build (allowed-targets, allowed-methods, value-limit). Defaults to all.
        #[arg(long = "kind", value_parser = parse_kind)]
        kinds: Vec<EnforcerKind>,
    },
    /// Record the address a deployment reported for an enforcer.
    Record {
        #[arg(long, value_parser = parse_kind)]
        kind: EnforcerKind,

        /// Deployed contract address (0x + 40 hex).
        #[arg(long)]
        address: String,

        /// Creation transaction hash (0x + 64 hex).
        #[arg(long)]
        tx_hash: Option<String>,
    },
}

/// Bytecode entry written under `enforcers.<kind>`.
#[derive(Serialize, Debug, PartialEq, Eq)]
struct EnforcerEntry {
    signature: &'static str,
    selector: String,
    runtime_code: String,
    init_code: String,
    deploy_data: String,
    runtime_size: usize,
}

impl From<&EnforcerArtifact> for EnforcerEntry {
    fn from(artifact: &EnforcerArtifact) -> Self {
        Self {
            signature: artifact.kind.signature(),
            selector: hex_prefixed(artifact.selector.as_slice()),
            runtime_code: hex_prefixed(&artifact.runtime),
            init_code: hex_prefixed(&artifact.init_code),
            deploy_data: hex_prefixed(&artifact.deploy_data()),
            runtime_size: artifact.runtime.len(),
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut root = read_deployments(&cli.deployments_path)?;
    match &cli.command {
        Command::Build { kinds } => {
            let kinds = if kinds.is_empty() {
                EnforcerKind::ALL.to_vec()
            } else {
                kinds.clone()
            };
            for kind in kinds {
                let artifact = compiler::compile(kind);
                apply_build(&mut root, &artifact)?;
                info!(
                    kind = %kind,
                    selector = %artifact.selector,
                    runtime_size = artifact.runtime.len(),
                    "compiled enforcer"
                );
            }
        }
        Command::Record {
            kind,
            address,
            tx_hash,
        } => {
            validate_address(address)?;
            if let Some(hash) = tx_hash {
                validate_tx_hash(hash)?;
            }
            apply_record(&mut root, *kind, address, tx_hash.as_deref())?;
            info!(kind = %kind, address = %address, "recorded deployment");
        }
    }

    stamp(&mut root, &cli.network);
    write_json_atomic(&cli.deployments_path, &root)?;
    info!(path = %cli.deployments_path.display(), "wrote deployments");
    Ok(())
}

fn parse_kind(value: &str) -> Result<EnforcerKind, String> {
    EnforcerKind::from_name(value).ok_or_else(|| {
        let names: Vec<&str> = EnforcerKind::ALL.iter().map(|k| k.name()).collect();
        format!("unknown enforcer `{value}` (expected one of: {})", names.join(", "))
    })
}

fn hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn read_deployments(path: &Path) -> Result<Value> {
    let existing = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?
    } else {
        String::new()
    };

    let root: Value = if existing.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&existing)
            .with_context(|| format!("failed parsing JSON in {}", path.display()))?
    };

    // Ensure root object
    if root.is_object() {
        Ok(root)
    } else {
        warn!(path = %path.display(), "deployments file is not a JSON object, starting fresh");
        Ok(json!({}))
    }
}

fn stamp(root: &mut Value, network: &str) {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    root["network"] = json!(network);
    root["updated_at"] = json!(now);
}

fn enforcers_mut(root: &mut Value) -> &mut Value {
    if root.get("enforcers").and_then(Value::as_object).is_none() {
        root["enforcers"] = json!({});
    }
    &mut root["enforcers"]
}

/// Write the bytecode for `artifact`. A previously recorded address is kept only while the
/// runtime it was deployed with is unchanged.
fn apply_build(root: &mut Value, artifact: &EnforcerArtifact) -> Result<()> {
    let entry = EnforcerEntry::from(artifact);
    let mut fresh = serde_json::to_value(&entry).context("failed serialising enforcer entry")?;

    let slot = &mut enforcers_mut(root)[artifact.kind.name()];
    if let Some(previous) = slot.as_object() {
        let same_runtime = previous.get("runtime_code").and_then(Value::as_str)
            == Some(entry.runtime_code.as_str());
        if same_runtime {
            for key in ["address", "tx_hash", "recorded_at"] {
                if let Some(value) = previous.get(key) {
                    fresh[key] = value.clone();
                }
            }
        } else if previous.contains_key("address") {
            warn!(
                kind = %artifact.kind,
                "runtime changed, dropping recorded address"
            );
        }
    }
    *slot = fresh;
    Ok(())
}

fn apply_record(
    root: &mut Value,
    kind: EnforcerKind,
    address: &str,
    tx_hash: Option<&str>,
) -> Result<()> {
    if root["enforcers"][kind.name()].as_object().is_none() {
        apply_build(root, &compiler::compile(kind))?;
    }
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let entry = enforcers_mut(root)
        .get_mut(kind.name())
        .ok_or_else(|| anyhow!("missing entry for {kind}"))?;
    entry["address"] = json!(address);
    entry["recorded_at"] = json!(now);
    match tx_hash {
        Some(hash) => entry["tx_hash"] = json!(hash),
        None => {
            if let Some(object) = entry.as_object_mut() {
                object.remove("tx_hash");
            }
        }
    }
    Ok(())
}

fn validate_address(address: &str) -> Result<()> {
    let re = Regex::new(r"^0x[a-fA-F0-9]{40}$")?;
    if !re.is_match(address) {
        bail!("invalid address `{address}`: expected 0x followed by 40 hex digits");
    }
    Ok(())
}

fn validate_tx_hash(hash: &str) -> Result<()> {
    let re = Regex::new(r"^0x[a-fA-F0-9]{64}$")?;
    if !re.is_match(hash) {
        bail!("invalid tx hash `{hash}`: expected 0x followed by 64 hex digits");
    }
    Ok(())
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised =
        serde_json::to_string_pretty(value).context("failed serialising deployments JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
