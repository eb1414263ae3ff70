//! Layered input loading: defaults < config file < environment < CLI

use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

use super::inputs::RawInputs;
use super::merge::{merge_cli_with_config, CliOverrides};

pub const ENV_PREFIX: &str = "SOURCE_SYNC_";

/// Table that may wrap the inputs inside a shared config file.
const NESTED_SECTION: &str = "source-sync";

const CONFIG_CANDIDATES: [&str; 3] = ["source-sync.toml", ".source-sync.toml", "source-sync.yml"];

/// Read from the environment verbatim; figment's env parsing turns `1.10` into `1.1`.
const TEXT_KEYS: [&str; 7] = ["repository", "ref", "commit", "path", "workspace", "token", "server_url"];

/// Keys that are not inputs at all.
const NON_INPUT_KEYS: [&str; 2] = ["config", "state_dir"];

pub fn load_inputs(
    workspace: Option<&Path>,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<RawInputs> {
    let mut figment = Figment::from(Serialized::defaults(RawInputs::default()));

    match config_path {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(file_layer(path)?);
        }
        None => {
            if let Some(found) = workspace.and_then(discover_config) {
                // Auto-discovered files are advisory: a broken one is skipped.
                match file_layer(&found) {
                    Ok(layer) => figment = figment.merge(layer),
                    Err(e) => tracing::warn!(
                        "Failed to parse auto-discovered config {}: {:#}",
                        found.display(),
                        e
                    ),
                }
            }
        }
    }

    let ignored: Vec<&str> = NON_INPUT_KEYS.iter().chain(TEXT_KEYS.iter()).copied().collect();
    figment = figment
        .merge(Env::prefixed(ENV_PREFIX).ignore(&ignored))
        .merge(Serialized::defaults(env_text_inputs()));
    figment = merge_cli_with_config(figment, overrides);

    figment.extract().context("Invalid inputs")
}

/// A validated figment holding just one config file.
fn file_layer(path: &Path) -> Result<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let layer = match ext.as_str() {
        "toml" => Figment::from(Toml::file(path)),
        "yaml" | "yml" => Figment::from(Yaml::file(path)),
        other => bail!("Unsupported config extension '.{}' for file {}", other, path.display()),
    };
    let layer = if layer.find_value(NESTED_SECTION).is_ok() {
        layer.focus(NESTED_SECTION)
    } else {
        layer
    };
    layer
        .extract::<RawInputs>()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(layer)
}

/// The text inputs set as `SOURCE_SYNC_*` variables, exactly as written.
fn env_text_inputs() -> CliOverrides {
    let var = |key: &str| std::env::var(format!("{ENV_PREFIX}{}", key.to_ascii_uppercase())).ok();
    CliOverrides {
        repository: var("repository"),
        git_ref: var("ref"),
        commit: var("commit"),
        path: var("path"),
        workspace: var("workspace"),
        token: var("token"),
        server_url: var("server_url"),
        ..CliOverrides::default()
    }
}

fn discover_config(workspace: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(|name| workspace.join(name)).find(|path| path.is_file())
}
