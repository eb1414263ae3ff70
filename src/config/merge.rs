//! CLI overrides, the top configuration layer

use figment::providers::Serialized;
use figment::Figment;
use serde::Serialize;

/// Values given on the command line. Unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_depth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_credentials: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submodules: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

/// Merge the overrides on top of everything already in `figment`.
pub fn merge_cli_with_config(figment: Figment, overrides: &CliOverrides) -> Figment {
    figment.merge(Serialized::defaults(overrides))
}
