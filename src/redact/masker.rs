//! Registered-secret masking shared by every log sink

use std::io::Write;
use std::sync::{Arc, RwLock};

use crate::redact::rules::{MaskRule, DEFAULT_RULES};

pub const MASK: &str = "***";

/// Replaces registered secrets and credential-shaped text with `***`.
///
/// Clones share the same registry, so a secret registered by the
/// synchronizer is masked by the log writer installed at startup.
#[derive(Clone)]
pub struct SecretMasker {
    secrets: Arc<RwLock<Vec<String>>>,
    rules: Vec<MaskRule>,
    announce_to_runner: bool,
}

impl Default for SecretMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretMasker {
    pub fn new() -> Self {
        Self {
            secrets: Arc::new(RwLock::new(Vec::new())),
            rules: DEFAULT_RULES.clone(),
            announce_to_runner: false,
        }
    }

    /// Masker for the current process; under GitHub Actions registrations are
    /// also announced to the runner so its own log capture masks them.
    pub fn from_env() -> Self {
        let on_actions = std::env::var("GITHUB_ACTIONS")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self::new().with_runner_announcements(on_actions)
    }

    pub fn with_runner_announcements(mut self, enabled: bool) -> Self {
        self.announce_to_runner = enabled;
        self
    }

    pub fn register(&self, secret: impl Into<String>) {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return;
        }
        let mut secrets = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        if secrets.contains(&secret) {
            return;
        }
        if self.announce_to_runner {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "::add-mask::{secret}");
        }
        secrets.push(secret);
        // Longest first so a secret containing another is masked whole.
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    pub fn is_registered(&self, secret: &str) -> bool {
        self.secrets.read().unwrap_or_else(|e| e.into_inner()).iter().any(|s| s == secret)
    }

    pub fn mask(&self, text: &str) -> String {
        let mut masked = text.to_string();
        {
            let secrets = self.secrets.read().unwrap_or_else(|e| e.into_inner());
            for secret in secrets.iter() {
                if masked.contains(secret.as_str()) {
                    masked = masked.replace(secret.as_str(), MASK);
                }
            }
        }
        for rule in &self.rules {
            if rule.pattern.is_match(&masked) {
                masked = rule.pattern.replace_all(&masked, rule.replacement).into_owned();
            }
        }
        masked
    }
}
