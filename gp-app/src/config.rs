//! Runtime settings for groq-probe, taken from the environment.
//!
//! There is no config file; every knob has a default and an env override.

use gp_llm::DEFAULT_BASE_URL;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProbeConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(v) = lookup("GROQ_BASE_URL") {
            if !v.trim().is_empty() {
                self.base_url = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("GROQ_PROBE_MODEL") {
            if !v.trim().is_empty() {
                self.model = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("GROQ_PROBE_TIMEOUT_SECS") {
            if !v.trim().is_empty() {
                self.timeout_secs = v.trim().parse().map_err(|e| {
                    anyhow::anyhow!("parse GROQ_PROBE_TIMEOUT_SECS={v:?}: {e}")
                })?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "GROQ_BASE_URL must start with http:// or https:// (got {:?})",
                self.base_url
            ));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow::anyhow!("GROQ_PROBE_TIMEOUT_SECS must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = ProbeConfig::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(cfg, ProbeConfig::default());
        assert_eq!(cfg.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(cfg.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn overrides_are_trimmed_and_blank_values_ignored() {
        let cfg = ProbeConfig::from_lookup(lookup_from(&[
            ("GROQ_BASE_URL", " http://127.0.0.1:8080/v1 "),
            ("GROQ_PROBE_MODEL", "   "),
            ("GROQ_PROBE_TIMEOUT_SECS", "5"),
        ]))
        .expect("config");
        assert_eq!(cfg.base_url, "http://127.0.0.1:8080/v1");
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn zero_or_garbage_timeout_is_rejected() {
        assert!(
            ProbeConfig::from_lookup(lookup_from(&[("GROQ_PROBE_TIMEOUT_SECS", "0")])).is_err()
        );
        assert!(
            ProbeConfig::from_lookup(lookup_from(&[("GROQ_PROBE_TIMEOUT_SECS", "soon")])).is_err()
        );
    }

    #[test]
    fn base_url_needs_a_scheme() {
        let err = ProbeConfig::from_lookup(lookup_from(&[("GROQ_BASE_URL", "api.groq.com")]))
            .expect_err("invalid");
        assert!(err.to_string().contains("GROQ_BASE_URL"));
    }
}
