//! Bearer credential resolution: `GROQ_API_KEY` first, then the first positional argument.

use std::fmt;
use thiserror::Error;

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

pub const USAGE: &str = "ERROR: GROQ_API_KEY environment variable not set
Usage: GROQ_API_KEY='your-key' groq-probe
   or: groq-probe 'your-key'";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no API key: set GROQ_API_KEY or pass the key as the first argument")]
    Missing,
}

/// A resolved, non-empty API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First and last four characters, for logs.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return "***".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

pub fn resolve(env_value: Option<&str>, args: &[String]) -> Result<Credential, CredentialError> {
    let from_env = env_value.filter(|v| !v.trim().is_empty());
    let from_args = args.first().map(String::as_str).filter(|v| !v.trim().is_empty());
    from_env
        .or(from_args)
        .map(|v| Credential(v.to_string()))
        .ok_or(CredentialError::Missing)
}
