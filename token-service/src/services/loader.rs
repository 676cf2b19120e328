//! Startup credential resolution.
//!
//! Credentials come from exactly one source, tried in priority order:
//!
//! 1. `TOKENS`, a JSON array of strings or `{ token | value, channelIds }` objects
//! 2. `TOKEN_<n>` variables, ordered by their numeric suffix
//! 3. the first fallback file (`tokens.json`, `tokens.js.orig`, `config.json`)
//!    that holds a usable array
//!
//! The first source yielding at least one record wins. Source failures are
//! logged and never abort startup; an empty result is a valid configuration.

use crate::models::{normalize_entries, CredentialRecord, MaskedCredentialView};
use crate::services::masking::masked_views;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const BULK_ENV_VAR: &str = "TOKENS";

pub const FALLBACK_FILES: [&str; 3] = ["tokens.json", "tokens.js.orig", "config.json"];

static INDEXED_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^TOKEN_(\d+)$").expect("indexed credential regex should compile"));

// Shortest bracketed span, possibly across lines.
static ARRAY_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*?\]").expect("array literal regex should compile"));

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("{origin} is not valid JSON: {source}")]
    InvalidJson {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not a JSON array")]
    NotAnArray(String),

    #[error("no array literal found in {0}")]
    NoArray(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One place credentials may be configured.
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce this source's records. An empty list means "nothing here".
    fn load(&self) -> Result<Vec<CredentialRecord>, LoaderError>;
}

/// JSON array held in a single environment variable.
#[derive(Debug, Clone, Default)]
pub struct BulkEnvSource {
    raw: Option<String>,
}

impl BulkEnvSource {
    pub fn new(raw: Option<String>) -> Self {
        Self {
            raw: raw.filter(|r| !r.is_empty()),
        }
    }
}

impl CredentialSource for BulkEnvSource {
    fn name(&self) -> &'static str {
        "bulk-env"
    }

    fn load(&self) -> Result<Vec<CredentialRecord>, LoaderError> {
        let Some(raw) = &self.raw else {
            return Ok(Vec::new());
        };

        let parsed: Value =
            serde_json::from_str(raw).map_err(|source| LoaderError::InvalidJson {
                origin: BULK_ENV_VAR.to_string(),
                source,
            })?;

        match parsed {
            Value::Array(items) => Ok(normalize_entries(items)),
            _ => Err(LoaderError::NotAnArray(BULK_ENV_VAR.to_string())),
        }
    }
}

/// `TOKEN_1`, `TOKEN_2`, ... environment variables.
#[derive(Debug, Clone, Default)]
pub struct IndexedEnvSource {
    vars: Vec<(String, String)>,
}

impl IndexedEnvSource {
    pub fn new(vars: Vec<(String, String)>) -> Self {
        Self { vars }
    }
}

impl CredentialSource for IndexedEnvSource {
    fn name(&self) -> &'static str {
        "indexed-env"
    }

    fn load(&self) -> Result<Vec<CredentialRecord>, LoaderError> {
        let mut matches: Vec<(u128, &str)> = self
            .vars
            .iter()
            .filter_map(|(key, value)| {
                let captures = INDEXED_VAR.captures(key)?;
                // Digit runs too long for u128 sort last.
                let index = captures[1].parse::<u128>().unwrap_or(u128::MAX);
                Some((index, value.as_str()))
            })
            .collect();

        // Stable: equal suffixes (TOKEN_1 / token_01) keep declaration order.
        matches.sort_by_key(|(index, _)| *index);

        Ok(matches
            .into_iter()
            .map(|(_, value)| CredentialRecord::new(value))
            .collect())
    }
}

/// Candidate files in a directory, first usable one wins.
#[derive(Debug, Clone)]
pub struct FileScanSource {
    dir: PathBuf,
    candidates: Vec<String>,
}

impl FileScanSource {
    pub fn new(dir: impl Into<PathBuf>, candidates: &[&str]) -> Self {
        Self {
            dir: dir.into(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn load_file(&self, path: &Path) -> Result<Vec<CredentialRecord>, LoaderError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LoaderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_credential_file(&raw, &path.display().to_string())
    }
}

impl CredentialSource for FileScanSource {
    fn name(&self) -> &'static str {
        "file-scan"
    }

    fn load(&self) -> Result<Vec<CredentialRecord>, LoaderError> {
        for candidate in &self.candidates {
            let path = self.dir.join(candidate);
            if !path.is_file() {
                continue;
            }

            match self.load_file(&path) {
                Ok(records) if !records.is_empty() => {
                    tracing::info!(file = %path.display(), "Loaded credentials from fallback file");
                    return Ok(records);
                }
                Ok(_) => {
                    tracing::debug!(file = %path.display(), "Fallback file holds no credentials")
                }
                Err(e) => {
                    tracing::debug!(file = %path.display(), error = %e, "Skipping fallback file")
                }
            }
        }

        Ok(Vec::new())
    }
}

/// Parse a fallback file: strict JSON first, then the first array literal in
/// the text with single quotes rewritten to double quotes.
///
/// Strict JSON that parses but is not an array is not searched further.
pub fn parse_credential_file(raw: &str, origin: &str) -> Result<Vec<CredentialRecord>, LoaderError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(normalize_entries(items)),
        Ok(_) => Err(LoaderError::NotAnArray(origin.to_string())),
        Err(_) => {
            let literal = ARRAY_LITERAL
                .find(raw)
                .ok_or_else(|| LoaderError::NoArray(origin.to_string()))?;
            let cleaned = literal.as_str().replace('\'', "\"");

            match serde_json::from_str::<Value>(&cleaned) {
                Ok(Value::Array(items)) => Ok(normalize_entries(items)),
                Ok(_) => Err(LoaderError::NotAnArray(origin.to_string())),
                Err(source) => Err(LoaderError::InvalidJson {
                    origin: origin.to_string(),
                    source,
                }),
            }
        }
    }
}

/// Ordered chain of credential sources.
pub struct CredentialLoader {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialLoader {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Standard chain over an environment snapshot and a fallback directory.
    pub fn from_env<I>(vars: I, credentials_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let bulk = vars
            .iter()
            .find(|(key, _)| key == BULK_ENV_VAR)
            .map(|(_, value)| value.clone());

        Self::new(vec![
            Box::new(BulkEnvSource::new(bulk)),
            Box::new(IndexedEnvSource::new(vars)),
            Box::new(FileScanSource::new(credentials_dir, &FALLBACK_FILES)),
        ])
    }

    /// Standard chain over the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are ignored.
    pub fn from_process_env(credentials_dir: impl Into<PathBuf>) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Self::from_env(vars, credentials_dir)
    }

    pub fn resolve(&self) -> CredentialStore {
        for source in &self.sources {
            match source.load() {
                Ok(records) if !records.is_empty() => {
                    tracing::info!(
                        source = source.name(),
                        count = records.len(),
                        "Loaded credentials"
                    );
                    return CredentialStore::new(records);
                }
                Ok(_) => tracing::debug!(source = source.name(), "Credential source is empty"),
                Err(e) => tracing::warn!(
                    source = source.name(),
                    error = %e,
                    "Credential source failed; trying next"
                ),
            }
        }

        tracing::info!("No credentials configured");
        CredentialStore::default()
    }
}

/// Read-only credential list shared by all handlers.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    records: Arc<[CredentialRecord]>,
}

impl CredentialStore {
    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self {
            records: Arc::from(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CredentialRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn masked(&self) -> Vec<MaskedCredentialView> {
        masked_views(&self.records)
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
