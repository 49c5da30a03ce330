//! Flat-file configuration store.
//!
//! Persists credentials and client settings as one `KEY=VALUE` pair per line.
//! The store keeps an in-memory overlay guarded by a [`tokio::sync::RwLock`];
//! every mutation rewrites the whole backing file and replaces the overlay so
//! later reads in the same process observe the change. Concurrent writers in
//! separate processes race last-write-wins.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

pub const API_KEY: &str = "API_KEY";
pub const GRAPHQL_ENDPOINT: &str = "GRAPHQL_ENDPOINT";
pub const ORGANIZATION_ID: &str = "ORGANIZATION_ID";
pub const USER_ID: &str = "USER_ID";
pub const TIMEOUT: &str = "TIMEOUT";
pub const RETRIES: &str = "RETRIES";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RETRIES: u32 = 3;

const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 30_000;
const MAX_RETRIES: u32 = 5;

const CANONICAL_KEYS: [&str; 6] = [
    API_KEY,
    GRAPHQL_ENDPOINT,
    ORGANIZATION_ID,
    USER_ID,
    TIMEOUT,
    RETRIES,
];

const PLACEHOLDER_MARKERS: [&str; 3] = ["your_", "placeholder", "_here"];

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    Io(io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing required setting: {name}"),
            Self::OutOfRange {
                name,
                value,
                min,
                max,
            } => write!(f, "{name} must be between {min} and {max} (got {value})"),
            Self::Io(err) => write!(f, "config file error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Missing(_) | Self::OutOfRange { .. } => None,
        }
    }
}

/// Required remote-API credentials resolved from the store.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub endpoint: String,
    pub organization_id: String,
    pub user_id: String,
}

/// Partial update merged into the persisted record.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub api_key: Option<String>,
    pub graphql_endpoint: Option<String>,
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
}

/// Read-only per-field presence and validity report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatus {
    pub is_configured: bool,
    pub is_fully_configured: bool,
    pub has_api_key: bool,
    pub has_graphql_endpoint: bool,
    pub has_organization_id: bool,
    pub has_user_id: bool,
    pub api_key_valid: bool,
    pub organization_id_valid: bool,
    pub user_id_valid: bool,
    pub timeout_ms: u64,
    pub retries: u32,
}

/// Display snapshot with the API key masked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDisplay {
    pub api_key: String,
    pub graphql_endpoint: String,
    pub organization_id: String,
    pub user_id: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub complete: bool,
}

/// Flat-file configuration store with an in-memory overlay.
pub struct ConfigStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl ConfigStore {
    /// Opens the store, loading the backing file when it exists.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let values = if path.exists() {
            parse_record(&std::fs::read_to_string(&path).map_err(ConfigError::Io)?)
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the value for `key` when present and non-empty.
    pub async fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().await;
        values
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Returns the value for `key`, failing when absent or empty.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] when the key has no usable value.
    pub async fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).await.ok_or(ConfigError::Missing(key))
    }

    /// Resolves the full credential set.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] for the first absent field.
    pub async fn credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials {
            api_key: self.require(API_KEY).await?,
            endpoint: self.require(GRAPHQL_ENDPOINT).await?,
            organization_id: self.require(ORGANIZATION_ID).await?,
            user_id: self.require(USER_ID).await?,
        })
    }

    pub async fn is_configured(&self) -> bool {
        self.credentials().await.is_ok()
    }

    /// Request timeout from the stored `TIMEOUT` setting (milliseconds).
    pub async fn timeout(&self) -> Duration {
        let millis = self
            .get(TIMEOUT)
            .await
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Duration::from_millis(millis)
    }

    /// Transport retry budget from the stored `RETRIES` setting.
    pub async fn retries(&self) -> u32 {
        self.get(RETRIES)
            .await
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_RETRIES)
    }

    /// Validates and merges `update` into the record, rewrites the backing
    /// file, and replaces the in-memory overlay. Returns the labels of the
    /// fields that changed.
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] for an invalid timeout or retry
    /// count, or [`ConfigError::Io`] when the file cannot be written.
    pub async fn apply(&self, update: ConfigUpdate) -> Result<Vec<&'static str>, ConfigError> {
        if let Some(timeout_ms) = update.timeout_ms {
            if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout_ms) {
                return Err(ConfigError::OutOfRange {
                    name: TIMEOUT,
                    value: timeout_ms,
                    min: MIN_TIMEOUT_MS,
                    max: MAX_TIMEOUT_MS,
                });
            }
        }
        if let Some(retries) = update.retries {
            if retries > MAX_RETRIES {
                return Err(ConfigError::OutOfRange {
                    name: RETRIES,
                    value: u64::from(retries),
                    min: 0,
                    max: u64::from(MAX_RETRIES),
                });
            }
        }

        let mut values = self.values.write().await;
        let mut merged = values.clone();
        let mut updated = Vec::new();
        if let Some(api_key) = update.api_key {
            merged.insert(API_KEY.to_string(), api_key);
            updated.push("API Key");
        }
        if let Some(endpoint) = update.graphql_endpoint {
            merged.insert(GRAPHQL_ENDPOINT.to_string(), endpoint);
            updated.push("GraphQL Endpoint");
        }
        if let Some(organization_id) = update.organization_id {
            merged.insert(ORGANIZATION_ID.to_string(), organization_id);
            updated.push("Organization ID");
        }
        if let Some(user_id) = update.user_id {
            merged.insert(USER_ID.to_string(), user_id);
            updated.push("User ID");
        }
        if let Some(timeout_ms) = update.timeout_ms {
            merged.insert(TIMEOUT.to_string(), timeout_ms.to_string());
            updated.push("Timeout");
        }
        if let Some(retries) = update.retries {
            merged.insert(RETRIES.to_string(), retries.to_string());
            updated.push("Retries");
        }

        self.write_record(&merged).await?;
        *values = merged;
        info!("configuration updated: {}", updated.join(", "));
        Ok(updated)
    }

    /// Overwrites the record with fixed defaults: empty credentials,
    /// `TIMEOUT=30000`, `RETRIES=3`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be written.
    pub async fn reset(&self) -> Result<(), ConfigError> {
        let defaults = default_record();
        let mut values = self.values.write().await;
        self.write_record(&defaults).await?;
        *values = defaults;
        info!("configuration reset to defaults");
        Ok(())
    }

    pub async fn status(&self) -> ConfigStatus {
        let values = self.values.read().await;
        let field = |key: &str| {
            values
                .get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let api_key = field(API_KEY);
        let endpoint = field(GRAPHQL_ENDPOINT);
        let organization_id = field(ORGANIZATION_ID);
        let user_id = field(USER_ID);

        let valid = |value: &Option<String>| {
            value.as_deref().is_some_and(|value| !is_placeholder(value))
        };
        let has_api_key = api_key.is_some();
        let has_graphql_endpoint = endpoint.is_some();
        let has_organization_id = organization_id.is_some();
        let has_user_id = user_id.is_some();
        let api_key_valid = valid(&api_key);
        let organization_id_valid = valid(&organization_id);
        let user_id_valid = valid(&user_id);
        let is_configured =
            has_api_key && has_graphql_endpoint && has_organization_id && has_user_id;

        ConfigStatus {
            is_configured,
            is_fully_configured: is_configured
                && api_key_valid
                && organization_id_valid
                && user_id_valid,
            has_api_key,
            has_graphql_endpoint,
            has_organization_id,
            has_user_id,
            api_key_valid,
            organization_id_valid,
            user_id_valid,
            timeout_ms: parse_or(&values, TIMEOUT, DEFAULT_TIMEOUT_MS),
            retries: parse_or(&values, RETRIES, DEFAULT_RETRIES),
        }
    }

    pub async fn display(&self) -> ConfigDisplay {
        let status = self.status().await;
        let values = self.values.read().await;
        let field = |key: &str| values.get(key).cloned().unwrap_or_default();
        ConfigDisplay {
            api_key: mask_api_key(&field(API_KEY)),
            graphql_endpoint: field(GRAPHQL_ENDPOINT),
            organization_id: field(ORGANIZATION_ID),
            user_id: field(USER_ID),
            timeout_ms: status.timeout_ms,
            retries: status.retries,
            complete: status.is_configured,
        }
    }

    async fn write_record(&self, values: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        tokio::fs::write(&self.path, render_record(values))
            .await
            .map_err(ConfigError::Io)
    }
}

/// Masks an API key for display, keeping only the last four characters.
#[must_use]
pub fn mask_api_key(api_key: &str) -> String {
    if api_key.is_empty() {
        return String::new();
    }
    let count = api_key.chars().count();
    if count <= 4 {
        return "***".to_string();
    }
    let tail: String = api_key.chars().skip(count - 4).collect();
    format!("***{tail}")
}

/// Whether a value matches a known template default.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| value.contains(marker))
}

fn parse_or<T: std::str::FromStr>(values: &BTreeMap<String, String>, key: &str, default: T) -> T {
    values
        .get(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_record(raw: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    values
}

fn render_record(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for key in CANONICAL_KEYS {
        if let Some(value) = values.get(key) {
            let _ = writeln!(out, "{key}={value}");
        }
    }
    for (key, value) in values {
        if !CANONICAL_KEYS.contains(&key.as_str()) {
            let _ = writeln!(out, "{key}={value}");
        }
    }
    out
}

fn default_record() -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    values.insert(API_KEY.to_string(), String::new());
    values.insert(GRAPHQL_ENDPOINT.to_string(), String::new());
    values.insert(ORGANIZATION_ID.to_string(), String::new());
    values.insert(USER_ID.to_string(), String::new());
    values.insert(TIMEOUT.to_string(), DEFAULT_TIMEOUT_MS.to_string());
    values.insert(RETRIES.to_string(), DEFAULT_RETRIES.to_string());
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir().join(format!("orgkit-config-{}.env", uuid::Uuid::new_v4()))
    }

    fn open_store() -> ConfigStore {
        ConfigStore::open(temp_store_path()).expect("store should open")
    }

    async fn configure(store: &ConfigStore) {
        store
            .apply(ConfigUpdate {
                api_key: Some("sk-live-abcdef1234".to_string()),
                graphql_endpoint: Some("https://api.example.com/graphql".to_string()),
                organization_id: Some("org_42".to_string()),
                user_id: Some("user_7".to_string()),
                ..ConfigUpdate::default()
            })
            .await
            .expect("update should apply");
    }

    #[test]
    fn masks_long_api_keys_to_last_four() {
        assert_eq!(mask_api_key("sk-live-abcdef1234"), "***1234");
    }

    #[test]
    fn masks_short_api_keys_entirely() {
        assert_eq!(mask_api_key("abcd"), "***");
        assert_eq!(mask_api_key("a"), "***");
        assert_eq!(mask_api_key(""), "");
    }

    #[test]
    fn detects_placeholder_values() {
        assert!(is_placeholder("your_api_key"));
        assert!(is_placeholder("placeholder-id"));
        assert!(is_placeholder("org_id_here"));
        assert!(!is_placeholder("org_42"));
    }

    #[test]
    fn parses_record_skipping_comments_and_blanks() {
        let values = parse_record("# comment\n\nAPI_KEY=abc\nTIMEOUT = 5000\nbroken-line\n");
        assert_eq!(values.get("API_KEY").map(String::as_str), Some("abc"));
        assert_eq!(values.get("TIMEOUT").map(String::as_str), Some("5000"));
        assert_eq!(values.len(), 2);
    }

    #[tokio::test]
    async fn require_fails_for_absent_key() {
        let store = open_store();
        let err = store.require(API_KEY).await.expect_err("should be missing");
        assert!(matches!(err, ConfigError::Missing(API_KEY)));
    }

    #[tokio::test]
    async fn is_configured_false_when_any_credential_missing() {
        let store = open_store();
        configure(&store).await;
        assert!(store.is_configured().await);

        store
            .apply(ConfigUpdate {
                user_id: Some(String::new()),
                ..ConfigUpdate::default()
            })
            .await
            .expect("update should apply");
        assert!(!store.is_configured().await);
    }

    #[tokio::test]
    async fn rejects_timeout_below_minimum() {
        let store = open_store();
        let err = store
            .apply(ConfigUpdate {
                timeout_ms: Some(999),
                ..ConfigUpdate::default()
            })
            .await
            .expect_err("timeout below range should fail");
        assert!(matches!(err, ConfigError::OutOfRange { name: TIMEOUT, .. }));
    }

    #[tokio::test]
    async fn accepts_timeout_boundaries_inclusive() {
        let store = open_store();
        for timeout_ms in [1_000, 30_000] {
            store
                .apply(ConfigUpdate {
                    timeout_ms: Some(timeout_ms),
                    ..ConfigUpdate::default()
                })
                .await
                .expect("boundary timeout should apply");
        }
        assert_eq!(store.timeout().await, Duration::from_millis(30_000));
    }

    #[tokio::test]
    async fn rejects_retries_above_maximum() {
        let store = open_store();
        let err = store
            .apply(ConfigUpdate {
                retries: Some(6),
                ..ConfigUpdate::default()
            })
            .await
            .expect_err("retries above range should fail");
        assert!(matches!(err, ConfigError::OutOfRange { name: RETRIES, .. }));
    }

    #[tokio::test]
    async fn apply_merges_and_reloads_overlay() {
        let store = open_store();
        configure(&store).await;
        let updated = store
            .apply(ConfigUpdate {
                organization_id: Some("org_new".to_string()),
                ..ConfigUpdate::default()
            })
            .await
            .expect("update should apply");
        assert_eq!(updated, vec!["Organization ID"]);
        assert_eq!(store.get(ORGANIZATION_ID).await.as_deref(), Some("org_new"));
        assert_eq!(store.get(USER_ID).await.as_deref(), Some("user_7"));
    }

    #[tokio::test]
    async fn apply_persists_across_reopen() {
        let path = temp_store_path();
        let store = ConfigStore::open(&path).expect("store should open");
        store
            .apply(ConfigUpdate {
                api_key: Some("sk-live-abcdef1234".to_string()),
                ..ConfigUpdate::default()
            })
            .await
            .expect("update should apply");

        let reopened = ConfigStore::open(&path).expect("store should reopen");
        assert_eq!(
            reopened.get(API_KEY).await.as_deref(),
            Some("sk-live-abcdef1234")
        );
    }

    #[tokio::test]
    async fn status_flags_placeholder_credentials() {
        let store = open_store();
        configure(&store).await;
        store
            .apply(ConfigUpdate {
                api_key: Some("your_api_key_here".to_string()),
                ..ConfigUpdate::default()
            })
            .await
            .expect("update should apply");

        let status = store.status().await;
        assert!(status.is_configured);
        assert!(!status.is_fully_configured);
        assert!(status.has_api_key);
        assert!(!status.api_key_valid);
        assert!(status.organization_id_valid);
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let store = open_store();
        configure(&store).await;
        store.reset().await.expect("reset should succeed");

        assert!(store.get(API_KEY).await.is_none());
        let status = store.status().await;
        assert!(!status.is_configured);
        assert_eq!(status.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(status.retries, DEFAULT_RETRIES);
    }

    #[tokio::test]
    async fn display_masks_api_key() {
        let store = open_store();
        configure(&store).await;
        let display = store.display().await;
        assert_eq!(display.api_key, "***1234");
        assert!(display.complete);
    }
}
