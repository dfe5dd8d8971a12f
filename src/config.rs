use crate::error::ConfigError;
use cil_shared::ROUTES_TABLE;
use std::time::Duration;

// =========================================================
// Runtime configuration
// =========================================================

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_ROUTES_TABLE: &str = "CIL_ROUTES_TABLE";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "CIL_FETCH_TIMEOUT_SECS";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Backend location and fetch policy.
///
/// The backend URL and the anon key have no defaults; the table name and
/// timeout fall back to the values above when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Project URL without a trailing slash, e.g. `https://xyz.supabase.co`
    pub supabase_url: String,
    pub anon_key: String,
    pub routes_table: String,
    pub fetch_timeout: Duration,
}

impl RuntimeConfig {
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            routes_table: ROUTES_TABLE.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let supabase_url = read(ENV_SUPABASE_URL).ok_or(ConfigError::Missing(ENV_SUPABASE_URL))?;
        if !(supabase_url.starts_with("http://") || supabase_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: ENV_SUPABASE_URL,
                value: supabase_url,
                reason: "expected an http(s) URL".to_string(),
            });
        }

        let anon_key =
            read(ENV_SUPABASE_ANON_KEY).ok_or(ConfigError::Missing(ENV_SUPABASE_ANON_KEY))?;

        let mut config = Self::new(supabase_url.trim(), anon_key.trim());

        if let Some(table) = read(ENV_ROUTES_TABLE) {
            config.routes_table = table.trim().to_string();
        }

        if let Some(raw) = read(ENV_FETCH_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: ENV_FETCH_TIMEOUT_SECS,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: ENV_FETCH_TIMEOUT_SECS,
                    value: raw,
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            config.fetch_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// PostgREST endpoint of the routes table.
    pub fn routes_endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.supabase_url, self.routes_table)
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (ENV_SUPABASE_URL, "https://demo.supabase.co/"),
            (ENV_SUPABASE_ANON_KEY, "anon"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.routes_table, "cil_routes");
        assert_eq!(config.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(
            config.routes_endpoint(),
            "https://demo.supabase.co/rest/v1/cil_routes"
        );
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (ENV_SUPABASE_URL, "http://localhost:54321"),
            (ENV_SUPABASE_ANON_KEY, "anon"),
            (ENV_ROUTES_TABLE, "cil_routes_v2"),
            (ENV_FETCH_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.routes_table, "cil_routes_v2");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_url() {
        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_SUPABASE_ANON_KEY, "anon")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_SUPABASE_URL));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let err = RuntimeConfig::from_lookup(lookup_from(&[
            (ENV_SUPABASE_URL, "https://demo.supabase.co"),
            (ENV_SUPABASE_ANON_KEY, "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_SUPABASE_ANON_KEY));
    }

    #[test]
    fn test_invalid_timeout() {
        for raw in ["abc", "0"] {
            let err = RuntimeConfig::from_lookup(lookup_from(&[
                (ENV_SUPABASE_URL, "https://demo.supabase.co"),
                (ENV_SUPABASE_ANON_KEY, "anon"),
                (ENV_FETCH_TIMEOUT_SECS, raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: ENV_FETCH_TIMEOUT_SECS, .. }));
        }
    }

    #[test]
    fn test_url_scheme_checked() {
        let err = RuntimeConfig::from_lookup(lookup_from(&[
            (ENV_SUPABASE_URL, "demo.supabase.co"),
            (ENV_SUPABASE_ANON_KEY, "anon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_SUPABASE_URL, .. }));
    }
}
