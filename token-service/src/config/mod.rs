use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    pub common: core_config::Config,
    /// Label reported by the status endpoint.
    pub version: String,
    /// Key that unlocks the unmasked credential listing. `None` disables reveal.
    pub admin_key: Option<Secret<String>>,
    /// Directory scanned for fallback credential files.
    pub credentials_dir: PathBuf,
}

impl TokenServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let credentials_dir = match non_empty_env("CREDENTIALS_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir()?,
        };

        Ok(TokenServiceConfig {
            common: common_config,
            version: non_empty_env("VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            admin_key: admin_key_from(non_empty_env("ADMIN_KEY")),
            credentials_dir,
        })
    }

    pub fn reveal_enabled(&self) -> bool {
        self.admin_key.is_some()
    }
}

/// Wrap a configured admin key, treating an empty value as unset.
pub fn admin_key_from(value: Option<String>) -> Option<Secret<String>> {
    value.filter(|key| !key.is_empty()).map(Secret::new)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn empty_admin_key_disables_reveal() {
        assert!(admin_key_from(Some(String::new())).is_none());
        assert!(admin_key_from(None).is_none());
    }

    #[test]
    fn admin_key_is_kept_secret() {
        let key = admin_key_from(Some("hunter2".to_string())).unwrap();
        assert_eq!(key.expose_secret(), "hunter2");
        assert!(!format!("{:?}", key).contains("hunter2"));
    }
}
