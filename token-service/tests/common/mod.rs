use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::path::PathBuf;
use token_service::config::{TokenServiceConfig, DEFAULT_VERSION};
use token_service::services::{CredentialLoader, CredentialStore};
use token_service::startup::{build_router, AppState, Application};

pub const ADMIN_KEY: &str = "test-admin-key";

pub fn test_config(admin_key: Option<&str>) -> TokenServiceConfig {
    TokenServiceConfig {
        common: CoreConfig { port: 0 },
        version: DEFAULT_VERSION.to_string(),
        admin_key: admin_key.map(|key| Secret::new(key.to_string())),
        credentials_dir: PathBuf::from("."),
    }
}

/// Resolve credentials from a fake environment with no fallback files.
pub fn credentials_from_env(vars: &[(&str, &str)]) -> CredentialStore {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    CredentialLoader::from_env(
        vars.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        dir.path(),
    )
    .resolve()
}

pub fn router(credentials: CredentialStore, admin_key: Option<&str>) -> axum::Router {
    build_router(AppState::new(test_config(admin_key), credentials))
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn(credentials: CredentialStore, admin_key: Option<&str>) -> Self {
        let app = Application::build_with_credentials(test_config(admin_key), credentials)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
