pub mod loader;
pub mod masking;
pub mod metrics;

pub use loader::{
    BulkEnvSource, CredentialLoader, CredentialSource, CredentialStore, FileScanSource,
    IndexedEnvSource, LoaderError, BULK_ENV_VAR, FALLBACK_FILES,
};
pub use masking::{mask_token, masked_views};
pub use self::metrics::{get_metrics, init_metrics, record_simulated_send};
