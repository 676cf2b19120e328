pub mod credential;

pub use credential::{normalize_entries, CredentialEntry, CredentialRecord, MaskedCredentialView};
