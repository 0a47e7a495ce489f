pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::infra::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub paseto_access_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub mutation_max_retries: u32,
}
