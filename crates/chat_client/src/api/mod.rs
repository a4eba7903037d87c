pub mod client;
pub mod models;

pub use client::BackendClient;
pub use models::{BackendUser, LoginResponse, RawResponse, RefreshResponse};
