//! chat_core - Core types and configuration for the chat frontend
//!
//! - `config` - backend URLs, token lifetimes, HTTP settings
//! - `conversation` - conversation references, response records, creation status
//! - `paths` - per-user config locations

pub mod config;
pub mod conversation;
pub mod paths;

pub use config::{Config, ConfigError, ProxyAuth};
pub use conversation::{ConversationRef, CreationStatus, CurrentResponse, ResponseRecord};
