//! Dailyfeed core types and utilities

pub mod error;
pub mod storage;
pub mod types;

pub use error::{CoreError, CoreResult};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
pub use storage::{keys, MemoryStorage, SessionStorage};
pub use types::{AuthUser, LoginCredentials};
