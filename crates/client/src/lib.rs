//! Dailyfeed client: session lifecycle and resilient HTTP access to the
//! backend services.
//!
//! The two pieces that matter are [`SessionStore`], custodian of the bearer
//! token and the cached user snapshot, and [`HttpClient`], which attaches
//! the token to every call, reacts to the two server signal headers
//! (`X-Token-Refresh-Needed`, `X-Relogin-Required`), coordinates a
//! single-flight token refresh, and retries the original request once with
//! the new token. Everything else is typed pass-through to the member,
//! content, timeline, activity, image, and search services.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod refresh;
pub mod session;
pub mod token;

pub use api::UploadedImage;
pub use config::ServicesConfig;
pub use error::ClientError;
pub use http::{
    FilePart, HttpClient, HttpClientBuilder, RequestSpec, REFRESH_NEEDED_HEADER,
    RELOGIN_REQUIRED_HEADER,
};
pub use session::SessionStore;
