//! Hytale server authentication.
//!
//! A dedicated server needs a short-lived game session bound to a purchased
//! profile. The session is obtained with an OAuth2 access token, which comes
//! either from a cached refresh token or from an interactive device-code
//! grant. The refresh token and the chosen profile are cached on disk so only
//! the first start of an installation needs an operator.

pub mod cache;
mod error;
pub mod flow;
pub mod oauth;

pub use cache::{CacheRecord, CacheState, TokenCache};
pub use error::AuthError;
pub use flow::{AuthState, HytaleAuthenticator};
pub use oauth::{DeviceAuthorization, GameSession, Profile, TokenSet};
pub use tokio_util::sync::CancellationToken;
