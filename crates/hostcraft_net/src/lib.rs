//! HTTP plumbing shared by the build resolver and the Hytale authenticator.
//!
//! Everything that talks to the network goes through [`HttpTransport`], so the
//! resolution and authentication logic can be exercised against a
//! [`MockTransport`] without sockets.

mod error;
pub mod mock;
pub mod transport;

pub use error::NetError;
pub use mock::{MockTransport, RecordedRequest};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
