//! Turns a (flavor, version, build) request into a concrete artifact URL and
//! materializes that artifact on disk.

pub mod descriptor;
pub mod download;
mod error;
pub mod flavor;
pub mod resolver;
pub mod url;
pub mod version;

pub use descriptor::{BuildRequest, DownloadDescriptor, ResolvedBuild};
pub use download::{Downloader, sha256_file, verify_sha256};
pub use error::ResolveError;
pub use flavor::{Flavor, Product};
pub use resolver::Resolver;
pub use url::validate_url;
pub use version::{compare_versions, is_stable_version, latest_stable};
