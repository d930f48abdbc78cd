pub mod archive;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod reference;
pub mod resolver;
pub mod transport;

pub use cache::{Cache, CachedArtifact};
pub use config::StashConfig;
pub use error::{Error, Result};
pub use resolver::{ArtifactKey, OpenOptions, ResolveOptions, Resolver};
pub use transport::OpenMode;
