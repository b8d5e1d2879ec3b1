//! Filesystem primitives for fileinstall
//!
//! Normalized path handling, locked atomic writes, content digests and
//! format-agnostic loading of property files.

pub mod config;
pub mod digest;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigStore, Properties};
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::NormalizedPath;
