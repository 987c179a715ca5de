// Shared utilities module
pub mod budget;
pub mod cache;
pub mod config_loader;
pub mod errors;
pub mod hashing;
pub mod logging;
pub mod profiler;
pub mod source_maps;
pub mod ui;
pub mod watch;

/// Directory under the project root holding the persistent build cache.
pub const CACHE_DIR_NAME: &str = ".musubi-cache";

pub use budget::*;
pub use cache::*;
pub use config_loader::*;
pub use errors::*;
pub use hashing::*;
pub use logging::*;
pub use profiler::*;
pub use source_maps::*;
pub use ui::*;
pub use watch::*;
