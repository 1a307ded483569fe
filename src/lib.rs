pub mod block;
pub mod builder;
pub mod bundle;
pub mod constants;
pub mod engine;
pub mod flatten;
pub mod generate;
pub mod indent;
pub mod materialize;
pub mod outline;
pub mod registry;
pub mod session;
pub mod util;

pub use block::{Block, BlockKind, BlockKindTag, ResourceRef};
pub use bundle::{BundleError, BundleManifest};
pub use engine::{EngineError, OutlineEngine, UploadReport};
pub use generate::{GenerateError, GenerationExecutor};
pub use indent::IndentDirection;
pub use outline::{MergeMode, Outline, OutlineError, Resource, Section, SectionBody};
pub use registry::ResourceRegistry;
pub use session::Session;

/// Default sessions directory path
pub const DEFAULT_SESSIONS_DIR: &str = ".docpack-sessions";

/// Get the default sessions directory path in user's home directory
pub fn default_sessions_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|p| p.join(DEFAULT_SESSIONS_DIR))
}
