pub mod config;
pub mod error;
pub mod lod;
pub mod loader;
pub mod params;

pub use config::Config;
pub use error::{ConfigError, ScriptLoadError};
pub use lod::LodLevel;
pub use loader::{LoadedScripts, ScriptFile, ScriptLoader};
pub use params::TemplateParams;
