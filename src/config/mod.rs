pub mod traits;
pub mod run;
pub mod engine;
pub mod manager;

pub use manager::{AppConfig, ConfigManager, ENV_PREFIX};
pub use run::RunConfig;
pub use engine::EngineConfig;
pub use traits::{ConfigManifest, ConfigSection, FieldManifest};
