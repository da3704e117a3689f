use super::{engine::EngineConfig, run::RunConfig, traits::ConfigSection};
use crate::error::TinyGpError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Environment variables with this prefix override file values, e.g.
/// `TINYGP__RUN__GENERATIONS=50`.
pub const ENV_PREFIX: &str = "TINYGP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub run: RunConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), TinyGpError> {
        self.run.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Loads a TOML or JSON file (by extension), then applies environment
    /// overrides. The stored configuration is replaced only if the result
    /// validates.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TinyGpError> {
        let path = path.as_ref();
        let config: AppConfig = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());

        *self.write_lock()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TinyGpError> {
        let toml_str = {
            let config = self.read_lock()?;
            toml::to_string_pretty(&*config)?
        };

        std::fs::write(path, toml_str)
            .map_err(|e| TinyGpError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Independent copy of the current configuration.
    pub fn get(&self) -> Result<AppConfig, TinyGpError> {
        Ok(self.read_lock()?.clone())
    }

    pub fn run_config(&self) -> Result<RunConfig, TinyGpError> {
        Ok(self.read_lock()?.run.clone())
    }

    /// Applies `f` to a copy and stores it only if the copy validates.
    pub fn update<F>(&self, f: F) -> Result<(), TinyGpError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.write_lock()?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, AppConfig>, TinyGpError> {
        self.config
            .read()
            .map_err(|_| TinyGpError::Configuration("Configuration lock poisoned".to_string()))
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, TinyGpError> {
        self.config
            .write()
            .map_err(|_| TinyGpError::Configuration("Configuration lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::Operation;

    #[test]
    fn test_save_and_reload_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tinygp.toml");

        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.run.generations = 12;
                c.run.seed = Some(99);
                c.run.operations = vec![Operation::Mul, Operation::Cos];
                c.engine.command = "/opt/engine".to_string();
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::new();
        reloaded.load_from_file(&path).unwrap();
        assert_eq!(reloaded.get().unwrap(), manager.get().unwrap());
    }

    #[test]
    fn test_load_json_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tinygp.json");
        std::fs::write(&path, r#"{"run": {"depth": 3, "fitness_function": "mean_squared_error"}}"#).unwrap();

        let manager = ConfigManager::new();
        manager.load_from_file(&path).unwrap();
        let run = manager.run_config().unwrap();
        assert_eq!(run.depth, 3);
        assert_eq!(run.population_size, 100_000);
    }

    #[test]
    fn test_invalid_file_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[run]\nmin_random = 3.0\nmax_random = 1.0\n").unwrap();

        let manager = ConfigManager::new();
        assert!(manager.load_from_file(&path).is_err());
        assert_eq!(manager.get().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_rejected_update_is_not_applied() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.run.operations.clear());
        assert!(result.is_err());
        assert_eq!(manager.run_config().unwrap().operations.len(), 4);
    }

    #[test]
    fn test_get_returns_independent_copy() {
        let manager = ConfigManager::new();
        let mut copy = manager.get().unwrap();
        copy.run.generations = 1;
        assert_eq!(manager.run_config().unwrap().generations, 100);
    }
}
