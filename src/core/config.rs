/*
 * Manages per-user gallery settings: the last tree document used, the template new
 * columns start with, the path input debounce delay and similar knobs. Settings are
 * stored as `config.json` inside the platform's local configuration directory.
 *
 * Access goes through `ConfigManagerOperations` so callers can be handed a manager
 * backed by some other directory; `CoreConfigManager` is the real one.
 */
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "GallerySync";
const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration file is not valid JSON: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine project directory for configuration")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn default_column_path() -> String {
    "data/".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_max_suggestions() -> usize {
    10
}

fn default_initial_column_count() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryConfig {
    #[serde(default)]
    pub tree_document: Option<PathBuf>,
    #[serde(default = "default_column_path")]
    pub default_column_path: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_initial_column_count")]
    pub initial_column_count: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        GalleryConfig {
            tree_document: None,
            default_column_path: default_column_path(),
            debounce_ms: default_debounce_ms(),
            max_suggestions: default_max_suggestions(),
            initial_column_count: default_initial_column_count(),
        }
    }
}

impl GalleryConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_config(&self, app_name: &str) -> Result<GalleryConfig>;
    fn save_config(&self, app_name: &str, config: &GalleryConfig) -> Result<()>;
}

/*
 * Resolves the local (non-roaming) configuration directory for `app_name`, creating
 * it when missing. Returns `None` when the platform has no such directory or it
 * cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if !config_path.exists() {
        if let Err(e) = fs::create_dir_all(config_path) {
            log::error!("ConfigManager: Failed to create config directory {config_path:?}: {e}");
            return None;
        }
        log::debug!("ConfigManager: Created config directory {config_path:?}");
    }
    Some(config_path.to_path_buf())
}

/* A missing file yields the defaults; missing fields fall back individually. */
fn read_config_file(file_path: &Path) -> Result<GalleryConfig> {
    if !file_path.exists() {
        log::debug!("ConfigManager: No config at {file_path:?}, using defaults.");
        return Ok(GalleryConfig::default());
    }
    let text = fs::read_to_string(file_path)?;
    if text.trim().is_empty() {
        return Ok(GalleryConfig::default());
    }
    let config = serde_json::from_str(&text)?;
    log::debug!("ConfigManager: Loaded config from {file_path:?}.");
    Ok(config)
}

fn write_config_file(file_path: &Path, config: &GalleryConfig) -> Result<()> {
    let file = File::create(file_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), config)?;
    log::debug!("ConfigManager: Saved config to {file_path:?}.");
    Ok(())
}

pub struct CoreConfigManager {}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {}
    }

    fn config_file_path(app_name: &str) -> Result<PathBuf> {
        let dir = get_base_app_config_local_dir(app_name).ok_or(ConfigError::NoProjectDirectory)?;
        Ok(dir.join(CONFIG_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_config(&self, app_name: &str) -> Result<GalleryConfig> {
        log::trace!("CoreConfigManager: Loading config for app '{app_name}'");
        read_config_file(&CoreConfigManager::config_file_path(app_name)?)
    }

    fn save_config(&self, app_name: &str, config: &GalleryConfig) -> Result<()> {
        log::trace!("CoreConfigManager: Saving config for app '{app_name}'");
        write_config_file(&CoreConfigManager::config_file_path(app_name)?, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Same file handling as CoreConfigManager, rooted in a temporary directory.
    struct TestConfigManager {
        mock_config_dir: PathBuf,
    }

    impl ConfigManagerOperations for TestConfigManager {
        fn load_config(&self, _app_name: &str) -> Result<GalleryConfig> {
            read_config_file(&self.mock_config_dir.join(CONFIG_FILENAME))
        }

        fn save_config(&self, _app_name: &str, config: &GalleryConfig) -> Result<()> {
            write_config_file(&self.mock_config_dir.join(CONFIG_FILENAME), config)
        }
    }

    #[test]
    fn test_missing_config_yields_defaults() {
        // Arrange
        let dir = tempdir().unwrap();
        let manager = TestConfigManager {
            mock_config_dir: dir.path().to_path_buf(),
        };

        // Act
        let config = manager.load_config(APP_NAME).unwrap();

        // Assert
        assert_eq!(config, GalleryConfig::default());
        assert_eq!(config.default_column_path, "data/");
        assert_eq!(config.debounce_delay(), Duration::from_millis(300));
        assert_eq!(config.initial_column_count, 2);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let manager = TestConfigManager {
            mock_config_dir: dir.path().to_path_buf(),
        };
        let config = GalleryConfig {
            tree_document: Some(PathBuf::from("/srv/gallery/structure.json")),
            max_suggestions: 25,
            ..GalleryConfig::default()
        };

        manager.save_config(APP_NAME, &config).unwrap();

        assert_eq!(manager.load_config(APP_NAME).unwrap(), config);
    }

    #[test]
    fn test_partial_config_fills_in_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"debounce_ms": 50}"#).unwrap();
        let manager = TestConfigManager {
            mock_config_dir: dir.path().to_path_buf(),
        };

        let config = manager.load_config(APP_NAME).unwrap();

        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.max_suggestions, 10);
        assert_eq!(config.tree_document, None);
    }

    #[test]
    fn test_corrupt_config_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();
        let manager = TestConfigManager {
            mock_config_dir: dir.path().to_path_buf(),
        };
        assert!(matches!(
            manager.load_config(APP_NAME),
            Err(ConfigError::Serde(_))
        ));
    }

    #[test]
    fn test_core_config_manager_uses_app_config_dir() {
        let unique_app_name = format!("TestApp_GalleryConfig_{}", rand::random::<u64>());
        let manager = CoreConfigManager::new();
        let config = GalleryConfig {
            debounce_ms: 120,
            ..GalleryConfig::default()
        };

        manager.save_config(&unique_app_name, &config).unwrap();
        let loaded = manager.load_config(&unique_app_name).unwrap();
        assert_eq!(loaded, config);

        if let Some(config_dir) = get_base_app_config_local_dir(&unique_app_name) {
            assert!(config_dir.join(CONFIG_FILENAME).exists());
            if let Err(e) = fs::remove_dir_all(&config_dir) {
                eprintln!("Test cleanup failed for {config_dir:?}: {e}");
            }
        }
    }
}
