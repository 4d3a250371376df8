//! Configuration management

use crate::locale::LocaleMap;
use crate::recognition::DEFAULT_MAX_ALTERNATIVES;
use crate::survey::DEFAULT_HIGHLIGHT;
use crate::{Result, VoxpollError};
use ini::Ini;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Survey settings
///
/// Manages the preferred language, speech parameters, recognition settings
/// and extra language mappings.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.voxpoll.cfg)
    path: PathBuf,

    /// Extra language tokens (token -> locale tag) from `[languages]`
    pub languages: HashMap<String, String>,
}

impl Config {
    /// Load configuration from ~/.voxpoll.cfg, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific file, creating it if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| VoxpollError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| VoxpollError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self::from_ini(ini, path))
    }

    /// Defaults only, never touching disk
    pub fn in_memory() -> Self {
        Self::from_ini(Self::default_config(), PathBuf::new())
    }

    fn from_ini(ini: Ini, path: PathBuf) -> Self {
        let mut config = Self {
            ini,
            path,
            languages: HashMap::new(),
        };
        config.parse_languages();
        config
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| VoxpollError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.voxpoll.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".voxpoll.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("survey"))
            .set("language", "en")
            .set("highlight", DEFAULT_HIGHLIGHT);

        ini.with_section(Some("recognition"))
            .set("max_alternatives", DEFAULT_MAX_ALTERNATIVES.to_string())
            .set("interim_results", "false");

        ini.with_section(Some("speech"));
        ini.with_section(Some("languages"));

        ini
    }

    /// Parse extra language mappings from config
    fn parse_languages(&mut self) {
        if let Some(section) = self.ini.section(Some("languages")) {
            for (token, tag) in section.iter() {
                self.languages
                    .insert(token.trim().to_lowercase(), tag.trim().to_string());
            }
        }
        debug!("Loaded {} extra languages", self.languages.len());
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
        if section == "languages" {
            self.languages
                .insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    /// Language token the user asked for ("tamil", "hi", ...)
    pub fn language(&self) -> String {
        self.get_string("survey", "language", "en")
    }

    /// Background colour for matched answers
    pub fn highlight(&self) -> String {
        self.get_string("survey", "highlight", DEFAULT_HIGHLIGHT)
    }

    /// Speech rate (0-100)
    pub fn rate(&self) -> Option<u8> {
        self.get_int("speech", "rate", -1)
            .try_into()
            .ok()
            .filter(|&r| r <= 100)
    }

    /// Speech volume (0-100)
    pub fn volume(&self) -> Option<u8> {
        self.get_int("speech", "volume", -1)
            .try_into()
            .ok()
            .filter(|&v| v <= 100)
    }

    /// Alternative transcriptions requested from the recognizer (at least 1)
    pub fn max_alternatives(&self) -> u32 {
        self.get_int("recognition", "max_alternatives", DEFAULT_MAX_ALTERNATIVES as i32)
            .try_into()
            .ok()
            .filter(|&n| n >= 1)
            .unwrap_or(DEFAULT_MAX_ALTERNATIVES)
    }

    /// Whether the recognizer should deliver partial results
    pub fn interim_results(&self) -> bool {
        self.get_bool("recognition", "interim_results", false)
    }

    /// Built-in language table plus `[languages]`
    pub fn locale_map(&self) -> LocaleMap {
        LocaleMap::with_overrides(self.languages.iter().map(|(k, v)| (k, v.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::in_memory();
        assert_eq!(config.language(), "en");
        assert_eq!(config.highlight(), DEFAULT_HIGHLIGHT);
        assert_eq!(config.max_alternatives(), 5);
        assert!(!config.interim_results());
        assert_eq!(config.rate(), None);
        assert_eq!(config.volume(), None);
    }

    #[test]
    fn test_out_of_range_values() {
        let mut config = Config::in_memory();
        config.set("speech", "rate", "150");
        config.set("speech", "volume", "80");
        config.set("recognition", "max_alternatives", "0");
        assert_eq!(config.rate(), None);
        assert_eq!(config.volume(), Some(80));
        assert_eq!(config.max_alternatives(), DEFAULT_MAX_ALTERNATIVES);
    }

    #[test]
    fn test_language_overrides() {
        let mut config = Config::in_memory();
        config.set("languages", "Bengali", "bn-IN");
        let map = config.locale_map();
        assert_eq!(map.resolve("bengali").as_str(), "bn-IN");
        assert_eq!(map.resolve("tamil").as_str(), "ta-IN");
    }
}
