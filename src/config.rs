use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::reminder::StatusRule;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub shops: ShopConfig,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_back")]
    pub back: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_maintenance")]
    pub maintenance: String,
    #[serde(default = "default_fuel")]
    pub fuel: String,
    #[serde(default = "default_reminders")]
    pub reminders: String,
    #[serde(default = "default_shops")]
    pub shops: String,
    #[serde(default = "default_complete")]
    pub complete: String,
    #[serde(default = "default_cancel_reminder")]
    pub cancel_reminder: String,
    #[serde(default = "default_toggle")]
    pub toggle: String,
    #[serde(default = "default_add_fuel")]
    pub add_fuel: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_logout")]
    pub logout: String,
    #[serde(default = "default_help")]
    pub help: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default)]
    pub status_rule: StatusRule,
    /// Lead times pre-filled on new reminders, in days before due
    #[serde(default = "default_lead_days")]
    pub default_lead_days: Vec<u32>,
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default = "default_shop_endpoint")]
    pub endpoint: String,
    /// OSM tag filter as key=value
    #[serde(default = "default_shop_tag")]
    pub tag: String,
    #[serde(default = "default_shop_radius")]
    pub radius_m: u32,
    #[serde(default = "default_shop_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub home_lat: Option<f64>,
    #[serde(default)]
    pub home_lon: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            key_bindings: KeyBindings::default(),
            reminders: ReminderConfig::default(),
            shops: ShopConfig::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            back: default_back(),
            new: default_new(),
            edit: default_edit(),
            save: default_save(),
            delete: default_delete(),
            select: default_select(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            maintenance: default_maintenance(),
            fuel: default_fuel(),
            reminders: default_reminders(),
            shops: default_shops(),
            complete: default_complete(),
            cancel_reminder: default_cancel_reminder(),
            toggle: default_toggle(),
            add_fuel: default_add_fuel(),
            filter: default_filter(),
            logout: default_logout(),
            help: default_help(),
        }
    }
}

impl KeyBindings {
    /// (name, binding) pairs, used for validation and the help line
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("quit", self.quit.as_str()),
            ("back", self.back.as_str()),
            ("new", self.new.as_str()),
            ("edit", self.edit.as_str()),
            ("save", self.save.as_str()),
            ("delete", self.delete.as_str()),
            ("select", self.select.as_str()),
            ("list_up", self.list_up.as_str()),
            ("list_down", self.list_down.as_str()),
            ("maintenance", self.maintenance.as_str()),
            ("fuel", self.fuel.as_str()),
            ("reminders", self.reminders.as_str()),
            ("shops", self.shops.as_str()),
            ("complete", self.complete.as_str()),
            ("cancel_reminder", self.cancel_reminder.as_str()),
            ("toggle", self.toggle.as_str()),
            ("add_fuel", self.add_fuel.as_str()),
            ("filter", self.filter.as_str()),
            ("logout", self.logout.as_str()),
            ("help", self.help.as_str()),
        ]
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            status_rule: StatusRule::default(),
            default_lead_days: default_lead_days(),
            channel_name: default_channel_name(),
        }
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            endpoint: default_shop_endpoint(),
            tag: default_shop_tag(),
            radius_m: default_shop_radius(),
            timeout_secs: default_shop_timeout(),
            home_lat: None,
            home_lon: None,
        }
    }
}

impl ShopConfig {
    pub fn home(&self) -> Option<(f64, f64)> {
        self.home_lat.zip(self.home_lon)
    }
}

// Default value functions
fn default_database_path() -> String {
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_back() -> String {
    "Esc".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_select() -> String {
    "Enter".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_maintenance() -> String {
    "m".to_string()
}

fn default_fuel() -> String {
    "f".to_string()
}

fn default_reminders() -> String {
    "r".to_string()
}

fn default_shops() -> String {
    "s".to_string()
}

fn default_complete() -> String {
    "c".to_string()
}

fn default_cancel_reminder() -> String {
    "x".to_string()
}

fn default_toggle() -> String {
    "t".to_string()
}

fn default_add_fuel() -> String {
    "a".to_string()
}

fn default_filter() -> String {
    "/".to_string()
}

fn default_logout() -> String {
    "Ctrl+l".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_lead_days() -> Vec<u32> {
    vec![7, 1]
}

fn default_channel_name() -> String {
    "maintenance_reminders".to_string()
}

fn default_shop_endpoint() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_shop_tag() -> String {
    "shop=car_repair".to_string()
}

fn default_shop_radius() -> u32 {
    5000
}

fn default_shop_timeout() -> u64 {
    30
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid key binding for {name}: {reason}")]
    InvalidKeyBinding { name: String, reason: String },
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path, profile)
    }

    /// Load configuration from file, using production profile
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_profile(utils::Profile::Prod)
    }

    /// Load from an explicit path, writing defaults there when the file is missing
    pub fn load_from_path(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        let config = if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;

            if config.database_path.trim().is_empty() {
                config.database_path = Self::default_database_path_for_profile(profile);
            }
            if config.config_version != Some(CURRENT_CONFIG_VERSION) {
                tracing::info!(found = ?config.config_version, current = CURRENT_CONFIG_VERSION, "config version differs");
            }
            config
        } else {
            let mut config = Config {
                database_path: Self::default_database_path_for_profile(profile),
                ..Config::default()
            };
            if let Err(e) = config.save_to_path(config_path) {
                tracing::error!(path = %config_path.display(), error = %e, "failed to save default config");
                return Err(e);
            }
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the profile's config file
    pub fn save_with_profile(&mut self, profile: utils::Profile) -> Result<(), ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Reject unparseable key bindings up front
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, binding) in self.key_bindings.entries() {
            utils::parse_key_binding(binding).map_err(|reason| ConfigError::InvalidKeyBinding {
                name: name.to_string(),
                reason,
            })?;
        }
        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        match utils::get_data_dir(profile) {
            Some(data_dir) => data_dir.join("garagebook.db").to_string_lossy().to_string(),
            None => format!("~/.local/share/{}/garagebook.db", profile.app_name()),
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.reminders.status_rule, StatusRule::Extended);
        assert_eq!(config.reminders.default_lead_days, vec![7, 1]);
        assert_eq!(config.shops.tag, "shop=car_repair");
        assert_eq!(config.shops.home(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            database_path = "/tmp/g.db"

            [reminders]
            status_rule = "basic"

            [shops]
            radius_m = 1200
            home_lat = 51.5
            home_lon = -0.12
            "#,
        )
        .unwrap();
        assert_eq!(config.reminders.status_rule, StatusRule::Basic);
        assert_eq!(config.reminders.channel_name, "maintenance_reminders");
        assert_eq!(config.shops.radius_m, 1200);
        assert_eq!(config.shops.home(), Some((51.5, -0.12)));
        assert_eq!(config.key_bindings.quit, "q");
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");
        let created = Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert!(path.exists());

        let reloaded = Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert_eq!(reloaded.database_path, created.database_path);
        assert_eq!(reloaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn bad_key_binding_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[key_bindings]\nquit = \"Hyper+q\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path, utils::Profile::Dev),
            Err(ConfigError::InvalidKeyBinding { .. })
        ));
    }
}
