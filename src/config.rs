//! Named configuration presets.
//!
//! The store only ever sees a data directory; the remaining settings are read by the
//! binary and by reporting code. Presets are selected by environment name, and unknown
//! names fall back to production.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Deployment environment selecting a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    /// Parse an environment name case-insensitively. Unknown names map to production.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Production,
        }
    }
}

/// Notification toggles consumed by reporting code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub notify_overdue: bool,
    pub notify_due_today: bool,
    pub channel: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            notify_overdue: true,
            notify_due_today: true,
            channel: "email".to_string(),
        }
    }
}

/// Application settings for one environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub environment: Environment,
    pub app_name: String,
    pub app_version: String,
    pub debug: bool,
    pub testing: bool,
    pub data_dir: PathBuf,
    pub projects_file: String,
    pub tasks_file: String,
    pub items_per_page: usize,
    pub date_format: String,
    pub log_level: String,
    pub notifications: NotificationConfig,
}

impl Config {
    fn base(environment: Environment) -> Self {
        Self {
            environment,
            app_name: "Task Manager Pro".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            debug: false,
            testing: false,
            data_dir: PathBuf::from("./data"),
            projects_file: "projects.json".to_string(),
            tasks_file: "tasks.json".to_string(),
            items_per_page: 50,
            date_format: "%d/%m/%Y %H:%M".to_string(),
            log_level: "info".to_string(),
            notifications: NotificationConfig::default(),
        }
    }

    pub fn development() -> Self {
        Self {
            debug: true,
            data_dir: PathBuf::from("./data/dev"),
            log_level: "debug".to_string(),
            ..Self::base(Environment::Development)
        }
    }

    pub fn testing() -> Self {
        let mut cfg = Self {
            testing: true,
            data_dir: PathBuf::from("./data/test"),
            ..Self::base(Environment::Testing)
        };
        cfg.notifications.enabled = false;
        cfg
    }

    pub fn production() -> Self {
        Self {
            data_dir: PathBuf::from("/opt/task_manager/data"),
            log_level: "warn".to_string(),
            ..Self::base(Environment::Production)
        }
    }

    pub fn for_environment(name: &str) -> Self {
        match Environment::from_name(name) {
            Environment::Development => Self::development(),
            Environment::Testing => Self::testing(),
            Environment::Production => Self::production(),
        }
    }

    /// Replace the preset's data directory.
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Absolute path of the data directory.
    pub fn database_path(&self) -> PathBuf {
        std::path::absolute(&self.data_dir).unwrap_or_else(|_| self.data_dir.clone())
    }

    /// Render the settings as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_where_expected() {
        let dev = Config::for_environment("development");
        assert!(dev.debug);
        assert_eq!(dev.data_dir, PathBuf::from("./data/dev"));
        assert_eq!(dev.log_level, "debug");

        let test = Config::for_environment("Testing");
        assert!(test.testing);
        assert!(!test.notifications.enabled);
        assert_eq!(test.data_dir, PathBuf::from("./data/test"));

        let prod = Config::for_environment("production");
        assert!(!prod.debug);
        assert_eq!(prod.log_level, "warn");
        assert_eq!(prod.items_per_page, 50);
    }

    #[test]
    fn unknown_environment_falls_back_to_production() {
        assert_eq!(Config::for_environment("staging"), Config::production());
        assert_eq!(Config::default().environment, Environment::Production);
    }

    #[test]
    fn data_dir_override_and_absolute_path() {
        let cfg = Config::testing().with_data_dir("/tmp/tm");
        assert_eq!(cfg.database_path(), PathBuf::from("/tmp/tm"));
        assert!(Config::development().database_path().is_absolute());
    }

    #[test]
    fn json_rendering_lists_settings() {
        let json = Config::development().to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["environment"], "development");
        assert_eq!(v["app_name"], "Task Manager Pro");
        assert_eq!(v["notifications"]["channel"], "email");
    }
}
