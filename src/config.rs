use crate::engine::{BooleanSettings, Mode};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Шорткаты, которые записываются пользователю при первом запуске
pub const BUNDLED_SHORTCUTS: &str = include_str!("../data/shortcuts.default.conf");

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub shortcuts: ShortcutsConfig,
    /// Глобальные значения режимов, например `isolate-workspace = true`
    pub settings: GlobalSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub device_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShortcutsConfig {
    pub path: String,
    /// Файл, копируемый на место отсутствующего `path`; без него берётся встроенный
    pub default_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GlobalSettings(BTreeMap<String, bool>);

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: "auto".to_string(),
        }
    }
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            path: "~/.config/run-or-raise/shortcuts.conf".to_string(),
            default_path: None,
        }
    }
}

impl GlobalSettings {
    pub fn new(values: impl IntoIterator<Item = (String, bool)>) -> Self {
        Self(values.into_iter().collect())
    }
}

impl BooleanSettings for GlobalSettings {
    fn get_boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key).copied()
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl ShortcutsConfig {
    pub fn user_path(&self) -> PathBuf {
        expand_path(&self.path)
    }

    /// Прочитать файл шорткатов. Если его нет, сначала скопировать туда
    /// файл по умолчанию (или встроенный список).
    pub fn read(&self) -> Result<String> {
        let path = self.user_path();
        if !path.exists() {
            self.install_default(&path)?;
        }
        fs::read_to_string(&path)
            .with_context(|| format!("Не удалось прочитать файл шорткатов {:?}", path))
    }

    fn install_default(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Не удалось создать каталог {:?}", parent))?;
        }

        match self.default_path.as_deref().map(expand_path) {
            Some(default) if default.exists() => {
                fs::copy(&default, path)
                    .with_context(|| format!("Не удалось скопировать {:?} в {:?}", default, path))?;
                info!("Файл шорткатов скопирован из {:?} в {:?}", default, path);
            }
            other => {
                if let Some(missing) = other {
                    warn!("Файл по умолчанию {:?} не найден, используется встроенный", missing);
                }
                fs::write(path, BUNDLED_SHORTCUTS)
                    .with_context(|| format!("Не удалось записать {:?}", path))?;
                info!("Создан файл шорткатов {:?}", path);
            }
        }
        Ok(())
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ROR_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.input.device_path.is_empty() {
            anyhow::bail!("input.device_path не может быть пустым");
        }

        if self.shortcuts.path.trim().is_empty() {
            anyhow::bail!("shortcuts.path не может быть пустым");
        }

        for key in self.settings.0.keys() {
            key.parse::<Mode>()
                .map_err(|_| anyhow::anyhow!("Неизвестный режим в [settings]: {}", key))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input.device_path, "auto");
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"

[shortcuts]
path = "/tmp/run-or-raise-test/shortcuts.conf"

[settings]
isolate-workspace = true
verbose = false
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.settings.get_boolean("isolate-workspace"), Some(true));
        assert_eq!(config.settings.get_boolean("verbose"), Some(false));
        assert_eq!(config.settings.get_boolean("always-run"), None);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_setting_is_rejected() {
        let mut config = Config::default();
        config.settings = GlobalSettings::new([("teleport".to_string(), true)]);
        assert!(config.validate().is_err());

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_shortcuts_get_bundled_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/shortcuts.conf");
        let shortcuts = ShortcutsConfig {
            path: path.to_string_lossy().into_owned(),
            default_path: None,
        };

        let text = shortcuts.read().unwrap();
        assert_eq!(text, BUNDLED_SHORTCUTS);
        assert!(path.exists());
    }

    #[test]
    fn test_default_path_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("default.conf");
        fs::write(&default, "<Super>x,xterm\n").unwrap();
        let shortcuts = ShortcutsConfig {
            path: dir.path().join("user.conf").to_string_lossy().into_owned(),
            default_path: Some(default.to_string_lossy().into_owned()),
        };

        assert_eq!(shortcuts.read().unwrap(), "<Super>x,xterm\n");

        // существующий файл пользователя не перезаписывается
        fs::write(&default, "<Super>y,yes\n").unwrap();
        assert_eq!(shortcuts.read().unwrap(), "<Super>x,xterm\n");
    }

    #[test]
    fn test_bundled_shortcuts_parse_cleanly() {
        let settings: std::sync::Arc<dyn BooleanSettings> =
            std::sync::Arc::new(GlobalSettings::default());
        let mut next_id = 0;
        let parsed = crate::engine::parser::parse_document(BUNDLED_SHORTCUTS, &settings, &mut next_id);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.actions.len(), 8);
    }

    #[test]
    fn test_tilde_is_expanded() {
        let shortcuts = ShortcutsConfig::default();
        assert!(!shortcuts.user_path().to_string_lossy().starts_with('~'));
    }
}
