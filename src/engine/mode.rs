use crate::error::{Result, RorError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Флаги поведения шортката. Строковые имена совпадают с ключами глобальных
/// настроек, поэтому `[settings]` и модификаторы в shortcuts.conf проверяются
/// одним и тем же ключом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    /// и запускает команду, и поднимает окно
    AlwaysRun,
    /// только запуск, окна не перебираются
    RunOnly,
    IsolateWorkspace,
    MinimizeWhenUnfocused,
    SwitchBackWhenFocused,
    MoveWindowToActiveWorkspace,
    CenterMouseToFocusedWindow,
    /// запомнить текущее окно в регистр для последующего `raise`
    Register,
    Raise,
    RaiseOrRegister,
    Verbose,
}

impl Mode {
    pub const ALL: [Mode; 11] = [
        Mode::AlwaysRun,
        Mode::RunOnly,
        Mode::IsolateWorkspace,
        Mode::MinimizeWhenUnfocused,
        Mode::SwitchBackWhenFocused,
        Mode::MoveWindowToActiveWorkspace,
        Mode::CenterMouseToFocusedWindow,
        Mode::Register,
        Mode::Raise,
        Mode::RaiseOrRegister,
        Mode::Verbose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::AlwaysRun => "always-run",
            Mode::RunOnly => "run-only",
            Mode::IsolateWorkspace => "isolate-workspace",
            Mode::MinimizeWhenUnfocused => "minimize-when-unfocused",
            Mode::SwitchBackWhenFocused => "switch-back-when-focused",
            Mode::MoveWindowToActiveWorkspace => "move-window-to-active-workspace",
            Mode::CenterMouseToFocusedWindow => "center-mouse-to-focused-window",
            Mode::Register => "register",
            Mode::Raise => "raise",
            Mode::RaiseOrRegister => "raise-or-register",
            Mode::Verbose => "verbose",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Mode {
    type Err = RorError;

    fn from_str(s: &str) -> Result<Self> {
        Mode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| RorError::ModeConfig(s.to_string()))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Значение режима: просто включён, либо включён с аргументом (`raise(2)`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModeValue {
    On,
    Arg(String),
}

impl ModeValue {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some(arg) if !arg.is_empty() => ModeValue::Arg(arg.to_string()),
            _ => ModeValue::On,
        }
    }

    pub fn arg(&self) -> Option<&str> {
        match self {
            ModeValue::On => None,
            ModeValue::Arg(arg) => Some(arg),
        }
    }
}

/// Хранилище глобальных булевых настроек
pub trait BooleanSettings: Send + Sync {
    /// `None`, если такого ключа в настройках нет
    fn get_boolean(&self, key: &str) -> Option<bool>;
}

/// Набор режимов одного шортката с откатом на глобальные настройки
#[derive(Clone)]
pub struct ModeSet {
    values: [Option<ModeValue>; Mode::ALL.len()],
    settings: Arc<dyn BooleanSettings>,
}

impl ModeSet {
    pub fn new(settings: Arc<dyn BooleanSettings>) -> Self {
        Self {
            values: Default::default(),
            settings,
        }
    }

    /// Добавить режим по имени; неизвестное имя - ошибка конфигурации
    pub fn add(&mut self, key: &str, value: ModeValue) -> Result<()> {
        let mode: Mode = key.parse()?;
        self.set(mode, value);
        Ok(())
    }

    pub fn set(&mut self, mode: Mode, value: ModeValue) {
        self.values[mode.index()] = Some(value);
    }

    /// Значение режима: собственное значение шортката, иначе глобальная настройка
    pub fn get(&self, mode: Mode) -> Option<ModeValue> {
        if let Some(value) = &self.values[mode.index()] {
            return Some(value.clone());
        }
        match self.settings.get_boolean(mode.as_str()) {
            Some(true) => Some(ModeValue::On),
            _ => None,
        }
    }

    pub fn is_set(&self, mode: Mode) -> bool {
        self.get(mode).is_some()
    }

    /// Режимы, явно заданные в строке конфигурации
    pub fn explicit(&self) -> impl Iterator<Item = (Mode, &ModeValue)> {
        Mode::ALL
            .iter()
            .copied()
            .filter_map(|mode| self.values[mode.index()].as_ref().map(|value| (mode, value)))
    }
}

impl fmt::Debug for ModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.explicit()).finish()
    }
}

impl PartialEq for ModeSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// Настройки без единого ключа: всё выключено
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSettings;

impl BooleanSettings for NoSettings {
    fn get_boolean(&self, _key: &str) -> Option<bool> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSettings(HashMap<&'static str, bool>);

    impl BooleanSettings for MapSettings {
        fn get_boolean(&self, key: &str) -> Option<bool> {
            self.0.get(key).copied()
        }
    }

    fn settings(pairs: &[(&'static str, bool)]) -> Arc<dyn BooleanSettings> {
        Arc::new(MapSettings(pairs.iter().copied().collect()))
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
        assert!("run-or-raise".parse::<Mode>().is_err());
    }

    #[test]
    fn explicit_value_wins_over_settings() {
        let mut modes = ModeSet::new(settings(&[("raise", false)]));
        modes.add("raise", ModeValue::Arg("2".into())).unwrap();
        assert_eq!(modes.get(Mode::Raise), Some(ModeValue::Arg("2".into())));
    }

    #[test]
    fn falls_back_to_global_settings() {
        let modes = ModeSet::new(settings(&[("isolate-workspace", true), ("verbose", false)]));
        assert!(modes.is_set(Mode::IsolateWorkspace));
        assert!(!modes.is_set(Mode::Verbose));
        // ключа нет в настройках
        assert!(!modes.is_set(Mode::AlwaysRun));
    }

    #[test]
    fn add_rejects_unknown_key() {
        let mut modes = ModeSet::new(Arc::new(NoSettings));
        let err = modes.add("teleport", ModeValue::On).unwrap_err();
        assert!(matches!(err, RorError::ModeConfig(ref key) if key == "teleport"));
        assert_eq!(modes.explicit().count(), 0);
    }

    #[test]
    fn mode_value_from_arg() {
        assert_eq!(ModeValue::from_arg(None), ModeValue::On);
        assert_eq!(ModeValue::from_arg(Some("")), ModeValue::On);
        assert_eq!(ModeValue::from_arg(Some("3")).arg(), Some("3"));
    }
}
