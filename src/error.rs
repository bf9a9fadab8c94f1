use thiserror::Error;

#[derive(Error, Debug)]
pub enum RorError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Строка {line} не разобрана: {reason}")]
    ConfigLine { line: usize, reason: String },

    #[error("Неизвестный режим: {0}")]
    ModeConfig(String),

    #[error("Сочетание уже занято: {0}")]
    GrabConflict(String),

    #[error("Окно {0:#x} больше не существует")]
    WindowStale(u64),

    #[error("Не удалось запустить команду: {0}")]
    Launcher(String),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl RorError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(RorError::DeviceNotFound(msg.into()))
    }

    /// Ошибка разбора строки; номер строки проставляется загрузчиком файла
    pub fn config_line(reason: impl Into<String>) -> Self {
        RorError::ConfigLine {
            line: 0,
            reason: reason.into(),
        }
    }

    pub fn at_line(self, line: usize) -> Self {
        match self {
            RorError::ConfigLine { reason, .. } => RorError::ConfigLine { line, reason },
            RorError::ModeConfig(mode) => RorError::ConfigLine {
                line,
                reason: format!("неизвестный режим '{}'", mode),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, RorError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! ror_error {
    (launcher, $($arg:tt)*) => {
        $crate::error::RorError::Launcher(format!($($arg)*))
    };
    (config_line, $($arg:tt)*) => {
        $crate::error::RorError::config_line(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_line_stamps_config_errors() {
        let err = RorError::config_line("пустой шорткат").at_line(7);
        assert!(matches!(err, RorError::ConfigLine { line: 7, .. }));

        let err = RorError::ModeConfig("bogus".into()).at_line(3);
        assert_eq!(err.to_string(), "Строка 3 не разобрана: неизвестный режим 'bogus'");
    }

    #[test]
    fn at_line_keeps_other_errors() {
        let err = RorError::Launcher("x".into()).at_line(2);
        assert!(matches!(err, RorError::Launcher(_)));
    }
}
