use crate::error::{Result, RorError};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{info, warn};

/// Проверить доступ к /dev/input и /dev/uinput перед захватом клавиатуры
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");
    check_input_devices_access(Path::new("/dev/input"))?;
    check_uinput_access(Path::new("/dev/uinput"))?;
    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access(input_dir: &Path) -> Result<()> {
    fs::read_dir(input_dir).map(drop).map_err(|e| {
        RorError::Permission(format!(
            "Нет доступа к {:?}: {}. Добавьте пользователя в группу 'input'",
            input_dir, e
        ))
    })
}

fn check_uinput_access(uinput: &Path) -> Result<()> {
    if !uinput.exists() {
        // модуль может быть загружен позже
        warn!("{:?} не существует, возможно модуль uinput не загружен (sudo modprobe uinput)", uinput);
        return Ok(());
    }

    let mode = fs::metadata(uinput)?.permissions().mode();
    if !is_group_or_world_accessible(mode) {
        return Err(RorError::Permission(format!(
            "Нет прав доступа к {:?}. Добавьте пользователя в группу 'uinput' или 'input'",
            uinput
        )));
    }
    Ok(())
}

fn is_group_or_world_accessible(mode: u32) -> bool {
    mode & 0o066 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uinput_modes() {
        assert!(is_group_or_world_accessible(0o660));
        assert!(is_group_or_world_accessible(0o666));
        assert!(!is_group_or_world_accessible(0o600));
    }

    #[test]
    fn missing_input_dir_is_a_permission_error() {
        let result = check_input_devices_access(Path::new("/non/existent/input"));
        assert!(matches!(result, Err(RorError::Permission(_))));
    }

    #[test]
    fn missing_uinput_is_tolerated() {
        assert!(check_uinput_access(Path::new("/non/existent/uinput")).is_ok());
    }
}
