use crate::error::{Result, RorError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти клавиатуру: явный путь из конфигурации или автопоиск при `auto`
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                RorError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        info!("Автопоиск клавиатурного устройства...");
        if let Some(path) = Self::find_by_id()? {
            info!("Найдено устройство по ID: {:?}", path);
            return Ok(path);
        }
        if let Some(path) = Self::find_by_event_devices()? {
            info!("Найдено устройство среди event устройств: {:?}", path);
            return Ok(path);
        }

        RorError::device_not_found(
            "Не удалось найти клавиатуру. Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    /// Приоритет ссылки из /dev/input/by-id; `None` - не клавиатура
    pub fn by_id_priority(name: &str) -> Option<u32> {
        let lower = name.to_lowercase();
        if !lower.contains("event") || lower.contains("mouse") {
            return None;
        }
        if name.ends_with("event-kbd") {
            Some(100)
        } else if lower.contains("keyboard") {
            Some(50)
        } else if lower.contains("kbd") {
            Some(10)
        } else {
            None
        }
    }

    fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir)
            .map_err(|e| RorError::Permission(format!("Нет доступа к {:?}: {}", dir, e)))?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        paths.sort();
        Ok(paths)
    }

    fn file_name(path: &Path) -> &str {
        path.file_name().and_then(|n| n.to_str()).unwrap_or("")
    }

    fn find_by_id() -> Result<Option<PathBuf>> {
        let by_id = Path::new("/dev/input/by-id");
        if !by_id.exists() {
            debug!("Директория {:?} не существует", by_id);
            return Ok(None);
        }

        let mut candidates: Vec<(PathBuf, u32)> = Self::list_dir(by_id)?
            .into_iter()
            .filter_map(|path| Self::by_id_priority(Self::file_name(&path)).map(|p| (path, p)))
            .filter(|(path, _)| Self::is_keyboard_device(path))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(candidates.into_iter().next().map(|(path, _)| path))
    }

    fn find_by_event_devices() -> Result<Option<PathBuf>> {
        Ok(Self::list_dir(Path::new("/dev/input"))?
            .into_iter()
            .filter(|path| Self::file_name(path).starts_with("event"))
            .find(|path| Self::is_keyboard_device(path)))
    }

    fn is_keyboard_device(device_path: &Path) -> bool {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                return false;
            }
        };

        let name = device.name().unwrap_or("Unknown").to_lowercase();
        if ["mouse", "touchpad", "trackpoint"].iter().any(|n| name.contains(n)) {
            debug!("Исключаем устройство {:?} ({})", device_path, name);
            return false;
        }

        let is_keyboard = device.supported_keys().is_some_and(|keys| {
            keys.contains(evdev::KeyCode::KEY_A)
                && keys.contains(evdev::KeyCode::KEY_SPACE)
                && keys.contains(evdev::KeyCode::KEY_ENTER)
                && keys.iter().count() > 20
        });
        debug!("Устройство {:?} ({}): клавиатура = {}", device_path, name, is_keyboard);
        is_keyboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = DeviceFinder::find_keyboard_device("/non/existent/path");
        assert!(matches!(result, Err(RorError::DeviceNotFound(_))));
    }

    #[test]
    fn by_id_priorities() {
        assert_eq!(DeviceFinder::by_id_priority("usb-Logitech_USB_Keyboard-event-kbd"), Some(100));
        assert_eq!(DeviceFinder::by_id_priority("usb-Some_Keyboard-event-if01"), Some(50));
        assert_eq!(DeviceFinder::by_id_priority("usb-Razer_DeathAdder-event-mouse"), None);
        assert_eq!(DeviceFinder::by_id_priority("usb-Logitech_USB_Keyboard-kbd"), None);
    }
}
