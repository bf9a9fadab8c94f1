use crate::error::{Result, RorError};
use crate::events::VirtualKeyEvent;
use tracing::{debug, info};

/// Виртуальная клавиатура uinput: через неё возвращаются в систему все
/// нажатия, не принадлежащие захваченным акселераторам
pub struct VirtualDevice {
    device: uinput::Device,
}

impl VirtualDevice {
    pub fn new(device_name: &str) -> Result<Self> {
        info!("Создание виртуального устройства uinput '{}'", device_name);

        let device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()
            .map_err(|e| {
                RorError::Internal(format!(
                    "Не удалось создать виртуальное устройство '{}': {}",
                    device_name, e
                ))
            })?;

        Ok(Self { device })
    }

    pub fn send_event(&mut self, event: VirtualKeyEvent) -> Result<()> {
        let keycode = i32::from(event.key_code.value());
        // EV_KEY, затем SYN_REPORT
        self.device.write(1, keycode, event.state.value())?;
        self.device.write(0, 0, 0)?;
        debug!("Проброшено {} ({:?})", event.key_code, event.state);
        Ok(())
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        info!("Закрытие виртуального устройства");
    }
}
