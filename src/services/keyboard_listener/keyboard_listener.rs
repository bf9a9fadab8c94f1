use crate::config::Config;
use crate::engine::LockState;
use crate::error::{Result, RorError};
use crate::events::{HostEvent, KeyCode, KeyState, VirtualKeyEvent};
use crate::mappings::LockKey;
use crate::services::{GrabTable, VirtualDevice};
use crate::utils::DeviceFinder;
use evdev::{Device, EventType, LedCode};
use std::io::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::r#trait::KeyboardListenerTrait;
use super::router::{KeyRouter, Route};

pub struct RealKeyboardListener {
    device: Device,
    virtual_device: VirtualDevice,
    router: KeyRouter,
}

impl RealKeyboardListener {
    pub fn new(
        config: Arc<Config>,
        grabs: Arc<GrabTable>,
        events: UnboundedSender<HostEvent>,
    ) -> Result<Self> {
        info!("Инициализация RealKeyboardListener");

        let virtual_device = VirtualDevice::new("run-or-raise passthrough")?;
        let device_path = DeviceFinder::find_keyboard_device(&config.input.device_path)?;

        let mut device = Device::open(&device_path).map_err(|e| {
            RorError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        match device.grab() {
            Ok(_) => Self::log_grabbed_device(&device),
            Err(e) => {
                Self::log_grab_error(device_path, &e);
                return Err(RorError::Permission(format!(
                    "Не удалось захватить устройство эксклюзивно: {}",
                    e
                )));
            }
        }

        let router = KeyRouter::new(grabs, events);
        router.set_lock_state(Self::read_leds(&device));

        Ok(Self {
            device,
            virtual_device,
            router,
        })
    }

    fn read_leds(device: &Device) -> LockState {
        match device.get_led_state() {
            Ok(leds) => LockState::new(
                leds.contains(LedCode::LED_NUML),
                leds.contains(LedCode::LED_CAPSL),
                leds.contains(LedCode::LED_SCROLLL),
            ),
            Err(e) => {
                warn!("Не удалось прочитать индикаторы: {}", e);
                LockState::default()
            }
        }
    }

    /// Чтение событий блокирующее, поэтому цикл живёт в отдельном потоке
    fn run_blocking(mut self) -> Result<()> {
        info!("RealKeyboardListener запущен, начинаем чтение событий");

        loop {
            let events: Vec<_> = match self.device.fetch_events() {
                Ok(events) => events.collect(),
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                    continue;
                }
            };

            for event in events {
                if let Err(e) = self.handle_event(event) {
                    error!("Ошибка обработки события: {}", e);
                }
            }
        }
    }

    fn handle_event(&mut self, event: evdev::InputEvent) -> Result<()> {
        let event_type = event.event_type();

        if event_type == EventType::LED {
            let lock = match LedCode(event.code()) {
                LedCode::LED_NUML => Some(LockKey::NumLock),
                LedCode::LED_CAPSL => Some(LockKey::CapsLock),
                LedCode::LED_SCROLLL => Some(LockKey::ScrollLock),
                _ => None,
            };
            if let Some(lock) = lock {
                self.router.set_led(lock, event.value() != 0);
            }
            return Ok(());
        }

        if event_type != EventType::KEY {
            return Ok(());
        }

        let Some(state) = KeyState::from_value(event.value()) else {
            debug!("Неизвестное значение события: {}", event.value());
            return Ok(());
        };

        match self.router.handle(event.code(), state) {
            Route::Swallow => Ok(()),
            Route::Passthrough => self
                .virtual_device
                .send_event(VirtualKeyEvent::new(KeyCode(event.code()), state)),
        }
    }

    fn log_grabbed_device(device: &Device) {
        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        info!("Физический путь: {:?}", device.physical_path());
        info!("Устройство захвачено эксклюзивно");
    }

    fn log_grab_error(device_path: PathBuf, e: &Error) {
        warn!(
            "Не удалось захватить устройство {}: {}",
            device_path.display(),
            e
        );
        warn!("Добавьте пользователя в группу input: sudo usermod -a -G input $USER");
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for RealKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        tokio::task::spawn_blocking(move || (*self).run_blocking())
            .await
            .map_err(|e| RorError::Internal(format!("Поток клавиатуры завершился: {}", e)))?
    }
}

impl Drop for RealKeyboardListener {
    fn drop(&mut self) {
        info!("Освобождение захваченного устройства");
        if let Err(e) = self.device.ungrab() {
            error!("Не удалось освободить устройство: {}", e);
        }
    }
}
