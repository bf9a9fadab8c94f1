use super::modifier_state::ModifierState;
use crate::engine::LockState;
use crate::events::{HostEvent, KeyState};
use crate::mappings::{EvdevToKeyName, LockKey};
use crate::services::GrabTable;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Что делать с физическим событием клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Отдать дальше через виртуальную клавиатуру
    Passthrough,
    /// Событие принадлежит захваченному акселератору или сессии слоёв
    Swallow,
}

/// Превращает нажатия в события хоста по таблице захватов
pub struct KeyRouter {
    grabs: Arc<GrabTable>,
    events: UnboundedSender<HostEvent>,
    modifiers: ModifierState,
    /// клавиши, чьё нажатие было поглощено; их повтор и отпускание тоже
    swallowed: HashSet<u16>,
}

impl KeyRouter {
    pub fn new(grabs: Arc<GrabTable>, events: UnboundedSender<HostEvent>) -> Self {
        Self {
            grabs,
            events,
            modifiers: ModifierState::new(),
            swallowed: HashSet::new(),
        }
    }

    fn send(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            debug!("Контроллер остановлен, событие отброшено");
        }
    }

    /// Новое состояние индикаторов (LED-события или переключение клавишей)
    pub fn set_lock_state(&self, state: LockState) {
        if self.grabs.set_lock_state(state) {
            self.send(HostEvent::LockStateChanged);
        }
    }

    pub fn set_led(&self, lock: LockKey, on: bool) {
        let mut state = self.grabs.lock_state();
        match lock {
            LockKey::NumLock => state.num_lock = on,
            LockKey::CapsLock => state.caps_lock = on,
            LockKey::ScrollLock => state.scroll_lock = on,
        }
        self.set_lock_state(state);
    }

    pub fn handle(&mut self, code: u16, state: KeyState) -> Route {
        let is_modifier = self.modifiers.update_key(code, state != KeyState::Released);

        match state {
            KeyState::Released => {
                if self.swallowed.remove(&code) {
                    return Route::Swallow;
                }
                return Route::Passthrough;
            }
            KeyState::Repeat => {
                if self.swallowed.contains(&code) {
                    return Route::Swallow;
                }
                return Route::Passthrough;
            }
            KeyState::Pressed => {}
        }

        if let Some(lock) = EvdevToKeyName::lock(code) {
            let current = self.grabs.lock_state();
            let on = match lock {
                LockKey::NumLock => current.num_lock,
                LockKey::CapsLock => current.caps_lock,
                LockKey::ScrollLock => current.scroll_lock,
            };
            self.set_led(lock, !on);
        }

        let Some(name) = EvdevToKeyName::translate(code) else {
            return Route::Passthrough;
        };

        if is_modifier {
            if self.grabs.is_capturing() {
                self.send(HostEvent::KeyPressed {
                    label: name.to_string(),
                    is_modifier: true,
                });
            }
            return Route::Passthrough;
        }

        let accelerator = self.modifiers.to_modifiers().accelerator(name);
        if let Some(grab_id) = self.grabs.lookup(&accelerator) {
            debug!("Акселератор {} (id {})", accelerator, grab_id);
            self.swallowed.insert(code);
            self.send(HostEvent::AcceleratorActivated(grab_id));
            return Route::Swallow;
        }

        if self.grabs.is_capturing() {
            self.swallowed.insert(code);
            self.send(HostEvent::KeyPressed {
                label: accelerator,
                is_modifier: false,
            });
            return Route::Swallow;
        }

        Route::Passthrough
    }
}
