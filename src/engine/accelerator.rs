use super::action::{Action, ActionId, Registers};
use super::lock_state::LockState;
use crate::error::RorError;
use crate::events::{normalize_accelerator, GrabId};
use crate::services::{Host, WindowHost};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Кому принадлежит захват: постоянному акселератору или временному
/// акселератору многоклавишного шортката
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabTarget {
    Shortcut(String),
    Layer(String),
}

/// Таблица `grab_id → акселератор` для диспетчеризации срабатываний
pub type GrabMap = HashMap<GrabId, GrabTarget>;

/// Группа шорткатов с одним и тем же сочетанием клавиш.
///
/// Владеет жизненным циклом захвата: захватывается, когда хотя бы один
/// шорткат допустим при текущем состоянии индикаторов, и временно
/// освобождается (`block`), когда сочетание нужно слою многоклавишного шортката.
#[derive(Debug)]
pub struct Accelerator {
    shortcut: String,
    /// каноническая форма сочетания, ключ во всех таблицах
    key: String,
    actions: Vec<Action>,
    grab_id: Option<GrabId>,
    /// состояние индикаторов, с которым акселератор был захвачен
    state: Option<LockState>,
    blocked: bool,
    reconnect_on_unblock: bool,
    is_layer_group: bool,
}

impl Accelerator {
    pub fn new(shortcut: impl Into<String>) -> Self {
        let shortcut = shortcut.into();
        Self {
            key: normalize_accelerator(&shortcut),
            shortcut,
            actions: Vec::new(),
            grab_id: None,
            state: None,
            blocked: false,
            reconnect_on_unblock: false,
            is_layer_group: false,
        }
    }

    /// Временный акселератор слоя многоклавишного шортката
    pub fn layer(shortcut: impl Into<String>) -> Self {
        Self {
            is_layer_group: true,
            ..Self::new(shortcut)
        }
    }

    pub fn shortcut(&self) -> &str {
        &self.shortcut
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn grab_id(&self) -> Option<GrabId> {
        self.grab_id
    }

    pub fn is_grabbed(&self) -> bool {
        self.grab_id.is_some()
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Зависит ли хоть один шорткат группы от индикаторов
    pub fn is_lock_dependent(&self) -> bool {
        self.actions.iter().any(|a| !a.lock.is_unconstrained())
    }

    pub fn conforms(&self, state: LockState) -> bool {
        self.actions.iter().any(|a| a.state_conforms(state))
    }

    /// Идентификаторы шорткатов, допустимых при данном состоянии
    pub fn filter_actions(&self, state: LockState) -> Vec<ActionId> {
        self.actions
            .iter()
            .filter(|a| a.state_conforms(state))
            .map(|a| a.id)
            .collect()
    }

    /// Есть ли среди допустимых шорткатов начало многоклавишного
    pub fn has_chord_roots(&self, state: LockState) -> bool {
        self.actions
            .iter()
            .any(|a| a.state_conforms(state) && a.is_chord())
    }

    fn target(&self) -> GrabTarget {
        if self.is_layer_group {
            GrabTarget::Layer(self.key.clone())
        } else {
            GrabTarget::Shortcut(self.key.clone())
        }
    }

    /// Захватить сочетание. Шорткаты, не подходящие под `state`,
    /// при срабатывании выполняться не будут.
    pub fn connect<H: WindowHost + ?Sized>(
        &mut self,
        state: LockState,
        host: &mut H,
        grab_map: &mut GrabMap,
    ) -> bool {
        if self.blocked {
            self.reconnect_on_unblock = true;
            return false;
        }
        if self.grab_id.is_some() {
            self.state = Some(state);
            return true;
        }

        let Some(grab_id) = host.grab_accelerator(&self.shortcut) else {
            warn!("{}", RorError::GrabConflict(self.shortcut.clone()));
            return false;
        };

        debug!("Захвачен акселератор {} (id {})", self.shortcut, grab_id);
        self.grab_id = Some(grab_id);
        self.state = Some(state);
        grab_map.insert(grab_id, self.target());
        true
    }

    /// Освободить сочетание; повторный вызов ничего не делает
    pub fn disconnect<H: WindowHost + ?Sized>(&mut self, host: &mut H, grab_map: &mut GrabMap) {
        let Some(grab_id) = self.grab_id.take() else {
            return;
        };
        if !host.ungrab_accelerator(grab_id) {
            warn!("Не удалось освободить акселератор {} (id {})", self.shortcut, grab_id);
        }
        grab_map.remove(&grab_id);
        debug!("Освобождён акселератор {}", self.shortcut);
    }

    /// Пересчитать захват после смены состояния индикаторов
    pub fn on_state_changed<H: WindowHost + ?Sized>(
        &mut self,
        state: LockState,
        last_state: LockState,
        host: &mut H,
        grab_map: &mut GrabMap,
    ) {
        let conforms = self.conforms(state);

        if self.blocked {
            // восстановится при unblock
            self.reconnect_on_unblock = conforms;
            return;
        }

        if self.is_grabbed() && !conforms {
            self.disconnect(host, grab_map);
        } else if !self.is_grabbed() && conforms {
            self.connect(state, host, grab_map);
        } else if self.is_grabbed()
            && conforms
            && self.filter_actions(state) != self.filter_actions(last_state)
        {
            // например `<Num_Lock>i` и `<Num_Lock_OFF>i` при переключении Num Lock
            self.disconnect(host, grab_map);
            self.connect(state, host, grab_map);
        }
    }

    /// Освободить сочетание для слоя многоклавишного шортката
    pub fn block<H: WindowHost + ?Sized>(&mut self, host: &mut H, grab_map: &mut GrabMap) {
        if self.blocked {
            return;
        }
        self.reconnect_on_unblock = self.is_grabbed();
        self.blocked = true;
        self.disconnect(host, grab_map);
    }

    /// Вернуть состояние, бывшее до `block`
    pub fn unblock<H: WindowHost + ?Sized>(
        &mut self,
        state: LockState,
        host: &mut H,
        grab_map: &mut GrabMap,
    ) {
        if !self.blocked {
            return;
        }
        self.blocked = false;
        if std::mem::take(&mut self.reconnect_on_unblock) && self.conforms(state) {
            self.connect(state, host, grab_map);
        }
    }

    /// Выполнить все допустимые шорткаты группы.
    ///
    /// Обычные шорткаты выполняются сразу, начала многоклавишных
    /// возвращаются вызывающему без выполнения.
    pub fn trigger<H: Host + ?Sized>(&mut self, host: &mut H, registers: &mut Registers) -> Vec<Action> {
        let Some(state) = self.state else {
            warn!("Акселератор {} не захвачен", self.shortcut);
            return Vec::new();
        };

        info!("Сработал акселератор {}", self.shortcut);
        let mut chord_roots = Vec::new();
        for action in self.actions.iter_mut().filter(|a| a.state_conforms(state)) {
            if action.is_chord() {
                chord_roots.push(action.clone());
                continue;
            }
            if let Err(e) = action.trigger(host, registers) {
                warn!("{} {}", self.shortcut, e);
            }
        }
        chord_roots
    }
}
