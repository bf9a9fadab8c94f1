use super::launcher;
use super::lock_state::{LockRequirement, LockState};
use super::matcher::MatchRule;
use super::mode::{Mode, ModeSet, ModeValue};
use crate::debug_if_enabled;
use crate::error::{Result, RorError};
use crate::events::{WindowId, WindowInfo};
use crate::services::Host;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// Порядковый номер шортката; уникален в пределах контроллера
pub type ActionId = usize;

/// Оставшиеся клавиши многоклавишного шортката: `<Super>g a b` → `["a", "b"]`
pub type Layers = SmallVec<[String; 2]>;

/// Ключ регистра окон
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegisterSlot {
    /// `register(n)` / `raise(n)` / `raise-or-register(n)`
    Named(String),
    /// общий регистр для `register` и `raise` без аргумента
    Default,
}

impl RegisterSlot {
    fn for_value(value: &ModeValue) -> Self {
        match value.arg() {
            Some(arg) => RegisterSlot::Named(arg.to_string()),
            None => RegisterSlot::Default,
        }
    }
}

/// Общая таблица регистров окон
#[derive(Debug, Default)]
pub struct Registers {
    slots: HashMap<RegisterSlot, Option<WindowId>>,
}

impl Registers {
    pub fn get(&self, slot: &RegisterSlot) -> Option<WindowId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn set(&mut self, slot: RegisterSlot, window: Option<WindowId>) {
        self.slots.insert(slot, window);
    }

    pub fn contains(&self, slot: &RegisterSlot) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Один шорткат: правило сопоставления окон, команда, режимы,
/// требования к индикаторам и путь многоклавишного шортката.
#[derive(Debug, Clone)]
pub struct Action {
    pub id: ActionId,
    pub command: String,
    pub wm_class: MatchRule,
    pub title: MatchRule,
    pub modes: ModeSet,
    /// шорткат без токенов `<Num_Lock>` и т.п.
    pub shortcut: String,
    pub lock: LockRequirement,
    pub layers: Layers,
    registered_window: Option<WindowId>,
}

impl Action {
    pub fn new(
        id: ActionId,
        shortcut_spec: &str,
        layers: Layers,
        modes: ModeSet,
        command: impl Into<String>,
        wm_class: MatchRule,
        title: MatchRule,
    ) -> Self {
        let (lock, shortcut) = LockRequirement::extract(shortcut_spec);
        Self {
            id,
            command: command.into(),
            wm_class,
            title,
            modes,
            shortcut,
            lock,
            layers,
            registered_window: None,
        }
    }

    /// Продолжение многоклавишного шортката: следующая клавиша становится
    /// шорткатом, путь сокращается на один шаг.
    pub fn layered_action(&self, id: ActionId) -> Action {
        let (next, rest) = match self.layers.split_first() {
            Some((next, rest)) => (next.as_str(), rest.iter().cloned().collect()),
            None => ("", Layers::new()),
        };
        Action::new(
            id,
            next,
            rest,
            self.modes.clone(),
            self.command.clone(),
            self.wm_class.clone(),
            self.title.clone(),
        )
    }

    pub fn is_chord(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn registered_window(&self) -> Option<WindowId> {
        self.registered_window
    }

    /// Допустим ли шорткат при данном состоянии индикаторов
    pub fn state_conforms(&self, state: LockState) -> bool {
        self.lock.conforms(state)
    }

    /// Подходит ли окно под критерии шортката.
    ///
    /// Порядок важен: сначала класс (instance или class) и, если задан,
    /// заголовок; затем только заголовок; при пустых обоих полях команда
    /// ищется без учёта регистра в классе или заголовке.
    pub fn is_conforming(&self, window: &WindowInfo) -> bool {
        if !self.wm_class.is_empty() {
            return (self.wm_class.matches(&window.instance) || self.wm_class.matches(&window.class))
                && (self.title.is_empty() || self.title.matches(&window.title));
        }
        if !self.title.is_empty() {
            return self.title.matches(&window.title);
        }
        let command = self.command.to_lowercase();
        window.class.to_lowercase().contains(&command)
            || window.title.to_lowercase().contains(&command)
    }

    /// Выбрать окно для поднятия из списка в порядке хоста (новые первыми).
    ///
    /// Если первое окно уже подходит, список просматривается с конца, чтобы
    /// поднять самое старое из подходящих; иначе выигрывает самое новое.
    /// Просмотр останавливается на первом подходящем окне без фокуса.
    pub fn select_window<'a>(&self, windows: &'a [WindowInfo]) -> Option<&'a WindowInfo> {
        let reverse = windows.first().is_some_and(|w| self.is_conforming(w));
        let ordered: Vec<&WindowInfo> = if reverse {
            windows.iter().rev().collect()
        } else {
            windows.iter().collect()
        };

        let mut seen = None;
        for window in ordered {
            if self.is_conforming(window) {
                seen = Some(window);
                if !window.has_focus() {
                    break;
                }
            }
        }
        seen
    }

    fn debug(&self, message: impl fmt::Display) {
        if self.modes.is_set(Mode::Verbose) {
            info!("{}: {}", self.shortcut, message);
        } else {
            debug_if_enabled!("{}: {}", self.shortcut, message);
        }
    }

    fn get_windows<H: Host + ?Sized>(&self, host: &H) -> Vec<WindowInfo> {
        host.windows(self.modes.is_set(Mode::IsolateWorkspace))
    }

    fn focus_window<H: Host + ?Sized>(&self, host: &mut H, window: &WindowInfo) -> Result<()> {
        if self.modes.is_set(Mode::MoveWindowToActiveWorkspace) {
            host.move_to_active_workspace(window)?;
        }
        host.focus(window)?;

        if self.modes.is_set(Mode::CenterMouseToFocusedWindow) {
            if let Some(rect) = window.geometry {
                let inside = host.pointer().is_some_and(|(x, y)| rect.contains(x, y));
                if !inside {
                    let (x, y) = rect.center();
                    host.warp_pointer(x, y)?;
                }
            }
        }
        self.debug(format_args!("окно активировано: {}", window));
        Ok(())
    }

    /// Поднять окно из регистра, если оно всё ещё есть среди текущих окон
    fn raise_registered<H: Host + ?Sized>(
        &self,
        host: &mut H,
        registered: Option<WindowId>,
    ) -> Result<bool> {
        let Some(id) = registered else {
            self.debug("окно не зарегистрировано");
            return Ok(false);
        };
        let windows = self.get_windows(host);
        match windows.iter().find(|w| w.id == id) {
            Some(window) => {
                self.focus_window(host, window)?;
                Ok(true)
            }
            None => {
                self.debug(RorError::WindowStale(id));
                Ok(false)
            }
        }
    }

    fn first_window<H: Host + ?Sized>(&self, host: &H) -> Option<WindowId> {
        self.get_windows(host).first().map(|w| w.id)
    }

    /// Выполнить шорткат
    pub fn trigger<H: Host + ?Sized>(&mut self, host: &mut H, registers: &mut Registers) -> Result<()> {
        self.debug(format_args!(
            "trigger title: {:?}, wm_class: {:?}",
            self.title, self.wm_class
        ));

        if let Some(value) = self.modes.get(Mode::RaiseOrRegister) {
            let slot = value.arg().map(|arg| RegisterSlot::Named(arg.to_string()));
            let registered = match &slot {
                Some(slot) => registers.get(slot),
                None => self.registered_window,
            };
            if !self.raise_registered(host, registered)? {
                let first = self.first_window(host);
                self.debug(format_args!("регистрируем окно {:?}", first));
                match slot {
                    Some(slot) => registers.set(slot, first),
                    None => self.registered_window = first,
                }
            }
            return Ok(());
        }

        if let Some(value) = self.modes.get(Mode::Register) {
            let first = self.first_window(host);
            self.debug(format_args!("регистрируем окно {:?}", first));
            registers.set(RegisterSlot::for_value(&value), first);
            return Ok(());
        }

        if let Some(value) = self.modes.get(Mode::Raise) {
            let registered = registers.get(&RegisterSlot::for_value(&value));
            self.raise_registered(host, registered)?;
            return Ok(());
        }

        if self.modes.is_set(Mode::RunOnly) {
            return self.run(host);
        }

        let windows = self.get_windows(host);
        let seen = self.select_window(&windows).cloned();

        if let Some(seen) = &seen {
            if !seen.has_focus() {
                self.focus_window(host, seen)?;
            } else {
                if self.modes.is_set(Mode::MinimizeWhenUnfocused) {
                    self.debug(format_args!("сворачиваем {}", seen));
                    host.minimize(seen)?;
                }
                if self.modes.is_set(Mode::SwitchBackWhenFocused) {
                    let previous = windows
                        .iter()
                        .find(|w| w.monitor == seen.monitor && w.id != seen.id);
                    if let Some(previous) = previous {
                        self.focus_window(host, previous)?;
                    }
                }
            }
        }

        if seen.is_none() || self.modes.is_set(Mode::AlwaysRun) {
            self.run(host)?;
        }
        Ok(())
    }

    /// Запустить команду шортката
    pub fn run<H: Host + ?Sized>(&self, host: &mut H) -> Result<()> {
        self.debug(format_args!("запуск: {}", self.command));
        launcher::run_command(host, &self.command)
    }
}
