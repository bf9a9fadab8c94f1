use std::fmt;

/// Состояние индикаторов клавиатуры (Num Lock, Caps Lock, Scroll Lock)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LockState {
    pub num_lock: bool,
    pub caps_lock: bool,
    pub scroll_lock: bool,
}

impl LockState {
    pub fn new(num_lock: bool, caps_lock: bool, scroll_lock: bool) -> Self {
        Self {
            num_lock,
            caps_lock,
            scroll_lock,
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "on" } else { "off" };
        write!(
            f,
            "num={} caps={} scroll={}",
            flag(self.num_lock),
            flag(self.caps_lock),
            flag(self.scroll_lock)
        )
    }
}

/// Требование шортката к состоянию индикаторов; `None` - любое состояние
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LockRequirement {
    pub num_lock: Option<bool>,
    pub caps_lock: Option<bool>,
    pub scroll_lock: Option<bool>,
}

impl LockRequirement {
    pub fn is_unconstrained(&self) -> bool {
        self.num_lock.is_none() && self.caps_lock.is_none() && self.scroll_lock.is_none()
    }

    pub fn conforms(&self, state: LockState) -> bool {
        let check = |required: Option<bool>, actual: bool| required.map_or(true, |r| r == actual);
        check(self.num_lock, state.num_lock)
            && check(self.caps_lock, state.caps_lock)
            && check(self.scroll_lock, state.scroll_lock)
    }

    /// Вынуть из строки шортката токены `<Num_Lock>`, `<Num_Lock_OFF>` и т.п.
    /// Возвращает требование и шорткат без этих токенов.
    pub fn extract(shortcut: &str) -> (Self, String) {
        let mut rest = shortcut.to_string();
        let mut take = |sym: &str| -> Option<bool> {
            let on = format!("<{}>", sym);
            let off = format!("<{}_OFF>", sym);
            if rest.contains(&on) {
                rest = rest.replacen(&on, "", 1);
                Some(true)
            } else if rest.contains(&off) {
                rest = rest.replacen(&off, "", 1);
                Some(false)
            } else {
                None
            }
        };

        let requirement = LockRequirement {
            num_lock: take("Num_Lock"),
            caps_lock: take("Caps_Lock"),
            scroll_lock: take("Scroll_Lock"),
        };
        (requirement, rest.trim().to_string())
    }
}

impl fmt::Display for LockRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |required: Option<bool>| match required {
            Some(true) => "on",
            Some(false) => "off",
            None => "*",
        };
        write!(
            f,
            "num={} caps={} scroll={}",
            flag(self.num_lock),
            flag(self.caps_lock),
            flag(self.scroll_lock)
        )
    }
}

/// Отслеживает последнее известное состояние индикаторов
#[derive(Debug, Default)]
pub struct LockStateTracker {
    last: LockState,
}

impl LockStateTracker {
    pub fn new(initial: LockState) -> Self {
        Self { last: initial }
    }

    pub fn current(&self) -> LockState {
        self.last
    }

    /// Сравнить новое состояние с последним известным.
    /// Возвращает предыдущее состояние, если оно изменилось.
    pub fn update(&mut self, state: LockState) -> Option<LockState> {
        if state == self.last {
            return None;
        }
        let previous = self.last;
        self.last = state;
        Some(previous)
    }
}
