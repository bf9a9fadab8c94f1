use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }

    pub fn value(&self) -> i32 {
        match self {
            KeyState::Released => 0,
            KeyState::Pressed => 1,
            KeyState::Repeat => 2,
        }
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY_{}", self.0)
    }
}

/// Модификаторы клавиш
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_super(mut self, super_key: bool) -> Self {
        self.super_key = super_key;
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.super_key
    }

    /// Применить имя модификатора из строки акселератора (`<Control>`, `<Mod4>` ...)
    fn apply(&mut self, name: &str) -> bool {
        match name.to_lowercase().as_str() {
            "control" | "ctrl" | "primary" => self.ctrl = true,
            "alt" | "mod1" => self.alt = true,
            "shift" => self.shift = true,
            "super" | "mod4" | "meta" | "hyper" => self.super_key = true,
            _ => return false,
        }
        true
    }

    /// Каноническая строка акселератора для клавиши с этими модификаторами
    pub fn accelerator(&self, key: &str) -> String {
        let mut result = String::new();
        if self.ctrl { result.push_str("<Control>"); }
        if self.alt { result.push_str("<Alt>"); }
        if self.shift { result.push_str("<Shift>"); }
        if self.super_key { result.push_str("<Super>"); }
        result.push_str(&normalize_key_name(key));
        result
    }
}

fn normalize_key_name(key: &str) -> String {
    let key = key.trim().to_lowercase();
    match key.as_str() {
        "enter" => "return".to_string(),
        "esc" => "escape".to_string(),
        "pageup" | "prior" => "page_up".to_string(),
        "pagedown" | "next" => "page_down".to_string(),
        "del" => "delete".to_string(),
        _ => key,
    }
}

/// Привести строку акселератора к канонической форме.
///
/// `<super>F`, `<Mod4>f` и `<Super>f` дают одну и ту же строку, поэтому захват
/// и нажатие сравниваются по ней. Неизвестные модификаторы сохраняются в
/// отсортированном виде перед клавишей.
pub fn normalize_accelerator(accel: &str) -> String {
    let mut modifiers = Modifiers::new();
    let mut unknown: Vec<String> = Vec::new();
    let mut rest = accel.trim();

    while let Some(stripped) = rest.strip_prefix('<') {
        let Some(end) = stripped.find('>') else { break };
        let name = &stripped[..end];
        if !modifiers.apply(name) {
            unknown.push(format!("<{}>", name));
        }
        rest = stripped[end + 1..].trim_start();
    }

    unknown.sort();
    unknown.dedup();
    // неизвестные модификаторы всегда идут перед известными
    let mut result = unknown.concat();
    result.push_str(&modifiers.accelerator(rest));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_creation() {
        let modifiers = Modifiers::new()
            .with_ctrl(true)
            .with_shift(true);

        assert!(modifiers.ctrl);
        assert!(modifiers.shift);
        assert!(!modifiers.alt);
        assert!(!modifiers.super_key);
        assert!(!modifiers.is_empty());
    }

    #[test]
    fn test_accelerator_from_modifiers() {
        let modifiers = Modifiers::new().with_super(true).with_ctrl(true);
        assert_eq!(modifiers.accelerator("F"), "<Control><Super>f");
        assert_eq!(Modifiers::new().accelerator("Enter"), "return");
    }

    #[test]
    fn test_normalize_accelerator_aliases() {
        assert_eq!(normalize_accelerator("<Super>1"), "<Super>1");
        assert_eq!(normalize_accelerator("<super>F"), "<Super>f");
        assert_eq!(normalize_accelerator("<Mod4><Primary>e"), "<Control><Super>e");
        assert_eq!(normalize_accelerator(" <Shift><Alt> Return "), "<Alt><Shift>return");
        assert_eq!(normalize_accelerator("a"), "a");
    }

    #[test]
    fn test_normalize_keeps_unknown_modifiers() {
        assert_eq!(normalize_accelerator("<Hyper2><Super>x"), "<Hyper2><Super>x");
    }

    #[test]
    fn test_key_state_values() {
        assert_eq!(KeyState::from_value(1), Some(KeyState::Pressed));
        assert_eq!(KeyState::from_value(7), None);
        assert_eq!(KeyState::Repeat.value(), 2);
    }
}
