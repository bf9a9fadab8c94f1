use crate::events::Modifiers;
use crate::mappings::{EvdevToKeyName, ModifierKey};

/// Нажатые модификаторы с учётом левой и правой клавиши по отдельности
#[derive(Debug, Default)]
pub struct ModifierState {
    held: Vec<u16>,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_modifiers(&self) -> Modifiers {
        self.held
            .iter()
            .filter_map(|code| EvdevToKeyName::modifier(*code))
            .fold(Modifiers::new(), |m, key| match key {
                ModifierKey::Control => m.with_ctrl(true),
                ModifierKey::Alt => m.with_alt(true),
                ModifierKey::Shift => m.with_shift(true),
                ModifierKey::Super => m.with_super(true),
            })
    }

    /// Обновить состояние; `true`, если это клавиша-модификатор
    pub fn update_key(&mut self, code: u16, pressed: bool) -> bool {
        if EvdevToKeyName::modifier(code).is_none() {
            return false;
        }
        if pressed {
            if !self.held.contains(&code) {
                self.held.push(code);
            }
        } else {
            self.held.retain(|held| *held != code);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_and_right_are_tracked_separately() {
        let mut state = ModifierState::new();
        assert!(state.update_key(125, true)); // Super_L
        assert!(state.update_key(126, true)); // Super_R
        assert!(state.update_key(125, false));
        assert!(state.to_modifiers().super_key);
        state.update_key(126, false);
        assert!(state.to_modifiers().is_empty());
        assert!(!state.update_key(30, true));
    }
}
