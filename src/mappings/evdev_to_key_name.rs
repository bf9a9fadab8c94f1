use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Коды клавиш linux (input-event-codes.h) → имена клавиш X11/GTK,
/// как они пишутся в shortcuts.conf (`<Super>KP_1`, `<Control>Page_Up`)
static KEY_NAMES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    let mut names = HashMap::new();

    // Буквы
    for (code, name) in [
        (30, "a"), (48, "b"), (46, "c"), (32, "d"), (18, "e"), (33, "f"),
        (34, "g"), (35, "h"), (23, "i"), (36, "j"), (37, "k"), (38, "l"),
        (50, "m"), (49, "n"), (24, "o"), (25, "p"), (16, "q"), (19, "r"),
        (31, "s"), (20, "t"), (22, "u"), (47, "v"), (17, "w"), (45, "x"),
        (21, "y"), (44, "z"),
    ] {
        names.insert(code, name);
    }

    // Цифры верхнего ряда
    for (code, name) in [
        (2, "1"), (3, "2"), (4, "3"), (5, "4"), (6, "5"),
        (7, "6"), (8, "7"), (9, "8"), (10, "9"), (11, "0"),
    ] {
        names.insert(code, name);
    }

    // Функциональные
    for (code, name) in [
        (59, "F1"), (60, "F2"), (61, "F3"), (62, "F4"), (63, "F5"), (64, "F6"),
        (65, "F7"), (66, "F8"), (67, "F9"), (68, "F10"), (87, "F11"), (88, "F12"),
    ] {
        names.insert(code, name);
    }

    // Цифровой блок
    for (code, name) in [
        (82, "KP_0"), (79, "KP_1"), (80, "KP_2"), (81, "KP_3"), (75, "KP_4"),
        (76, "KP_5"), (77, "KP_6"), (71, "KP_7"), (72, "KP_8"), (73, "KP_9"),
        (83, "KP_Decimal"), (96, "KP_Enter"), (78, "KP_Add"),
        (74, "KP_Subtract"), (55, "KP_Multiply"), (98, "KP_Divide"),
    ] {
        names.insert(code, name);
    }

    for (code, name) in [
        (1, "Escape"), (12, "minus"), (13, "equal"), (14, "BackSpace"), (15, "Tab"),
        (26, "bracketleft"), (27, "bracketright"), (28, "Return"), (39, "semicolon"),
        (40, "apostrophe"), (41, "grave"), (43, "backslash"), (51, "comma"),
        (52, "period"), (53, "slash"), (57, "space"),
        (102, "Home"), (103, "Up"), (104, "Page_Up"), (105, "Left"), (106, "Right"),
        (107, "End"), (108, "Down"), (109, "Page_Down"), (110, "Insert"), (111, "Delete"),
        (99, "Print"), (119, "Pause"), (127, "Menu"),
    ] {
        names.insert(code, name);
    }

    // Индикаторы
    names.insert(69, "Num_Lock");
    names.insert(58, "Caps_Lock");
    names.insert(70, "Scroll_Lock");

    // Модификаторы
    for (code, name) in [
        (29, "Control_L"), (97, "Control_R"), (42, "Shift_L"), (54, "Shift_R"),
        (56, "Alt_L"), (100, "Alt_R"), (125, "Super_L"), (126, "Super_R"),
    ] {
        names.insert(code, name);
    }

    names
});

/// Клавиша-модификатор
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    Control,
    Alt,
    Shift,
    Super,
}

/// Клавиша-индикатор
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKey {
    NumLock,
    CapsLock,
    ScrollLock,
}

pub struct EvdevToKeyName;

impl EvdevToKeyName {
    pub fn translate(code: u16) -> Option<&'static str> {
        KEY_NAMES.get(&code).copied()
    }

    pub fn modifier(code: u16) -> Option<ModifierKey> {
        match code {
            29 | 97 => Some(ModifierKey::Control),
            56 | 100 => Some(ModifierKey::Alt),
            42 | 54 => Some(ModifierKey::Shift),
            125 | 126 => Some(ModifierKey::Super),
            _ => None,
        }
    }

    pub fn lock(code: u16) -> Option<LockKey> {
        match code {
            69 => Some(LockKey::NumLock),
            58 => Some(LockKey::CapsLock),
            70 => Some(LockKey::ScrollLock),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_and_number_keys() {
        assert_eq!(EvdevToKeyName::translate(30), Some("a"));
        assert_eq!(EvdevToKeyName::translate(44), Some("z"));
        assert_eq!(EvdevToKeyName::translate(11), Some("0"));
    }

    #[test]
    fn test_gtk_names() {
        assert_eq!(EvdevToKeyName::translate(79), Some("KP_1"));
        assert_eq!(EvdevToKeyName::translate(104), Some("Page_Up"));
        assert_eq!(EvdevToKeyName::translate(28), Some("Return"));
        assert_eq!(EvdevToKeyName::translate(69), Some("Num_Lock"));
        assert_eq!(EvdevToKeyName::translate(0), None);
    }

    #[test]
    fn test_modifiers_and_locks() {
        assert_eq!(EvdevToKeyName::modifier(126), Some(ModifierKey::Super));
        assert_eq!(EvdevToKeyName::modifier(30), None);
        assert_eq!(EvdevToKeyName::lock(58), Some(LockKey::CapsLock));
        assert_eq!(EvdevToKeyName::lock(30), None);
    }
}
