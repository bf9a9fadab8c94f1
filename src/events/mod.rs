pub mod keyboard;
pub mod window;

pub use keyboard::{normalize_accelerator, KeyCode, KeyState, Modifiers};
pub use window::{WindowGeometry, WindowId, WindowInfo};

/// Идентификатор захвата акселератора, выданный хостом
pub type GrabId = u32;

/// Входящие события хоста. Все они обрабатываются последовательно одной
/// задачей контроллера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Сработал ранее захваченный акселератор
    AcceleratorActivated(GrabId),
    /// Хост сообщил об изменении состояния клавиатуры (Num/Caps/Scroll Lock)
    LockStateChanged,
    /// Нажатие, пойманное поверхностью захвата во время многоклавишного шортката
    KeyPressed { label: String, is_modifier: bool },
    /// Поверхность захвата потеряла фокус
    CaptureFocusLost,
    /// Завершение работы
    Shutdown,
}

/// События для виртуальной клавиатуры
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualKeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
}

impl VirtualKeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState) -> Self {
        Self { key_code, state }
    }
}
