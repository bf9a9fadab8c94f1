use crate::engine::LockState;
use crate::error::Result;
use crate::events::{GrabId, WindowInfo};

/// Оконная система и клавиатура, как их видит движок шорткатов.
///
/// Все методы синхронные: вызываются только из задачи контроллера.
pub trait WindowHost {
    /// Захватить акселератор. `None`, если сочетание уже занято.
    fn grab_accelerator(&mut self, shortcut: &str) -> Option<GrabId>;

    fn ungrab_accelerator(&mut self, grab_id: GrabId) -> bool;

    /// Окна в порядке последнего использования, самое свежее первым
    fn windows(&self, active_workspace_only: bool) -> Vec<WindowInfo>;

    fn focus(&mut self, window: &WindowInfo) -> Result<()>;

    fn minimize(&mut self, window: &WindowInfo) -> Result<()>;

    fn move_to_active_workspace(&mut self, window: &WindowInfo) -> Result<()>;

    fn pointer(&self) -> Option<(i32, i32)>;

    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<()>;

    fn lock_state(&self) -> LockState;

    /// Начать перехват всех нажатий (сессия многоклавишного шортката)
    fn start_key_capture(&mut self) -> Result<()>;

    fn stop_key_capture(&mut self);
}

/// Запуск приложений и команд
pub trait Launcher {
    /// Идентификатор установленного приложения (desktop id), если команда им является
    fn lookup_app(&self, command: &str) -> Option<String>;

    fn activate_app(&mut self, app: &str) -> Result<()>;

    /// Запустить процесс, не дожидаясь завершения
    fn spawn(&mut self, argv: &[String]) -> Result<()>;
}

pub trait Host: WindowHost + Launcher + Send {}

impl<T: WindowHost + Launcher + Send> Host for T {}
