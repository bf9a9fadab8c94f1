//! Хост для X11-сессии: окна через wmctrl/xdotool/xrandr, клавиатура через
//! evdev (см. `keyboard_listener`), приложения через desktop-файлы.

pub mod applications;
pub mod wmctrl;
pub mod xdotool;
pub mod xrandr;

use super::grab_table::GrabTable;
use super::host::{Launcher, WindowHost};
use crate::engine::LockState;
use crate::error::{Result, RorError};
use crate::events::{GrabId, WindowId, WindowInfo};
use crate::{debug_if_enabled, ror_error};
use applications::ApplicationIndex;
use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Запустить утилиту и вернуть её stdout
pub(crate) fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    debug_if_enabled!("{} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| RorError::Internal(format!("{} не найден: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RorError::Internal(format!(
            "{} вернул ошибку: {}",
            program,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Окна сверху вниз по `_NET_CLIENT_LIST_STACKING`
fn stacking_order() -> Result<Vec<WindowId>> {
    let stdout = run_tool("xprop", &["-root", "_NET_CLIENT_LIST_STACKING"])?;
    Ok(parse_stacking(&stdout))
}

/// `_NET_CLIENT_LIST_STACKING(WINDOW): window id # 0x1200003, 0x3a00003`
fn parse_stacking(output: &str) -> Vec<WindowId> {
    let Some((_, ids)) = output.split_once('#') else {
        return Vec::new();
    };
    let mut ids: Vec<WindowId> = ids.split(',').filter_map(wmctrl::parse_id).collect();
    ids.reverse();
    ids
}

/// Упорядочить окна: последнее использованное первым
fn order_by_recency(mut windows: Vec<WindowInfo>, stacking: Option<Vec<WindowId>>) -> Vec<WindowInfo> {
    match stacking {
        Some(order) if !order.is_empty() => {
            let rank: HashMap<WindowId, usize> =
                order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
            windows.sort_by_key(|w| rank.get(&w.id).copied().unwrap_or(usize::MAX));
        }
        _ => windows.reverse(),
    }
    windows
}

/// Запустить процесс без ожидания; завершившийся потомок забирает отдельный поток
fn spawn_detached(argv: &[String]) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ror_error!(launcher, "пустая команда"));
    };
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ror_error!(launcher, "не удалось запустить {}: {}", program, e))?;

    let program = program.clone();
    std::thread::spawn(move || match child.wait() {
        Ok(status) => debug!("{} завершился: {}", program, status),
        Err(e) => warn!("Ошибка ожидания {}: {}", program, e),
    });
    Ok(())
}

pub struct DesktopHost {
    grabs: Arc<GrabTable>,
    applications: ApplicationIndex,
}

impl DesktopHost {
    pub fn new(grabs: Arc<GrabTable>) -> Self {
        info!("Инициализация DesktopHost");
        Self {
            grabs,
            applications: ApplicationIndex::from_env(),
        }
    }

    /// Проверить, что нужные утилиты доступны
    pub fn check_tools() -> Result<()> {
        for (program, args) in [
            ("wmctrl", &["-m"][..]),
            ("xdotool", &["version"][..]),
            ("xrandr", &["--listmonitors"][..]),
        ] {
            run_tool(program, args)?;
        }
        Ok(())
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        let windows = wmctrl::list_windows()?;
        let stacking = stacking_order()
            .map_err(|e| debug!("Порядок окон недоступен: {}", e))
            .ok();
        let mut windows = order_by_recency(windows, stacking);

        let active = xdotool::active_window().unwrap_or_else(|e| {
            debug!("Активное окно неизвестно: {}", e);
            None
        });
        let monitors = xrandr::monitors().unwrap_or_default();
        for window in &mut windows {
            window.focused = Some(window.id) == active;
            if let Some(geometry) = &window.geometry {
                window.monitor = xrandr::monitor_of(&monitors, geometry);
            }
        }
        Ok(windows)
    }
}

impl WindowHost for DesktopHost {
    fn grab_accelerator(&mut self, shortcut: &str) -> Option<GrabId> {
        self.grabs.grab(shortcut)
    }

    fn ungrab_accelerator(&mut self, grab_id: GrabId) -> bool {
        self.grabs.ungrab(grab_id)
    }

    fn windows(&self, active_workspace_only: bool) -> Vec<WindowInfo> {
        let windows = match self.list_windows() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Не удалось получить список окон: {}", e);
                return Vec::new();
            }
        };
        if !active_workspace_only {
            return windows;
        }

        match wmctrl::active_workspace() {
            Ok(Some(active)) => windows
                .into_iter()
                .filter(|w| w.workspace.map_or(true, |ws| ws == active))
                .collect(),
            _ => windows,
        }
    }

    fn focus(&mut self, window: &WindowInfo) -> Result<()> {
        wmctrl::activate(window.id)
    }

    fn minimize(&mut self, window: &WindowInfo) -> Result<()> {
        xdotool::minimize(window.id)
    }

    fn move_to_active_workspace(&mut self, window: &WindowInfo) -> Result<()> {
        match wmctrl::active_workspace()? {
            Some(active) if window.workspace != Some(active) => {
                wmctrl::move_to_workspace(window.id, active)
            }
            _ => Ok(()),
        }
    }

    fn pointer(&self) -> Option<(i32, i32)> {
        xdotool::pointer().ok().flatten()
    }

    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<()> {
        xdotool::warp_pointer(x, y)
    }

    fn lock_state(&self) -> LockState {
        self.grabs.lock_state()
    }

    fn start_key_capture(&mut self) -> Result<()> {
        self.grabs.set_capturing(true);
        Ok(())
    }

    fn stop_key_capture(&mut self) {
        self.grabs.set_capturing(false);
    }
}

impl Launcher for DesktopHost {
    fn lookup_app(&self, command: &str) -> Option<String> {
        self.applications.lookup(command)
    }

    fn activate_app(&mut self, app: &str) -> Result<()> {
        spawn_detached(&["gtk-launch".to_string(), app.to_string()])
    }

    fn spawn(&mut self, argv: &[String]) -> Result<()> {
        spawn_detached(argv)
    }
}
