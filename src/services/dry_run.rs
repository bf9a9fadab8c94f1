use super::grab_table::GrabTable;
use super::host::{Launcher, WindowHost};
use crate::engine::LockState;
use crate::error::Result;
use crate::events::{GrabId, WindowId, WindowInfo};
use crate::ror_error;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Вызов, который движок сделал бы в реальной оконной системе
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Focus(WindowId),
    Minimize(WindowId),
    MoveToWorkspace(WindowId, i32),
    Warp(i32, i32),
    Activate(String),
    Spawn(Vec<String>),
}

/// Хост без оконной системы: окна, индикаторы и приложения задаются
/// вручную, действия только записываются и логируются
#[derive(Debug)]
pub struct DryRunHost {
    grabs: Arc<GrabTable>,
    windows: Vec<WindowInfo>,
    active_workspace: i32,
    pointer: Option<(i32, i32)>,
    applications: BTreeSet<String>,
    calls: Vec<HostCall>,
    fail_spawn: bool,
}

impl Default for DryRunHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunHost {
    pub fn new() -> Self {
        Self::with_grabs(Arc::new(GrabTable::new()))
    }

    /// Хост поверх общей таблицы захватов (её же читает dry-run слушатель)
    pub fn with_grabs(grabs: Arc<GrabTable>) -> Self {
        Self {
            grabs,
            windows: Vec::new(),
            active_workspace: 0,
            pointer: None,
            applications: BTreeSet::new(),
            calls: Vec::new(),
            fail_spawn: false,
        }
    }

    pub fn grabs(&self) -> Arc<GrabTable> {
        Arc::clone(&self.grabs)
    }

    pub fn add_window(&mut self, window: WindowInfo) {
        self.windows.push(window);
    }

    pub fn remove_window(&mut self, id: WindowId) {
        self.windows.retain(|w| w.id != id);
    }

    /// Сделать окно активным, не записывая вызов
    pub fn focus_by_id(&mut self, id: WindowId) {
        let Some(index) = self.windows.iter().position(|w| w.id == id) else {
            return;
        };
        for window in &mut self.windows {
            window.focused = window.id == id;
        }
        let window = self.windows.remove(index);
        self.windows.insert(0, window);
    }

    pub fn set_active_workspace(&mut self, workspace: i32) {
        self.active_workspace = workspace;
    }

    pub fn set_pointer(&mut self, x: i32, y: i32) {
        self.pointer = Some((x, y));
    }

    pub fn set_lock_state(&mut self, state: LockState) {
        self.grabs.set_lock_state(state);
    }

    pub fn add_application(&mut self, app: impl Into<String>) {
        self.applications.insert(app.into());
    }

    pub fn fail_spawn(&mut self, fail: bool) {
        self.fail_spawn = fail;
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn is_grabbed(&self, shortcut: &str) -> bool {
        self.grabs.is_grabbed(shortcut)
    }

    pub fn grab_id(&self, shortcut: &str) -> Option<GrabId> {
        self.grabs.lookup(shortcut)
    }

    pub fn grab_count(&self) -> usize {
        self.grabs.len()
    }

    pub fn is_capturing(&self) -> bool {
        self.grabs.is_capturing()
    }

    fn record(&mut self, call: HostCall) {
        info!("[dry-run] {:?}", call);
        self.calls.push(call);
    }
}

impl WindowHost for DryRunHost {
    fn grab_accelerator(&mut self, shortcut: &str) -> Option<GrabId> {
        self.grabs.grab(shortcut)
    }

    fn ungrab_accelerator(&mut self, grab_id: GrabId) -> bool {
        self.grabs.ungrab(grab_id)
    }

    fn windows(&self, active_workspace_only: bool) -> Vec<WindowInfo> {
        self.windows
            .iter()
            .filter(|w| {
                // окна без рабочего стола видны на всех
                !active_workspace_only
                    || w.workspace.map_or(true, |ws| ws == self.active_workspace)
            })
            .cloned()
            .collect()
    }

    fn focus(&mut self, window: &WindowInfo) -> Result<()> {
        self.record(HostCall::Focus(window.id));
        self.focus_by_id(window.id);
        Ok(())
    }

    fn minimize(&mut self, window: &WindowInfo) -> Result<()> {
        self.record(HostCall::Minimize(window.id));
        if let Some(w) = self.windows.iter_mut().find(|w| w.id == window.id) {
            w.focused = false;
        }
        Ok(())
    }

    fn move_to_active_workspace(&mut self, window: &WindowInfo) -> Result<()> {
        let workspace = self.active_workspace;
        self.record(HostCall::MoveToWorkspace(window.id, workspace));
        if let Some(w) = self.windows.iter_mut().find(|w| w.id == window.id) {
            w.workspace = Some(workspace);
        }
        Ok(())
    }

    fn pointer(&self) -> Option<(i32, i32)> {
        self.pointer
    }

    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<()> {
        self.record(HostCall::Warp(x, y));
        self.pointer = Some((x, y));
        Ok(())
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

impl Launcher for DryRunHost {
    fn lookup_app(&self, command: &str) -> Option<String> {
        self.applications.get(command).cloned()
    }

    fn activate_app(&mut self, app: &str) -> Result<()> {
        self.record(HostCall::Activate(app.to_string()));
        Ok(())
    }

    fn spawn(&mut self, argv: &[String]) -> Result<()> {
        if self.fail_spawn {
            return Err(ror_error!(launcher, "не удалось запустить {:?}", argv));
        }
        self.record(HostCall::Spawn(argv.to_vec()));
        Ok(())
    }
}
