use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна, выданный хостом (X11 window id для реального бэкенда)
pub type WindowId = u64;

/// Информация об окне
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    /// WM_CLASS class (например `Firefox`)
    pub class: String,
    /// WM_CLASS instance (например `Navigator`)
    pub instance: String,
    pub pid: Option<u32>,
    pub monitor: i32,
    pub workspace: Option<i32>,
    pub focused: bool,
    pub geometry: Option<WindowGeometry>,
}

impl WindowInfo {
    pub fn new(id: WindowId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            class: String::new(),
            instance: String::new(),
            pid: None,
            monitor: 0,
            workspace: None,
            focused: false,
            geometry: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_monitor(mut self, monitor: i32) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_workspace(mut self, workspace: i32) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn with_focus(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn with_geometry(mut self, geometry: WindowGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_empty() {
            write!(f, "{:#x} \"{}\"", self.id, self.title)
        } else {
            write!(f, "{:#x} \"{}\" ({})", self.id, self.title, self.class)
        }
    }
}

/// Геометрия окна (frame rect)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && i64::from(px) < i64::from(self.x) + i64::from(self.width)
            && i64::from(py) < i64::from(self.y) + i64::from(self.height)
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_info_creation() {
        let window = WindowInfo::new(0x42, "Test Window")
            .with_class("TestApp")
            .with_instance("testapp")
            .with_pid(1234)
            .with_focus(true);

        assert_eq!(window.title, "Test Window");
        assert_eq!(window.class, "TestApp");
        assert_eq!(window.instance, "testapp");
        assert_eq!(window.pid, Some(1234));
        assert!(window.has_focus());
        assert_eq!(window.to_string(), "0x42 \"Test Window\" (TestApp)");
    }

    #[test]
    fn test_geometry_contains_and_center() {
        let rect = WindowGeometry::new(100, 50, 200, 100);
        assert!(rect.contains(100, 50));
        assert!(rect.contains(299, 149));
        assert!(!rect.contains(300, 149));
        assert!(!rect.contains(99, 60));
        assert_eq!(rect.center(), (200, 100));
    }
}
