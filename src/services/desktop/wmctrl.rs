use super::run_tool;
use crate::error::Result;
use crate::events::{WindowGeometry, WindowId, WindowInfo};
use tracing::debug;

/// Окна из `wmctrl -lxpG` в порядке списка клиентов
pub fn list_windows() -> Result<Vec<WindowInfo>> {
    let stdout = run_tool("wmctrl", &["-lxpG"])?;
    Ok(stdout.lines().filter_map(parse_window_line).collect())
}

/// Номер текущего рабочего стола (`wmctrl -d`, строка со `*`)
pub fn active_workspace() -> Result<Option<i32>> {
    let stdout = run_tool("wmctrl", &["-d"])?;
    Ok(stdout.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let index = parts.next()?.parse().ok()?;
        (parts.next() == Some("*")).then_some(index)
    }))
}

pub fn activate(id: WindowId) -> Result<()> {
    run_tool("wmctrl", &["-ia", &format_id(id)]).map(drop)
}

pub fn move_to_workspace(id: WindowId, workspace: i32) -> Result<()> {
    run_tool("wmctrl", &["-ir", &format_id(id), "-t", &workspace.to_string()]).map(drop)
}

pub fn format_id(id: WindowId) -> String {
    format!("{:#010x}", id)
}

pub fn parse_id(text: &str) -> Option<WindowId> {
    let text = text.trim();
    match text.strip_prefix("0x") {
        Some(hex) => WindowId::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// `0x03a00003  0 4242   0 27 1920 1053  Navigator.firefox  host  Title words`
pub fn parse_window_line(line: &str) -> Option<WindowInfo> {
    let mut rest = line.trim_start();
    let mut fields = Vec::with_capacity(9);
    for _ in 0..9 {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    let title = rest.trim_end();

    let id = parse_id(fields[0])?;
    let desktop: i32 = fields[1].parse().ok()?;
    let pid: u32 = fields[2].parse().ok()?;
    let x: i32 = fields[3].parse().ok()?;
    let y: i32 = fields[4].parse().ok()?;
    let width: u32 = fields[5].parse().ok()?;
    let height: u32 = fields[6].parse().ok()?;
    let (instance, class) = split_wm_class(fields[7]);

    let mut window = WindowInfo::new(id, title)
        .with_class(class)
        .with_instance(instance)
        .with_geometry(WindowGeometry::new(x, y, width, height));
    if pid > 0 {
        window = window.with_pid(pid);
    }
    // -1: окно на всех рабочих столах
    if desktop >= 0 {
        window = window.with_workspace(desktop);
    }
    debug!("wmctrl: {}", window);
    Some(window)
}

/// Разделить `instance.Class`. Обе части могут содержать точки
/// (`org.gnome.Nautilus.Org.gnome.Nautilus`): если половины совпадают без
/// учёта регистра, режем посередине, иначе по последней точке.
pub fn split_wm_class(wm_class: &str) -> (&str, &str) {
    let dots: Vec<usize> = wm_class.match_indices('.').map(|(i, _)| i).collect();
    if dots.len() % 2 == 1 {
        let middle = dots[dots.len() / 2];
        let (instance, class) = (&wm_class[..middle], &wm_class[middle + 1..]);
        if instance.eq_ignore_ascii_case(class) {
            return (instance, class);
        }
    }
    match wm_class.rsplit_once('.') {
        Some((instance, class)) => (instance, class),
        None => (wm_class, wm_class),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_line() {
        let line = "0x03a00003  2 4242   10   27   1920 1053 Navigator.firefox  box Mozilla Firefox  ";
        let w = parse_window_line(line).unwrap();
        assert_eq!(w.id, 0x03a00003);
        assert_eq!(w.workspace, Some(2));
        assert_eq!(w.pid, Some(4242));
        assert_eq!(w.instance, "Navigator");
        assert_eq!(w.class, "firefox");
        assert_eq!(w.title, "Mozilla Firefox");
        assert_eq!(w.geometry, Some(WindowGeometry::new(10, 27, 1920, 1053)));
    }

    #[test]
    fn sticky_window_has_no_workspace() {
        let line = "0x01200001 -1 0 0 0 1920 32 xfce4-panel.Xfce4-panel box xfce4-panel";
        let w = parse_window_line(line).unwrap();
        assert_eq!(w.workspace, None);
        assert_eq!(w.pid, None);
    }

    #[test]
    fn empty_title_and_garbage() {
        let w = parse_window_line("0x1 0 1 0 0 10 10 a.B box").unwrap();
        assert_eq!(w.title, "");
        assert!(parse_window_line("garbage").is_none());
    }

    #[test]
    fn wm_class_with_dots() {
        assert_eq!(
            split_wm_class("org.gnome.Nautilus.Org.gnome.Nautilus"),
            ("org.gnome.Nautilus", "Org.gnome.Nautilus")
        );
        assert_eq!(split_wm_class("Navigator.firefox"), ("Navigator", "firefox"));
        assert_eq!(split_wm_class("a.b.Term"), ("a.b", "Term"));
        assert_eq!(split_wm_class("xterm"), ("xterm", "xterm"));
    }

    #[test]
    fn window_ids() {
        assert_eq!(parse_id("0x03a00003"), Some(0x03a00003));
        assert_eq!(parse_id("60817411\n"), Some(60817411));
        assert_eq!(format_id(0x3a00003), "0x03a00003");
    }
}
