use super::run_tool;
use super::wmctrl::parse_id;
use crate::error::Result;
use crate::events::WindowId;

pub fn active_window() -> Result<Option<WindowId>> {
    Ok(parse_id(&run_tool("xdotool", &["getactivewindow"])?))
}

pub fn minimize(id: WindowId) -> Result<()> {
    run_tool("xdotool", &["windowminimize", &id.to_string()]).map(drop)
}

pub fn pointer() -> Result<Option<(i32, i32)>> {
    Ok(parse_mouse_location(&run_tool("xdotool", &["getmouselocation", "--shell"])?))
}

pub fn warp_pointer(x: i32, y: i32) -> Result<()> {
    run_tool("xdotool", &["mousemove", &x.to_string(), &y.to_string()]).map(drop)
}

/// Вывод `getmouselocation --shell`: строки `X=..`, `Y=..`, `SCREEN=..`, `WINDOW=..`
pub fn parse_mouse_location(output: &str) -> Option<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for line in output.lines() {
        match line.trim().split_once('=') {
            Some(("X", value)) => x = value.parse().ok(),
            Some(("Y", value)) => y = value.parse().ok(),
            _ => {}
        }
    }
    Some((x?, y?))
}
