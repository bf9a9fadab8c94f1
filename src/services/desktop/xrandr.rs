use super::run_tool;
use crate::error::Result;
use crate::events::WindowGeometry;

/// Прямоугольники мониторов в порядке `xrandr --listmonitors`
pub fn monitors() -> Result<Vec<WindowGeometry>> {
    let stdout = run_tool("xrandr", &["--listmonitors"])?;
    Ok(stdout.lines().skip(1).filter_map(parse_monitor_line).collect())
}

/// ` 0: +*DP-1 1920/527x1080/296+0+0  DP-1`
pub fn parse_monitor_line(line: &str) -> Option<WindowGeometry> {
    let geometry = line.split_whitespace().nth(2)?;
    let (size, offset) = geometry.split_once('+')?;
    let (width, height) = size.split_once('x')?;
    let (x, y) = offset.split_once('+')?;

    let physical = |s: &str| s.split('/').next().and_then(|v| v.parse::<u32>().ok());
    Some(WindowGeometry::new(
        x.parse().ok()?,
        y.parse().ok()?,
        physical(width)?,
        physical(height)?,
    ))
}

/// Монитор, на котором находится центр окна (0, если не найден)
pub fn monitor_of(monitors: &[WindowGeometry], window: &WindowGeometry) -> i32 {
    let (x, y) = window.center();
    monitors
        .iter()
        .position(|m| m.contains(x, y))
        .map_or(0, |i| i as i32)
}
