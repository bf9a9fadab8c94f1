pub mod desktop;
pub mod dry_run;
pub mod grab_table;
pub mod host;
pub mod keyboard_listener;
pub mod virtual_device;

pub use desktop::DesktopHost;
pub use dry_run::DryRunHost;
pub use grab_table::GrabTable;
pub use host::{Host, Launcher, WindowHost};
pub use keyboard_listener::create_keyboard_listener;
pub use virtual_device::VirtualDevice;
