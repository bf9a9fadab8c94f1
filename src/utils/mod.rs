pub mod device_finder;
pub mod permissions;

pub use device_finder::DeviceFinder;

// Макрос условного логирования: аргументы не форматируются, если DEBUG выключен
#[macro_export]
macro_rules! debug_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}
