mod dry_keyboard_listener;
mod keyboard_listener;
mod modifier_state;
mod router;
mod r#trait;

pub use self::r#trait::{create_keyboard_listener, KeyboardListenerTrait};
