use crate::config::Config;
use crate::error::Result;
use crate::events::HostEvent;
use crate::services::GrabTable;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Источник нажатий: реальная клавиатура или stdin в dry-run режиме
#[async_trait::async_trait]
pub trait KeyboardListenerTrait {
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Выбрать источник нажатий по флагу `dry_run`
pub fn create_keyboard_listener(
    config: Arc<Config>,
    grabs: Arc<GrabTable>,
    events: UnboundedSender<HostEvent>,
    dry_run: bool,
) -> Result<Box<dyn KeyboardListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_keyboard_listener::DryRunKeyboardListener::new(
            grabs, events,
        )?))
    } else {
        Ok(Box::new(super::keyboard_listener::RealKeyboardListener::new(
            config, grabs, events,
        )?))
    }
}
