use crate::engine::LockState;
use crate::error::{Result, RorError};
use crate::events::HostEvent;
use crate::services::GrabTable;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use super::r#trait::KeyboardListenerTrait;

/// Клавиатура для `--dry-run`: нажатия читаются из stdin построчно.
///
/// `<Super>e` - нажать сочетание, `!locks num caps` - задать индикаторы,
/// `!focus-lost` - поверхность захвата потеряла фокус.
pub struct DryRunKeyboardListener {
    grabs: Arc<GrabTable>,
    events: UnboundedSender<HostEvent>,
}

impl DryRunKeyboardListener {
    pub fn new(grabs: Arc<GrabTable>, events: UnboundedSender<HostEvent>) -> Result<Self> {
        info!("Инициализация DryRunKeyboardListener");
        Ok(Self { grabs, events })
    }

    fn run_blocking(self) -> Result<()> {
        info!("Dry-run режим: вводите сочетания клавиш, по одному в строке");
        info!("Захвачено: {:?}", self.grabs.shortcuts());

        for line in std::io::stdin().lock().lines() {
            let line = line?;
            match interpret(&line, &self.grabs) {
                Some(event) => {
                    if self.events.send(event).is_err() {
                        break;
                    }
                }
                None if !line.trim().is_empty() => {
                    warn!("'{}' не захвачено. Захвачено: {:?}", line.trim(), self.grabs.shortcuts());
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// Разобрать строку ввода в событие хоста
pub fn interpret(line: &str, grabs: &GrabTable) -> Option<HostEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(command) = line.strip_prefix('!') {
        let mut words = command.split_whitespace();
        return match words.next()? {
            "focus-lost" => Some(HostEvent::CaptureFocusLost),
            "locks" => {
                let mut state = LockState::default();
                for word in words {
                    match word {
                        "num" => state.num_lock = true,
                        "caps" => state.caps_lock = true,
                        "scroll" => state.scroll_lock = true,
                        _ => {}
                    }
                }
                grabs
                    .set_lock_state(state)
                    .then_some(HostEvent::LockStateChanged)
            }
            _ => None,
        };
    }

    if let Some(grab_id) = grabs.lookup(line) {
        return Some(HostEvent::AcceleratorActivated(grab_id));
    }
    grabs.is_capturing().then(|| HostEvent::KeyPressed {
        label: line.to_string(),
        is_modifier: false,
    })
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for DryRunKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        tokio::task::spawn_blocking(move || (*self).run_blocking())
            .await
            .map_err(|e| RorError::Internal(format!("Чтение stdin завершилось: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grabbed_line_activates() {
        let grabs = GrabTable::new();
        let id = grabs.grab("<Super>e").unwrap();
        assert_eq!(interpret(" <super>E ", &grabs), Some(HostEvent::AcceleratorActivated(id)));
        assert_eq!(interpret("<Super>x", &grabs), None);

        grabs.set_capturing(true);
        assert_eq!(
            interpret("x", &grabs),
            Some(HostEvent::KeyPressed { label: "x".into(), is_modifier: false })
        );
    }

    #[test]
    fn commands() {
        let grabs = GrabTable::new();
        assert_eq!(interpret("!focus-lost", &grabs), Some(HostEvent::CaptureFocusLost));
        assert_eq!(interpret("!locks num", &grabs), Some(HostEvent::LockStateChanged));
        assert!(grabs.lock_state().num_lock);
        assert_eq!(interpret("!locks num", &grabs), None);
        assert_eq!(interpret("!bogus", &grabs), None);
    }
}
