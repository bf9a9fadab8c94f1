use super::accelerator::{Accelerator, GrabMap};
use super::action::{Action, ActionId};
use super::lock_state::LockState;
use crate::events::normalize_accelerator;
use crate::services::WindowHost;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Открытая сессия многоклавишного шортката.
///
/// Держит временные акселераторы следующего слоя и список постоянных
/// акселераторов, заблокированных ради них. Все они возвращаются в исходное
/// состояние через [`LayerSession::release`], на любом пути выхода.
#[derive(Debug, Default)]
pub struct LayerSession {
    accelerators: BTreeMap<String, Accelerator>,
    blocked: Vec<String>,
    depth: usize,
}

impl LayerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Постоянные акселераторы, заблокированные на время сессии
    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    pub fn shortcuts(&self) -> impl Iterator<Item = &str> {
        self.accelerators.keys().map(String::as_str)
    }

    pub fn accelerator_mut(&mut self, shortcut: &str) -> Option<&mut Accelerator> {
        self.accelerators.get_mut(&normalize_accelerator(shortcut))
    }

    /// Ожидает ли сессия это нажатие (сравнение по канонической форме)
    pub fn expects(&self, label: &str) -> bool {
        self.accelerators.contains_key(&normalize_accelerator(label))
    }

    /// Перейти на следующий слой: построить продолжения для каждого
    /// начала шортката, заблокировать совпадающие постоянные акселераторы
    /// и захватить новые клавиши. Возвращает число захваченных клавиш.
    pub fn descend<H: WindowHost + ?Sized>(
        &mut self,
        roots: Vec<Action>,
        next_id: &mut ActionId,
        persistent: &mut BTreeMap<String, Accelerator>,
        state: LockState,
        host: &mut H,
        grab_map: &mut GrabMap,
    ) -> usize {
        // предыдущий слой больше не нужен
        for accelerator in self.accelerators.values_mut() {
            accelerator.disconnect(host, grab_map);
        }
        self.accelerators.clear();
        self.depth += 1;

        for root in roots {
            let continuation = root.layered_action(*next_id);
            *next_id += 1;
            let key = normalize_accelerator(&continuation.shortcut);

            if let Some(existing) = persistent.get_mut(&key) {
                if !self.blocked.contains(&key) {
                    existing.block(host, grab_map);
                    self.blocked.push(key.clone());
                }
            }

            self.accelerators
                .entry(key)
                .or_insert_with(|| Accelerator::layer(continuation.shortcut.clone()))
                .push(continuation);
        }

        let mut grabbed = 0;
        for accelerator in self.accelerators.values_mut() {
            if accelerator.conforms(state) && accelerator.connect(state, host, grab_map) {
                grabbed += 1;
            }
        }
        info!(
            "Слой {}: ожидаем {:?}",
            self.depth,
            self.accelerators.keys().collect::<Vec<_>>()
        );
        grabbed
    }

    /// Освободить временные захваты и разблокировать постоянные акселераторы
    pub fn release<H: WindowHost + ?Sized>(
        &mut self,
        persistent: &mut BTreeMap<String, Accelerator>,
        state: LockState,
        host: &mut H,
        grab_map: &mut GrabMap,
    ) {
        for accelerator in self.accelerators.values_mut() {
            accelerator.disconnect(host, grab_map);
        }
        self.accelerators.clear();

        for shortcut in self.blocked.drain(..) {
            if let Some(accelerator) = persistent.get_mut(&shortcut) {
                accelerator.unblock(state, host, grab_map);
            }
        }
        debug!("Сессия слоёв освобождена");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::accelerator::GrabTarget;
    use crate::engine::mode::{BooleanSettings, NoSettings};
    use crate::engine::parser::parse_line;
    use crate::services::dry_run::DryRunHost;
    use std::sync::Arc;

    fn action(line: &str, id: ActionId) -> Action {
        let settings: Arc<dyn BooleanSettings> = Arc::new(NoSettings);
        parse_line(line, id, &settings).unwrap()
    }

    fn persistent_a(host: &mut DryRunHost, grab_map: &mut GrabMap) -> BTreeMap<String, Accelerator> {
        let mut acc = Accelerator::new("a");
        acc.push(action("a,xterm", 1));
        acc.connect(LockState::default(), host, grab_map);
        BTreeMap::from([("a".to_string(), acc)])
    }

    #[test]
    fn descend_blocks_conflicting_accelerator() {
        let mut host = DryRunHost::new();
        let mut grab_map = GrabMap::new();
        let mut persistent = persistent_a(&mut host, &mut grab_map);
        let mut session = LayerSession::new();
        let mut next_id = 100;

        let roots = vec![action("<Super>g a,gedit", 2), action("<Super>g b,abiword", 3)];
        let grabbed = session.descend(
            roots,
            &mut next_id,
            &mut persistent,
            LockState::default(),
            &mut host,
            &mut grab_map,
        );

        assert_eq!(grabbed, 2);
        assert_eq!(next_id, 102);
        assert_eq!(session.blocked(), &["a".to_string()]);
        assert!(persistent["a"].is_blocked());
        assert_eq!(session.shortcuts().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(grab_map.values().all(|t| matches!(t, GrabTarget::Layer(_))));
        assert!(session.expects("A"));
        assert!(!session.expects("c"));
    }

    #[test]
    fn release_restores_everything() {
        let mut host = DryRunHost::new();
        let mut grab_map = GrabMap::new();
        let mut persistent = persistent_a(&mut host, &mut grab_map);
        let mut session = LayerSession::new();
        let mut next_id = 100;

        session.descend(
            vec![action("<Super>g a,gedit", 2)],
            &mut next_id,
            &mut persistent,
            LockState::default(),
            &mut host,
            &mut grab_map,
        );
        session.release(&mut persistent, LockState::default(), &mut host, &mut grab_map);

        assert!(session.blocked().is_empty());
        assert!(!persistent["a"].is_blocked());
        assert!(persistent["a"].is_grabbed());
        assert_eq!(grab_map.len(), 1);
        assert!(matches!(grab_map.values().next(), Some(GrabTarget::Shortcut(_))));
    }

    #[test]
    fn deeper_layer_replaces_previous_grabs() {
        let mut host = DryRunHost::new();
        let mut grab_map = GrabMap::new();
        let mut persistent = BTreeMap::new();
        let mut session = LayerSession::new();
        let mut next_id = 10;

        let root = action("<Super>g a b,gedit", 1);
        session.descend(
            vec![root],
            &mut next_id,
            &mut persistent,
            LockState::default(),
            &mut host,
            &mut grab_map,
        );
        let continuation = session.accelerator_mut("a").unwrap().actions()[0].clone();
        assert!(continuation.is_chord());

        session.descend(
            vec![continuation],
            &mut next_id,
            &mut persistent,
            LockState::default(),
            &mut host,
            &mut grab_map,
        );
        assert_eq!(session.depth(), 2);
        assert_eq!(session.shortcuts().collect::<Vec<_>>(), vec!["b"]);
        assert!(!host.is_grabbed("a"));
        assert!(host.is_grabbed("b"));
        assert_eq!(grab_map.len(), 1);
    }
}
