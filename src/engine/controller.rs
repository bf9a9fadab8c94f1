use super::accelerator::{Accelerator, GrabMap, GrabTarget};
use super::action::{Action, ActionId, Registers};
use super::layer::LayerSession;
use super::lock_state::{LockRequirement, LockStateTracker};
use super::mode::BooleanSettings;
use super::parser;
use crate::events::{normalize_accelerator, GrabId, HostEvent};
use crate::services::Host;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Краткое описание акселератора для `--check`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorSummary {
    pub shortcut: String,
    pub actions: Vec<ActionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSummary {
    pub command: String,
    pub wm_class: String,
    pub title: String,
    pub lock: LockRequirement,
    pub layers: Vec<String>,
    pub modes: Vec<String>,
}

/// Оркестратор: держит таблицу акселераторов, регистры окон, состояние
/// индикаторов и открытую сессию слоёв. Всё изменяемое состояние живёт
/// здесь и передаётся акселераторам и шорткатам по ссылке.
pub struct Controller {
    settings: Arc<dyn BooleanSettings>,
    accelerators: BTreeMap<String, Accelerator>,
    grab_map: GrabMap,
    registers: Registers,
    lock_tracker: LockStateTracker,
    layer: Option<LayerSession>,
    next_action_id: ActionId,
    enabled: bool,
}

impl Controller {
    pub fn new(settings: Arc<dyn BooleanSettings>) -> Self {
        Self {
            settings,
            accelerators: BTreeMap::new(),
            grab_map: GrabMap::new(),
            registers: Registers::default(),
            lock_tracker: LockStateTracker::default(),
            layer: None,
            next_action_id: 0,
            enabled: false,
        }
    }

    /// Разобрать текст shortcuts.conf и добавить шорткаты в таблицу.
    /// Возвращает число добавленных шорткатов; плохие строки логируются.
    pub fn load_text(&mut self, text: &str) -> usize {
        let parsed = parser::parse_document(text, &self.settings, &mut self.next_action_id);
        for e in &parsed.errors {
            warn!("{}", e);
        }
        let count = parsed.actions.len();
        for action in parsed.actions {
            self.register(action);
        }
        info!("Загружено шорткатов: {} (акселераторов: {})", count, self.accelerators.len());
        count
    }

    /// Добавить шорткат в акселератор с его сочетанием клавиш;
    /// `<Ctrl>a` и `<Control>a` попадают в одну группу
    pub fn register(&mut self, action: Action) {
        self.accelerators
            .entry(normalize_accelerator(&action.shortcut))
            .or_insert_with(|| Accelerator::new(action.shortcut.clone()))
            .push(action);
    }

    pub fn accelerator(&self, shortcut: &str) -> Option<&Accelerator> {
        self.accelerators.get(&normalize_accelerator(shortcut))
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn layer_session(&self) -> Option<&LayerSession> {
        self.layer.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn summary(&self) -> Vec<AcceleratorSummary> {
        self.accelerators
            .values()
            .map(|acc| AcceleratorSummary {
                shortcut: acc.shortcut().to_string(),
                actions: acc
                    .actions()
                    .iter()
                    .map(|a| ActionSummary {
                        command: a.command.clone(),
                        wm_class: a.wm_class.source(),
                        title: a.title.source(),
                        lock: a.lock,
                        layers: a.layers.to_vec(),
                        modes: a
                            .modes
                            .explicit()
                            .map(|(mode, value)| match value.arg() {
                                Some(arg) => format!("{}({})", mode, arg),
                                None => mode.to_string(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Захватить все акселераторы, допустимые при текущем состоянии индикаторов
    pub fn enable<H: Host + ?Sized>(&mut self, host: &mut H) {
        let state = host.lock_state();
        self.lock_tracker = LockStateTracker::new(state);
        debug!("Состояние индикаторов при запуске: {}", state);

        for accelerator in self.accelerators.values_mut() {
            if accelerator.conforms(state) {
                accelerator.connect(state, host, &mut self.grab_map);
            }
        }
        self.enabled = true;
        info!(
            "Захвачено акселераторов: {} из {}",
            self.accelerators.values().filter(|a| a.is_grabbed()).count(),
            self.accelerators.len()
        );
    }

    /// Освободить все захваты и закрыть сессию слоёв
    pub fn disable<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.close_layers(host, "отключение");
        for accelerator in self.accelerators.values_mut() {
            accelerator.disconnect(host, &mut self.grab_map);
        }
        self.registers.clear();
        self.enabled = false;
        info!("Все акселераторы освобождены");
    }

    pub fn handle_event<H: Host + ?Sized>(&mut self, event: HostEvent, host: &mut H) {
        match event {
            HostEvent::AcceleratorActivated(grab_id) => self.on_accelerator_activated(grab_id, host),
            HostEvent::LockStateChanged => self.on_lock_state_changed(host),
            HostEvent::KeyPressed { label, is_modifier } => self.on_key_pressed(&label, is_modifier, host),
            HostEvent::CaptureFocusLost => self.close_layers(host, "поверхность захвата потеряла фокус"),
            HostEvent::Shutdown => self.disable(host),
        }
    }

    fn on_accelerator_activated<H: Host + ?Sized>(&mut self, grab_id: GrabId, host: &mut H) {
        let Some(target) = self.grab_map.get(&grab_id).cloned() else {
            debug!("Нет слушателей для акселератора {}", grab_id);
            return;
        };

        match target {
            GrabTarget::Layer(shortcut) => self.on_layer_activated(&shortcut, host),
            GrabTarget::Shortcut(shortcut) => {
                if self.layer.is_some() {
                    // новый корневой шорткат во время сессии слоёв
                    let state = self.lock_tracker.current();
                    let is_chord = self
                        .accelerators
                        .get(&shortcut)
                        .is_some_and(|acc| acc.has_chord_roots(state));
                    self.close_layers(host, "нажат другой шорткат");
                    if !is_chord {
                        debug!("Срабатывание {} во время слоёв проигнорировано", shortcut);
                        return;
                    }
                }

                let Some(accelerator) = self.accelerators.get_mut(&shortcut) else {
                    return;
                };
                let roots = accelerator.trigger(host, &mut self.registers);
                if !roots.is_empty() {
                    self.enter_layers(roots, host);
                }
            }
        }
    }

    fn on_layer_activated<H: Host + ?Sized>(&mut self, shortcut: &str, host: &mut H) {
        let Some(accelerator) = self
            .layer
            .as_mut()
            .and_then(|session| session.accelerator_mut(shortcut))
        else {
            return;
        };

        let roots = accelerator.trigger(host, &mut self.registers);
        if roots.is_empty() {
            self.close_layers(host, "шорткат выполнен");
        } else {
            self.enter_layers(roots, host);
        }
    }

    fn enter_layers<H: Host + ?Sized>(&mut self, roots: Vec<Action>, host: &mut H) {
        let state = self.lock_tracker.current();
        let starting = self.layer.is_none();
        let session = self.layer.get_or_insert_with(LayerSession::new);

        let grabbed = session.descend(
            roots,
            &mut self.next_action_id,
            &mut self.accelerators,
            state,
            host,
            &mut self.grab_map,
        );

        if grabbed == 0 {
            self.close_layers(host, "не удалось захватить ни одной клавиши слоя");
            return;
        }
        if starting {
            if let Err(e) = host.start_key_capture() {
                error!("Не удалось начать захват клавиатуры: {}", e);
                self.close_layers(host, "нет поверхности захвата");
            }
        }
    }

    fn on_key_pressed<H: Host + ?Sized>(&mut self, label: &str, is_modifier: bool, host: &mut H) {
        let Some(session) = &self.layer else {
            return;
        };
        if is_modifier || session.expects(label) {
            return;
        }
        self.close_layers(host, "нажата посторонняя клавиша");
    }

    fn on_lock_state_changed<H: Host + ?Sized>(&mut self, host: &mut H) {
        let state = host.lock_state();
        let Some(previous) = self.lock_tracker.update(state) else {
            return;
        };
        info!("Состояние индикаторов: {} -> {}", previous, state);

        for accelerator in self
            .accelerators
            .values_mut()
            .filter(|acc| acc.is_lock_dependent())
        {
            accelerator.on_state_changed(state, previous, host, &mut self.grab_map);
        }
    }

    /// Завершить сессию слоёв: временные захваты освобождаются,
    /// заблокированные акселераторы возвращаются, захват клавиатуры снимается
    fn close_layers<H: Host + ?Sized>(&mut self, host: &mut H, reason: &str) {
        let Some(mut session) = self.layer.take() else {
            return;
        };
        session.release(
            &mut self.accelerators,
            self.lock_tracker.current(),
            host,
            &mut self.grab_map,
        );
        host.stop_key_capture();
        info!("Сессия слоёв закрыта: {}", reason);
    }

    /// Цикл обработки событий хоста. Единственное место, где меняется
    /// состояние контроллера.
    pub async fn run(
        mut self,
        mut host: Box<dyn Host>,
        mut events: mpsc::UnboundedReceiver<HostEvent>,
    ) {
        self.enable(host.as_mut());

        while let Some(event) = events.recv().await {
            if event == HostEvent::Shutdown {
                break;
            }
            self.handle_event(event, host.as_mut());
        }

        self.disable(host.as_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::action::RegisterSlot;
    use crate::engine::lock_state::LockState;
    use crate::engine::mode::NoSettings;
    use crate::events::WindowInfo;
    use crate::services::dry_run::{DryRunHost, HostCall};
    use crate::services::WindowHost;

    fn controller(text: &str) -> Controller {
        let mut controller = Controller::new(Arc::new(NoSettings));
        controller.load_text(text);
        controller
    }

    fn press(controller: &mut Controller, host: &mut DryRunHost, shortcut: &str) {
        let grab_id = host
            .grab_id(shortcut)
            .unwrap_or_else(|| panic!("{} не захвачен", shortcut));
        controller.handle_event(HostEvent::AcceleratorActivated(grab_id), host);
    }

    fn key(controller: &mut Controller, host: &mut DryRunHost, label: &str) {
        if let Some(grab_id) = host.grab_id(label) {
            controller.handle_event(HostEvent::AcceleratorActivated(grab_id), host);
        } else {
            controller.handle_event(
                HostEvent::KeyPressed {
                    label: label.to_string(),
                    is_modifier: false,
                },
                host,
            );
        }
    }

    #[test]
    fn groups_actions_by_shortcut() {
        let c = controller("<Super>e,gedit\n<Super>e,xterm\n<Super>f,firefox,firefox,\n");
        assert_eq!(c.accelerator("<Super>e").unwrap().actions().len(), 2);
        let summary = c.summary();
        assert_eq!(summary.len(), 2);
        let firefox = &summary[1].actions[0];
        assert_eq!((firefox.wm_class.as_str(), firefox.title.as_str()), ("firefox", ""));
    }

    #[test]
    fn end_to_end_launch_then_raise() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Super>1,firefox,firefox,");
        c.enable(&mut host);
        assert!(host.is_grabbed("<Super>1"));

        press(&mut c, &mut host, "<Super>1");
        assert_eq!(host.calls(), &[HostCall::Spawn(vec!["firefox".into()])]);

        host.clear_calls();
        host.add_window(WindowInfo::new(3, "Mozilla Firefox").with_class("firefox"));
        host.add_window(WindowInfo::new(4, "Terminal").with_class("XTerm").with_focus(true));
        press(&mut c, &mut host, "<Super>1");
        assert_eq!(host.calls(), &[HostCall::Focus(3)]);
    }

    #[test]
    fn enable_skips_non_conforming_lock_actions() {
        let mut host = DryRunHost::new();
        host.set_lock_state(LockState::new(false, false, false));
        let mut c = controller("<Num_Lock><Super>i,on-cmd\n<Super>e,gedit");
        c.enable(&mut host);
        assert!(!host.is_grabbed("<Super>i"));
        assert!(host.is_grabbed("<Super>e"));

        host.set_lock_state(LockState::new(true, false, false));
        c.handle_event(HostEvent::LockStateChanged, &mut host);
        assert!(host.is_grabbed("<Super>i"));
    }

    #[test]
    fn num_lock_pair_is_always_grabbed_once() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Num_Lock><Super>i,on-cmd\n<Num_Lock_OFF><Super>i,off-cmd");
        c.enable(&mut host);

        for on in [true, false, true] {
            host.set_lock_state(LockState::new(on, false, false));
            c.handle_event(HostEvent::LockStateChanged, &mut host);
            assert_eq!(host.grab_count(), 1);
            assert!(c.accelerator("<Super>i").unwrap().is_grabbed());

            host.clear_calls();
            press(&mut c, &mut host, "<Super>i");
            let expected = if on { "on-cmd" } else { "off-cmd" };
            assert_eq!(host.calls(), &[HostCall::Spawn(vec![expected.into()])]);
        }
    }

    #[test]
    fn chord_executes_after_layer_key() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Super>g a,gedit\n<Super>g b,abiword");
        c.enable(&mut host);

        press(&mut c, &mut host, "<Super>g");
        assert!(host.calls().is_empty());
        assert!(host.is_capturing());
        assert!(host.is_grabbed("a") && host.is_grabbed("b"));

        key(&mut c, &mut host, "b");
        assert_eq!(host.calls(), &[HostCall::Spawn(vec!["abiword".into()])]);
        assert!(c.layer_session().is_none());
        assert!(!host.is_capturing());
        assert!(!host.is_grabbed("a"));
        assert!(!host.is_grabbed("b"));
    }

    #[test]
    fn nested_layers_descend() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Super>g a b,gedit");
        c.enable(&mut host);

        press(&mut c, &mut host, "<Super>g");
        key(&mut c, &mut host, "a");
        assert!(host.calls().is_empty());
        assert_eq!(c.layer_session().map(|s| s.depth()), Some(2));
        assert!(!host.is_grabbed("a"));

        key(&mut c, &mut host, "b");
        assert_eq!(host.calls(), &[HostCall::Spawn(vec!["gedit".into()])]);
        assert!(c.layer_session().is_none());
    }

    #[test]
    fn focus_loss_rolls_back_blocked_accelerators() {
        let mut host = DryRunHost::new();
        let mut c = controller("a,xterm\n<Super>g a,gedit");
        c.enable(&mut host);
        let before = host.grab_id("a");
        assert!(before.is_some());

        press(&mut c, &mut host, "<Super>g");
        let session = c.layer_session().unwrap();
        assert_eq!(session.blocked(), &["a".to_string()]);
        assert!(c.accelerator("a").unwrap().is_blocked());

        c.handle_event(HostEvent::CaptureFocusLost, &mut host);
        assert!(c.layer_session().is_none());
        assert!(!c.accelerator("a").unwrap().is_blocked());
        assert!(c.accelerator("a").unwrap().is_grabbed());
        assert!(c.accelerator("<Super>g").unwrap().is_grabbed());
        assert_eq!(host.grab_count(), 2);
        assert!(host.calls().is_empty());
        assert!(!host.is_capturing());
    }

    #[test]
    fn stray_key_abandons_session() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Super>g a,gedit");
        c.enable(&mut host);

        press(&mut c, &mut host, "<Super>g");
        c.handle_event(
            HostEvent::KeyPressed {
                label: "Shift_L".into(),
                is_modifier: true,
            },
            &mut host,
        );
        assert!(c.layer_session().is_some());

        key(&mut c, &mut host, "z");
        assert!(c.layer_session().is_none());
        assert!(host.calls().is_empty());
        assert_eq!(host.grab_count(), 1);
    }

    #[test]
    fn new_root_during_session() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Super>g a,gedit\n<Super>h b,abiword\n<Super>e,xterm");
        c.enable(&mut host);

        press(&mut c, &mut host, "<Super>g");
        // обычный шорткат во время слоёв только прерывает сессию
        press(&mut c, &mut host, "<Super>e");
        assert!(c.layer_session().is_none());
        assert!(host.calls().is_empty());

        press(&mut c, &mut host, "<Super>g");
        // другой многоклавишный шорткат начинает новую сессию
        press(&mut c, &mut host, "<Super>h");
        let session = c.layer_session().unwrap();
        assert_eq!(session.shortcuts().collect::<Vec<_>>(), vec!["b"]);
        assert!(!host.is_grabbed("a"));
    }

    #[test]
    fn disable_releases_everything() {
        let mut host = DryRunHost::new();
        let mut c = controller("a,xterm\n<Super>g a,gedit\n<Super>e,gedit");
        c.enable(&mut host);
        press(&mut c, &mut host, "<Super>g");

        c.disable(&mut host);
        assert_eq!(host.grab_count(), 0);
        assert!(c.layer_session().is_none());
        assert!(!host.is_capturing());
        assert!(!c.is_enabled());
    }

    #[test]
    fn registers_are_shared_and_dropped_on_disable() {
        let mut host = DryRunHost::new();
        host.add_window(WindowInfo::new(7, "Notes").with_focus(true));
        host.add_window(WindowInfo::new(8, "Mail"));
        let mut c = controller("<Super>KP_1:register(1),true\n<Super>1:raise(1),true");
        c.enable(&mut host);

        press(&mut c, &mut host, "<Super>KP_1");
        assert_eq!(c.registers().get(&RegisterSlot::Named("1".into())), Some(7));

        host.focus_by_id(8);
        host.clear_calls();
        press(&mut c, &mut host, "<Super>1");
        assert_eq!(host.calls(), &[HostCall::Focus(7)]);

        c.disable(&mut host);
        assert!(!c.registers().contains(&RegisterSlot::Named("1".into())));
    }

    #[test]
    fn aliased_shortcuts_share_one_accelerator() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Control>a,xterm\n<Super>g <Ctrl>a,gedit\n<Super>f,firefox\n<super>F,abiword");
        c.enable(&mut host);
        assert_eq!(c.accelerator("<Super>f").unwrap().actions().len(), 2);
        assert_eq!(c.summary().len(), 3);
        assert_eq!(host.grab_count(), 3);

        press(&mut c, &mut host, "<Super>g");
        assert_eq!(c.layer_session().unwrap().blocked(), &["<Control>a".to_string()]);
        assert!(c.accelerator("<Ctrl>a").unwrap().is_blocked());

        key(&mut c, &mut host, "<Control>a");
        assert_eq!(host.calls(), &[HostCall::Spawn(vec!["gedit".into()])]);
        assert!(c.layer_session().is_none());
        assert!(c.accelerator("<Control>a").unwrap().is_grabbed());
        assert_eq!(host.grab_count(), 3);
    }

    fn lock_toggle_during_session(toggles: &[bool]) -> (Controller, DryRunHost) {
        let mut host = DryRunHost::new();
        host.set_lock_state(LockState::new(true, false, false));
        let mut c = controller("<Num_Lock>a,xterm\n<Super>g a,gedit");
        c.enable(&mut host);
        assert!(host.is_grabbed("a"));

        press(&mut c, &mut host, "<Super>g");
        assert_eq!(c.layer_session().unwrap().blocked(), &["a".to_string()]);

        for &num_lock in toggles {
            host.set_lock_state(LockState::new(num_lock, false, false));
            c.handle_event(HostEvent::LockStateChanged, &mut host);
            assert!(c.accelerator("a").unwrap().is_blocked());
        }

        c.handle_event(HostEvent::CaptureFocusLost, &mut host);
        assert!(c.layer_session().is_none());
        assert!(!c.accelerator("a").unwrap().is_blocked());
        assert!(host.calls().is_empty());
        (c, host)
    }

    #[test]
    fn lock_toggled_back_during_session_regrabs_once() {
        let (c, host) = lock_toggle_during_session(&[false, true]);
        let accelerator = c.accelerator("a").unwrap();
        assert!(accelerator.is_grabbed());
        assert_eq!(accelerator.grab_id(), host.grab_id("a"));
        assert_eq!(host.grab_count(), 2);
    }

    #[test]
    fn lock_turned_off_during_session_stays_ungrabbed() {
        let (c, host) = lock_toggle_during_session(&[false]);
        assert!(!c.accelerator("a").unwrap().is_grabbed());
        assert!(!host.is_grabbed("a"));
        assert_eq!(host.grab_count(), 1);
    }

    #[test]
    fn unknown_grab_id_is_ignored() {
        let mut host = DryRunHost::new();
        let mut c = controller("<Super>e,gedit");
        c.enable(&mut host);
        c.handle_event(HostEvent::AcceleratorActivated(9999), &mut host);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn grab_conflict_is_not_fatal() {
        let mut host = DryRunHost::new();
        host.grab_accelerator("<Super>e");
        let mut c = controller("<Super>e,gedit\n<Super>f,firefox");
        c.enable(&mut host);
        assert!(!c.accelerator("<Super>e").unwrap().is_grabbed());
        assert!(c.accelerator("<Super>f").unwrap().is_grabbed());
    }

    #[tokio::test]
    async fn run_loop_stops_on_shutdown() {
        let host = DryRunHost::new();
        let shared = host.grabs();
        let c = controller("<Super>e,gedit");
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(HostEvent::LockStateChanged).unwrap();
        tx.send(HostEvent::Shutdown).unwrap();
        c.run(Box::new(host), rx).await;
        assert_eq!(shared.len(), 0);
    }
}
