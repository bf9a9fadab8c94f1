use crate::engine::LockState;
use crate::events::{normalize_accelerator, GrabId};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Таблица захваченных сочетаний, общая для задачи контроллера и потока,
/// читающего клавиатуру. Ключ таблицы - каноническая форма акселератора.
#[derive(Debug)]
pub struct GrabTable {
    grabs: DashMap<String, GrabId>,
    next_id: AtomicU32,
    capturing: AtomicBool,
    locks: RwLock<LockState>,
}

impl Default for GrabTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GrabTable {
    pub fn new() -> Self {
        Self {
            grabs: DashMap::new(),
            next_id: AtomicU32::new(1),
            capturing: AtomicBool::new(false),
            locks: RwLock::new(LockState::default()),
        }
    }

    pub fn grab(&self, shortcut: &str) -> Option<GrabId> {
        let key = normalize_accelerator(shortcut);
        match self.grabs.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                slot.insert(id);
                Some(id)
            }
        }
    }

    pub fn ungrab(&self, grab_id: GrabId) -> bool {
        let before = self.grabs.len();
        self.grabs.retain(|_, id| *id != grab_id);
        self.grabs.len() != before
    }

    /// Идентификатор захвата для нажатого сочетания
    pub fn lookup(&self, accelerator: &str) -> Option<GrabId> {
        self.grabs
            .get(&normalize_accelerator(accelerator))
            .map(|entry| *entry.value())
    }

    pub fn is_grabbed(&self, shortcut: &str) -> bool {
        self.lookup(shortcut).is_some()
    }

    pub fn shortcuts(&self) -> Vec<String> {
        let mut shortcuts: Vec<String> = self.grabs.iter().map(|e| e.key().clone()).collect();
        shortcuts.sort();
        shortcuts
    }

    pub fn len(&self) -> usize {
        self.grabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grabs.is_empty()
    }

    pub fn set_capturing(&self, capturing: bool) {
        self.capturing.store(capturing, Ordering::SeqCst);
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    pub fn lock_state(&self) -> LockState {
        *self.locks.read()
    }

    /// Обновить состояние индикаторов. `true`, если оно изменилось.
    pub fn set_lock_state(&self, state: LockState) -> bool {
        let mut locks = self.locks.write();
        if *locks == state {
            return false;
        }
        *locks = state;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_is_exclusive_and_normalized() {
        let table = GrabTable::new();
        let id = table.grab("<Super>f").unwrap();
        assert_eq!(table.grab("<super>F"), None);
        assert_eq!(table.lookup("<Mod4>f"), Some(id));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ungrab_frees_shortcut() {
        let table = GrabTable::new();
        let id = table.grab("<Control><Alt>t").unwrap();
        assert!(table.ungrab(id));
        assert!(!table.ungrab(id));
        assert!(table.is_empty());

        let again = table.grab("<Alt><Ctrl>t").unwrap();
        assert_ne!(again, id);
    }

    #[test]
    fn lock_state_reports_changes() {
        let table = GrabTable::new();
        let on = LockState::new(true, false, false);
        assert!(table.set_lock_state(on));
        assert!(!table.set_lock_state(on));
        assert_eq!(table.lock_state(), on);
    }
}
