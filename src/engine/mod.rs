//! Движок run-or-raise: разбор шорткатов, выбор окна, захват сочетаний
//! с учётом индикаторов и многоклавишные шорткаты.

pub mod accelerator;
pub mod action;
pub mod controller;
pub mod launcher;
pub mod layer;
pub mod lock_state;
pub mod matcher;
pub mod mode;
pub mod parser;

pub use accelerator::{Accelerator, GrabMap, GrabTarget};
pub use action::{Action, ActionId, RegisterSlot, Registers};
pub use controller::{AcceleratorSummary, ActionSummary, Controller};
pub use lock_state::{LockRequirement, LockState, LockStateTracker};
pub use matcher::MatchRule;
pub use mode::{BooleanSettings, Mode, ModeSet, ModeValue, NoSettings};
