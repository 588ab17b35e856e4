//! The single shared owner of the selection state.
//!
//! Intents arrive from the poll loop and from asynchronous contexts (the
//! encoder and USB tasks, or an interrupt). [`SharedSelection::submit`]
//! runs "read state, apply intent, write state, notify" inside one
//! blocking-mutex critical section, so two intents can never interleave.
//!
//! The critical section is short: observers must only record or signal
//! (e.g. `embassy_sync::signal::Signal::signal`) and must never call back
//! into the `SharedSelection`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::{BootTarget, OptionList, SelectionState, Selector, SynthOption, Transition};
use crate::input::SelectionIntent;

/// Receives selection notifications while the state lock is held.
pub trait SelectionObserver {
    /// The highlighted option changed.
    fn selection_changed(&self, index: usize, option: &SynthOption);

    /// An option was confirmed; boot is now pending.
    fn confirmed(&self, index: usize, option: &SynthOption);
}

/// Observer that ignores everything.
impl SelectionObserver for () {
    fn selection_changed(&self, _index: usize, _option: &SynthOption) {}
    fn confirmed(&self, _index: usize, _option: &SynthOption) {}
}

/// Mutex-guarded [`Selector`] plus the observer it notifies.
pub struct SharedSelection<'a, M: RawMutex, O: SelectionObserver> {
    selector: Mutex<M, RefCell<Selector<'a>>>,
    observer: O,
}

impl<'a, M: RawMutex, O: SelectionObserver> SharedSelection<'a, M, O> {
    pub fn new(options: OptionList<'a>, observer: O) -> Self {
        Self {
            selector: Mutex::new(RefCell::new(Selector::new(options))),
            observer,
        }
    }

    /// Apply one intent and notify the observer, as one atomic unit.
    pub fn submit(&self, intent: SelectionIntent) -> Transition {
        self.selector.lock(|cell| {
            let mut selector = cell.borrow_mut();
            let transition = selector.apply(intent);

            if let Some(index) = transition.moved_to() {
                #[cfg(feature = "defmt")]
                defmt::info!("Selection: {} ({})", index, selector.current().display_name);
                self.observer.selection_changed(index, selector.current());
            }
            if let Some(index) = transition.confirmed() {
                #[cfg(feature = "defmt")]
                defmt::info!("Selection: confirmed {}", selector.current().display_name);
                self.observer.confirmed(index, selector.current());
            }

            transition
        })
    }

    pub fn state(&self) -> SelectionState {
        self.selector.lock(|cell| cell.borrow().state())
    }

    /// Checked at the top of every input path; once true, stop reading input.
    pub fn is_confirmed(&self) -> bool {
        self.state().confirmed
    }

    /// Currently highlighted option.
    pub fn current(&self) -> (usize, SynthOption) {
        self.selector.lock(|cell| {
            let selector = cell.borrow();
            (selector.state().current_index, *selector.current())
        })
    }

    pub fn options(&self) -> OptionList<'a> {
        self.selector.lock(|cell| *cell.borrow().options())
    }

    pub fn option_count(&self) -> usize {
        self.options().len()
    }

    /// The confirmed target, once the state machine is terminal.
    pub fn boot_target(&self) -> Option<BootTarget> {
        self.selector.lock(|cell| cell.borrow().boot_target())
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}
