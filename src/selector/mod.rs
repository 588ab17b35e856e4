//! Selection state machine.
//!
//! Holds the highlighted option and the confirmed flag and applies one
//! [`SelectionIntent`] at a time:
//!
//! ```text
//!              Next / Previous (wrap)      JumpTo(i)
//!                 ┌──────┐            ┌──────────────┐
//!                 ▼      │            │              ▼
//!            ┌──────────────┐  Confirm   ┌──────────────────────┐
//!  start ──▶ │   Browsing   │ ─────────▶ │ ConfirmedPendingBoot │ (terminal)
//!            └──────────────┘            └──────────────────────┘
//! ```
//!
//! Once confirmed, every further intent is discarded; the chosen index is
//! frozen until the boot dispatcher hands off.

pub mod shared;

pub use shared::{SelectionObserver, SharedSelection};

use heapless::String;

use crate::config::LABEL_CAPACITY;
use crate::error::Error;
use crate::input::SelectionIntent;

/// One selectable firmware image. Its index is its position in the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SynthOption {
    /// Name shown on the display.
    pub display_name: &'static str,
    /// Key passed to the hand-off to locate the image.
    pub boot_key: &'static str,
}

impl SynthOption {
    pub const fn new(display_name: &'static str, boot_key: &'static str) -> Self {
        Self {
            display_name,
            boot_key,
        }
    }
}

/// Immutable, non-empty, ordered list of options.
///
/// Any length from one up is accepted; only the MIDI note table is
/// capped at `config::MAX_OPTIONS`.
#[derive(Clone, Copy, Debug)]
pub struct OptionList<'a> {
    options: &'a [SynthOption],
}

// Never empty, so there is no `is_empty`.
#[allow(clippy::len_without_is_empty)]
impl<'a> OptionList<'a> {
    pub fn new(options: &'a [SynthOption]) -> Result<Self, Error> {
        if options.is_empty() {
            return Err(Error::NoOptions);
        }
        Ok(Self { options })
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn get(&self, index: usize) -> Option<&'a SynthOption> {
        self.options.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'a, SynthOption> {
        self.options.iter()
    }

    /// Index after `index`, wrapping to the first option.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.len()
    }

    /// Index before `index`, wrapping to the last option.
    pub fn prev_index(&self, index: usize) -> usize {
        (index + self.len() - 1) % self.len()
    }

    /// Display line for `index`: `"< Name >"`, where `<` only appears when
    /// there is an option before it and `>` only when there is one after.
    ///
    /// Names longer than the line are truncated.
    pub fn label(&self, index: usize) -> String<LABEL_CAPACITY> {
        let mut line = String::new();
        let Some(option) = self.get(index) else {
            return line;
        };

        let _ = line.push_str(if index > 0 { "< " } else { "  " });
        // Two bytes stay free for the trailing marker.
        for c in option.display_name.chars() {
            if line.len() + c.len_utf8() > LABEL_CAPACITY - 2 {
                break;
            }
            let _ = line.push(c);
        }
        if index + 1 < self.len() {
            let _ = line.push_str(" >");
        }
        line
    }
}

/// State-machine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Browsing,
    ConfirmedPendingBoot,
}

/// Snapshot of the authoritative selection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelectionState {
    pub current_index: usize,
    pub confirmed: bool,
}

impl SelectionState {
    pub fn phase(&self) -> Phase {
        if self.confirmed {
            Phase::ConfirmedPendingBoot
        } else {
            Phase::Browsing
        }
    }
}

/// Result of applying one intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// The intent had no effect.
    Ignored,
    /// The highlight moved to this index.
    Moved(usize),
    /// The highlighted option was confirmed.
    Confirmed(usize),
    /// Jumped to this index and confirmed it in the same step.
    JumpedAndConfirmed(usize),
}

impl Transition {
    /// Index the display should now show, if the highlight changed.
    pub fn moved_to(&self) -> Option<usize> {
        match *self {
            Transition::Moved(i) | Transition::JumpedAndConfirmed(i) => Some(i),
            _ => None,
        }
    }

    /// Index that was confirmed, if this transition confirmed.
    pub fn confirmed(&self) -> Option<usize> {
        match *self {
            Transition::Confirmed(i) | Transition::JumpedAndConfirmed(i) => Some(i),
            _ => None,
        }
    }
}

/// The confirmed boot target. Only a confirmed [`Selector`] hands these out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootTarget {
    index: usize,
    option: SynthOption,
}

impl BootTarget {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn option(&self) -> &SynthOption {
        &self.option
    }
}

/// Owns [`SelectionState`] and is the only thing that mutates it.
#[derive(Clone, Debug)]
pub struct Selector<'a> {
    options: OptionList<'a>,
    state: SelectionState,
}

impl<'a> Selector<'a> {
    /// Start browsing at the first option.
    pub fn new(options: OptionList<'a>) -> Self {
        Self {
            options,
            state: SelectionState {
                current_index: 0,
                confirmed: false,
            },
        }
    }

    pub fn options(&self) -> &OptionList<'a> {
        &self.options
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn current(&self) -> &'a SynthOption {
        // current_index is kept in range by construction.
        &self.options.options[self.state.current_index]
    }

    pub fn boot_target(&self) -> Option<BootTarget> {
        self.state.confirmed.then(|| BootTarget {
            index: self.state.current_index,
            option: *self.current(),
        })
    }

    /// Apply one intent atomically.
    pub fn apply(&mut self, intent: SelectionIntent) -> Transition {
        if self.state.confirmed {
            #[cfg(feature = "defmt")]
            defmt::debug!("Selector: {} discarded, boot pending", intent);
            return Transition::Ignored;
        }

        let index = self.state.current_index;
        match intent {
            SelectionIntent::Next => {
                self.state.current_index = self.options.next_index(index);
                Transition::Moved(self.state.current_index)
            }
            SelectionIntent::Previous => {
                self.state.current_index = self.options.prev_index(index);
                Transition::Moved(self.state.current_index)
            }
            SelectionIntent::JumpTo(target) => {
                if target >= self.options.len() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Selector: jump to {} out of range", target);
                    return Transition::Ignored;
                }
                self.state.current_index = target;
                self.state.confirmed = true;
                Transition::JumpedAndConfirmed(target)
            }
            SelectionIntent::Confirm => {
                self.state.confirmed = true;
                Transition::Confirmed(index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_OPTIONS, MAX_OPTIONS};

    fn selector() -> Selector<'static> {
        Selector::new(OptionList::new(&DEFAULT_OPTIONS).unwrap())
    }

    #[test]
    fn option_list_rejects_only_empty() {
        assert_eq!(OptionList::new(&[]).unwrap_err(), Error::NoOptions);
        let many = [SynthOption::new("x", "x"); MAX_OPTIONS + 1];
        assert_eq!(OptionList::new(&many).unwrap().len(), MAX_OPTIONS + 1);
    }

    #[test]
    fn list_longer_than_note_table_wraps() {
        let nine = [SynthOption::new("x", "x"); 9];
        let mut s = Selector::new(OptionList::new(&nine).unwrap());
        assert_eq!(s.apply(SelectionIntent::Previous), Transition::Moved(8));
        assert_eq!(s.apply(SelectionIntent::Next), Transition::Moved(0));
        assert_eq!(s.apply(SelectionIntent::Previous), Transition::Moved(8));
        assert_eq!(
            s.apply(SelectionIntent::JumpTo(8)),
            Transition::JumpedAndConfirmed(8)
        );
    }

    #[test]
    fn starts_browsing_at_first_option() {
        let s = selector();
        assert_eq!(
            s.state(),
            SelectionState {
                current_index: 0,
                confirmed: false
            }
        );
        assert_eq!(s.state().phase(), Phase::Browsing);
        assert!(s.boot_target().is_none());
    }

    #[test]
    fn previous_then_next_wraps_both_ways() {
        let mut s = selector();
        assert_eq!(s.apply(SelectionIntent::Previous), Transition::Moved(2));
        assert_eq!(s.apply(SelectionIntent::Next), Transition::Moved(0));
        assert_eq!(s.apply(SelectionIntent::Next), Transition::Moved(1));
        assert_eq!(s.current().display_name, "MiniJV880");
    }

    #[test]
    fn single_option_wraps_onto_itself() {
        let only = [SynthOption::new("Solo", "solo")];
        let mut s = Selector::new(OptionList::new(&only).unwrap());
        assert_eq!(s.apply(SelectionIntent::Next), Transition::Moved(0));
        assert_eq!(s.apply(SelectionIntent::Previous), Transition::Moved(0));
    }

    #[test]
    fn confirm_is_terminal() {
        let mut s = selector();
        s.apply(SelectionIntent::Next);
        assert_eq!(s.apply(SelectionIntent::Confirm), Transition::Confirmed(1));
        let frozen = s.state();
        assert_eq!(frozen.phase(), Phase::ConfirmedPendingBoot);

        for intent in [
            SelectionIntent::Next,
            SelectionIntent::Previous,
            SelectionIntent::JumpTo(2),
            SelectionIntent::Confirm,
        ] {
            assert_eq!(s.apply(intent), Transition::Ignored);
            assert_eq!(s.state(), frozen);
        }
    }

    #[test]
    fn jump_selects_and_confirms_in_one_step() {
        let mut s = selector();
        assert_eq!(
            s.apply(SelectionIntent::JumpTo(2)),
            Transition::JumpedAndConfirmed(2)
        );
        let target = s.boot_target().unwrap();
        assert_eq!(target.index(), 2);
        assert_eq!(target.option().boot_key, "mt32pi");
    }

    #[test]
    fn out_of_range_jump_is_ignored() {
        let mut s = selector();
        assert_eq!(s.apply(SelectionIntent::JumpTo(3)), Transition::Ignored);
        assert!(!s.state().confirmed);
        assert_eq!(s.state().current_index, 0);
    }

    #[test]
    fn labels_mark_the_available_directions() {
        let options = OptionList::new(&DEFAULT_OPTIONS).unwrap();
        assert_eq!(options.label(0).as_str(), "  MiniDexed >");
        assert_eq!(options.label(1).as_str(), "< MiniJV880 >");
        assert_eq!(options.label(2).as_str(), "< MT-32Pi");
        assert_eq!(options.label(3).as_str(), "");

        let only = [SynthOption::new("Solo", "solo")];
        assert_eq!(OptionList::new(&only).unwrap().label(0).as_str(), "  Solo");
    }

    #[test]
    fn long_names_are_truncated_before_the_marker() {
        let long = [
            SynthOption::new("An Extremely Long Synthesizer Name", "a"),
            SynthOption::new("b", "b"),
        ];
        let label = OptionList::new(&long).unwrap().label(0);
        assert_eq!(label.len(), LABEL_CAPACITY);
        assert!(label.ends_with(" >"));
    }

    #[test]
    fn transition_accessors() {
        assert_eq!(Transition::Moved(1).moved_to(), Some(1));
        assert_eq!(Transition::Moved(1).confirmed(), None);
        assert_eq!(Transition::Confirmed(2).moved_to(), None);
        assert_eq!(Transition::JumpedAndConfirmed(0).moved_to(), Some(0));
        assert_eq!(Transition::JumpedAndConfirmed(0).confirmed(), Some(0));
        assert_eq!(Transition::Ignored.confirmed(), None);
    }
}
