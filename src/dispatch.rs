//! Boot dispatcher - the one-way exit from the selector.
//!
//! Runs once, after the selection is confirmed:
//!
//! 1. release locally owned peripherals (display, encoder, USB, interrupts)
//! 2. unmount persisted storage
//! 3. hand off to the chosen image
//! 4. report how the caller must shut down
//!
//! Cleanup failures are logged and skipped; they never block the hand-off.
//! A hand-off that fails is fatal and there is no way back to browsing.

use crate::error::Error;
use crate::selector::{BootTarget, SynthOption};

/// How the caller must leave after dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shutdown {
    /// The image was staged; reset to run it.
    Reboot,
    /// The hand-off failed; stop here.
    Halt,
}

/// Teardown calls into the peripheral collaborators.
pub trait Teardown {
    fn release_peripherals(&mut self) -> Result<(), Error>;
    fn unmount_storage(&mut self) -> Result<(), Error>;
}

/// One peripheral group that must be quiet before the hand-off.
pub trait Release {
    /// Short name for the log.
    fn name(&self) -> &'static str;
    fn release(&mut self) -> Result<(), Error>;
}

/// Release every part in order, even after a failure.
///
/// Each failure is logged; the first one is returned.
pub fn release_all(parts: &mut [&mut dyn Release]) -> Result<(), Error> {
    let mut first = Ok(());
    for part in parts.iter_mut() {
        match part.release() {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::info!("Boot: {} released", part.name());
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Boot: {} release failed: {}", part.name(), e);
                if first.is_ok() {
                    first = Err(e);
                }
            }
        }
    }
    first
}

/// Transfers control to a firmware image.
///
/// A direct jump never returns. `Ok(())` means the image was staged and
/// will run after a reset; `Err` means it can not be started at all.
pub trait Handoff {
    fn boot(&mut self, option: &SynthOption) -> Result<(), Error>;
}

/// Consumes the collaborators so dispatch can only happen once.
pub struct BootDispatcher<T: Teardown, H: Handoff> {
    teardown: T,
    handoff: H,
}

impl<T: Teardown, H: Handoff> BootDispatcher<T, H> {
    pub fn new(teardown: T, handoff: H) -> Self {
        Self { teardown, handoff }
    }

    pub fn dispatch(mut self, target: BootTarget) -> Shutdown {
        let option = target.option();
        #[cfg(feature = "defmt")]
        defmt::info!(
            "Boot: launching {} ({}) at index {}",
            option.display_name,
            option.boot_key,
            target.index()
        );

        if let Err(_e) = self.teardown.release_peripherals() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Boot: peripheral release failed: {}", _e);
        }
        if let Err(_e) = self.teardown.unmount_storage() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Boot: storage unmount failed: {}", _e);
        }

        match self.handoff.boot(option) {
            Ok(()) => Shutdown::Reboot,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Boot: hand-off to {} failed: {}", option.boot_key, _e);
                Shutdown::Halt
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_OPTIONS;
    use crate::input::SelectionIntent;
    use crate::selector::{OptionList, Selector};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct FakeTeardown {
        log: Log,
        fail: bool,
    }

    impl Teardown for FakeTeardown {
        fn release_peripherals(&mut self) -> Result<(), Error> {
            self.log.borrow_mut().push("release");
            if self.fail {
                Err(Error::Display)
            } else {
                Ok(())
            }
        }

        fn unmount_storage(&mut self) -> Result<(), Error> {
            self.log.borrow_mut().push("unmount");
            if self.fail {
                Err(Error::Storage)
            } else {
                Ok(())
            }
        }
    }

    struct FakeHandoff {
        log: Log,
        result: Result<(), Error>,
    }

    impl Handoff for FakeHandoff {
        fn boot(&mut self, option: &SynthOption) -> Result<(), Error> {
            self.log.borrow_mut().push(option.boot_key);
            self.result
        }
    }

    fn confirmed_target(index: usize) -> BootTarget {
        let mut selector = Selector::new(OptionList::new(&DEFAULT_OPTIONS).unwrap());
        selector.apply(SelectionIntent::JumpTo(index));
        selector.boot_target().unwrap()
    }

    fn dispatcher(
        log: &Log,
        fail_teardown: bool,
        result: Result<(), Error>,
    ) -> BootDispatcher<FakeTeardown, FakeHandoff> {
        BootDispatcher::new(
            FakeTeardown {
                log: log.clone(),
                fail: fail_teardown,
            },
            FakeHandoff {
                log: log.clone(),
                result,
            },
        )
    }

    #[test]
    fn steps_run_in_order_and_reboot() {
        let log = Log::default();
        let shutdown = dispatcher(&log, false, Ok(())).dispatch(confirmed_target(1));
        assert_eq!(shutdown, Shutdown::Reboot);
        assert_eq!(*log.borrow(), ["release", "unmount", "minijv880"]);
    }

    #[test]
    fn teardown_failure_does_not_block_handoff() {
        let log = Log::default();
        let shutdown = dispatcher(&log, true, Ok(())).dispatch(confirmed_target(2));
        assert_eq!(shutdown, Shutdown::Reboot);
        assert_eq!(*log.borrow(), ["release", "unmount", "mt32pi"]);
    }

    struct FakePart {
        name: &'static str,
        log: Log,
        result: Result<(), Error>,
    }

    impl Release for FakePart {
        fn name(&self) -> &'static str {
            self.name
        }

        fn release(&mut self) -> Result<(), Error> {
            self.log.borrow_mut().push(self.name);
            self.result
        }
    }

    fn part(log: &Log, name: &'static str, result: Result<(), Error>) -> FakePart {
        FakePart {
            name,
            log: log.clone(),
            result,
        }
    }

    #[test]
    fn release_all_runs_every_part_after_a_failure() {
        let log = Log::default();
        let mut display = part(&log, "display", Ok(()));
        let mut serial = part(&log, "serial", Err(Error::Serial));
        let mut encoder = part(&log, "encoder", Err(Error::Display));
        let mut usb = part(&log, "usb", Ok(()));

        let result = release_all(&mut [&mut display, &mut serial, &mut encoder, &mut usb]);

        assert_eq!(result, Err(Error::Serial));
        assert_eq!(*log.borrow(), ["display", "serial", "encoder", "usb"]);
    }

    #[test]
    fn release_all_succeeds_when_every_part_does() {
        let log = Log::default();
        let mut a = part(&log, "a", Ok(()));
        let mut b = part(&log, "b", Ok(()));
        assert_eq!(release_all(&mut [&mut a, &mut b]), Ok(()));
        assert_eq!(release_all(&mut []), Ok(()));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn failed_handoff_halts() {
        let log = Log::default();
        let shutdown =
            dispatcher(&log, false, Err(Error::InvalidImage)).dispatch(confirmed_target(0));
        assert_eq!(shutdown, Shutdown::Halt);
        assert_eq!(log.borrow().last(), Some(&"minidexed"));
    }
}
