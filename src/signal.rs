//! Ctrl-C and SIGTERM handling
//!
//! The handler only sets a flag. Long running commands poll
//! [`shutdown_requested`] and wind down on their own, so cleanup always
//! runs on the main thread.

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_signal: nix::libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Install the SIGINT and SIGTERM handlers
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
    unsafe {
        sigaction(Signal::SIGINT, &action)?;
        sigaction(Signal::SIGTERM, &action)?;
    }
    Ok(())
}

/// Whether Ctrl-C or SIGTERM has been received
pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Sleep for `duration` in short steps, returning early on shutdown
///
/// Returns true if a shutdown was requested.
pub fn sleep(duration: Duration) -> bool {
    const STEP: Duration = Duration::from_millis(50);

    let mut remaining = duration;
    while !remaining.is_zero() {
        if shutdown_requested() {
            return true;
        }
        let step = remaining.min(STEP);
        std::thread::sleep(step);
        remaining -= step;
    }
    shutdown_requested()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigterm_sets_flag() {
        install().unwrap();
        assert!(!shutdown_requested());
        nix::sys::signal::raise(Signal::SIGTERM).unwrap();
        assert!(shutdown_requested());
        assert!(sleep(Duration::from_secs(5)));
    }
}
