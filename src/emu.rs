//! Emulator context
//!
//! The slice of global emulator state the event facility consumes: the
//! monotonic microsecond clock, the emulated process identity, and the
//! process-wide "emulation is stopping" flag that lets blocked guest
//! threads unwind during shutdown.

use core::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use spin::Once;

/// Clock base, fixed the first time anything asks for the time.
static BOOT_TIME: Once<Instant> = Once::new();

/// Microseconds on the emulator's monotonic clock.
pub fn get_system_time() -> u64 {
    BOOT_TIME.call_once(Instant::now).elapsed().as_micros() as u64
}

/// Per-emulation collaborator state.
#[derive(Debug)]
pub struct EmuContext {
    pid: u32,
    stopped: AtomicBool,
}

impl EmuContext {
    pub fn new() -> Self {
        Self::with_pid(1)
    }

    pub fn with_pid(pid: u32) -> Self {
        Self {
            pid,
            stopped: AtomicBool::new(false),
        }
    }

    /// Identity of the emulated process, used for synthetic port sources.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// True once emulation shutdown has begun.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Signal shutdown; blocked receives observe this within one wait slice.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}
