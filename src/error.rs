//! lv2 error codes
//!
//! The guest-visible error vocabulary of the lv2 kernel. Discriminants
//! are wire-exact: they are the 32-bit values guest code receives in r3
//! and branches on, so they must never be renumbered.

use core::fmt;

/// Success value returned to the guest when a call completes normally.
pub const CELL_OK: u32 = 0;

/// lv2 error codes returned by the event syscalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CellError {
    /// CELL_EAGAIN - resource temporarily unavailable
    Again = 0x8001_0001,
    /// CELL_EINVAL - invalid argument
    Inval = 0x8001_0002,
    /// CELL_ENOMEM - insufficient memory
    Nomem = 0x8001_0004,
    /// CELL_ESRCH - no such handle
    Srch = 0x8001_0005,
    /// CELL_EBUSY - resource busy
    Busy = 0x8001_000a,
    /// CELL_ETIMEDOUT - wait timed out
    Timedout = 0x8001_000b,
    /// CELL_ECANCELED - operation cancelled
    Canceled = 0x8001_0013,
    /// CELL_EEXIST - object already exists
    Exist = 0x8001_0014,
    /// CELL_EISCONN - already connected
    Isconn = 0x8001_0015,
    /// CELL_ENOTCONN - not connected
    Notconn = 0x8001_0016,
}

impl CellError {
    /// Raw 32-bit value as seen by the guest.
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// lv2 mnemonic for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::Again => "CELL_EAGAIN",
            Self::Inval => "CELL_EINVAL",
            Self::Nomem => "CELL_ENOMEM",
            Self::Srch => "CELL_ESRCH",
            Self::Busy => "CELL_EBUSY",
            Self::Timedout => "CELL_ETIMEDOUT",
            Self::Canceled => "CELL_ECANCELED",
            Self::Exist => "CELL_EEXIST",
            Self::Isconn => "CELL_EISCONN",
            Self::Notconn => "CELL_ENOTCONN",
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08x})", self.name(), self.raw())
    }
}

/// Result type for syscall-shaped operations.
pub type SysResult<T = ()> = Result<T, CellError>;

/// Raw return value for a completed call, as written back to the guest.
pub fn to_raw(result: SysResult) -> u32 {
    match result {
        Ok(()) => CELL_OK,
        Err(e) => e.raw(),
    }
}
