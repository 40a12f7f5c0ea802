//! Guest ABI types
//!
//! Big-endian storage cells and the wire structures the event syscalls
//! exchange with guest memory, plus the lv2 constants for the event
//! facility. The PPU is big-endian; every multi-byte field that crosses
//! the guest boundary goes through `BeU32`/`BeU64` so host code can
//! never read a guest value without the byte swap.

use crate::event::EventRecord;

// ============================================================================
// lv2 constants
// ============================================================================

/// FIFO queue protocol
pub const SYS_SYNC_FIFO: u32 = 1;
/// Priority queue protocol (accepted, wakeup order is unaffected)
pub const SYS_SYNC_PRIORITY: u32 = 2;

/// PPU-side event queue
pub const SYS_PPU_QUEUE: u32 = 1;
/// SPU-side event queue (send-only from the PPU path)
pub const SYS_SPU_QUEUE: u32 = 2;

/// Forced queue destruction mode
pub const SYS_EVENT_QUEUE_DESTROY_FORCE: i32 = 1;

/// Local (intra-process) event port
pub const SYS_EVENT_PORT_LOCAL: i32 = 1;

/// Hardware maximum for a queue's capacity.
pub const EVENT_QUEUE_MAX_SIZE: i32 = 127;

// ============================================================================
// Big-endian cells
// ============================================================================

/// A 32-bit value stored in guest (big-endian) byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct BeU32([u8; 4]);

impl BeU32 {
    pub fn new(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn get(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn set(&mut self, value: u32) {
        self.0 = value.to_be_bytes();
    }
}

/// A 64-bit value stored in guest (big-endian) byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct BeU64([u8; 8]);

impl BeU64 {
    pub fn new(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn get(self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    pub fn set(&mut self, value: u64) {
        self.0 = value.to_be_bytes();
    }
}

// ============================================================================
// Wire structures
// ============================================================================

/// Guest-visible event record, as written into a tryreceive buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct SysEventData {
    pub source: BeU64,
    pub data1: BeU64,
    pub data2: BeU64,
    pub data3: BeU64,
}

impl From<EventRecord> for SysEventData {
    fn from(record: EventRecord) -> Self {
        Self {
            source: BeU64::new(record.source),
            data1: BeU64::new(record.data1),
            data2: BeU64::new(record.data2),
            data3: BeU64::new(record.data3),
        }
    }
}

/// Creation attributes read from guest memory by `sys_event_queue_create`.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct SysEventQueueAttr {
    pub protocol: BeU32,
    pub queue_type: BeU32,
    /// Eight name bytes, handled as one 64-bit value.
    pub name: BeU64,
}

impl SysEventQueueAttr {
    pub fn new(protocol: u32, queue_type: u32, name: u64) -> Self {
        Self {
            protocol: BeU32::new(protocol),
            queue_type: BeU32::new(queue_type),
            name: BeU64::new(name),
        }
    }
}
