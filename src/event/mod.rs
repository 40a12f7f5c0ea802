//! lv2 event subsystem
//!
//! Kernel objects behind the `sys_event` calls: bounded event queues
//! consumers block on, send-only event ports bound to at most one
//! queue, and the process-wide key registry that deduplicates global
//! queue keys.

use crate::error::CellError;
use crate::types;

pub mod port;
pub mod queue;
pub mod registry;

pub use port::EventPort;
pub use queue::EventQueue;
pub use registry::KeyRegistry;

/// A single notification. Immutable once enqueued; copied by value into
/// the queue and out to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub source: u64,
    pub data1: u64,
    pub data2: u64,
    pub data3: u64,
}

/// Queue scheduling protocol. Validated at creation; wakeup order is a
/// broadcast-and-race regardless, matching observed lv2 behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueProtocol {
    Fifo,
    Priority,
}

impl QueueProtocol {
    pub fn from_raw(raw: u32) -> Result<Self, CellError> {
        match raw {
            types::SYS_SYNC_FIFO => Ok(Self::Fifo),
            types::SYS_SYNC_PRIORITY => Ok(Self::Priority),
            _ => Err(CellError::Inval),
        }
    }
}

/// Which processor family consumes the queue. Only PPU queues have a
/// receive path here; SPU queues may still be created and sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Ppu,
    Spu,
}

impl QueueKind {
    pub fn from_raw(raw: u32) -> Result<Self, CellError> {
        match raw {
            types::SYS_PPU_QUEUE => Ok(Self::Ppu),
            types::SYS_SPU_QUEUE => Ok(Self::Spu),
            _ => Err(CellError::Inval),
        }
    }
}

/// Port flavor. lv2 only defines local ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortType {
    Local,
}
