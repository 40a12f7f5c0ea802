//! Event port
//!
//! Producer-side handle. A port is bound to at most one queue through a
//! weak reference: queue destruction never has to chase down connected
//! ports, a stale reference simply resolves to "not connected" on the
//! next use.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{EventQueue, EventRecord, PortType};
use crate::error::CellError;

#[derive(Debug)]
pub struct EventPort {
    port_type: PortType,
    name: u64,
    queue: Mutex<Weak<EventQueue>>,
}

impl EventPort {
    pub fn new(port_type: PortType, name: u64) -> Self {
        Self {
            port_type,
            name,
            queue: Mutex::new(Weak::new()),
        }
    }

    pub fn port_type(&self) -> PortType {
        self.port_type
    }

    /// Resolve the connection, if the queue is still alive.
    pub fn connected_queue(&self) -> Option<Arc<EventQueue>> {
        self.queue.lock().upgrade()
    }

    /// Bind to a queue. At most one live connection may exist.
    pub fn connect(&self, queue: &Arc<EventQueue>) -> Result<(), CellError> {
        let mut slot = self.queue.lock();
        if slot.upgrade().is_some() {
            return Err(CellError::Isconn);
        }
        *slot = Arc::downgrade(queue);
        Ok(())
    }

    /// Clear the connection. A reference to an already-destroyed queue
    /// counts as not connected. Records already queued under this
    /// port's source identity stay queued; lv2 does not reclaim them.
    pub fn disconnect(&self) -> Result<(), CellError> {
        let mut slot = self.queue.lock();
        if slot.upgrade().is_none() {
            return Err(CellError::Notconn);
        }
        *slot = Weak::new();
        Ok(())
    }

    /// Source identity stamped on every record sent through this port:
    /// the port name when one was given, otherwise a synthetic identity
    /// from the owning process and the port's own id.
    pub fn source(&self, pid: u32, port_id: u32) -> u64 {
        if self.name != 0 {
            self.name
        } else {
            (u64::from(pid) << 32) | u64::from(port_id)
        }
    }

    /// Deliver an event into the connected queue, subject to the
    /// queue's capacity back-pressure.
    pub fn send(
        &self,
        pid: u32,
        port_id: u32,
        data1: u64,
        data2: u64,
        data3: u64,
    ) -> Result<(), CellError> {
        let queue = self.connected_queue().ok_or(CellError::Notconn)?;
        queue.send(EventRecord {
            source: self.source(pid, port_id),
            data1,
            data2,
            data3,
        })
    }
}
