//! sys_event syscall surface
//!
//! Parameter validation, guest ABI translation and error mapping for
//! the ten event calls. The object state machines live in `event`;
//! this layer resolves handles, keeps the validation order of the lv2
//! kernel, and reports outcomes in its error vocabulary.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::emu::{get_system_time, EmuContext};
use crate::error::CellError;
use crate::event::{
    EventPort, EventQueue, KeyRegistry, PortType, QueueKind, QueueProtocol,
};
use crate::idm::IdManager;
use crate::ppu::PpuThread;
use crate::types::{
    SysEventData, SysEventQueueAttr, EVENT_QUEUE_MAX_SIZE, SYS_EVENT_PORT_LOCAL,
    SYS_EVENT_QUEUE_DESTROY_FORCE,
};

/// The event subsystem's kernel state plus its collaborators.
#[derive(Debug)]
pub struct Lv2Kernel {
    pub idm: IdManager,
    pub keys: KeyRegistry,
    pub emu: EmuContext,
    /// Serializes queue destruction. Held across resolve, cancel and
    /// removal so that of two racing destroyers exactly one wins; the
    /// loser re-resolves the handle and finds it gone (`CELL_ESRCH`)
    /// instead of tripping the one-shot cancel.
    destroy_lock: Mutex<()>,
}

impl Lv2Kernel {
    pub fn new() -> Self {
        Self::with_pid(1)
    }

    pub fn with_pid(pid: u32) -> Self {
        Self {
            idm: IdManager::new(),
            keys: KeyRegistry::new(),
            emu: EmuContext::with_pid(pid),
            destroy_lock: Mutex::new(()),
        }
    }

    // ========================================================================
    // Queue calls
    // ========================================================================

    pub fn sys_event_queue_create(
        &self,
        equeue_id: &mut u32,
        attr: &SysEventQueueAttr,
        event_queue_key: u64,
        size: i32,
    ) -> Result<(), CellError> {
        debug!(key = event_queue_key, size, "sys_event_queue_create");

        if size <= 0 || size > EVENT_QUEUE_MAX_SIZE {
            return Err(CellError::Inval);
        }

        let protocol = match QueueProtocol::from_raw(attr.protocol.get()) {
            Ok(protocol) => protocol,
            Err(e) => {
                warn!(
                    protocol = attr.protocol.get(),
                    "sys_event_queue_create: unknown protocol"
                );
                return Err(e);
            }
        };

        let kind = match QueueKind::from_raw(attr.queue_type.get()) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(
                    queue_type = attr.queue_type.get(),
                    "sys_event_queue_create: unknown type"
                );
                return Err(e);
            }
        };

        let queue = Arc::new(EventQueue::new(
            protocol,
            kind,
            attr.name.get(),
            event_queue_key,
            size as usize,
        ));

        // key collision aborts creation before the queue gets an id
        self.keys.register(&queue, event_queue_key)?;

        *equeue_id = self.idm.add_queue(queue);

        Ok(())
    }

    pub fn sys_event_queue_destroy(&self, equeue_id: u32, mode: i32) -> Result<(), CellError> {
        debug!(equeue_id, mode, "sys_event_queue_destroy");

        let _destroying = self.destroy_lock.lock();

        let queue = self.idm.get_queue(equeue_id).ok_or(CellError::Srch)?;

        if mode != 0 && mode != SYS_EVENT_QUEUE_DESTROY_FORCE {
            return Err(CellError::Inval);
        }

        queue.cancel(mode == SYS_EVENT_QUEUE_DESTROY_FORCE)?;

        self.keys.unregister(queue.key());
        self.idm.remove_queue(equeue_id);

        Ok(())
    }

    pub fn sys_event_queue_tryreceive(
        &self,
        equeue_id: u32,
        event_array: &mut [SysEventData],
        size: i32,
        number: &mut u32,
    ) -> Result<(), CellError> {
        trace!(equeue_id, size, "sys_event_queue_tryreceive");

        let queue = self.idm.get_queue(equeue_id).ok_or(CellError::Srch)?;

        // negative size is a collaborator bug, not a guest error
        assert!(size >= 0, "sys_event_queue_tryreceive: negative size");
        assert!(
            event_array.len() >= size as usize,
            "sys_event_queue_tryreceive: buffer smaller than size"
        );

        if queue.kind() != QueueKind::Ppu {
            return Err(CellError::Inval);
        }

        let drained = queue.try_receive(size as usize);
        for (slot, record) in event_array.iter_mut().zip(&drained) {
            *slot = SysEventData::from(*record);
        }
        *number = drained.len() as u32;

        Ok(())
    }

    pub fn sys_event_queue_receive(
        &self,
        ppu: &mut PpuThread,
        equeue_id: u32,
        timeout: u64,
    ) -> Result<(), CellError> {
        trace!(equeue_id, timeout, "sys_event_queue_receive");

        // wall clock starts at call entry, before handle resolution
        let start_time = get_system_time();

        let queue = self.idm.get_queue(equeue_id).ok_or(CellError::Srch)?;

        if queue.kind() != QueueKind::Ppu {
            return Err(CellError::Inval);
        }

        match queue.receive(timeout, start_time, &self.emu)? {
            Some(record) => {
                // event data goes out in registers, not guest memory
                ppu.gpr[4] = record.source;
                ppu.gpr[5] = record.data1;
                ppu.gpr[6] = record.data2;
                ppu.gpr[7] = record.data3;
                Ok(())
            }
            None => {
                warn!(equeue_id, "sys_event_queue_receive aborted");
                Ok(())
            }
        }
    }

    pub fn sys_event_queue_drain(&self, equeue_id: u32) -> Result<(), CellError> {
        trace!(equeue_id, "sys_event_queue_drain");

        let queue = self.idm.get_queue(equeue_id).ok_or(CellError::Srch)?;
        queue.drain();

        Ok(())
    }

    // ========================================================================
    // Port calls
    // ========================================================================

    pub fn sys_event_port_create(
        &self,
        eport_id: &mut u32,
        port_type: i32,
        name: u64,
    ) -> Result<(), CellError> {
        debug!(port_type, name, "sys_event_port_create");

        if port_type != SYS_EVENT_PORT_LOCAL {
            warn!(port_type, "sys_event_port_create: invalid port_type");
            return Err(CellError::Inval);
        }

        let port = Arc::new(EventPort::new(PortType::Local, name));
        *eport_id = self.idm.add_port(port);

        Ok(())
    }

    pub fn sys_event_port_destroy(&self, eport_id: u32) -> Result<(), CellError> {
        debug!(eport_id, "sys_event_port_destroy");

        let port = self.idm.get_port(eport_id).ok_or(CellError::Srch)?;

        if port.connected_queue().is_some() {
            return Err(CellError::Isconn);
        }

        self.idm.remove_port(eport_id);

        Ok(())
    }

    pub fn sys_event_port_connect_local(
        &self,
        eport_id: u32,
        equeue_id: u32,
    ) -> Result<(), CellError> {
        debug!(eport_id, equeue_id, "sys_event_port_connect_local");

        let port = self.idm.get_port(eport_id).ok_or(CellError::Srch)?;
        let queue = self.idm.get_queue(equeue_id).ok_or(CellError::Srch)?;

        if port.port_type() != PortType::Local {
            return Err(CellError::Inval);
        }

        port.connect(&queue)
    }

    pub fn sys_event_port_disconnect(&self, eport_id: u32) -> Result<(), CellError> {
        debug!(eport_id, "sys_event_port_disconnect");

        let port = self.idm.get_port(eport_id).ok_or(CellError::Srch)?;
        port.disconnect()
    }

    pub fn sys_event_port_send(
        &self,
        eport_id: u32,
        data1: u64,
        data2: u64,
        data3: u64,
    ) -> Result<(), CellError> {
        trace!(eport_id, data1, data2, data3, "sys_event_port_send");

        let port = self.idm.get_port(eport_id).ok_or(CellError::Srch)?;
        port.send(self.emu.pid(), eport_id, data1, data2, data3)
    }
}
