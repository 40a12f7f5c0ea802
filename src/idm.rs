//! Id manager
//!
//! Opaque-handle table for the event kernel objects. Guest code names
//! queues and ports by small integer ids handed out here; lookup and
//! removal are typed by object kind, so a queue id never resolves as a
//! port and vice versa.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{EventPort, EventQueue};

/// A kernel object reachable through the id table.
#[derive(Debug, Clone)]
pub enum Lv2Object {
    Queue(Arc<EventQueue>),
    Port(Arc<EventPort>),
}

#[derive(Debug)]
struct IdTable {
    next: u32,
    objects: BTreeMap<u32, Lv2Object>,
}

#[derive(Debug)]
pub struct IdManager {
    inner: Mutex<IdTable>,
}

impl IdManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(IdTable {
                next: 1,
                objects: BTreeMap::new(),
            }),
        }
    }

    fn add(&self, object: Lv2Object) -> u32 {
        let mut table = self.inner.lock();
        let id = table.next;
        table.next += 1;
        table.objects.insert(id, object);
        id
    }

    pub fn add_queue(&self, queue: Arc<EventQueue>) -> u32 {
        self.add(Lv2Object::Queue(queue))
    }

    pub fn add_port(&self, port: Arc<EventPort>) -> u32 {
        self.add(Lv2Object::Port(port))
    }

    pub fn get_queue(&self, id: u32) -> Option<Arc<EventQueue>> {
        match self.inner.lock().objects.get(&id) {
            Some(Lv2Object::Queue(queue)) => Some(Arc::clone(queue)),
            _ => None,
        }
    }

    pub fn get_port(&self, id: u32) -> Option<Arc<EventPort>> {
        match self.inner.lock().objects.get(&id) {
            Some(Lv2Object::Port(port)) => Some(Arc::clone(port)),
            _ => None,
        }
    }

    /// Remove a queue handle. Ids of a different kind are left alone.
    pub fn remove_queue(&self, id: u32) -> Option<Arc<EventQueue>> {
        let mut table = self.inner.lock();
        if !matches!(table.objects.get(&id), Some(Lv2Object::Queue(_))) {
            return None;
        }
        match table.objects.remove(&id) {
            Some(Lv2Object::Queue(queue)) => Some(queue),
            _ => None,
        }
    }

    /// Remove a port handle. Ids of a different kind are left alone.
    pub fn remove_port(&self, id: u32) -> Option<Arc<EventPort>> {
        let mut table = self.inner.lock();
        if !matches!(table.objects.get(&id), Some(Lv2Object::Port(_))) {
            return None;
        }
        match table.objects.remove(&id) {
            Some(Lv2Object::Port(port)) => Some(port),
            _ => None,
        }
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.inner.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().objects.is_empty()
    }
}
