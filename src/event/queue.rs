//! Event queue
//!
//! The central state machine of the event facility: a fixed-capacity
//! FIFO of event records plus the blocking receive loop with wall-clock
//! timeout, one-shot cancellation and shutdown abort.
//!
//! Receivers do not park until an explicit wakeup. They sleep in 1 ms
//! slices so that cancellation, timeout and the emulator stop flag are
//! observed promptly even when no push ever arrives. Pushes and forced
//! destruction broadcast to every waiter; the first one to reacquire
//! the lock and find a pending record wins, with no fairness between
//! waiters and no influence from the queue protocol.

use std::time::Duration;

use heapless::Deque;
use parking_lot::{Condvar, Mutex};

use super::{EventRecord, QueueKind, QueueProtocol};
use crate::emu::{get_system_time, EmuContext};
use crate::error::CellError;

/// Hardware maximum for a queue's capacity.
pub const QUEUE_SIZE_MAX: usize = 127;

/// Sleep slice of the receive poll loop.
const WAIT_SLICE: Duration = Duration::from_millis(1);

/// Mutable queue state. Everything a receiver or destroyer has to
/// observe atomically together lives under this one lock.
#[derive(Debug)]
struct QueueState {
    events: Deque<EventRecord, QUEUE_SIZE_MAX>,
    waiters: u32,
    cancelled: bool,
}

/// A bounded event queue shared by the id table, the key registry and
/// any connected ports (the latter hold only weak references).
#[derive(Debug)]
pub struct EventQueue {
    protocol: QueueProtocol,
    kind: QueueKind,
    name: u64,
    key: u64,
    size: usize,
    state: Mutex<QueueState>,
    cv: Condvar,
}

impl EventQueue {
    /// Build a queue. `size` must already be validated to 1..=127.
    pub fn new(
        protocol: QueueProtocol,
        kind: QueueKind,
        name: u64,
        key: u64,
        size: usize,
    ) -> Self {
        debug_assert!((1..=QUEUE_SIZE_MAX).contains(&size));
        Self {
            protocol,
            kind,
            name,
            key,
            size,
            state: Mutex::new(QueueState {
                events: Deque::new(),
                waiters: 0,
                cancelled: false,
            }),
            cv: Condvar::new(),
        }
    }

    pub fn protocol(&self) -> QueueProtocol {
        self.protocol
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn name(&self) -> u64 {
        self.name
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    /// Caller-chosen capacity.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of records currently pending.
    pub fn pending_count(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Number of receive calls currently blocked in the wait loop.
    pub fn waiter_count(&self) -> u32 {
        self.state.lock().waiters
    }

    /// Append a record to the back of the pending buffer. The capacity
    /// check is the caller's responsibility; overflow here means that
    /// check was bypassed.
    fn push(state: &mut QueueState, record: EventRecord) {
        if state.events.push_back(record).is_err() {
            panic!("event queue overflow: capacity check bypassed");
        }
    }

    /// Send-side entry: back-pressure check plus push under one lock
    /// acquisition, then a broadcast wakeup.
    pub fn send(&self, record: EventRecord) -> Result<(), CellError> {
        let mut st = self.state.lock();
        if st.cancelled {
            // the queue is destroyed, only a stale strong reference kept
            // it reachable; the sender sees it as gone
            return Err(CellError::Notconn);
        }
        if st.events.len() >= self.size {
            return Err(CellError::Busy);
        }
        Self::push(&mut st, record);
        drop(st);
        self.cv.notify_all();
        Ok(())
    }

    /// Non-blocking drain of up to `max` records in FIFO order.
    ///
    /// Yields nothing while any receiver is blocked on this queue:
    /// pending data belongs to the waiters, tryreceive must not race
    /// them for it.
    pub fn try_receive(&self, max: usize) -> Vec<EventRecord> {
        let mut st = self.state.lock();
        let mut drained = Vec::new();
        while st.waiters == 0 && drained.len() < max {
            match st.events.pop_front() {
                Some(record) => drained.push(record),
                None => break,
            }
        }
        drained
    }

    /// Blocking receive.
    ///
    /// `timeout_us` of 0 waits indefinitely; otherwise elapsed time is
    /// measured from `start_time` (taken by the caller before handle
    /// resolution). `Ok(None)` is the benign shutdown abort: emulation
    /// is stopping and the waiter count is deliberately left elevated,
    /// the whole environment is going away.
    pub fn receive(
        &self,
        timeout_us: u64,
        start_time: u64,
        emu: &EmuContext,
    ) -> Result<Option<EventRecord>, CellError> {
        let mut st = self.state.lock();
        st.waiters += 1;
        loop {
            if let Some(record) = st.events.pop_front() {
                st.waiters -= 1;
                return Ok(Some(record));
            }
            if st.cancelled {
                st.waiters -= 1;
                return Err(CellError::Canceled);
            }
            if timeout_us != 0 && get_system_time() - start_time > timeout_us {
                st.waiters -= 1;
                return Err(CellError::Timedout);
            }
            if emu.is_stopped() {
                return Ok(None);
            }
            self.cv.wait_for(&mut st, WAIT_SLICE);
        }
    }

    /// Clear every pending record. Waiters and the cancelled flag are
    /// untouched and nobody is woken.
    pub fn drain(&self) {
        let mut st = self.state.lock();
        while st.events.pop_front().is_some() {}
    }

    /// Flip the one-shot cancelled flag, failing `CELL_EBUSY` in normal
    /// mode while receivers are blocked. With `force` the flag is set
    /// regardless and every waiter is woken to unwind with
    /// `CELL_ECANCELED`.
    ///
    /// Cancelling twice is a fatal logic error: the id table must have
    /// handed out a handle to an already-destroyed queue.
    pub fn cancel(&self, force: bool) -> Result<(), CellError> {
        let mut st = self.state.lock();
        if !force && st.waiters > 0 {
            return Err(CellError::Busy);
        }
        if core::mem::replace(&mut st.cancelled, true) {
            panic!("event queue cancelled twice: stale handle in the id table");
        }
        let wake = st.waiters > 0;
        drop(st);
        if wake {
            self.cv.notify_all();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn ppu_queue(size: usize) -> EventQueue {
        EventQueue::new(QueueProtocol::Fifo, QueueKind::Ppu, 0, 0, size)
    }

    fn record(data1: u64) -> EventRecord {
        EventRecord {
            source: 0xcafe,
            data1,
            data2: 0,
            data3: 0,
        }
    }

    #[test]
    fn test_creation_attributes_are_kept() {
        let queue = EventQueue::new(
            QueueProtocol::Priority,
            QueueKind::Spu,
            0x6e61_6d65,
            0x77,
            16,
        );
        assert_eq!(queue.protocol(), QueueProtocol::Priority);
        assert_eq!(queue.kind(), QueueKind::Spu);
        assert_eq!(queue.name(), 0x6e61_6d65);
        assert_eq!(queue.key(), 0x77);
        assert_eq!(queue.size(), 16);
    }

    #[test]
    fn test_capacity_back_pressure() {
        let queue = ppu_queue(2);
        assert_eq!(queue.send(record(1)), Ok(()));
        assert_eq!(queue.send(record(2)), Ok(()));
        assert_eq!(queue.send(record(3)), Err(CellError::Busy));

        // draining one record frees one slot
        let drained = queue.try_receive(1);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].data1, 1);
        assert_eq!(queue.send(record(3)), Ok(()));
    }

    #[test]
    fn test_try_receive_fifo_order() {
        let queue = ppu_queue(4);
        for i in 0..4 {
            queue.send(record(i)).unwrap();
        }
        let drained = queue.try_receive(8);
        let data: Vec<u64> = drained.iter().map(|e| e.data1).collect();
        assert_eq!(data, [0, 1, 2, 3]);
    }

    #[test]
    fn test_drain_discards_everything() {
        let queue = ppu_queue(3);
        queue.send(record(1)).unwrap();
        queue.send(record(2)).unwrap();
        queue.drain();
        assert_eq!(queue.pending_count(), 0);
        assert!(queue.try_receive(1).is_empty());
        // drain is not a cancel, the queue keeps working
        assert_eq!(queue.send(record(3)), Ok(()));
    }

    #[test]
    fn test_receive_times_out() {
        let emu = EmuContext::new();
        let queue = ppu_queue(1);
        let begin = Instant::now();
        let start = get_system_time();
        let result = queue.receive(30_000, start, &emu);
        assert_eq!(result, Err(CellError::Timedout));
        assert!(begin.elapsed() >= Duration::from_millis(30));
        assert_eq!(queue.waiter_count(), 0);
    }

    #[test]
    fn test_timeout_counts_from_caller_start_time() {
        let emu = EmuContext::new();
        let queue = ppu_queue(1);

        // the start timestamp predates the call by more than the
        // timeout: the deadline check must fire before the first wait
        // slice, not after another full timeout of sleeping
        let start = get_system_time().saturating_sub(3_000_000);
        let begin = Instant::now();
        let result = queue.receive(2_000_000, start, &emu);
        assert_eq!(result, Err(CellError::Timedout));
        assert!(begin.elapsed() < Duration::from_secs(1));
        assert_eq!(queue.waiter_count(), 0);
    }

    #[test]
    fn test_receive_immediate_when_pending() {
        let emu = EmuContext::new();
        let queue = ppu_queue(1);
        queue.send(record(9)).unwrap();
        let got = queue.receive(0, get_system_time(), &emu).unwrap();
        assert_eq!(got, Some(record(9)));
    }

    #[test]
    fn test_try_receive_yields_to_blocked_waiter() {
        let emu = Arc::new(EmuContext::new());
        let queue = Arc::new(ppu_queue(4));

        let waiter = {
            let queue = Arc::clone(&queue);
            let emu = Arc::clone(&emu);
            thread::spawn(move || queue.receive(0, get_system_time(), &emu))
        };
        while queue.waiter_count() == 0 {
            thread::yield_now();
        }

        queue.send(record(7)).unwrap();
        // the pending record belongs to the waiter, not to us
        assert!(queue.try_receive(1).is_empty());

        let got = waiter.join().unwrap().unwrap();
        assert_eq!(got, Some(record(7)));
        assert!(queue.try_receive(1).is_empty());
    }

    #[test]
    fn test_force_cancel_unwinds_waiters() {
        let emu = Arc::new(EmuContext::new());
        let queue = Arc::new(ppu_queue(1));

        let waiter = {
            let queue = Arc::clone(&queue);
            let emu = Arc::clone(&emu);
            thread::spawn(move || queue.receive(0, get_system_time(), &emu))
        };
        while queue.waiter_count() == 0 {
            thread::yield_now();
        }

        assert_eq!(queue.cancel(false), Err(CellError::Busy));
        assert_eq!(queue.cancel(true), Ok(()));
        assert_eq!(waiter.join().unwrap(), Err(CellError::Canceled));
        assert_eq!(queue.waiter_count(), 0);

        // future receives fail straight away
        let late = queue.receive(0, get_system_time(), &emu);
        assert_eq!(late, Err(CellError::Canceled));
    }

    #[test]
    #[should_panic(expected = "cancelled twice")]
    fn test_double_cancel_is_fatal() {
        let queue = ppu_queue(1);
        queue.cancel(false).unwrap();
        let _ = queue.cancel(true);
    }

    #[test]
    fn test_send_to_cancelled_queue() {
        let queue = ppu_queue(1);
        queue.cancel(false).unwrap();
        assert_eq!(queue.send(record(1)), Err(CellError::Notconn));
    }

    #[test]
    fn test_stop_flag_aborts_without_unwinding() {
        let emu = Arc::new(EmuContext::new());
        let queue = Arc::new(ppu_queue(1));

        let waiter = {
            let queue = Arc::clone(&queue);
            let emu = Arc::clone(&emu);
            thread::spawn(move || queue.receive(0, get_system_time(), &emu))
        };
        while queue.waiter_count() == 0 {
            thread::yield_now();
        }

        emu.stop();
        assert_eq!(waiter.join().unwrap(), Ok(None));
        // shutdown path does not clean up the waiter count
        assert_eq!(queue.waiter_count(), 1);
    }
}
