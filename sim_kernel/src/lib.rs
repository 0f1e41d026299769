//! # Simulated Kernel
//!
//! This crate provides a simulated implementation of the kernel API.
//!
//! ## Purpose
//!
//! The simulated kernel allows testing the FAT module without hardware:
//! - Runs under `cargo test`
//! - Deterministic (no real concurrency, scripted faults)
//! - Inspectable (queues, completions and cache maintenance are visible)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! Where a real kernel would suspend the receiver on an empty queue, the
//! simulation returns [`KernelError::WouldBlock`] so the test regains
//! control.

pub mod cache_audit;
pub mod fault_injection;
pub mod test_utils;

use cache_audit::CacheAuditLog;
use core_types::{Fd, QueueHandle, ResultCode};
use fault_injection::FaultPlan;
use ipc::{Message, MessageId, Request};
use kernel_api::{CacheCoherency, KernelApi, KernelError, MessageTransport, QUEUE_SLOT_SIZE};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Heap available to the module when no limit is configured
pub const DEFAULT_HEAP_SIZE: usize = 64 * 1024;

/// A queue and the buffer the module handed over for it
struct Queue {
    buffer: Vec<u8>,
    pending: VecDeque<Message>,
}

impl Queue {
    /// Slots the buffer provides
    fn capacity(&self) -> usize {
        self.buffer.len() / QUEUE_SLOT_SIZE
    }
}

/// An acknowledged request
#[derive(Debug, Clone)]
pub struct Completion {
    /// The message as handed back to its caller, buffers included
    pub message: Message,
    /// Acknowledge value
    pub result: ResultCode,
}

/// Simulated kernel state
///
/// Unlike a real kernel, this state is directly accessible for testing.
pub struct SimulatedKernel {
    /// Bytes left in the module heap
    heap_remaining: usize,
    /// Message queues by handle
    queues: HashMap<QueueHandle, Queue>,
    next_queue: u32,
    /// Device name registry
    devices: HashMap<String, QueueHandle>,
    /// Acknowledged requests in completion order
    completions: Vec<Completion>,
    /// Cache maintenance audit (test-only)
    cache_audit: Rc<CacheAuditLog>,
    faults: FaultPlan,
}

impl SimulatedKernel {
    /// Creates a new simulated kernel
    pub fn new() -> Self {
        Self {
            heap_remaining: DEFAULT_HEAP_SIZE,
            queues: HashMap::new(),
            next_queue: 1,
            devices: HashMap::new(),
            completions: Vec::new(),
            cache_audit: Rc::new(CacheAuditLog::new()),
            faults: FaultPlan::new(),
        }
    }

    /// Limits the module heap to `bytes`
    pub fn with_heap_size(mut self, bytes: usize) -> Self {
        self.heap_remaining = bytes;
        self
    }

    /// Sets the fault plan for this kernel
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.faults = plan;
        self
    }

    /// Enqueues `message` on `queue`, as a client's request would be
    pub fn send(&mut self, queue: QueueHandle, message: Message) -> Result<MessageId, KernelError> {
        let id = message.id;
        let target = self
            .queues
            .get_mut(&queue)
            .ok_or(KernelError::QueueNotFound(queue.as_raw()))?;
        if target.pending.len() >= target.capacity() {
            return Err(KernelError::QueueFull(queue.as_raw()));
        }
        target.pending.push_back(message);
        Ok(id)
    }

    /// Routes a request to the queue registered for `device`
    ///
    /// An exact registration wins; otherwise the longest registered name
    /// that prefixes `device` is used, so `sd:/dir/file` reaches `sd:`.
    pub fn send_to_device(
        &mut self,
        device: &str,
        fd: Fd,
        request: Request,
    ) -> Result<MessageId, KernelError> {
        let queue = self
            .resolve_device(device)
            .ok_or_else(|| KernelError::InvalidArgument(format!("no device for {}", device)))?;
        self.send(queue, Message::new(fd, request))
    }

    /// Finds the queue serving `device`
    pub fn resolve_device(&self, device: &str) -> Option<QueueHandle> {
        if let Some(queue) = self.devices.get(device) {
            return Some(*queue);
        }
        self.devices
            .iter()
            .filter(|(name, _)| device.starts_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, queue)| *queue)
    }

    /// Registered device names, sorted
    pub fn registered_devices(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Returns the number of messages waiting on `queue`
    pub fn pending_message_count(&self, queue: QueueHandle) -> usize {
        self.queues
            .get(&queue)
            .map(|target| target.pending.len())
            .unwrap_or(0)
    }

    /// Capacity of `queue`, if it exists
    pub fn queue_capacity(&self, queue: QueueHandle) -> Option<usize> {
        self.queues.get(&queue).map(Queue::capacity)
    }

    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    /// Removes and returns all completions recorded so far
    pub fn take_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.completions)
    }

    /// Finds the completion for a given message
    pub fn completion(&self, id: MessageId) -> Option<&Completion> {
        self.completions.iter().find(|c| c.message.id == id)
    }

    /// Number of acknowledges recorded for `id`
    pub fn acknowledge_count(&self, id: MessageId) -> usize {
        self.completions
            .iter()
            .filter(|c| c.message.id == id)
            .count()
    }

    /// Shared handle to the cache audit log
    pub fn cache_audit(&self) -> Rc<CacheAuditLog> {
        Rc::clone(&self.cache_audit)
    }

    pub fn heap_remaining(&self) -> usize {
        self.heap_remaining
    }
}

impl Default for SimulatedKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageTransport for SimulatedKernel {
    fn receive(&mut self, queue: QueueHandle) -> Result<Message, KernelError> {
        let target = self
            .queues
            .get_mut(&queue)
            .ok_or(KernelError::QueueNotFound(queue.as_raw()))?;
        target
            .pending
            .pop_front()
            .ok_or(KernelError::WouldBlock(queue.as_raw()))
    }

    fn acknowledge(&mut self, message: Message, result: ResultCode) {
        debug!("ack {} -> {}", message.id, result);
        self.completions.push(Completion { message, result });
    }
}

impl CacheCoherency for SimulatedKernel {
    fn invalidate(&self, range: &[u8]) {
        self.cache_audit.record_invalidate(range);
    }

    fn flush(&self, range: &[u8]) {
        self.cache_audit.record_flush(range);
    }
}

impl KernelApi for SimulatedKernel {
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, KernelError> {
        if self.faults.fails_allocation() || size > self.heap_remaining {
            return Err(KernelError::OutOfMemory(size));
        }
        self.heap_remaining -= size;
        Ok(vec![0; size])
    }

    fn create_message_queue(
        &mut self,
        mut buffer: Vec<u8>,
        capacity: usize,
    ) -> Result<QueueHandle, KernelError> {
        if self.faults.fails_queue_create() {
            return Err(KernelError::QueueCreateFailed(
                "injected fault".to_string(),
            ));
        }
        if capacity == 0 {
            return Err(KernelError::InvalidArgument(
                "queue capacity must be non-zero".to_string(),
            ));
        }
        let needed = capacity.saturating_mul(QUEUE_SLOT_SIZE);
        if buffer.len() < needed {
            return Err(KernelError::InvalidArgument(format!(
                "queue buffer of {} bytes cannot hold {} slots",
                buffer.len(),
                capacity
            )));
        }

        // Bytes past the last slot are not part of the queue
        buffer.truncate(needed);

        let handle = QueueHandle::from_raw(self.next_queue);
        self.next_queue += 1;
        self.queues.insert(
            handle,
            Queue {
                buffer,
                pending: VecDeque::with_capacity(capacity),
            },
        );
        Ok(handle)
    }

    fn register_device(&mut self, name: &str, queue: QueueHandle) -> Result<(), KernelError> {
        if self.faults.fails_register(name) {
            return Err(KernelError::RegisterFailed {
                name: name.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        if !self.queues.contains_key(&queue) {
            return Err(KernelError::QueueNotFound(queue.as_raw()));
        }
        if self.devices.contains_key(name) {
            return Err(KernelError::RegisterFailed {
                name: name.to_string(),
                reason: "already registered".to_string(),
            });
        }
        self.devices.insert(name.to_string(), queue);
        Ok(())
    }
}
