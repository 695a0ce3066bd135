//! Event source seam - the native queue abstraction.
//!
//! The queue multiplexer drives everything through [`EventSource`], so the
//! platform behind it is pluggable: [`ChannelSource`] here is an in-process
//! queue fed from any thread, and [`crate::terminal::TerminalSource`] adapts
//! terminal input. Per-code queries exist because batch operations filter by
//! one native code at a time.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::debug;

use crate::error::EventError;
use crate::native::NativeEvent;

/// Default record capacity of [`ChannelSource`].
pub const DEFAULT_CAPACITY: usize = 65535;

/// First native code handed out by [`ChannelSource`] user-block negotiation.
pub const USER_BLOCK_START: u32 = 0x8000;

// =============================================================================
// Source trait
// =============================================================================

/// A native event source plus its queryable queue.
///
/// Exactly one logical consumer may drive a source at a time; the source
/// synchronizes its own queue but does not serialize consumers.
pub trait EventSource {
    /// Move pending platform input into the queryable queue.
    fn pump(&mut self);

    /// Remove and return the next record, or `None` when exhausted.
    fn poll(&mut self) -> Option<NativeEvent>;

    /// Remove and return the next record, blocking until one arrives.
    ///
    /// This call may suspend the calling thread. The source holds only its
    /// own lock across the block, so producers on other threads can feed it;
    /// their records (including an injected wakeup) are the only way to
    /// unblock.
    fn wait(&mut self) -> Result<NativeEvent, EventError>;

    /// Clone of the first queued record with native code `code`, without
    /// removing it.
    fn peek_code(&mut self, code: u32) -> Option<NativeEvent>;

    /// Remove and return the first queued record with native code `code`.
    fn take_code(&mut self, code: u32) -> Option<NativeEvent>;

    /// Append a record to the queue.
    fn push(&mut self, event: NativeEvent) -> Result<(), EventError>;

    /// Enable or disable delivery for one native code.
    fn set_enabled(&mut self, code: u32, enabled: bool);

    /// Whether delivery is enabled for `code`. Codes default to enabled.
    fn is_enabled(&self, code: u32) -> bool;

    /// Request a contiguous block of `count` native codes for user events.
    /// Returns the first code of the block, or `None` when the platform has
    /// no codes available.
    fn register_events(&mut self, count: u32) -> Option<u32>;
}

// =============================================================================
// Channel source
// =============================================================================

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<NativeEvent>,
    disabled: HashSet<u32>,
    next_user_code: Option<u32>,
    capacity: usize,
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    available: Condvar,
    senders: AtomicUsize,
}

/// In-process native source backed by a mutex/condvar queue.
///
/// Producers obtain a [`SourceSender`] and feed records from any thread;
/// blocked waits wake when a record arrives or the last sender drops.
#[derive(Debug)]
pub struct ChannelSource {
    shared: Arc<Shared>,
}

/// Producer handle for a [`ChannelSource`].
#[derive(Debug)]
pub struct SourceSender {
    shared: Arc<Shared>,
}

fn lock(shared: &Shared) -> MutexGuard<'_, Inner> {
    // A panicked producer does not invalidate queue contents.
    shared.inner.lock().unwrap_or_else(|e| e.into_inner())
}

fn push_locked(inner: &mut Inner, event: NativeEvent) -> Result<bool, EventError> {
    if inner.disabled.contains(&event.code) {
        debug!(code = event.code, "dropping record for disabled native code");
        return Ok(false);
    }
    if inner.queue.len() >= inner.capacity {
        return Err(EventError::QueueFull);
    }
    inner.queue.push_back(event);
    Ok(true)
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A source whose queue holds at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    queue: VecDeque::new(),
                    disabled: HashSet::new(),
                    next_user_code: Some(USER_BLOCK_START),
                    capacity,
                }),
                available: Condvar::new(),
                senders: AtomicUsize::new(0),
            }),
        }
    }

    /// A source that refuses user-block negotiation, for exercising the
    /// feature-unavailable path.
    pub fn without_user_events() -> Self {
        let source = Self::new();
        lock(&source.shared).next_user_code = None;
        source
    }

    /// New producer handle. Dropping the last handle wakes any blocked wait
    /// with a disconnect error once the queue drains.
    pub fn sender(&self) -> SourceSender {
        self.shared.senders.fetch_add(1, Ordering::SeqCst);
        SourceSender { shared: Arc::clone(&self.shared) }
    }

    /// Records currently queued.
    pub fn len(&self) -> usize {
        lock(&self.shared).queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for ChannelSource {
    fn pump(&mut self) {
        // Producers deliver directly into the queue; nothing to collect.
    }

    fn poll(&mut self) -> Option<NativeEvent> {
        lock(&self.shared).queue.pop_front()
    }

    fn wait(&mut self) -> Result<NativeEvent, EventError> {
        let mut inner = lock(&self.shared);
        loop {
            if let Some(event) = inner.queue.pop_front() {
                return Ok(event);
            }
            if self.shared.senders.load(Ordering::SeqCst) == 0 {
                return Err(EventError::Disconnected);
            }
            inner = self
                .shared
                .available
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    fn peek_code(&mut self, code: u32) -> Option<NativeEvent> {
        lock(&self.shared)
            .queue
            .iter()
            .find(|e| e.code == code)
            .cloned()
    }

    fn take_code(&mut self, code: u32) -> Option<NativeEvent> {
        let mut inner = lock(&self.shared);
        let pos = inner.queue.iter().position(|e| e.code == code)?;
        inner.queue.remove(pos)
    }

    fn push(&mut self, event: NativeEvent) -> Result<(), EventError> {
        let pushed = push_locked(&mut lock(&self.shared), event)?;
        if pushed {
            self.shared.available.notify_one();
        }
        Ok(())
    }

    fn set_enabled(&mut self, code: u32, enabled: bool) {
        let mut inner = lock(&self.shared);
        if enabled {
            inner.disabled.remove(&code);
        } else {
            inner.disabled.insert(code);
        }
    }

    fn is_enabled(&self, code: u32) -> bool {
        !lock(&self.shared).disabled.contains(&code)
    }

    fn register_events(&mut self, count: u32) -> Option<u32> {
        let mut inner = lock(&self.shared);
        let first = inner.next_user_code?;
        inner.next_user_code = first.checked_add(count);
        debug!(first, count, "negotiated user event block");
        Some(first)
    }
}

impl SourceSender {
    /// Queue a record. Records for disabled codes are dropped silently, as
    /// the platform would drop them at delivery.
    pub fn send(&self, event: NativeEvent) -> Result<(), EventError> {
        let pushed = push_locked(&mut lock(&self.shared), event)?;
        if pushed {
            self.shared.available.notify_one();
        }
        Ok(())
    }
}

impl Clone for SourceSender {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::SeqCst);
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl Drop for SourceSender {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Last producer gone: wake waiters so they can observe it.
            self.shared.available.notify_all();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
