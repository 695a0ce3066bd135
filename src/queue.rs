//! Queue multiplexer - the public event queue API.
//!
//! [`EventQueue`] composes the source, translator, decoder, payload
//! registry, and repeat filter behind the operations application code
//! calls: pump/wait/poll for the stream, get/peek/clear over a type mask,
//! post for synthetic events, and the blocking controls.
//!
//! # Ordering
//!
//! The underlying per-code query only filters one native code at a time, so
//! batch operations iterate public types in ascending code order and drain
//! per type. Results therefore group by type, not by arrival order.
//!
//! # Concurrency
//!
//! One logical consumer drives a queue. [`EventQueue::wait`] may suspend the
//! calling thread; it holds none of the queue's own state while blocked, so
//! producers feeding the source from other threads are free to run, and
//! their records (including an injected wakeup event) are the only way to
//! unblock it.

use tracing::debug;

use crate::decode::decode;
use crate::error::EventError;
use crate::native::{NativeData, NativeEvent, UserSlot};
use crate::payload::PayloadRegistry;
use crate::repeat::KeyRepeat;
use crate::source::EventSource;
use crate::translate::TypeTranslator;
use crate::types::{event_type, is_user_type, Event, EventMask};

/// Multiplexed event queue over a native source.
#[derive(Debug)]
pub struct EventQueue<S: EventSource> {
    source: S,
    translator: TypeTranslator,
    repeat: KeyRepeat,
    payloads: PayloadRegistry,
}

impl<S: EventSource> EventQueue<S> {
    /// Wrap `source`, negotiating the user event block once up front. When
    /// the source denies the block, user-range operations fail with
    /// [`EventError::FeatureUnavailable`] for the life of the queue.
    pub fn new(mut source: S) -> Self {
        let translator = TypeTranslator::negotiate(&mut source);
        Self {
            source,
            translator,
            repeat: KeyRepeat::new(),
            payloads: PayloadRegistry::new(),
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the wrapped source, for feeding it in-process.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Number of posted payloads still parked in the registry.
    pub fn pending_payloads(&self) -> usize {
        self.payloads.len()
    }

    fn realize(&mut self, native: &NativeEvent) -> Event {
        Event::new(
            self.translator.event_to_public(native),
            decode(native, &self.translator, &mut self.payloads),
        )
    }

    // -------------------------------------------------------------------------
    // Stream reads
    // -------------------------------------------------------------------------

    /// Collect pending platform input into the queryable queue.
    pub fn pump(&mut self) {
        self.source.pump();
    }

    /// Next event, blocking until one passes the repeat filter.
    pub fn wait(&mut self) -> Result<Event, EventError> {
        loop {
            let native = self.source.wait()?;
            if self.repeat.should_pass(&native) {
                return Ok(self.realize(&native));
            }
        }
    }

    /// Next event that passes the repeat filter, or `None` when the source
    /// is exhausted.
    pub fn poll(&mut self) -> Option<Event> {
        while let Some(native) = self.source.poll() {
            if self.repeat.should_pass(&native) {
                return Some(self.realize(&native));
            }
        }
        None
    }

    // -------------------------------------------------------------------------
    // Batch operations
    // -------------------------------------------------------------------------

    /// Dequeue every pending event whose type is in `mask`, grouped by
    /// ascending type code. Repeat filtering does not apply here.
    pub fn get(&mut self, mask: EventMask) -> Vec<Event> {
        self.source.pump();
        let mut events = Vec::new();
        for ty in 1..event_type::NUMEVENTS {
            if !mask.contains(ty) {
                continue;
            }
            let Some(code) = self.translator.to_native(ty) else {
                continue;
            };
            while let Some(native) = self.source.take_code(code) {
                let event = self.realize(&native);
                events.push(event);
            }
        }
        events
    }

    /// Dequeue every pending event of every type.
    pub fn get_all(&mut self) -> Vec<Event> {
        self.get(EventMask::ALL)
    }

    /// Whether any pending event has a type in `mask`, without removing
    /// anything.
    pub fn peek(&mut self, mask: EventMask) -> bool {
        self.source.pump();
        for ty in 1..event_type::NUMEVENTS {
            if !mask.contains(ty) {
                continue;
            }
            if let Some(code) = self.translator.to_native(ty) {
                if self.source.peek_code(code).is_some() {
                    return true;
                }
            }
        }
        false
    }

    /// First pending event in ascending type order, without removing it
    /// from the queue.
    ///
    /// Decoding a peeked user event consumes its parked payload; if the
    /// record is later dequeued it decodes from its own fields instead.
    pub fn peek_front(&mut self) -> Option<Event> {
        self.source.pump();
        for ty in 1..event_type::NUMEVENTS {
            if let Some(code) = self.translator.to_native(ty) {
                if let Some(native) = self.source.peek_code(code) {
                    return Some(self.realize(&native));
                }
            }
        }
        None
    }

    /// Discard every pending event whose type is in `mask`, releasing any
    /// parked payloads the discarded records carried.
    pub fn clear(&mut self, mask: EventMask) {
        self.source.pump();
        for ty in 1..event_type::NUMEVENTS {
            if !mask.contains(ty) {
                continue;
            }
            let Some(code) = self.translator.to_native(ty) else {
                continue;
            };
            while let Some(native) = self.source.take_code(code) {
                if let NativeData::User { data1: UserSlot::Payload(handle), .. } = native.data {
                    self.payloads.take(handle);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Posting
    // -------------------------------------------------------------------------

    /// Submit a synthetic event to the native queue.
    ///
    /// An event whose native type is currently blocked is dropped silently
    /// with no payload registered. A full queue fails with
    /// [`EventError::QueueFull`] and rolls the payload registration back.
    pub fn post(&mut self, event: &Event) -> Result<(), EventError> {
        let code = if event.event_type == event_type::OTHEREVENT {
            self.translator.resolve_other(&event.attributes)?
        } else {
            self.translator.require_native(event.event_type)?
        };

        if !self.source.is_enabled(code) {
            debug!(code, ty = event.event_type, "dropping post for blocked type");
            return Ok(());
        }

        let user_code = event
            .attributes
            .get("code")
            .and_then(|v| v.as_int())
            .and_then(|c| i32::try_from(c).ok())
            .unwrap_or(0);

        let mut handle = None;
        let data1 = if event.attributes.is_empty() {
            UserSlot::Empty
        } else {
            let h = self.payloads.register(event.attributes.clone());
            handle = Some(h);
            UserSlot::Payload(h)
        };

        let record = NativeEvent::new(
            code,
            NativeData::User { code: user_code, data1, data2: UserSlot::Empty, timestamp_ms: 0 },
        );

        match self.source.push(record) {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(h) = handle {
                    self.payloads.take(h);
                }
                Err(err)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Blocking controls
    // -------------------------------------------------------------------------

    /// Re-enable delivery for every type in `types`.
    pub fn set_allowed(&mut self, types: &[u32]) -> Result<(), EventError> {
        self.apply_enabled(types, true)
    }

    /// Disable delivery for every type in `types`. Blocked types are
    /// dropped by the source at delivery and by `post` before payload
    /// registration.
    pub fn set_blocked(&mut self, types: &[u32]) -> Result<(), EventError> {
        self.apply_enabled(types, false)
    }

    /// Disable delivery for every public type.
    pub fn set_blocked_all(&mut self) {
        for ty in 1..event_type::NUMEVENTS {
            if let Some(code) = self.translator.to_native(ty) {
                self.source.set_enabled(code, false);
            }
        }
    }

    /// Whether any type in `types` is currently blocked.
    pub fn get_blocked(&mut self, types: &[u32]) -> Result<bool, EventError> {
        let codes = self.resolve_batch(types)?;
        Ok(codes.iter().any(|&code| !self.source.is_enabled(code)))
    }

    /// Resolve a whole batch before touching anything, so an invalid type
    /// cannot leave a partial application behind.
    fn resolve_batch(&self, types: &[u32]) -> Result<Vec<u32>, EventError> {
        let mut codes = Vec::with_capacity(types.len());
        for &ty in types {
            if ty >= event_type::NUMEVENTS {
                return Err(EventError::InvalidArgument(ty));
            }
            match self.translator.to_native(ty) {
                Some(code) => codes.push(code),
                None if is_user_type(ty) => return Err(EventError::FeatureUnavailable),
                // NOEVENT and OTHEREVENT have no native surface to toggle.
                None => {}
            }
        }
        Ok(codes)
    }

    fn apply_enabled(&mut self, types: &[u32], enabled: bool) -> Result<(), EventError> {
        let codes = self.resolve_batch(types)?;
        for code in codes {
            self.source.set_enabled(code, enabled);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Key repeat configuration
    // -------------------------------------------------------------------------

    /// Configure held-key repeat emulation. Negative values fail with
    /// [`EventError::Configuration`] and change nothing.
    pub fn enable_key_repeat(&mut self, delay: i32, interval: i32) -> Result<(), EventError> {
        self.repeat.configure(delay, interval)
    }

    /// Current `(delay, interval)` repeat settings.
    pub fn get_key_repeat(&self) -> (i32, i32) {
        self.repeat.settings()
    }
}

// =============================================================================
// Tests
// =============================================================================
