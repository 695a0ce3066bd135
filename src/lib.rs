//! # event-mux
//!
//! Event taxonomy translator and queue multiplexer for terminal
//! applications.
//!
//! Native input sources speak in sparse platform type codes; applications
//! want a small, stable public taxonomy with dictionary-style attributes.
//! This crate sits between the two: it translates codes in both
//! directions, decodes native records into attribute maps, multiplexes a
//! single-code queue query into mask-based batch operations, and carries
//! application payloads across the native queue through a generational
//! registry.
//!
//! ## Architecture
//!
//! ```text
//! platform input → EventSource → NativeEvent → TypeTranslator + decode → Event
//!                       ↑                                                  │
//!                       └────────────── EventQueue::post ←─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Public taxonomy ([`Event`], [`EventMask`], attribute values)
//! - [`native`] - Native record model (codes, sub-codes, modifier bitmasks)
//! - [`source`] - The [`source::EventSource`] seam and an in-process channel source
//! - [`terminal`] - crossterm-backed live terminal source
//! - [`translate`] - Bidirectional type-code translation and user-range negotiation
//! - [`decode`] - Native record to attribute-map decoding
//! - [`payload`] - Generational payload registry for posted events
//! - [`repeat`] - Held-key repeat filter
//! - [`queue`] - The [`EventQueue`] multiplexer tying it all together

pub mod decode;
pub mod error;
pub mod native;
pub mod payload;
pub mod queue;
pub mod repeat;
pub mod source;
pub mod terminal;
pub mod translate;
pub mod types;

// Re-export the main surface
pub use error::EventError;
pub use native::{native_code, window_event, HatState, KeyMod, MouseButtons, NativeData, NativeEvent, UserSlot};
pub use payload::{PayloadHandle, PayloadRegistry};
pub use queue::EventQueue;
pub use repeat::KeyRepeat;
pub use source::{ChannelSource, EventSource, SourceSender};
pub use terminal::TerminalSource;
pub use translate::{TypeTranslator, NATIVE_TYPE_ATTR};
pub use types::{event_type, is_user_type, name_of, AttrValue, AttributeMap, Event, EventMask};
