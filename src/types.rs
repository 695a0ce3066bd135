//! Public event taxonomy and attribute model.
//!
//! These types are the stable surface application code sees: the numeric
//! event codes, the type mask used by batch queue operations, the attribute
//! map produced by decoding, and the `Event` carrier itself.

use std::collections::HashMap;
use std::fmt;

use crate::error::EventError;

// =============================================================================
// Event type codes
// =============================================================================

/// Public event type codes.
///
/// All codes fit below 32 so a `u32` bitmask covers the whole taxonomy.
/// `USEREVENT..NUMEVENTS` is the contiguous block reserved for
/// application-defined events; its native-side offset is negotiated once at
/// startup (see [`crate::translate::TypeTranslator`]).
pub mod event_type {
    pub const NOEVENT: u32 = 0;
    pub const ACTIVEEVENT: u32 = 1;
    pub const KEYDOWN: u32 = 2;
    pub const KEYUP: u32 = 3;
    pub const MOUSEMOTION: u32 = 4;
    pub const MOUSEBUTTONDOWN: u32 = 5;
    pub const MOUSEBUTTONUP: u32 = 6;
    pub const JOYAXISMOTION: u32 = 7;
    pub const JOYBALLMOTION: u32 = 8;
    pub const JOYHATMOTION: u32 = 9;
    pub const JOYBUTTONDOWN: u32 = 10;
    pub const JOYBUTTONUP: u32 = 11;
    pub const QUIT: u32 = 12;
    pub const SYSWMEVENT: u32 = 13;
    /// Catch-all for native codes with no fixed mapping.
    pub const OTHEREVENT: u32 = 14;
    pub const VIDEORESIZE: u32 = 16;
    pub const VIDEOEXPOSE: u32 = 17;
    /// First application-defined event type.
    pub const USEREVENT: u32 = 24;
    /// One past the last valid event type.
    pub const NUMEVENTS: u32 = 32;

    /// Number of codes in the user range.
    pub const USER_RANGE: u32 = NUMEVENTS - USEREVENT;

    /// Reserved user code: the first payload slot carries a filename string.
    pub const DROPFILE_CODE: i32 = 0x1000;
}

/// True when `ty` lies in the user-defined block.
pub fn is_user_type(ty: u32) -> bool {
    (event_type::USEREVENT..event_type::NUMEVENTS).contains(&ty)
}

/// Fixed reverse lookup from type code to display name.
///
/// Any code in the user block is "UserEvent"; anything unrecognized is
/// "Unknown".
pub fn name_of(ty: u32) -> &'static str {
    use event_type::*;
    match ty {
        NOEVENT => "NoEvent",
        ACTIVEEVENT => "ActiveEvent",
        KEYDOWN => "KeyDown",
        KEYUP => "KeyUp",
        MOUSEMOTION => "MouseMotion",
        MOUSEBUTTONDOWN => "MouseButtonDown",
        MOUSEBUTTONUP => "MouseButtonUp",
        JOYAXISMOTION => "JoyAxisMotion",
        JOYBALLMOTION => "JoyBallMotion",
        JOYHATMOTION => "JoyHatMotion",
        JOYBUTTONDOWN => "JoyButtonDown",
        JOYBUTTONUP => "JoyButtonUp",
        QUIT => "Quit",
        SYSWMEVENT => "SysWMEvent",
        VIDEORESIZE => "VideoResize",
        VIDEOEXPOSE => "VideoExpose",
        _ if is_user_type(ty) => "UserEvent",
        _ => "Unknown",
    }
}

// =============================================================================
// Event mask
// =============================================================================

/// Bitmask over public event types for batch queue operations.
///
/// Bit `1 << ty` selects type `ty`. Built from single codes or slices; every
/// code is range-checked up front so a bad batch fails before anything is
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventMask(u32);

impl EventMask {
    /// Selects every type.
    pub const ALL: EventMask = EventMask(u32::MAX);

    /// Selects nothing.
    pub const EMPTY: EventMask = EventMask(0);

    /// Mask selecting a single type code.
    pub fn of(ty: u32) -> Result<EventMask, EventError> {
        if ty >= event_type::NUMEVENTS {
            return Err(EventError::InvalidArgument(ty));
        }
        Ok(EventMask(1 << ty))
    }

    /// Mask selecting every code in `types`. Fails on the first
    /// out-of-range code without building a partial mask.
    pub fn of_types(types: &[u32]) -> Result<EventMask, EventError> {
        let mut mask = 0u32;
        for &ty in types {
            if ty >= event_type::NUMEVENTS {
                return Err(EventError::InvalidArgument(ty));
            }
            mask |= 1 << ty;
        }
        Ok(EventMask(mask))
    }

    /// Whether the mask selects `ty`.
    pub fn contains(self, ty: u32) -> bool {
        ty < event_type::NUMEVENTS && self.0 & (1 << ty) != 0
    }

    /// Whether the mask selects nothing.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventMask {
    type Output = EventMask;
    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

// =============================================================================
// Attribute values
// =============================================================================

/// One decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    /// 2-tuple of integers (positions, sizes, relative motion, hat value).
    Pair(i32, i32),
    Bool(bool),
    /// Mouse button hold state for buttons 1-3.
    Buttons([bool; 3]),
    Text(String),
    /// Opaque platform message bytes, not decoded further.
    Blob(Vec<u8>),
}

impl AttrValue {
    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The pair payload, if this is a `Pair`.
    pub fn as_pair(&self) -> Option<(i32, i32)> {
        match self {
            AttrValue::Pair(x, y) => Some((*x, *y)),
            _ => None,
        }
    }

    /// The string payload, if this is `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<(i32, i32)> for AttrValue {
    fn from((x, y): (i32, i32)) -> Self {
        AttrValue::Pair(x, y)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Pair(x, y) => write!(f, "({}, {})", x, y),
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Buttons([a, b, c]) => write!(f, "({}, {}, {})", a, b, c),
            AttrValue::Text(s) => write!(f, "{:?}", s),
            AttrValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Insertion-order-irrelevant mapping from attribute name to value.
///
/// Exactly one is produced per decoded event; it is the complete public
/// payload of that event.
pub type AttributeMap = HashMap<String, AttrValue>;

// =============================================================================
// Event
// =============================================================================

/// A decoded public event: a type code plus its attribute map.
///
/// This is a plain data carrier. Construction, display, and equality only;
/// event semantics live with the consumer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub event_type: u32,
    pub attributes: AttributeMap,
}

impl Event {
    /// Build a synthetic event with an arbitrary attribute map, for posting.
    pub fn new(event_type: u32, attributes: AttributeMap) -> Self {
        Self { event_type, attributes }
    }

    /// An event with no attributes.
    pub fn empty(event_type: u32) -> Self {
        Self { event_type, attributes: AttributeMap::new() }
    }

    /// Whether the type lies in the user-defined block.
    pub fn is_user(&self) -> bool {
        is_user_type(self.event_type)
    }

    /// One attribute by name.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sorted keys so the form is deterministic.
        let mut keys: Vec<&String> = self.attributes.keys().collect();
        keys.sort();
        write!(f, "<Event({}-{} {{", self.event_type, name_of(self.event_type))?;
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {}", key, self.attributes[*key])?;
        }
        write!(f, "}})>")
    }
}

// =============================================================================
// Tests
// =============================================================================
