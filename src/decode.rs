//! Native record -> attribute map decoding.
//!
//! One map per record, keyed on the record's public type. Payload-carrying
//! user records short-circuit: the map the application posted comes back out
//! of the registry verbatim. Every map built here also stashes the raw
//! native code under [`NATIVE_TYPE_ATTR`] so unclassified events can be
//! re-posted later.

use tracing::warn;

use crate::native::{native_code, window_event, KeyMod, NativeData, NativeEvent, UserSlot};
use crate::payload::PayloadRegistry;
use crate::translate::{TypeTranslator, NATIVE_TYPE_ATTR};
use crate::types::{event_type, is_user_type, AttrValue, AttributeMap};

/// Focus-kind values carried by the `state` attribute of active events.
pub mod focus_state {
    /// Pointer entered or left the window.
    pub const MOUSE: i64 = 0x01;
    /// Keyboard focus gained or lost.
    pub const INPUT: i64 = 0x02;
    /// Window minimized or restored.
    pub const ACTIVE: i64 = 0x04;
}

/// Keydown text for a key symbol under the given modifiers: empty for
/// symbols in the private range or when any modifier outside the shift pair
/// is held, uppercased under shift.
fn key_unicode(sym: u32, modifiers: KeyMod) -> String {
    if sym & 0x4000_0000 != 0 {
        return String::new();
    }
    if modifiers.intersects(KeyMod::SHIFT.complement()) {
        return String::new();
    }
    let Some(c) = char::from_u32(sym) else {
        return String::new();
    };
    if modifiers.intersects(KeyMod::SHIFT) {
        c.to_uppercase().collect()
    } else {
        c.to_string()
    }
}

/// Active-event `(gain, state)` for a windowing sub-code.
fn activate_fields(sub: u8) -> (i64, i64) {
    match sub {
        window_event::ENTER => (1, focus_state::MOUSE),
        window_event::LEAVE => (0, focus_state::MOUSE),
        window_event::FOCUS_GAINED => (1, focus_state::INPUT),
        window_event::FOCUS_LOST => (0, focus_state::INPUT),
        window_event::MINIMIZED => (0, focus_state::ACTIVE),
        window_event::RESTORED => (1, focus_state::ACTIVE),
        other => {
            // The translator only routes the six sub-codes above here, so
            // this is unreachable from the public pipeline.
            warn!(sub = other, "unrecognized activate sub-code, treating as restored");
            (1, focus_state::ACTIVE)
        }
    }
}

/// Decode one native record into its attribute map.
///
/// A record carrying a registry handle yields the posted map directly when
/// the payload is still parked; a handle that no longer resolves (already
/// consumed by a speculative peek, or foreign) degrades to field-level
/// decoding instead of erroring.
pub fn decode(
    event: &NativeEvent,
    translator: &TypeTranslator,
    registry: &mut PayloadRegistry,
) -> AttributeMap {
    if let NativeData::User { data1: UserSlot::Payload(handle), .. } = &event.data {
        if let Some(map) = registry.take(*handle) {
            return map;
        }
        warn!(code = event.code, "payload handle did not resolve, decoding record fields");
    }

    let public = translator.event_to_public(event);
    let mut attrs = AttributeMap::new();
    attrs.insert(NATIVE_TYPE_ATTR.into(), AttrValue::Int(event.code as i64));

    if event.code == native_code::WINDOW {
        if let NativeData::Window { window_id, .. } = event.data {
            attrs.insert("window_id".into(), AttrValue::Int(window_id as i64));
        }
    }

    match (&event.data, public) {
        (&NativeData::Window { event: sub, .. }, event_type::ACTIVEEVENT) => {
            let (gain, state) = activate_fields(sub);
            attrs.insert("gain".into(), AttrValue::Int(gain));
            attrs.insert("state".into(), AttrValue::Int(state));
        }
        (&NativeData::Window { data1, data2, .. }, event_type::VIDEORESIZE) => {
            attrs.insert("size".into(), AttrValue::Pair(data1, data2));
            attrs.insert("w".into(), AttrValue::Int(data1 as i64));
            attrs.insert("h".into(), AttrValue::Int(data2 as i64));
        }
        (&NativeData::Key { sym, modifiers, scancode, .. }, ty) => {
            if ty == event_type::KEYDOWN {
                attrs.insert("unicode".into(), AttrValue::Text(key_unicode(sym, modifiers)));
            }
            attrs.insert("key".into(), AttrValue::Int(sym as i64));
            attrs.insert("mod".into(), AttrValue::Int(modifiers.bits() as i64));
            attrs.insert("scancode".into(), AttrValue::Int(scancode as i64));
        }
        (&NativeData::MouseMotion { x, y, xrel, yrel, state }, _) => {
            attrs.insert("pos".into(), AttrValue::Pair(x, y));
            attrs.insert("rel".into(), AttrValue::Pair(xrel, yrel));
            attrs.insert(
                "buttons".into(),
                AttrValue::Buttons([
                    state.contains(crate::native::MouseButtons::LEFT),
                    state.contains(crate::native::MouseButtons::MIDDLE),
                    state.contains(crate::native::MouseButtons::RIGHT),
                ]),
            );
        }
        (&NativeData::MouseButton { x, y, button }, _) => {
            attrs.insert("pos".into(), AttrValue::Pair(x, y));
            attrs.insert("button".into(), AttrValue::Int(button as i64));
        }
        (&NativeData::JoyAxis { joy, axis, value }, _) => {
            attrs.insert("joy".into(), AttrValue::Int(joy as i64));
            attrs.insert("axis".into(), AttrValue::Int(axis as i64));
            attrs.insert("value".into(), AttrValue::Float(value as f64 / 32767.0));
        }
        (&NativeData::JoyBall { joy, ball, xrel, yrel }, _) => {
            attrs.insert("joy".into(), AttrValue::Int(joy as i64));
            attrs.insert("ball".into(), AttrValue::Int(ball as i64));
            attrs.insert("rel".into(), AttrValue::Pair(xrel, yrel));
        }
        (&NativeData::JoyHat { joy, hat, value }, _) => {
            attrs.insert("joy".into(), AttrValue::Int(joy as i64));
            attrs.insert("hat".into(), AttrValue::Int(hat as i64));
            let (dx, dy) = value.direction();
            attrs.insert("value".into(), AttrValue::Pair(dx, dy));
        }
        (&NativeData::JoyButton { joy, button }, _) => {
            attrs.insert("joy".into(), AttrValue::Int(joy as i64));
            attrs.insert("button".into(), AttrValue::Int(button as i64));
        }
        (NativeData::SysWm { bytes }, _) => {
            // Platform message passthrough; nothing to decode when the
            // producer captured no bytes.
            if !bytes.is_empty() {
                attrs.insert("event".into(), AttrValue::Blob(bytes.clone()));
            }
        }
        // Quit, expose, and unclassified codes have no type-specific
        // attributes.
        _ => {}
    }

    if let NativeData::User { code, data1, .. } = &event.data {
        if public == event_type::USEREVENT && *code == event_type::DROPFILE_CODE {
            if let UserSlot::Text(filename) = data1 {
                attrs.insert("filename".into(), AttrValue::Text(filename.clone()));
            }
        }
        if is_user_type(public) {
            attrs.insert("code".into(), AttrValue::Int(*code as i64));
        }
    }

    attrs
}

// =============================================================================
// Tests
// =============================================================================
