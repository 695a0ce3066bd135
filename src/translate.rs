//! Native <-> public event type translation.
//!
//! Fixed native codes map through a total table; windowing records fan out
//! to three public types by sub-code; a contiguous user block negotiated
//! once at startup maps onto `USEREVENT..NUMEVENTS`. Everything else is
//! OTHEREVENT.
//!
//! The reverse direction is lossy for the windowing family (all three public
//! types collapse onto the single native window code) and recovers re-posted
//! OTHEREVENT codes from the `native_type` attribute stashed at decode time.

use tracing::warn;

use crate::error::EventError;
use crate::native::{native_code, window_event, NativeEvent};
use crate::source::EventSource;
use crate::types::{event_type, is_user_type, AttributeMap};

/// Attribute name carrying the raw native code on every decoded map, so
/// OTHEREVENT events stay postable.
pub const NATIVE_TYPE_ATTR: &str = "native_type";

#[derive(Debug, Clone, Copy)]
struct UserBlock {
    /// First native code of the block; maps to `USEREVENT`.
    first: u32,
    /// Spare registered code one past the mapped block. Re-posted
    /// OTHEREVENT records with no recoverable stash land here.
    spare: u32,
}

/// Translates native type codes to public codes and back.
///
/// The user block is negotiated at most once; when the platform denies the
/// request, user-range translation stays disabled for the life of the
/// translator and user-type operations fail with
/// [`EventError::FeatureUnavailable`].
#[derive(Debug, Default)]
pub struct TypeTranslator {
    user_block: Option<UserBlock>,
}

impl TypeTranslator {
    /// Translator with the user range disabled (not yet negotiated).
    pub fn new() -> Self {
        Self::default()
    }

    /// Negotiate the user block from `source`: the range itself plus one
    /// spare code for unclassified re-posts.
    pub fn negotiate(source: &mut impl EventSource) -> Self {
        let user_block = match source.register_events(event_type::USER_RANGE + 1) {
            Some(first) => Some(UserBlock { first, spare: first + event_type::USER_RANGE }),
            None => {
                warn!("user event block denied; user-range operations disabled");
                None
            }
        };
        Self { user_block }
    }

    /// Whether the user block was successfully negotiated.
    pub fn user_range_available(&self) -> bool {
        self.user_block.is_some()
    }

    /// Public type for a native code plus optional windowing sub-code.
    pub fn to_public(&self, code: u32, sub: Option<u8>) -> u32 {
        use event_type::*;
        match code {
            native_code::WINDOW => match sub {
                Some(window_event::ENTER)
                | Some(window_event::LEAVE)
                | Some(window_event::FOCUS_GAINED)
                | Some(window_event::FOCUS_LOST)
                | Some(window_event::MINIMIZED)
                | Some(window_event::RESTORED) => ACTIVEEVENT,
                Some(window_event::RESIZED) => VIDEORESIZE,
                Some(window_event::EXPOSED) => VIDEOEXPOSE,
                _ => OTHEREVENT,
            },
            native_code::KEYDOWN => KEYDOWN,
            native_code::KEYUP => KEYUP,
            native_code::MOUSEMOTION => MOUSEMOTION,
            native_code::MOUSEBUTTONDOWN => MOUSEBUTTONDOWN,
            native_code::MOUSEBUTTONUP => MOUSEBUTTONUP,
            native_code::JOYAXISMOTION => JOYAXISMOTION,
            native_code::JOYBALLMOTION => JOYBALLMOTION,
            native_code::JOYHATMOTION => JOYHATMOTION,
            native_code::JOYBUTTONDOWN => JOYBUTTONDOWN,
            native_code::JOYBUTTONUP => JOYBUTTONUP,
            native_code::QUIT => QUIT,
            native_code::SYSWM => SYSWMEVENT,
            _ => {
                if let Some(block) = self.user_block {
                    if (block.first..block.spare).contains(&code) {
                        return USEREVENT + (code - block.first);
                    }
                }
                OTHEREVENT
            }
        }
    }

    /// Public type for a whole record.
    pub fn event_to_public(&self, event: &NativeEvent) -> u32 {
        self.to_public(event.code, event.window_sub())
    }

    /// Native code for a public type, or `None` when there is no native
    /// equivalent (NOEVENT, OTHEREVENT, out-of-range, or a user type with
    /// the block unavailable).
    ///
    /// Lossy for the windowing family: ACTIVEEVENT, VIDEORESIZE, and
    /// VIDEOEXPOSE all return the native window code; the sub-code is not
    /// reconstructed.
    pub fn to_native(&self, ty: u32) -> Option<u32> {
        use event_type::*;
        match ty {
            ACTIVEEVENT | VIDEORESIZE | VIDEOEXPOSE => Some(native_code::WINDOW),
            KEYDOWN => Some(native_code::KEYDOWN),
            KEYUP => Some(native_code::KEYUP),
            MOUSEMOTION => Some(native_code::MOUSEMOTION),
            MOUSEBUTTONDOWN => Some(native_code::MOUSEBUTTONDOWN),
            MOUSEBUTTONUP => Some(native_code::MOUSEBUTTONUP),
            JOYAXISMOTION => Some(native_code::JOYAXISMOTION),
            JOYBALLMOTION => Some(native_code::JOYBALLMOTION),
            JOYHATMOTION => Some(native_code::JOYHATMOTION),
            JOYBUTTONDOWN => Some(native_code::JOYBUTTONDOWN),
            JOYBUTTONUP => Some(native_code::JOYBUTTONUP),
            QUIT => Some(native_code::QUIT),
            SYSWMEVENT => Some(native_code::SYSWM),
            _ if is_user_type(ty) => {
                self.user_block.map(|block| block.first + (ty - USEREVENT))
            }
            _ => None,
        }
    }

    /// Like [`Self::to_native`], but distinguishes *why* there is no
    /// mapping: a user type with the block unavailable is
    /// `FeatureUnavailable`, anything else is `InvalidArgument`.
    pub fn require_native(&self, ty: u32) -> Result<u32, EventError> {
        match self.to_native(ty) {
            Some(code) => Ok(code),
            None if is_user_type(ty) => Err(EventError::FeatureUnavailable),
            None => Err(EventError::InvalidArgument(ty)),
        }
    }

    /// Native code for a re-posted OTHEREVENT: recover the stash from its
    /// attribute map, falling back to the spare registered code when the
    /// stash is absent, non-numeric, or past the known code space.
    pub fn resolve_other(&self, attributes: &AttributeMap) -> Result<u32, EventError> {
        let stashed = attributes
            .get(NATIVE_TYPE_ATTR)
            .and_then(|v| v.as_int())
            .and_then(|c| u32::try_from(c).ok());

        match (stashed, self.user_block) {
            (Some(code), Some(block)) if code <= block.spare => Ok(code),
            (Some(code), None) => Ok(code),
            (_, Some(block)) => Ok(block.spare),
            (None, None) => Err(EventError::FeatureUnavailable),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChannelSource;
    use crate::types::AttrValue;

    fn negotiated() -> TypeTranslator {
        let mut source = ChannelSource::new();
        TypeTranslator::negotiate(&mut source)
    }

    /// Public types with an exact two-way native mapping.
    const FIXED: [u32; 12] = [
        event_type::KEYDOWN,
        event_type::KEYUP,
        event_type::MOUSEMOTION,
        event_type::MOUSEBUTTONDOWN,
        event_type::MOUSEBUTTONUP,
        event_type::JOYAXISMOTION,
        event_type::JOYBALLMOTION,
        event_type::JOYHATMOTION,
        event_type::JOYBUTTONDOWN,
        event_type::JOYBUTTONUP,
        event_type::QUIT,
        event_type::SYSWMEVENT,
    ];

    #[test]
    fn test_fixed_round_trip() {
        let tr = negotiated();
        for ty in FIXED {
            let native = tr.to_native(ty).unwrap();
            assert_eq!(tr.to_public(native, None), ty, "type {}", ty);
        }
    }

    #[test]
    fn test_window_fan_out() {
        let tr = negotiated();
        for sub in [
            window_event::ENTER,
            window_event::LEAVE,
            window_event::FOCUS_GAINED,
            window_event::FOCUS_LOST,
            window_event::MINIMIZED,
            window_event::RESTORED,
        ] {
            assert_eq!(
                tr.to_public(native_code::WINDOW, Some(sub)),
                event_type::ACTIVEEVENT
            );
        }
        assert_eq!(
            tr.to_public(native_code::WINDOW, Some(window_event::RESIZED)),
            event_type::VIDEORESIZE
        );
        assert_eq!(
            tr.to_public(native_code::WINDOW, Some(window_event::EXPOSED)),
            event_type::VIDEOEXPOSE
        );
        // Unrouted sub-codes are unclassified, not active events.
        assert_eq!(tr.to_public(native_code::WINDOW, Some(4)), event_type::OTHEREVENT);
    }

    #[test]
    fn test_window_family_collapses_back() {
        let tr = negotiated();
        for ty in [
            event_type::ACTIVEEVENT,
            event_type::VIDEORESIZE,
            event_type::VIDEOEXPOSE,
        ] {
            assert_eq!(tr.to_native(ty), Some(native_code::WINDOW));
        }
    }

    #[test]
    fn test_user_range_bijection() {
        let tr = negotiated();
        for k in 0..event_type::USER_RANGE {
            let ty = event_type::USEREVENT + k;
            let native = tr.to_native(ty).unwrap();
            assert_eq!(tr.to_public(native, None), ty, "user offset {}", k);
        }
    }

    #[test]
    fn test_codes_outside_user_block_are_other() {
        let tr = negotiated();
        let first = tr.to_native(event_type::USEREVENT).unwrap();
        assert_eq!(tr.to_public(first - 1, None), event_type::OTHEREVENT);
        // The spare code is registered but deliberately unmapped.
        assert_eq!(
            tr.to_public(first + event_type::USER_RANGE, None),
            event_type::OTHEREVENT
        );
    }

    #[test]
    fn test_unmapped_types() {
        let tr = negotiated();
        assert_eq!(tr.to_native(event_type::NOEVENT), None);
        assert_eq!(tr.to_native(event_type::OTHEREVENT), None);
        assert_eq!(tr.to_native(event_type::NUMEVENTS), None);
        assert_eq!(
            tr.require_native(event_type::NOEVENT),
            Err(EventError::InvalidArgument(0))
        );
    }

    #[test]
    fn test_denied_negotiation_disables_user_range() {
        let mut source = ChannelSource::without_user_events();
        let tr = TypeTranslator::negotiate(&mut source);
        assert!(!tr.user_range_available());
        assert_eq!(tr.to_native(event_type::USEREVENT), None);
        assert_eq!(
            tr.require_native(event_type::USEREVENT),
            Err(EventError::FeatureUnavailable)
        );
        // Fixed types keep working.
        assert_eq!(tr.to_native(event_type::QUIT), Some(native_code::QUIT));
    }

    #[test]
    fn test_resolve_other_recovers_stash() {
        let tr = negotiated();
        let mut attrs = AttributeMap::new();
        attrs.insert(
            NATIVE_TYPE_ATTR.into(),
            AttrValue::Int(native_code::MOUSEMOTION as i64),
        );
        assert_eq!(tr.resolve_other(&attrs), Ok(native_code::MOUSEMOTION));
    }

    #[test]
    fn test_resolve_other_fallback() {
        let tr = negotiated();
        let spare = tr.to_native(event_type::USEREVENT).unwrap() + event_type::USER_RANGE;

        // Absent stash.
        assert_eq!(tr.resolve_other(&AttributeMap::new()), Ok(spare));

        // Wrong-typed stash.
        let mut attrs = AttributeMap::new();
        attrs.insert(NATIVE_TYPE_ATTR.into(), AttrValue::Text("nope".into()));
        assert_eq!(tr.resolve_other(&attrs), Ok(spare));

        // Negative stash.
        let mut attrs = AttributeMap::new();
        attrs.insert(NATIVE_TYPE_ATTR.into(), AttrValue::Int(-3));
        assert_eq!(tr.resolve_other(&attrs), Ok(spare));

        // Stash past the known code space.
        let mut attrs = AttributeMap::new();
        attrs.insert(NATIVE_TYPE_ATTR.into(), AttrValue::Int(spare as i64 + 1));
        assert_eq!(tr.resolve_other(&attrs), Ok(spare));
    }
}
