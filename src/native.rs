//! Native event records.
//!
//! The raw, platform-defined side of the bridge: fixed numeric type codes,
//! windowing sub-codes, and a tagged record whose fields vary per kind.
//! Records are produced by an [`crate::source::EventSource`] and consumed by
//! the translator and decoder; nothing here knows about public type codes.

use bitflags::bitflags;

use crate::payload::PayloadHandle;

// =============================================================================
// Native type codes
// =============================================================================

/// Fixed native type codes, mirroring the platform's numbering.
///
/// User-defined codes live in a dynamically negotiated block above these and
/// have no constants here.
pub mod native_code {
    pub const QUIT: u32 = 0x100;
    pub const WINDOW: u32 = 0x200;
    pub const SYSWM: u32 = 0x201;
    pub const KEYDOWN: u32 = 0x300;
    pub const KEYUP: u32 = 0x301;
    pub const MOUSEMOTION: u32 = 0x400;
    pub const MOUSEBUTTONDOWN: u32 = 0x401;
    pub const MOUSEBUTTONUP: u32 = 0x402;
    pub const JOYAXISMOTION: u32 = 0x600;
    pub const JOYBALLMOTION: u32 = 0x601;
    pub const JOYHATMOTION: u32 = 0x602;
    pub const JOYBUTTONDOWN: u32 = 0x603;
    pub const JOYBUTTONUP: u32 = 0x604;
}

/// Windowing sub-codes carried by `native_code::WINDOW` records.
pub mod window_event {
    pub const EXPOSED: u8 = 3;
    pub const RESIZED: u8 = 5;
    pub const MINIMIZED: u8 = 7;
    pub const RESTORED: u8 = 9;
    pub const ENTER: u8 = 10;
    pub const LEAVE: u8 = 11;
    pub const FOCUS_GAINED: u8 = 12;
    pub const FOCUS_LOST: u8 = 13;
}

// =============================================================================
// Bitflag fields
// =============================================================================

bitflags! {
    /// Keyboard modifier bitmask on key records.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyMod: u16 {
        const LSHIFT = 0x0001;
        const RSHIFT = 0x0002;
        const LCTRL = 0x0040;
        const RCTRL = 0x0080;
        const LALT = 0x0100;
        const RALT = 0x0200;
        const LGUI = 0x0400;
        const RGUI = 0x0800;
        const NUM = 0x1000;
        const CAPS = 0x2000;
        const MODE = 0x4000;

        const SHIFT = Self::LSHIFT.bits() | Self::RSHIFT.bits();
        const CTRL = Self::LCTRL.bits() | Self::RCTRL.bits();
        const ALT = Self::LALT.bits() | Self::RALT.bits();
        const GUI = Self::LGUI.bits() | Self::RGUI.bits();
    }
}

bitflags! {
    /// Mouse button hold state on motion records. Bit `1 << (n - 1)` is
    /// button `n`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u32 {
        const LEFT = 1 << 0;
        const MIDDLE = 1 << 1;
        const RIGHT = 1 << 2;
    }
}

bitflags! {
    /// Hat direction bits on joystick hat records. Opposite bits per axis
    /// are mutually exclusive by construction at the source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HatState: u8 {
        const UP = 0x01;
        const RIGHT = 0x02;
        const DOWN = 0x04;
        const LEFT = 0x08;
    }
}

impl HatState {
    /// Direction as a `(dx, dy)` pair: right/left on x, up/down on y.
    pub fn direction(self) -> (i32, i32) {
        let mut dx = 0;
        let mut dy = 0;
        if self.contains(HatState::UP) {
            dy = 1;
        } else if self.contains(HatState::DOWN) {
            dy = -1;
        }
        if self.contains(HatState::RIGHT) {
            dx = 1;
        } else if self.contains(HatState::LEFT) {
            dx = -1;
        }
        (dx, dy)
    }
}

// =============================================================================
// Records
// =============================================================================

/// One generic payload slot on a user record.
///
/// The queue can only transport fixed-shape records, so application payloads
/// travel as registry handles and short strings travel inline.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UserSlot {
    #[default]
    Empty,
    /// Ownership token into the payload registry.
    Payload(PayloadHandle),
    /// Inline text (the dropped-file convention).
    Text(String),
}

/// Kind-specific fields of a native record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NativeData {
    /// No kind-specific fields (quit and unclassified codes).
    #[default]
    None,
    Window {
        window_id: u32,
        event: u8,
        data1: i32,
        data2: i32,
    },
    Key {
        timestamp_ms: u32,
        sym: u32,
        modifiers: KeyMod,
        scancode: u32,
        /// Platform-generated held-key repeat flag.
        repeat: bool,
    },
    MouseMotion {
        x: i32,
        y: i32,
        xrel: i32,
        yrel: i32,
        state: MouseButtons,
    },
    MouseButton {
        x: i32,
        y: i32,
        button: u8,
    },
    JoyAxis {
        joy: u32,
        axis: u8,
        value: i16,
    },
    JoyBall {
        joy: u32,
        ball: u8,
        xrel: i32,
        yrel: i32,
    },
    JoyHat {
        joy: u32,
        hat: u8,
        value: HatState,
    },
    JoyButton {
        joy: u32,
        button: u8,
    },
    /// Opaque platform message bytes, passed through verbatim.
    SysWm {
        bytes: Vec<u8>,
    },
    User {
        code: i32,
        data1: UserSlot,
        data2: UserSlot,
        timestamp_ms: u32,
    },
}

/// A native event record: a numeric type code plus kind-specific fields.
///
/// `code` is authoritative for queue filtering; `data` is whatever the
/// producing source filled in for that kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeEvent {
    pub code: u32,
    pub data: NativeData,
}

impl NativeEvent {
    pub fn new(code: u32, data: NativeData) -> Self {
        Self { code, data }
    }

    pub fn quit() -> Self {
        Self::new(native_code::QUIT, NativeData::None)
    }

    pub fn window(window_id: u32, event: u8, data1: i32, data2: i32) -> Self {
        Self::new(
            native_code::WINDOW,
            NativeData::Window { window_id, event, data1, data2 },
        )
    }

    pub fn key_down(timestamp_ms: u32, sym: u32, modifiers: KeyMod, scancode: u32, repeat: bool) -> Self {
        Self::new(
            native_code::KEYDOWN,
            NativeData::Key { timestamp_ms, sym, modifiers, scancode, repeat },
        )
    }

    pub fn key_up(timestamp_ms: u32, sym: u32, modifiers: KeyMod, scancode: u32) -> Self {
        Self::new(
            native_code::KEYUP,
            NativeData::Key { timestamp_ms, sym, modifiers, scancode, repeat: false },
        )
    }

    pub fn user(code_native: u32, code: i32, data1: UserSlot, data2: UserSlot) -> Self {
        Self::new(
            code_native,
            NativeData::User { code, data1, data2, timestamp_ms: 0 },
        )
    }

    /// Windowing sub-code, when this is a window record.
    pub fn window_sub(&self) -> Option<u8> {
        match self.data {
            NativeData::Window { event, .. } => Some(event),
            _ => None,
        }
    }

    /// Timestamp and repeat flag, when this is a key-down record. This is
    /// what the repeat filter keys on.
    pub fn key_repeat(&self) -> Option<(u32, bool)> {
        if self.code != native_code::KEYDOWN {
            return None;
        }
        match self.data {
            NativeData::Key { timestamp_ms, repeat, .. } => Some((timestamp_ms, repeat)),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
