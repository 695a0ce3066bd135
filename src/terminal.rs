//! Terminal Source - crossterm-backed native event producer
//!
//! Bridges crossterm's terminal input to the native record model so a
//! [`crate::queue::EventQueue`] can run over a live terminal. Conversion
//! is split out from the source so it can be tested without a TTY.
//!
//! # API
//!
//! - `TerminalSource` - [`EventSource`] over crossterm input
//! - `convert_event` - Convert a crossterm `Event` to a native record
//! - `convert_key_event` - Key press/repeat/release conversion
//! - `convert_mouse_event` - Mouse button/motion/scroll conversion
//! - `enable_mouse` / `disable_mouse` - Control mouse capture

use std::collections::{HashSet, VecDeque};
use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::event::{
    poll, read, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent,
    KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers,
    MouseButton as CrosstermMouseButton, MouseEvent as CrosstermMouseEvent, MouseEventKind,
};
use crossterm::execute;
use tracing::warn;

use crate::error::EventError;
use crate::native::{native_code, window_event, KeyMod, MouseButtons, NativeData, NativeEvent};
use crate::source::{EventSource, DEFAULT_CAPACITY, USER_BLOCK_START};

/// Keysyms for keys without a printable character carry this bit, mirroring
/// the convention the decoder's unicode rule keys on.
const NONPRINTING_SYM: u32 = 0x4000_0000;

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

/// Convert a crossterm KeyEvent to a native key record.
///
/// Press and Repeat become key-down records (Repeat sets the platform
/// repeat flag, which the repeat filter consumes); Release becomes key-up.
pub fn convert_key_event(event: CrosstermKeyEvent, timestamp_ms: u32) -> Option<NativeEvent> {
    let sym = keysym_of(event.code)?;
    let modifiers = convert_modifiers(event.modifiers);
    // Crossterm has no scancode; the keysym doubles as a stable stand-in.
    let scancode = sym;

    match event.kind {
        KeyEventKind::Press => Some(NativeEvent::key_down(timestamp_ms, sym, modifiers, scancode, false)),
        KeyEventKind::Repeat => Some(NativeEvent::key_down(timestamp_ms, sym, modifiers, scancode, true)),
        KeyEventKind::Release => Some(NativeEvent::key_up(timestamp_ms, sym, modifiers, scancode)),
    }
}

fn keysym_of(code: KeyCode) -> Option<u32> {
    let sym = match code {
        // Character keys use their lowercase codepoint so the shift rule in
        // the decoder can uppercase them.
        KeyCode::Char(c) => c.to_lowercase().next().unwrap_or(c) as u32,
        KeyCode::Enter => '\r' as u32,
        KeyCode::Tab => '\t' as u32,
        KeyCode::Backspace => 0x08,
        KeyCode::Esc => 0x1B,
        KeyCode::Delete => 0x7F,
        KeyCode::Up => NONPRINTING_SYM | 0x52,
        KeyCode::Down => NONPRINTING_SYM | 0x51,
        KeyCode::Left => NONPRINTING_SYM | 0x50,
        KeyCode::Right => NONPRINTING_SYM | 0x4F,
        KeyCode::Home => NONPRINTING_SYM | 0x4A,
        KeyCode::End => NONPRINTING_SYM | 0x4D,
        KeyCode::PageUp => NONPRINTING_SYM | 0x4B,
        KeyCode::PageDown => NONPRINTING_SYM | 0x4E,
        KeyCode::Insert => NONPRINTING_SYM | 0x49,
        KeyCode::F(n) => NONPRINTING_SYM | (0x3A + u32::from(n) - 1),
        _ => return None,
    };
    Some(sym)
}

/// Convert crossterm KeyModifiers to the native modifier bitmask.
///
/// Crossterm does not distinguish left from right, so the left bit stands
/// for both.
pub fn convert_modifiers(mods: KeyModifiers) -> KeyMod {
    let mut out = KeyMod::empty();
    if mods.contains(KeyModifiers::SHIFT) {
        out |= KeyMod::LSHIFT;
    }
    if mods.contains(KeyModifiers::CONTROL) {
        out |= KeyMod::LCTRL;
    }
    if mods.contains(KeyModifiers::ALT) {
        out |= KeyMod::LALT;
    }
    if mods.contains(KeyModifiers::SUPER) || mods.contains(KeyModifiers::META) {
        out |= KeyMod::LGUI;
    }
    out
}

// =============================================================================
// MOUSE EVENT CONVERSION
// =============================================================================

/// Convert a crossterm MouseEvent to a native mouse record.
///
/// `held` is the source's view of currently pressed buttons, reported as
/// the hold state on motion records. Scroll ticks use the classic wheel
/// convention of button 4 (up) and 5 (down).
pub fn convert_mouse_event(event: CrosstermMouseEvent, held: MouseButtons) -> Option<NativeEvent> {
    let x = i32::from(event.column);
    let y = i32::from(event.row);

    let native = match event.kind {
        MouseEventKind::Down(btn) => NativeEvent::new(
            native_code::MOUSEBUTTONDOWN,
            NativeData::MouseButton { x, y, button: button_number(btn) },
        ),
        MouseEventKind::Up(btn) => NativeEvent::new(
            native_code::MOUSEBUTTONUP,
            NativeData::MouseButton { x, y, button: button_number(btn) },
        ),
        MouseEventKind::Moved | MouseEventKind::Drag(_) => NativeEvent::new(
            native_code::MOUSEMOTION,
            // Relative motion is filled in by the source, which tracks the
            // previous position.
            NativeData::MouseMotion { x, y, xrel: 0, yrel: 0, state: held },
        ),
        MouseEventKind::ScrollUp => NativeEvent::new(
            native_code::MOUSEBUTTONDOWN,
            NativeData::MouseButton { x, y, button: 4 },
        ),
        MouseEventKind::ScrollDown => NativeEvent::new(
            native_code::MOUSEBUTTONDOWN,
            NativeData::MouseButton { x, y, button: 5 },
        ),
        MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => return None,
    };
    Some(native)
}

fn button_number(btn: CrosstermMouseButton) -> u8 {
    match btn {
        CrosstermMouseButton::Left => 1,
        CrosstermMouseButton::Middle => 2,
        CrosstermMouseButton::Right => 3,
    }
}

fn button_bit(btn: CrosstermMouseButton) -> MouseButtons {
    match btn {
        CrosstermMouseButton::Left => MouseButtons::LEFT,
        CrosstermMouseButton::Middle => MouseButtons::MIDDLE,
        CrosstermMouseButton::Right => MouseButtons::RIGHT,
    }
}

// =============================================================================
// TERMINAL SOURCE
// =============================================================================

/// [`EventSource`] over live crossterm terminal input.
///
/// Platform input (keys, mouse, resize, focus) is converted to native
/// records as it is pumped; posted records share the same internal queue.
/// Single-threaded by construction: crossterm reads happen on the calling
/// thread.
#[derive(Debug)]
pub struct TerminalSource {
    queue: VecDeque<NativeEvent>,
    disabled: HashSet<u32>,
    next_user_code: u32,
    capacity: usize,
    epoch: Instant,
    held: MouseButtons,
    last_mouse: Option<(i32, i32)>,
}

impl TerminalSource {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            disabled: HashSet::new(),
            next_user_code: USER_BLOCK_START,
            capacity: DEFAULT_CAPACITY,
            epoch: Instant::now(),
            held: MouseButtons::empty(),
            last_mouse: None,
        }
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn timestamp_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    /// Convert one crossterm event, tracking button hold state and filling
    /// relative motion from the previous position.
    fn convert(&mut self, event: CrosstermEvent) -> Option<NativeEvent> {
        match event {
            CrosstermEvent::Key(key) => convert_key_event(key, self.timestamp_ms()),
            CrosstermEvent::Mouse(mouse) => {
                match mouse.kind {
                    MouseEventKind::Down(btn) => self.held |= button_bit(btn),
                    MouseEventKind::Up(btn) => self.held -= button_bit(btn),
                    _ => {}
                }
                let mut native = convert_mouse_event(mouse, self.held)?;
                if let NativeData::MouseMotion { x, y, ref mut xrel, ref mut yrel, .. } = native.data {
                    if let Some((px, py)) = self.last_mouse {
                        *xrel = x - px;
                        *yrel = y - py;
                    }
                    self.last_mouse = Some((x, y));
                }
                Some(native)
            }
            CrosstermEvent::Resize(w, h) => Some(NativeEvent::window(
                0,
                window_event::RESIZED,
                i32::from(w),
                i32::from(h),
            )),
            CrosstermEvent::FocusGained => {
                Some(NativeEvent::window(0, window_event::FOCUS_GAINED, 0, 0))
            }
            CrosstermEvent::FocusLost => {
                Some(NativeEvent::window(0, window_event::FOCUS_LOST, 0, 0))
            }
            _ => None,
        }
    }

    /// Enqueue a converted record unless its code is disabled. Platform
    /// input past capacity is discarded with a warning rather than erroring
    /// the pump.
    fn enqueue(&mut self, event: NativeEvent) {
        if self.disabled.contains(&event.code) {
            return;
        }
        if self.queue.len() >= self.capacity {
            warn!(code = event.code, "terminal queue full, discarding input");
            return;
        }
        self.queue.push_back(event);
    }
}

impl Default for TerminalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TerminalSource {
    fn pump(&mut self) {
        loop {
            match poll(Duration::ZERO) {
                Ok(true) => match read() {
                    Ok(raw) => {
                        if let Some(native) = self.convert(raw) {
                            self.enqueue(native);
                        }
                    }
                    Err(err) => {
                        warn!(%err, "terminal read failed");
                        return;
                    }
                },
                Ok(false) => return,
                Err(err) => {
                    warn!(%err, "terminal poll failed");
                    return;
                }
            }
        }
    }

    fn poll(&mut self) -> Option<NativeEvent> {
        self.pump();
        self.queue.pop_front()
    }

    fn wait(&mut self) -> Result<NativeEvent, EventError> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Ok(event);
            }
            let raw = read().map_err(|_| EventError::Disconnected)?;
            if let Some(native) = self.convert(raw) {
                self.enqueue(native);
            }
        }
    }

    fn peek_code(&mut self, code: u32) -> Option<NativeEvent> {
        self.queue.iter().find(|e| e.code == code).cloned()
    }

    fn take_code(&mut self, code: u32) -> Option<NativeEvent> {
        let pos = self.queue.iter().position(|e| e.code == code)?;
        self.queue.remove(pos)
    }

    fn push(&mut self, event: NativeEvent) -> Result<(), EventError> {
        if self.disabled.contains(&event.code) {
            return Ok(());
        }
        if self.queue.len() >= self.capacity {
            return Err(EventError::QueueFull);
        }
        self.queue.push_back(event);
        Ok(())
    }

    fn set_enabled(&mut self, code: u32, enabled: bool) {
        if enabled {
            self.disabled.remove(&code);
        } else {
            self.disabled.insert(code);
        }
    }

    fn is_enabled(&self, code: u32) -> bool {
        !self.disabled.contains(&code)
    }

    fn register_events(&mut self, count: u32) -> Option<u32> {
        let first = self.next_user_code;
        let end = first.checked_add(count)?;
        self.next_user_code = end;
        Some(first)
    }
}

// =============================================================================
// MOUSE CAPTURE
// =============================================================================

/// Enable mouse capture so the terminal reports mouse input.
pub fn enable_mouse() -> std::io::Result<()> {
    execute!(stdout(), EnableMouseCapture)
}

/// Disable mouse capture.
pub fn disable_mouse() -> std::io::Result<()> {
    execute!(stdout(), DisableMouseCapture)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, mods: KeyModifiers, kind: KeyEventKind) -> CrosstermKeyEvent {
        let mut event = CrosstermKeyEvent::new(code, mods);
        event.kind = kind;
        event
    }

    #[test]
    fn test_convert_key_press() {
        let event = convert_key_event(
            key(KeyCode::Char('a'), KeyModifiers::empty(), KeyEventKind::Press),
            100,
        )
        .unwrap();

        assert_eq!(event.code, native_code::KEYDOWN);
        match event.data {
            NativeData::Key { timestamp_ms, sym, repeat, .. } => {
                assert_eq!(timestamp_ms, 100);
                assert_eq!(sym, 'a' as u32);
                assert!(!repeat);
            }
            other => panic!("expected key data, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_key_repeat_sets_flag() {
        let event = convert_key_event(
            key(KeyCode::Char('a'), KeyModifiers::empty(), KeyEventKind::Repeat),
            0,
        )
        .unwrap();
        assert_eq!(event.key_repeat(), Some((0, true)));
    }

    #[test]
    fn test_convert_key_release() {
        let event = convert_key_event(
            key(KeyCode::Char('a'), KeyModifiers::empty(), KeyEventKind::Release),
            0,
        )
        .unwrap();
        assert_eq!(event.code, native_code::KEYUP);
    }

    #[test]
    fn test_uppercase_char_normalizes_to_lowercase_sym() {
        let event = convert_key_event(
            key(KeyCode::Char('A'), KeyModifiers::SHIFT, KeyEventKind::Press),
            0,
        )
        .unwrap();
        match event.data {
            NativeData::Key { sym, modifiers, .. } => {
                assert_eq!(sym, 'a' as u32);
                assert!(modifiers.contains(KeyMod::LSHIFT));
            }
            other => panic!("expected key data, got {other:?}"),
        }
    }

    #[test]
    fn test_arrow_key_carries_nonprinting_bit() {
        let event = convert_key_event(
            key(KeyCode::Up, KeyModifiers::empty(), KeyEventKind::Press),
            0,
        )
        .unwrap();
        match event.data {
            NativeData::Key { sym, .. } => assert_ne!(sym & NONPRINTING_SYM, 0),
            other => panic!("expected key data, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_modifiers() {
        let mods = convert_modifiers(KeyModifiers::SHIFT | KeyModifiers::CONTROL);
        assert!(mods.intersects(KeyMod::SHIFT));
        assert!(mods.intersects(KeyMod::CTRL));
        assert!(!mods.intersects(KeyMod::ALT));
    }

    #[test]
    fn test_convert_mouse_down() {
        let raw = CrosstermMouseEvent {
            kind: MouseEventKind::Down(CrosstermMouseButton::Left),
            column: 10,
            row: 5,
            modifiers: KeyModifiers::empty(),
        };
        let event = convert_mouse_event(raw, MouseButtons::empty()).unwrap();

        assert_eq!(event.code, native_code::MOUSEBUTTONDOWN);
        assert_eq!(event.data, NativeData::MouseButton { x: 10, y: 5, button: 1 });
    }

    #[test]
    fn test_convert_scroll_to_wheel_buttons() {
        let raw = CrosstermMouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::empty(),
        };
        let event = convert_mouse_event(raw, MouseButtons::empty()).unwrap();
        assert_eq!(event.data, NativeData::MouseButton { x: 0, y: 0, button: 5 });
    }

    #[test]
    fn test_motion_reports_hold_state() {
        let raw = CrosstermMouseEvent {
            kind: MouseEventKind::Drag(CrosstermMouseButton::Left),
            column: 3,
            row: 4,
            modifiers: KeyModifiers::empty(),
        };
        let event = convert_mouse_event(raw, MouseButtons::LEFT).unwrap();
        match event.data {
            NativeData::MouseMotion { state, .. } => assert_eq!(state, MouseButtons::LEFT),
            other => panic!("expected motion data, got {other:?}"),
        }
    }

    #[test]
    fn test_source_tracks_relative_motion() {
        let mut source = TerminalSource::new();
        let motion = |col, row| {
            CrosstermEvent::Mouse(CrosstermMouseEvent {
                kind: MouseEventKind::Moved,
                column: col,
                row,
                modifiers: KeyModifiers::empty(),
            })
        };

        let first = source.convert(motion(10, 10)).unwrap();
        match first.data {
            NativeData::MouseMotion { xrel, yrel, .. } => {
                assert_eq!((xrel, yrel), (0, 0));
            }
            other => panic!("expected motion data, got {other:?}"),
        }

        let second = source.convert(motion(13, 8)).unwrap();
        match second.data {
            NativeData::MouseMotion { x, y, xrel, yrel, .. } => {
                assert_eq!((x, y), (13, 8));
                assert_eq!((xrel, yrel), (3, -2));
            }
            other => panic!("expected motion data, got {other:?}"),
        }
    }

    #[test]
    fn test_resize_becomes_window_record() {
        let mut source = TerminalSource::new();
        let event = source.convert(CrosstermEvent::Resize(80, 24)).unwrap();
        assert_eq!(event.code, native_code::WINDOW);
        assert_eq!(event.window_sub(), Some(window_event::RESIZED));
        assert_eq!(event.data, NativeData::Window { window_id: 0, event: window_event::RESIZED, data1: 80, data2: 24 });
    }

    #[test]
    fn test_focus_becomes_window_record() {
        let mut source = TerminalSource::new();
        let gained = source.convert(CrosstermEvent::FocusGained).unwrap();
        assert_eq!(gained.window_sub(), Some(window_event::FOCUS_GAINED));
        let lost = source.convert(CrosstermEvent::FocusLost).unwrap();
        assert_eq!(lost.window_sub(), Some(window_event::FOCUS_LOST));
    }

    #[test]
    fn test_push_respects_disabled_and_capacity() {
        let mut source = TerminalSource::new();
        source.capacity = 1;

        source.set_enabled(native_code::QUIT, false);
        source.push(NativeEvent::quit()).unwrap();
        assert!(source.is_empty());

        source.set_enabled(native_code::QUIT, true);
        source.push(NativeEvent::quit()).unwrap();
        assert_eq!(source.push(NativeEvent::quit()), Err(EventError::QueueFull));
    }

    #[test]
    fn test_take_code_scans_past_other_codes() {
        let mut source = TerminalSource::new();
        source.push(NativeEvent::quit()).unwrap();
        source
            .push(NativeEvent::key_down(0, 97, KeyMod::empty(), 97, false))
            .unwrap();

        let key = source.take_code(native_code::KEYDOWN).unwrap();
        assert_eq!(key.code, native_code::KEYDOWN);
        assert_eq!(source.len(), 1);
        assert!(source.peek_code(native_code::QUIT).is_some());
    }

    #[test]
    fn test_register_events_allocates_contiguous_blocks() {
        let mut source = TerminalSource::new();
        let first = source.register_events(9).unwrap();
        let second = source.register_events(2).unwrap();
        assert_eq!(second, first + 9);
    }
}
