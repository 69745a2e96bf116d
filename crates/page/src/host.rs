//! Host platform boundary.
//!
//! Everything the core needs from its embedder: a canvas to paint on, a
//! window manager for the cursor, keyboard/pointer events, a filesystem
//! for downloads and printing, and a JS host factory. The JS engine itself
//! is a black box behind [`JsHost`]; the default factory runs no scripts.

use common::Color;

/// Drawing surface.
pub trait Canvas {
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color);
    fn set_pixel(&mut self, x: f32, y: f32, color: Color);
    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color);
    fn draw_text_scaled(&mut self, x: f32, y: f32, text: &str, color: Color, scale: f32);
}

/// Pointer shapes the core requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIcon {
    #[default]
    Default,
    Pointer,
    Text,
    Wait,
}

pub trait WindowManager {
    fn set_cursor(&mut self, cursor: CursorIcon);
}

/// Non-character keys the controller routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    None,
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub ch: Option<char>,
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub fn char(c: char) -> Self {
        Self {
            ch: Some(c),
            key: Key::None,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn key(key: Key) -> Self {
        Self {
            ch: None,
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Up,
    Move,
}

#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    pub button: u8,
}

/// Filesystem access for downloads and "print to file".
pub trait Filesystem {
    fn mkdir(&mut self, path: &str) -> bool;
    fn write(&mut self, path: &str, bytes: &[u8]) -> bool;
    fn read(&self, path: &str) -> Option<Vec<u8>>;
}

/// Std-backed filesystem, the usual embedder choice.
#[derive(Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn mkdir(&mut self, path: &str) -> bool {
        std::fs::create_dir_all(path).is_ok()
    }

    fn write(&mut self, path: &str, bytes: &[u8]) -> bool {
        std::fs::write(path, bytes).is_ok()
    }

    fn read(&self, path: &str) -> Option<Vec<u8>> {
        std::fs::read(path).ok()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JS host boundary
// ─────────────────────────────────────────────────────────────────────────────

/// The environment handed to a script host. Rerender requests are queued
/// and applied at the start of the next reactor turn, never re-entrantly.
pub struct JsEnv {
    /// Queue a re-render with replacement body HTML.
    pub rerender: Box<dyn FnMut(String)>,
    /// Script console/error sink; script errors never abort layout.
    pub log: Box<dyn FnMut(String)>,
}

/// A running script host attached to one document.
pub trait JsHost {
    /// Drive timers and animation frames.
    fn tick(&mut self, now_ms: u64);
    /// Deliver a DOM event to the scripts.
    fn fire_event(&mut self, target: u32, kind: &str, payload: &str);
    fn dispose(&mut self);
}

pub trait JsHostFactory {
    fn create(&self, scripts: Vec<String>, env: JsEnv) -> Box<dyn JsHost>;
}

/// Factory for embedders without a JS engine: scripts are accepted and
/// ignored.
#[derive(Default)]
pub struct NullJsFactory;

struct NullJsHost;

impl JsHost for NullJsHost {
    fn tick(&mut self, _now_ms: u64) {}
    fn fire_event(&mut self, _target: u32, _kind: &str, _payload: &str) {}
    fn dispose(&mut self) {}
}

impl JsHostFactory for NullJsFactory {
    fn create(&self, _scripts: Vec<String>, _env: JsEnv) -> Box<dyn JsHost> {
        Box::new(NullJsHost)
    }
}
