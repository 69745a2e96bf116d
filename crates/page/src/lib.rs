//! # Page controller
//!
//! The top of the pipeline: tabs, navigation and history, fetch
//! orchestration as a polled state machine, input routing, the form
//! runtime, find-in-page, and the paint pass. Everything above this crate
//! (window, framebuffer, filesystem, JS engine) is reached through the
//! host-boundary traits in [`host`].

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod controller;
pub mod find;
pub mod form;
pub mod host;
pub mod paint;
pub mod tab;

pub use config::Config;
pub use context::Context;
pub use controller::Browser;
pub use find::FindState;
pub use form::WidgetState;
pub use host::{
    Canvas, CursorIcon, Filesystem, JsEnv, JsHost, JsHostFactory, Key, KeyEvent, NullJsFactory,
    PointerEvent, PointerKind, StdFilesystem, WindowManager,
};
pub use tab::Tab;
