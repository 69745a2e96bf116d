//! # Layout engine
//!
//! Flows styled blocks into a positioned sequence of horizontal lines and
//! widget boxes. Text metrics are fixed-width: a glyph is `CHAR_W × scale`
//! pixels wide, with scale drawn from a small set of discrete buckets.
//! Lines are emitted strictly top to bottom, so hit-testing can binary
//! search on `y`.

#![forbid(unsafe_code)]

pub mod build;
pub mod flow;
pub mod hit;
pub mod widgets;

use common::Color;

pub use build::{Block, BlockKind, InlineItem, SpanStyle, build_blocks};
pub use flow::{layout_blocks, layout_document};
pub use hit::{hit_test_span, hit_test_widget};
pub use widgets::widget_size;

/// Fixed glyph advance at scale 1.
pub const CHAR_W: f32 = 8.0;
/// Natural line height at scale 1 before the line-height multiplier.
pub const LINE_BASE: f32 = 16.0;
/// Horizontal page padding.
pub const PAGE_PADDING: f32 = 8.0;
/// Indent per list nesting level.
pub const LIST_INDENT: f32 = 8.0;
/// Width of the blockquote bar.
pub const QUOTE_BAR_W: f32 = 3.0;

/// Discrete font scale from a continuous CSS pixel size. The default 16 px
/// stays at scale 1.
pub fn font_scale(px: f32) -> f32 {
    if px < 12.0 {
        0.75
    } else if px <= 16.0 {
        1.0
    } else if px < 24.0 {
        2.0
    } else {
        3.0
    }
}

/// Default scales for `h1`–`h6`.
pub fn heading_scale(level: u8) -> f32 {
    match level {
        1 => 3.0,
        2 => 2.0,
        3 => 1.5,
        4 => 1.25,
        _ => 1.0,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output model
// ─────────────────────────────────────────────────────────────────────────────

/// One positioned run of same-styled text.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSpan {
    pub x: f32,
    pub text: String,
    pub color: Color,
    pub font_scale: f32,
    pub bold: bool,
    pub italic: bool,
    pub href: Option<String>,
    pub underline: bool,
    pub strike: bool,
    pub code_bg: bool,
    pub mark: bool,
    pub search_hit: bool,
}

impl RenderedSpan {
    /// Pixel width under the fixed-glyph metric.
    pub fn width(&self) -> f32 {
        self.text.chars().count() as f32 * CHAR_W * self.font_scale
    }
}

/// Per-line decoration flags for the paint pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineDecoration {
    /// Horizontal rule line.
    pub hr: bool,
    /// Preformatted block background.
    pub pre_bg: bool,
    /// Blockquote bar plus tinted background.
    pub quote_bar: bool,
    /// Background image URL of the host block, for the paint pass to
    /// fetch and tile.
    pub bg_image: Option<String>,
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub y: f32,
    pub height: f32,
    pub spans: Vec<RenderedSpan>,
    /// Host block background, painted across the content width.
    pub bg: Option<Color>,
    pub deco: LineDecoration,
}

impl RenderedLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A laid-out form control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedWidget {
    /// Index into the document's widget blueprint list.
    pub widget_index: usize,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl PositionedWidget {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

/// The layout output for one document.
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub lines: Vec<RenderedLine>,
    pub widgets: Vec<PositionedWidget>,
}

impl LayoutResult {
    /// Total content height.
    pub fn content_height(&self) -> f32 {
        self.lines.last().map(RenderedLine::bottom).unwrap_or(0.0)
    }

    /// `max(0, content_height − viewport_height)`.
    pub fn max_scroll(&self, viewport_height: f32) -> f32 {
        (self.content_height() - viewport_height).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_buckets() {
        assert_eq!(font_scale(8.0), 0.75);
        assert_eq!(font_scale(11.9), 0.75);
        assert_eq!(font_scale(12.0), 1.0);
        assert_eq!(font_scale(16.0), 1.0);
        assert_eq!(font_scale(17.0), 2.0);
        assert_eq!(font_scale(23.9), 2.0);
        assert_eq!(font_scale(24.0), 3.0);
        assert_eq!(font_scale(64.0), 3.0);
    }

    #[test]
    fn heading_scales() {
        assert_eq!(heading_scale(1), 3.0);
        assert_eq!(heading_scale(2), 2.0);
        assert_eq!(heading_scale(3), 1.5);
        assert_eq!(heading_scale(4), 1.25);
        assert_eq!(heading_scale(5), 1.0);
        assert_eq!(heading_scale(6), 1.0);
    }

    #[test]
    fn span_width_is_monospace() {
        let span = RenderedSpan {
            x: 0.0,
            text: "abcd".into(),
            color: Color::BLACK,
            font_scale: 2.0,
            bold: false,
            italic: false,
            href: None,
            underline: false,
            strike: false,
            code_bg: false,
            mark: false,
            search_hit: false,
        };
        assert_eq!(span.width(), 4.0 * CHAR_W * 2.0);
    }

    #[test]
    fn scroll_extent_clamps_at_zero() {
        let mut result = LayoutResult::default();
        assert_eq!(result.max_scroll(600.0), 0.0);
        result.lines.push(RenderedLine {
            y: 0.0,
            height: 1000.0,
            spans: vec![],
            bg: None,
            deco: LineDecoration::default(),
        });
        assert_eq!(result.max_scroll(600.0), 400.0);
    }
}
