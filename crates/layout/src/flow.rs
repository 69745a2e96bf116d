//! Block and inline flow.
//!
//! Blocks stack top to bottom with collapsed vertical margins (adjoining
//! margins reduce to their maximum). Inside a block, styled spans and
//! widget boxes pack onto lines under the fixed-glyph metric; a word that
//! would overflow closes the line unless wrapping is disabled.

use css::{Length, ListStyleType, TextAlign, WordBreak};
use html::WidgetBlueprint;

use crate::build::{Block, BlockKind, InlineItem, SpanStyle};
use crate::widgets::widget_size;
use crate::{
    CHAR_W, LINE_BASE, LIST_INDENT, LayoutResult, LineDecoration, PAGE_PADDING, PositionedWidget,
    RenderedLine, RenderedSpan,
};

/// Extra height reserved for a horizontal rule.
const HR_H: f32 = 2.0;

/// Lay out blocks into lines and positioned widgets.
pub fn layout_blocks(
    blocks: &[Block],
    blueprints: &[WidgetBlueprint],
    viewport_w: f32,
) -> LayoutResult {
    let container_w = (viewport_w - 2.0 * PAGE_PADDING).max(CHAR_W);
    let mut out = LayoutResult::default();
    let mut y = PAGE_PADDING;
    let mut pending_margin = 0.0f32;

    for block in blocks {
        let style = &block.style;
        let resolve = |l: Option<Length>| l.and_then(|l| l.resolve(container_w)).unwrap_or(0.0);

        let margin_top = resolve(style.margin[0]).max(0.0);
        let margin_bottom = resolve(style.margin[2]).max(0.0);
        let pad_top = resolve(style.padding[0]);
        let pad_right = resolve(style.padding[1]);
        let pad_bottom = resolve(style.padding[2]);
        let pad_left = resolve(style.padding[3]);
        let border = style.border_width;

        // Collapse with the previous block's bottom margin.
        y += pending_margin.max(margin_top);
        y += border + pad_top;

        let indent = block.depth as f32 * LIST_INDENT;
        let x_start = PAGE_PADDING + indent + border + pad_left;

        // Content width: explicit width clamped by min/max, else whatever
        // the container leaves after box chrome.
        let available = container_w - indent - pad_left - pad_right - 2.0 * border;
        let mut content_w = style
            .width
            .and_then(|w| w.resolve(container_w))
            .unwrap_or(available);
        if let Some(min) = style.min_width.and_then(|w| w.resolve(container_w)) {
            content_w = content_w.max(min);
        }
        if let Some(max) = style.max_width.and_then(|w| w.resolve(container_w)) {
            content_w = content_w.min(max);
        }
        let content_w = content_w.max(CHAR_W);

        if block.kind == BlockKind::Hr {
            out.lines.push(RenderedLine {
                y,
                height: HR_H,
                spans: Vec::new(),
                bg: style.background_color,
                deco: LineDecoration {
                    hr: true,
                    ..LineDecoration::default()
                },
            });
            y += HR_H + pad_bottom + border;
            pending_margin = margin_bottom.max(8.0);
            continue;
        }

        let deco = LineDecoration {
            hr: false,
            pre_bg: block.kind == BlockKind::Pre,
            quote_bar: block.kind == BlockKind::Blockquote,
            bg_image: style.background_image.clone(),
        };

        let mut flow = InlineFlow {
            x_start,
            content_w,
            align: if block.kind == BlockKind::Pre {
                TextAlign::Left
            } else {
                style.text_align
            },
            line_height_mult: style.line_height,
            base_scale: block.base_scale,
            bg: style.background_color,
            deco,
            spans: Vec::new(),
            widgets: Vec::new(),
            used: 0.0,
            max_scale: 0.0,
            widget_h: 0.0,
            pending_gap: false,
            y,
            out: &mut out,
        };

        if let BlockKind::ListItem { ordinal } = &block.kind {
            flow.add_marker(style.list_style_type, *ordinal, block.base_scale, style.color);
        }

        let preformatted = style.white_space.preserves_newlines()
            || block.kind == BlockKind::Pre;
        let wraps = style.white_space.wraps() && block.kind != BlockKind::Pre;

        for item in &block.items {
            match item {
                InlineItem::Text { text, style: span } => {
                    if preformatted {
                        flow.add_preformatted(text, span);
                    } else {
                        flow.add_text(text, span, wraps, block);
                    }
                }
                InlineItem::Widget { index } => {
                    let (w, h) = widget_size(&blueprints[*index]);
                    flow.add_widget(*index, w, h);
                }
                InlineItem::Break => flow.break_line(),
            }
        }
        flow.finish();
        y = flow.y;

        y += pad_bottom + border;
        pending_margin = margin_bottom;
    }

    out
}

/// Line packing state for one block.
struct InlineFlow<'a> {
    x_start: f32,
    content_w: f32,
    align: TextAlign,
    line_height_mult: f32,
    base_scale: f32,
    bg: Option<common::Color>,
    deco: LineDecoration,

    spans: Vec<RenderedSpan>,
    widgets: Vec<(usize, f32, f32, f32)>, // (index, rel_x, w, h)
    used: f32,
    max_scale: f32,
    widget_h: f32,
    pending_gap: bool,
    y: f32,
    out: &'a mut LayoutResult,
}

impl InlineFlow<'_> {
    fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.widgets.is_empty()
    }

    fn word_width(text: &str, style: &SpanStyle) -> f32 {
        let n = text.chars().count() as f32;
        if n == 0.0 {
            return 0.0;
        }
        n * CHAR_W * style.scale + style.letter_spacing * (n - 1.0)
    }

    fn line_height(&self) -> f32 {
        let scale = if self.max_scale > 0.0 {
            self.max_scale
        } else {
            self.base_scale
        };
        (LINE_BASE * self.line_height_mult * scale).max(self.widget_h)
    }

    /// Close the current line, applying text alignment.
    fn flush_line(&mut self, keep_empty: bool) {
        if self.is_empty() && !keep_empty {
            return;
        }
        let height = self.line_height();
        let shift = match self.align {
            TextAlign::Left | TextAlign::Justify => 0.0,
            TextAlign::Center => ((self.content_w - self.used) / 2.0).max(0.0),
            TextAlign::Right => (self.content_w - self.used).max(0.0),
        };

        let mut spans = std::mem::take(&mut self.spans);
        for span in &mut spans {
            span.x += self.x_start + shift;
        }
        for (index, rel_x, w, h) in self.widgets.drain(..) {
            self.out.widgets.push(PositionedWidget {
                widget_index: index,
                x: self.x_start + shift + rel_x,
                y: self.y,
                w,
                h,
            });
        }

        self.out.lines.push(RenderedLine {
            y: self.y,
            height,
            spans,
            bg: self.bg,
            deco: self.deco.clone(),
        });

        self.y += height;
        self.used = 0.0;
        self.max_scale = 0.0;
        self.widget_h = 0.0;
        self.pending_gap = false;
    }

    fn break_line(&mut self) {
        self.flush_line(true);
    }

    fn finish(&mut self) {
        self.flush_line(false);
    }

    /// The gap becomes a space character inside the previous span, so the
    /// concatenated line text reads naturally.
    fn materialize_gap(&mut self) {
        if !self.pending_gap {
            return;
        }
        self.pending_gap = false;
        if let Some(last) = self.spans.last_mut() {
            last.text.push(' ');
            self.used += CHAR_W * last.font_scale;
        }
    }

    fn push_run(&mut self, text: &str, style: &SpanStyle, width: f32) {
        let mergeable = self.spans.last().is_some_and(|s| {
            s.color == style.color
                && s.font_scale == style.scale
                && s.bold == style.bold
                && s.italic == style.italic
                && s.href == style.href
                && s.underline == style.underline
                && s.strike == style.strike
                && s.code_bg == style.code
                && s.mark == style.mark
        });
        if mergeable {
            if let Some(last) = self.spans.last_mut() {
                last.text.push_str(text);
            }
        } else {
            self.spans.push(RenderedSpan {
                x: self.used,
                text: text.to_string(),
                color: style.color,
                font_scale: style.scale,
                bold: style.bold,
                italic: style.italic,
                href: style.href.clone(),
                underline: style.underline,
                strike: style.strike,
                code_bg: style.code,
                mark: style.mark,
                search_hit: false,
            });
        }
        self.used += width;
        self.max_scale = self.max_scale.max(style.scale);
    }

    /// Word-wrapped text.
    fn add_text(&mut self, text: &str, style: &SpanStyle, wraps: bool, block: &Block) {
        if text.starts_with(char::is_whitespace) && !self.is_empty() {
            self.pending_gap = true;
        }

        for word in text.split_whitespace() {
            let w = Self::word_width(word, style);
            let gap = if self.pending_gap {
                CHAR_W * self.spans.last().map(|s| s.font_scale).unwrap_or(style.scale)
            } else {
                0.0
            };

            if wraps && !self.is_empty() && self.used + gap + w > self.content_w {
                self.flush_line(false);
            }

            if w > self.content_w
                && (block.style.word_break == WordBreak::BreakAll
                    || block.style.overflow_wrap == css::OverflowWrap::BreakWord)
            {
                self.add_broken_word(word, style);
                self.pending_gap = true;
                continue;
            }

            self.materialize_gap();
            self.push_run(word, style, w);
            self.pending_gap = true;
        }

        // Trailing whitespace separates this run from the next item;
        // no trailing space means the next run joins directly.
        if !text.ends_with(char::is_whitespace) {
            self.pending_gap = false;
        }
    }

    /// Break an over-long word at character boundaries.
    fn add_broken_word(&mut self, word: &str, style: &SpanStyle) {
        self.materialize_gap();
        let per_char = CHAR_W * style.scale;
        let mut rest: Vec<char> = word.chars().collect();
        while !rest.is_empty() {
            let room = self.content_w - self.used;
            let fit = ((room / per_char).floor() as usize).max(1).min(rest.len());
            let chunk: String = rest.drain(..fit).collect();
            let w = Self::word_width(&chunk, style);
            self.push_run(&chunk, style, w);
            if !rest.is_empty() {
                self.flush_line(false);
            }
        }
    }

    /// Preformatted text: newlines are hard breaks, spaces are kept.
    fn add_preformatted(&mut self, text: &str, style: &SpanStyle) {
        let mut first = true;
        for segment in text.split('\n') {
            if !first {
                self.flush_line(true);
            }
            first = false;
            if segment.is_empty() {
                continue;
            }
            let w = Self::word_width(segment, style);
            self.push_run(segment, style, w);
        }
    }

    fn add_widget(&mut self, index: usize, w: f32, h: f32) {
        let gap = if self.pending_gap {
            CHAR_W * self.spans.last().map(|s| s.font_scale).unwrap_or(1.0)
        } else {
            0.0
        };
        if !self.is_empty() && self.used + gap + w > self.content_w {
            self.flush_line(false);
        }
        self.materialize_gap();
        self.widgets.push((index, self.used, w, h));
        self.used += w;
        self.widget_h = self.widget_h.max(h);
        self.pending_gap = false;
    }

    /// Leading list marker span.
    fn add_marker(
        &mut self,
        list_type: ListStyleType,
        ordinal: Option<i64>,
        scale: f32,
        color: common::Color,
    ) {
        let text = match list_type {
            ListStyleType::Disc => "\u{2022} ".to_string(),
            ListStyleType::Circle => "\u{25E6} ".to_string(),
            ListStyleType::Square => "\u{25AA} ".to_string(),
            ListStyleType::Decimal => format!("{}. ", ordinal.unwrap_or(1)),
            ListStyleType::None => return,
        };
        let style = SpanStyle {
            color,
            scale,
            bold: false,
            italic: false,
            underline: false,
            strike: false,
            code: false,
            mark: false,
            letter_spacing: 0.0,
            href: None,
        };
        let w = Self::word_width(&text, &style);
        self.push_run(&text, &style, w);
        self.pending_gap = false;
    }
}

/// Convenience wrapper: full pipeline from parsed document to layout.
pub fn layout_document(
    doc: &html::Document,
    styles: &std::collections::HashMap<html::NodeId, style::ComputedStyle>,
    extract: &html::DocumentExtract,
    viewport_w: f32,
) -> LayoutResult {
    let blocks = crate::build::build_blocks(doc, styles, extract);
    layout_blocks(&blocks, &extract.widgets, viewport_w)
}
