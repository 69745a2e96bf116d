//! Block-list construction.
//!
//! Walks the styled document and flattens it into a list of block-level
//! entries, each holding a run of inline items (styled text, widgets, hard
//! breaks). Pseudo-element content is resolved here, against the running
//! counter map, and injected as leading/trailing spans.

use std::collections::HashMap;

use css::Display;
use html::{Document, DocumentExtract, NodeId, NodeKind, WidgetKind};
use style::{ComputedStyle, CounterMap, content::resolve_content};

use crate::{font_scale, heading_scale};

/// Inline styling carried onto spans.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanStyle {
    pub color: common::Color,
    pub scale: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub code: bool,
    pub mark: bool,
    pub letter_spacing: f32,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineItem {
    Text { text: String, style: SpanStyle },
    Widget { index: usize },
    /// `<br>`
    Break,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    Pre,
    Blockquote,
    ListItem { ordinal: Option<i64> },
    Hr,
}

/// One block-level flow entry.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub node: NodeId,
    pub style: ComputedStyle,
    /// List/quote nesting depth, for indentation.
    pub depth: usize,
    /// Base font scale for the block (heading mapping applied).
    pub base_scale: f32,
    pub items: Vec<InlineItem>,
}

impl Block {
    pub fn has_content(&self) -> bool {
        self.kind == BlockKind::Hr
            || self.items.iter().any(|item| match item {
                InlineItem::Text { text, .. } => !text.trim().is_empty(),
                InlineItem::Widget { .. } => true,
                InlineItem::Break => false,
            })
    }
}

/// Flatten the document body into blocks.
pub fn build_blocks(
    doc: &Document,
    styles: &HashMap<NodeId, ComputedStyle>,
    extract: &DocumentExtract,
) -> Vec<Block> {
    let mut b = Builder {
        doc,
        styles,
        extract,
        counters: CounterMap::new(),
        blocks: Vec::new(),
        current: None,
        ordinals: Vec::new(),
    };
    let root = Template {
        kind: BlockKind::Paragraph,
        node: doc.body,
        style: ComputedStyle::default(),
        depth: 0,
        base_scale: 1.0,
    };
    let ctx = span_style(&root.style, &root, None);
    b.walk_children(doc.body, &root, &ctx);
    b.flush();
    b.blocks
}

/// The block to (re)open whenever inline content appears.
#[derive(Clone)]
struct Template {
    kind: BlockKind,
    node: NodeId,
    style: ComputedStyle,
    depth: usize,
    base_scale: f32,
}

struct Builder<'a> {
    doc: &'a Document,
    styles: &'a HashMap<NodeId, ComputedStyle>,
    extract: &'a DocumentExtract,
    counters: CounterMap,
    blocks: Vec<Block>,
    current: Option<Block>,
    /// One frame per open list: `Some(next ordinal)` for ordered lists.
    ordinals: Vec<Option<i64>>,
}

impl Builder<'_> {
    fn style_of(&self, node: NodeId) -> ComputedStyle {
        self.styles.get(&node).cloned().unwrap_or_default()
    }

    fn flush(&mut self) {
        if let Some(block) = self.current.take() {
            if block.has_content() {
                self.blocks.push(block);
            }
        }
    }

    fn ensure_current(&mut self, template: &Template) {
        if self.current.is_none() {
            self.current = Some(Block {
                kind: template.kind.clone(),
                node: template.node,
                style: template.style.clone(),
                depth: template.depth,
                base_scale: template.base_scale,
                items: Vec::new(),
            });
        }
    }

    fn push_text(&mut self, template: &Template, text: &str, style: &SpanStyle) {
        if text.is_empty() {
            return;
        }
        self.ensure_current(template);
        if let Some(cur) = self.current.as_mut() {
            cur.items.push(InlineItem::Text {
                text: text.to_string(),
                style: style.clone(),
            });
        }
    }

    fn walk_children(&mut self, node: NodeId, template: &Template, inline: &SpanStyle) {
        for &child in &self.doc.get(node).children {
            match &self.doc.get(child).kind {
                NodeKind::Text(text) => {
                    if !text.trim().is_empty() || matches!(template.kind, BlockKind::Pre) {
                        self.push_text(template, text, inline);
                    } else if !text.is_empty() && self.current.is_some() {
                        // Whitespace between inline content keeps words
                        // apart.
                        self.push_text(template, " ", inline);
                    }
                }
                NodeKind::Comment(_) | NodeKind::Fragment => {}
                NodeKind::Element(el) => {
                    let tag = el.tag.clone();
                    self.element(child, &tag, template, inline);
                }
            }
        }
    }

    fn element(&mut self, node: NodeId, tag: &str, template: &Template, inline: &SpanStyle) {
        let style = self.style_of(node);
        if style.display == Display::None {
            return;
        }
        self.counters
            .apply(&style.counter_reset, &style.counter_increment);

        match tag {
            "BR" => {
                self.ensure_current(template);
                if let Some(cur) = self.current.as_mut() {
                    cur.items.push(InlineItem::Break);
                }
                return;
            }
            "HR" => {
                self.flush();
                self.blocks.push(Block {
                    kind: BlockKind::Hr,
                    node,
                    style,
                    depth: template.depth,
                    base_scale: 1.0,
                    items: Vec::new(),
                });
                return;
            }
            "IMG" => {
                // Decode is a collaborator concern; the flow shows the
                // alternative text placeholder.
                let alt = self
                    .doc
                    .element(node)
                    .and_then(|e| e.attrs.get("alt"))
                    .unwrap_or("[image]")
                    .to_string();
                let mut s = inline.clone();
                s.italic = true;
                self.push_text(template, &alt, &s);
                return;
            }
            "INPUT" | "TEXTAREA" | "SELECT" | "BUTTON" => {
                if let Some(index) = self.extract.widget_for(node) {
                    if self.extract.widgets[index].kind != WidgetKind::Hidden {
                        self.ensure_current(template);
                        if let Some(cur) = self.current.as_mut() {
                            cur.items.push(InlineItem::Widget { index });
                        }
                    }
                }
                return;
            }
            "UL" | "OL" => {
                self.flush();
                let start = self
                    .doc
                    .element(node)
                    .and_then(|e| e.attrs.get("start"))
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1);
                self.ordinals
                    .push(if tag == "OL" { Some(start) } else { None });
                let nested = Template {
                    depth: template.depth + 1,
                    ..template.clone()
                };
                self.walk_children(node, &nested, inline);
                self.ordinals.pop();
                self.flush();
                return;
            }
            _ => {}
        }

        if style.is_block() {
            self.flush();

            let ordinal = if style.display == Display::ListItem {
                match self.ordinals.last_mut() {
                    Some(Some(n)) => {
                        let v = *n;
                        *n += 1;
                        Some(v)
                    }
                    _ => None,
                }
            } else {
                None
            };

            let kind = match tag {
                "H1" => BlockKind::Heading(1),
                "H2" => BlockKind::Heading(2),
                "H3" => BlockKind::Heading(3),
                "H4" => BlockKind::Heading(4),
                "H5" => BlockKind::Heading(5),
                "H6" => BlockKind::Heading(6),
                "PRE" => BlockKind::Pre,
                "BLOCKQUOTE" => BlockKind::Blockquote,
                _ if style.display == Display::ListItem => BlockKind::ListItem { ordinal },
                _ => BlockKind::Paragraph,
            };

            let base_scale = match &kind {
                BlockKind::Heading(level) if font_scale(style.font_size) == 1.0 => {
                    heading_scale(*level)
                }
                _ => font_scale(style.font_size),
            };

            let depth = template.depth
                + usize::from(matches!(kind, BlockKind::Blockquote));
            let nested = Template {
                kind,
                node,
                style: style.clone(),
                depth,
                base_scale,
            };
            let ctx = span_style(&style, &nested, inline.href.clone());

            if let Some(before) = &style.content_before {
                let text = self.resolve(before, node);
                self.push_text(&nested, &text, &ctx);
            }
            self.walk_children(node, &nested, &ctx);
            if let Some(after) = &style.content_after {
                let text = self.resolve(after, node);
                self.push_text(&nested, &text, &ctx);
            }
            self.flush();
        } else {
            // Inline element: style its subtree, keep flowing into the
            // current block.
            let href = self
                .doc
                .element(node)
                .filter(|e| e.tag == "A")
                .and_then(|e| e.attrs.get("href"))
                .map(str::to_string)
                .or_else(|| inline.href.clone());
            let mut ctx = span_style(&style, template, href);
            ctx.underline |= inline.underline;
            ctx.strike |= inline.strike;
            ctx.code = inline.code || matches!(tag, "CODE" | "KBD" | "SAMP" | "TT");
            ctx.mark = inline.mark || tag == "MARK";

            if let Some(before) = &style.content_before {
                let text = self.resolve(before, node);
                self.push_text(template, &text, &ctx);
            }
            self.walk_children(node, template, &ctx);
            if let Some(after) = &style.content_after {
                let text = self.resolve(after, node);
                self.push_text(template, &text, &ctx);
            }
        }
    }

    fn resolve(&mut self, pieces: &[css::ContentPiece], node: NodeId) -> String {
        match self.doc.element(node) {
            Some(el) => resolve_content(pieces, el, &mut self.counters),
            None => String::new(),
        }
    }
}

/// Span styling from a computed style within a block.
fn span_style(style: &ComputedStyle, template: &Template, href: Option<String>) -> SpanStyle {
    let scale = if (style.font_size - template.style.font_size).abs() < 0.01 {
        template.base_scale
    } else {
        font_scale(style.font_size)
    };
    SpanStyle {
        color: style.color,
        scale,
        bold: style.bold,
        italic: style.italic,
        underline: style.underline,
        strike: style.strike,
        code: false,
        mark: false,
        letter_spacing: style.letter_spacing,
        href,
    }
}
