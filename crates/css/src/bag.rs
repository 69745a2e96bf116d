//! Typed declaration bag.
//!
//! One flat struct with an `Option` per supported property, an extension
//! map for `--custom` properties, and a recorded list of CSS-wide keyword
//! declarations (`inherit` / `initial` / `unset` / `revert`) that the
//! cascade applies in a post-pass.

use std::collections::HashMap;

use common::Color;

use crate::selector::CursorKind;
use crate::value::{parse_color, parse_length, parse_length_px};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    ListItem,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Percent(f32),
    Auto,
}

impl Length {
    /// Resolve against a container length; `Auto` yields `None`.
    pub fn resolve(self, container: f32) -> Option<f32> {
        match self {
            Length::Px(v) => Some(v),
            Length::Percent(p) => Some(container * p / 100.0),
            Length::Auto => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSizeValue {
    Px(f32),
    /// Relative to the parent's computed size.
    Percent(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecorationLine {
    None,
    Underline,
    LineThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteSpace {
    #[default]
    Normal,
    Nowrap,
    Pre,
    PreWrap,
    PreLine,
}

impl WhiteSpace {
    /// The `pre` family disables wrapping and preserves newlines.
    pub fn preserves_newlines(self) -> bool {
        matches!(self, WhiteSpace::Pre | WhiteSpace::PreWrap | WhiteSpace::PreLine)
    }

    pub fn wraps(self) -> bool {
        matches!(self, WhiteSpace::Normal | WhiteSpace::PreWrap | WhiteSpace::PreLine)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordBreak {
    #[default]
    Normal,
    BreakAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowWrap {
    #[default]
    Normal,
    BreakWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStyleType {
    #[default]
    Disc,
    Circle,
    Square,
    Decimal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// CSS-wide keywords, applied after the cascade proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKeyword {
    Inherit,
    Initial,
    Unset,
    Revert,
}

impl GlobalKeyword {
    fn parse(s: &str) -> Option<GlobalKeyword> {
        match s {
            "inherit" => Some(GlobalKeyword::Inherit),
            "initial" => Some(GlobalKeyword::Initial),
            "unset" => Some(GlobalKeyword::Unset),
            "revert" => Some(GlobalKeyword::Revert),
            _ => None,
        }
    }
}

/// A piece of a `content:` value for `::before` / `::after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPiece {
    Literal(String),
    Attr(String),
    Counter(String),
    OpenQuote,
    CloseQuote,
}

/// The typed declaration bag. `None` means "not declared here".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBag {
    pub display: Option<Display>,
    pub color: Option<Color>,
    pub background_color: Option<Color>,
    /// `url(...)` target, or `Some(None)`-like sentinel via empty string
    /// is avoided: `none` clears the field at merge time.
    pub background_image: Option<Option<String>>,
    pub font_size: Option<FontSizeValue>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Multiplier over the font's natural line height.
    pub line_height: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub text_align: Option<TextAlign>,
    pub text_decoration: Option<TextDecorationLine>,
    pub white_space: Option<WhiteSpace>,
    pub word_break: Option<WordBreak>,
    pub overflow_wrap: Option<OverflowWrap>,
    pub list_style_type: Option<ListStyleType>,
    pub cursor: Option<CursorKind>,
    pub visibility: Option<Visibility>,

    pub width: Option<Length>,
    pub min_width: Option<Length>,
    pub max_width: Option<Length>,
    pub height: Option<Length>,
    pub margin: [Option<Length>; 4],  // top right bottom left
    pub padding: [Option<Length>; 4], // top right bottom left
    pub border_width: Option<f32>,
    pub border_color: Option<Color>,

    pub content: Option<Vec<ContentPiece>>,
    pub counter_reset: Option<Vec<(String, i64)>>,
    pub counter_increment: Option<Vec<(String, i64)>>,

    /// `--custom` properties declared in this block.
    pub vars: HashMap<String, String>,
    /// `(property, keyword)` pairs for the post-cascade pass.
    pub globals: Vec<(String, GlobalKeyword)>,
}

pub const EDGE_TOP: usize = 0;
pub const EDGE_RIGHT: usize = 1;
pub const EDGE_BOTTOM: usize = 2;
pub const EDGE_LEFT: usize = 3;

impl StyleBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `other` onto `self`: declared fields win.
    pub fn merge(&mut self, other: &StyleBag) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field.clone(); })*
            };
        }
        take!(
            display, color, background_color, background_image, font_size, bold, italic,
            line_height, letter_spacing, text_align, text_decoration, white_space, word_break,
            overflow_wrap, list_style_type, cursor, visibility, width, min_width, max_width,
            height, border_width, border_color, content, counter_reset, counter_increment
        );
        for i in 0..4 {
            if other.margin[i].is_some() {
                self.margin[i] = other.margin[i];
            }
            if other.padding[i].is_some() {
                self.padding[i] = other.padding[i];
            }
        }
        for (k, v) in &other.vars {
            self.vars.insert(k.clone(), v.clone());
        }
        self.globals.extend(other.globals.iter().cloned());
    }

    /// Apply one `name: value` declaration. Unknown properties and
    /// malformed values are ignored.
    pub fn apply(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            return;
        }

        if let Some(custom) = name.strip_prefix("--") {
            self.vars.insert(custom.to_string(), value.to_string());
            return;
        }

        let lower = value.to_ascii_lowercase();
        if let Some(kw) = GlobalKeyword::parse(&lower) {
            self.globals.push((name, kw));
            return;
        }

        match name.as_str() {
            "color" => self.color = parse_color(value),
            "background-color" => self.background_color = parse_color(value),
            "background" => {
                // Color and/or image out of the shorthand; other parts are
                // out of scope.
                if let Some(url) = extract_url(value) {
                    self.background_image = Some(Some(url));
                }
                for part in value.split_whitespace() {
                    if let Some(c) = parse_color(part) {
                        self.background_color = Some(c);
                        break;
                    }
                }
            }
            "background-image" => {
                if lower == "none" {
                    self.background_image = Some(None);
                } else if let Some(url) = extract_url(value) {
                    self.background_image = Some(Some(url));
                }
            }
            "display" => {
                self.display = match lower.as_str() {
                    "block" | "flow-root" => Some(Display::Block),
                    "inline" => Some(Display::Inline),
                    "inline-block" => Some(Display::InlineBlock),
                    "list-item" => Some(Display::ListItem),
                    "none" => Some(Display::None),
                    _ => self.display,
                }
            }
            "font-size" => {
                self.font_size = if let Some(p) = lower.strip_suffix('%') {
                    p.parse().ok().map(FontSizeValue::Percent)
                } else {
                    match lower.as_str() {
                        "xx-small" => Some(FontSizeValue::Px(9.0)),
                        "x-small" => Some(FontSizeValue::Px(10.0)),
                        "small" => Some(FontSizeValue::Px(13.0)),
                        "medium" => Some(FontSizeValue::Px(16.0)),
                        "large" => Some(FontSizeValue::Px(18.0)),
                        "x-large" => Some(FontSizeValue::Px(24.0)),
                        "xx-large" => Some(FontSizeValue::Px(32.0)),
                        "smaller" => Some(FontSizeValue::Percent(83.3)),
                        "larger" => Some(FontSizeValue::Percent(120.0)),
                        _ => parse_length_px(value).map(FontSizeValue::Px),
                    }
                };
            }
            "font-weight" => {
                self.bold = match lower.as_str() {
                    "bold" | "bolder" => Some(true),
                    "normal" | "lighter" => Some(false),
                    n => n.parse::<f32>().ok().map(|w| w >= 600.0),
                }
            }
            "font-style" => {
                self.italic = match lower.as_str() {
                    "italic" | "oblique" => Some(true),
                    "normal" => Some(false),
                    _ => self.italic,
                }
            }
            "line-height" => {
                self.line_height = if lower == "normal" {
                    Some(1.0)
                } else if let Ok(mult) = lower.parse::<f32>() {
                    Some(mult)
                } else {
                    // A pixel value becomes a multiplier over the em base.
                    parse_length_px(value).map(|px| px / crate::value::EM_BASE)
                }
            }
            "letter-spacing" => {
                self.letter_spacing = if lower == "normal" {
                    Some(0.0)
                } else {
                    parse_length_px(value)
                }
            }
            "text-align" => {
                self.text_align = match lower.as_str() {
                    "left" | "start" => Some(TextAlign::Left),
                    "right" | "end" => Some(TextAlign::Right),
                    "center" => Some(TextAlign::Center),
                    "justify" => Some(TextAlign::Justify),
                    _ => self.text_align,
                }
            }
            "text-decoration" | "text-decoration-line" => {
                self.text_decoration = if lower.contains("underline") {
                    Some(TextDecorationLine::Underline)
                } else if lower.contains("line-through") {
                    Some(TextDecorationLine::LineThrough)
                } else if lower.contains("none") {
                    Some(TextDecorationLine::None)
                } else {
                    self.text_decoration
                }
            }
            "white-space" => {
                self.white_space = match lower.as_str() {
                    "normal" => Some(WhiteSpace::Normal),
                    "nowrap" => Some(WhiteSpace::Nowrap),
                    "pre" => Some(WhiteSpace::Pre),
                    "pre-wrap" => Some(WhiteSpace::PreWrap),
                    "pre-line" => Some(WhiteSpace::PreLine),
                    _ => self.white_space,
                }
            }
            "word-break" => {
                self.word_break = match lower.as_str() {
                    "break-all" => Some(WordBreak::BreakAll),
                    "normal" => Some(WordBreak::Normal),
                    _ => self.word_break,
                }
            }
            "overflow-wrap" | "word-wrap" => {
                self.overflow_wrap = match lower.as_str() {
                    "break-word" | "anywhere" => Some(OverflowWrap::BreakWord),
                    "normal" => Some(OverflowWrap::Normal),
                    _ => self.overflow_wrap,
                }
            }
            "list-style-type" | "list-style" => {
                self.list_style_type = match lower.as_str() {
                    "disc" => Some(ListStyleType::Disc),
                    "circle" => Some(ListStyleType::Circle),
                    "square" => Some(ListStyleType::Square),
                    "decimal" => Some(ListStyleType::Decimal),
                    "none" => Some(ListStyleType::None),
                    _ => self.list_style_type,
                }
            }
            "cursor" => {
                self.cursor = match lower.as_str() {
                    "pointer" => Some(CursorKind::Pointer),
                    "text" => Some(CursorKind::Text),
                    "wait" | "progress" => Some(CursorKind::Wait),
                    "default" | "auto" => Some(CursorKind::Default),
                    _ => self.cursor,
                }
            }
            "visibility" => {
                self.visibility = match lower.as_str() {
                    "hidden" | "collapse" => Some(Visibility::Hidden),
                    "visible" => Some(Visibility::Visible),
                    _ => self.visibility,
                }
            }
            "width" => self.width = parse_length(value),
            "min-width" => self.min_width = parse_length(value),
            "max-width" => {
                self.max_width = if lower == "none" {
                    None
                } else {
                    parse_length(value)
                }
            }
            "height" => self.height = parse_length(value),
            "margin" => apply_edges(&mut self.margin, value),
            "margin-top" => self.margin[EDGE_TOP] = parse_length(value),
            "margin-right" => self.margin[EDGE_RIGHT] = parse_length(value),
            "margin-bottom" => self.margin[EDGE_BOTTOM] = parse_length(value),
            "margin-left" => self.margin[EDGE_LEFT] = parse_length(value),
            "padding" => apply_edges(&mut self.padding, value),
            "padding-top" => self.padding[EDGE_TOP] = parse_length(value),
            "padding-right" => self.padding[EDGE_RIGHT] = parse_length(value),
            "padding-bottom" => self.padding[EDGE_BOTTOM] = parse_length(value),
            "padding-left" => self.padding[EDGE_LEFT] = parse_length(value),
            "border-width" => self.border_width = parse_length_px(value),
            "border-color" => self.border_color = parse_color(value),
            "border" => {
                if lower == "none" || lower == "0" {
                    self.border_width = Some(0.0);
                    return;
                }
                for part in value.split_whitespace() {
                    if let Some(px) = parse_length_px(part) {
                        self.border_width = Some(px);
                    } else if let Some(c) = parse_color(part) {
                        self.border_color = Some(c);
                    }
                    // style keywords (solid, dashed, …) are accepted and
                    // ignored
                }
                if self.border_width.is_none() {
                    self.border_width = Some(1.0);
                }
            }
            "content" => self.content = parse_content(value),
            "counter-reset" => self.counter_reset = parse_counters(value, 0),
            "counter-increment" => self.counter_increment = parse_counters(value, 1),
            _ => {}
        }
    }
}

/// 1–4 value edge shorthand, CSS order.
fn apply_edges(edges: &mut [Option<Length>; 4], value: &str) {
    let parts: Vec<Option<Length>> = value.split_whitespace().map(parse_length).collect();
    let get = |i: usize| parts.get(i).copied().flatten();
    match parts.len() {
        1 => *edges = [get(0); 4],
        2 => *edges = [get(0), get(1), get(0), get(1)],
        3 => *edges = [get(0), get(1), get(2), get(1)],
        4 => *edges = [get(0), get(1), get(2), get(3)],
        _ => {}
    }
}

/// Pull the target out of `url(...)`, stripping optional quotes.
fn extract_url(value: &str) -> Option<String> {
    let start = value.to_ascii_lowercase().find("url(")?;
    let rest = &value[start + 4..];
    let end = rest.find(')')?;
    let inner = rest[..end].trim();
    let inner = inner
        .strip_prefix(['"', '\''])
        .and_then(|v| v.strip_suffix(['"', '\'']))
        .unwrap_or(inner);
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

/// `content:` values: quoted literals, `attr()`, `counter()` and quote
/// keywords, space-separated.
fn parse_content(value: &str) -> Option<Vec<ContentPiece>> {
    let lower = value.trim().to_ascii_lowercase();
    if lower == "none" || lower == "normal" {
        return Some(Vec::new());
    }

    let mut pieces = Vec::new();
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '"' || c == '\'' {
            let mut lit = String::new();
            i += 1;
            while i < chars.len() && chars[i] != c {
                lit.push(chars[i]);
                i += 1;
            }
            i += 1; // closing quote
            pieces.push(ContentPiece::Literal(lit));
        } else {
            let mut word = String::new();
            while i < chars.len() && !chars[i].is_whitespace() {
                word.push(chars[i]);
                i += 1;
            }
            let lower = word.to_ascii_lowercase();
            if lower == "open-quote" {
                pieces.push(ContentPiece::OpenQuote);
            } else if lower == "close-quote" {
                pieces.push(ContentPiece::CloseQuote);
            } else if let Some(arg) = func_arg(&word, "attr") {
                pieces.push(ContentPiece::Attr(arg.to_ascii_lowercase()));
            } else if let Some(arg) = func_arg(&word, "counter") {
                pieces.push(ContentPiece::Counter(arg));
            }
            // anything else is dropped
        }
    }
    Some(pieces)
}

fn func_arg(word: &str, func: &str) -> Option<String> {
    let lower = word.to_ascii_lowercase();
    if lower.starts_with(func) && lower.as_bytes().get(func.len()) == Some(&b'(') {
        let inner = &word[func.len() + 1..];
        let inner = inner.strip_suffix(')').unwrap_or(inner);
        Some(inner.trim().to_string())
    } else {
        None
    }
}

/// `counter-reset` / `counter-increment` lists: `name [int]` pairs.
fn parse_counters(value: &str, default: i64) -> Option<Vec<(String, i64)>> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Some(Vec::new());
    }
    let mut out = Vec::new();
    let mut parts = value.split_whitespace().peekable();
    while let Some(name) = parts.next() {
        let n = match parts.peek().and_then(|p| p.parse::<i64>().ok()) {
            Some(n) => {
                parts.next();
                n
            }
            None => default,
        };
        out.push((name.to_string(), n));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(decls: &[(&str, &str)]) -> StyleBag {
        let mut b = StyleBag::new();
        for (n, v) in decls {
            b.apply(n, v);
        }
        b
    }

    #[test]
    fn color_properties() {
        let b = bag(&[("color", "red"), ("background-color", "#001122")]);
        assert_eq!(b.color, Some(Color::RED));
        assert_eq!(b.background_color, Some(Color::rgb(0, 0x11, 0x22)));
    }

    #[test]
    fn display_values() {
        assert_eq!(bag(&[("display", "none")]).display, Some(Display::None));
        assert_eq!(
            bag(&[("display", "list-item")]).display,
            Some(Display::ListItem)
        );
    }

    #[test]
    fn font_size_forms() {
        assert_eq!(
            bag(&[("font-size", "12px")]).font_size,
            Some(FontSizeValue::Px(12.0))
        );
        assert_eq!(
            bag(&[("font-size", "120%")]).font_size,
            Some(FontSizeValue::Percent(120.0))
        );
        assert_eq!(
            bag(&[("font-size", "2em")]).font_size,
            Some(FontSizeValue::Px(32.0))
        );
    }

    #[test]
    fn font_weight_numeric() {
        assert_eq!(bag(&[("font-weight", "700")]).bold, Some(true));
        assert_eq!(bag(&[("font-weight", "400")]).bold, Some(false));
        assert_eq!(bag(&[("font-weight", "bold")]).bold, Some(true));
    }

    #[test]
    fn margin_shorthand_expansion() {
        let b = bag(&[("margin", "1px 2px 3px 4px")]);
        assert_eq!(b.margin[EDGE_TOP], Some(Length::Px(1.0)));
        assert_eq!(b.margin[EDGE_RIGHT], Some(Length::Px(2.0)));
        assert_eq!(b.margin[EDGE_BOTTOM], Some(Length::Px(3.0)));
        assert_eq!(b.margin[EDGE_LEFT], Some(Length::Px(4.0)));

        let b = bag(&[("margin", "8px")]);
        assert_eq!(b.margin, [Some(Length::Px(8.0)); 4]);

        let b = bag(&[("margin", "1px 2px")]);
        assert_eq!(b.margin[EDGE_TOP], Some(Length::Px(1.0)));
        assert_eq!(b.margin[EDGE_LEFT], Some(Length::Px(2.0)));
    }

    #[test]
    fn padding_longhand() {
        let b = bag(&[("padding-left", "1em")]);
        assert_eq!(b.padding[EDGE_LEFT], Some(Length::Px(16.0)));
        assert_eq!(b.padding[EDGE_TOP], None);
    }

    #[test]
    fn border_shorthand() {
        let b = bag(&[("border", "2px solid green")]);
        assert_eq!(b.border_width, Some(2.0));
        assert_eq!(b.border_color, Some(Color::GREEN));

        let b = bag(&[("border", "solid red")]);
        assert_eq!(b.border_width, Some(1.0));
    }

    #[test]
    fn background_shorthand_url() {
        let b = bag(&[("background", "url('/bg.png') red")]);
        assert_eq!(b.background_image, Some(Some("/bg.png".into())));
        assert_eq!(b.background_color, Some(Color::RED));

        let b = bag(&[("background-image", "none")]);
        assert_eq!(b.background_image, Some(None));
    }

    #[test]
    fn custom_properties_recorded() {
        let b = bag(&[("--brand", "#aabbcc"), ("color", "var(--brand)")]);
        assert_eq!(b.vars.get("brand").map(String::as_str), Some("#aabbcc"));
    }

    #[test]
    fn global_keywords_recorded_not_applied() {
        let b = bag(&[("color", "inherit"), ("display", "initial")]);
        assert_eq!(b.color, None);
        assert_eq!(b.display, None);
        assert_eq!(
            b.globals,
            vec![
                ("color".to_string(), GlobalKeyword::Inherit),
                ("display".to_string(), GlobalKeyword::Initial),
            ]
        );
    }

    #[test]
    fn content_pieces() {
        let b = bag(&[("content", "\"[\" attr(href) counter(item) open-quote close-quote")]);
        assert_eq!(
            b.content.as_ref().unwrap(),
            &vec![
                ContentPiece::Literal("[".into()),
                ContentPiece::Attr("href".into()),
                ContentPiece::Counter("item".into()),
                ContentPiece::OpenQuote,
                ContentPiece::CloseQuote,
            ]
        );
        assert_eq!(bag(&[("content", "none")]).content, Some(vec![]));
    }

    #[test]
    fn counters() {
        let b = bag(&[("counter-reset", "item 5 other"), ("counter-increment", "item")]);
        assert_eq!(
            b.counter_reset,
            Some(vec![("item".into(), 5), ("other".into(), 0)])
        );
        assert_eq!(b.counter_increment, Some(vec![("item".into(), 1)]));
    }

    #[test]
    fn merge_overlays_declared_fields() {
        let mut base = bag(&[("color", "red"), ("font-size", "10px")]);
        let over = bag(&[("color", "blue"), ("margin-left", "4px")]);
        base.merge(&over);
        assert_eq!(base.color, Some(Color::BLUE));
        assert_eq!(base.font_size, Some(FontSizeValue::Px(10.0)));
        assert_eq!(base.margin[EDGE_LEFT], Some(Length::Px(4.0)));
    }

    #[test]
    fn unknown_properties_ignored() {
        let b = bag(&[("grid-template-areas", "\"a b\""), ("colour", "red")]);
        assert_eq!(b, StyleBag::new());
    }

    #[test]
    fn length_resolution() {
        assert_eq!(Length::Px(5.0).resolve(100.0), Some(5.0));
        assert_eq!(Length::Percent(50.0).resolve(200.0), Some(100.0));
        assert_eq!(Length::Auto.resolve(100.0), None);
    }
}
