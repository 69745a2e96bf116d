//! Computed style: the concrete value of every supported property.

use common::Color;
use css::{
    ContentPiece, CursorKind, Display, Length, ListStyleType, OverflowWrap, TextAlign, Visibility,
    WhiteSpace, WordBreak,
};

/// Fully resolved style for one element. Inheritable fields are copied
/// from the parent before the cascade runs; the rest start at their
/// initial values.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub color: Color,
    pub background_color: Option<Color>,
    pub background_image: Option<String>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub line_height: f32,
    pub letter_spacing: f32,
    pub text_align: TextAlign,
    pub underline: bool,
    pub strike: bool,
    pub white_space: WhiteSpace,
    pub word_break: WordBreak,
    pub overflow_wrap: OverflowWrap,
    pub list_style_type: ListStyleType,
    pub cursor: CursorKind,
    pub visibility: Visibility,

    pub width: Option<Length>,
    pub min_width: Option<Length>,
    pub max_width: Option<Length>,
    pub height: Option<Length>,
    /// top, right, bottom, left
    pub margin: [Option<Length>; 4],
    pub padding: [Option<Length>; 4],
    pub border_width: f32,
    pub border_color: Color,

    pub content_before: Option<Vec<ContentPiece>>,
    pub content_after: Option<Vec<ContentPiece>>,
    pub counter_reset: Vec<(String, i64)>,
    pub counter_increment: Vec<(String, i64)>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            color: Color::BLACK,
            background_color: None,
            background_image: None,
            font_size: 16.0,
            bold: false,
            italic: false,
            line_height: 1.25,
            letter_spacing: 0.0,
            text_align: TextAlign::Left,
            underline: false,
            strike: false,
            white_space: WhiteSpace::Normal,
            word_break: WordBreak::Normal,
            overflow_wrap: OverflowWrap::Normal,
            list_style_type: ListStyleType::Disc,
            cursor: CursorKind::Default,
            visibility: Visibility::Visible,
            width: None,
            min_width: None,
            max_width: None,
            height: None,
            margin: [None; 4],
            padding: [None; 4],
            border_width: 0.0,
            border_color: Color::BLACK,
            content_before: None,
            content_after: None,
            counter_reset: Vec::new(),
            counter_increment: Vec::new(),
        }
    }
}

impl ComputedStyle {
    /// Start a child's style: inheritable properties copied, the rest at
    /// their initial values.
    pub fn inherit_from(parent: &ComputedStyle) -> ComputedStyle {
        ComputedStyle {
            color: parent.color,
            font_size: parent.font_size,
            bold: parent.bold,
            italic: parent.italic,
            line_height: parent.line_height,
            letter_spacing: parent.letter_spacing,
            text_align: parent.text_align,
            white_space: parent.white_space,
            word_break: parent.word_break,
            overflow_wrap: parent.overflow_wrap,
            list_style_type: parent.list_style_type,
            cursor: parent.cursor,
            visibility: parent.visibility,
            ..ComputedStyle::default()
        }
    }

    /// Is this a block-level display value?
    pub fn is_block(&self) -> bool {
        matches!(self.display, Display::Block | Display::ListItem)
    }
}
