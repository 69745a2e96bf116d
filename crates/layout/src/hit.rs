//! Hit testing.
//!
//! Lines are emitted top to bottom, so the line under a point is found by
//! binary search on `y`; the span (or widget) is then scanned within it.

use crate::{LayoutResult, PositionedWidget, RenderedSpan};

/// The line whose vertical extent contains `y`, if any.
fn line_at(result: &LayoutResult, y: f32) -> Option<usize> {
    let lines = &result.lines;
    if lines.is_empty() {
        return None;
    }
    // Last line whose top is at or above y.
    let idx = lines.partition_point(|l| l.y <= y);
    if idx == 0 {
        return None;
    }
    let candidate = idx - 1;
    (y < lines[candidate].bottom()).then_some(candidate)
}

/// The span under `(x, y)` in document coordinates. At most one span is
/// returned; its bounding box contains the point.
pub fn hit_test_span(result: &LayoutResult, x: f32, y: f32) -> Option<(usize, usize)> {
    let line_idx = line_at(result, y)?;
    let line = &result.lines[line_idx];
    let span_idx = line
        .spans
        .iter()
        .position(|s| x >= s.x && x < s.x + s.width())?;
    Some((line_idx, span_idx))
}

/// The widget box under `(x, y)`, if any.
pub fn hit_test_widget(result: &LayoutResult, x: f32, y: f32) -> Option<usize> {
    result.widgets.iter().position(|w| w.contains(x, y))
}

/// The href under a point, walking up from the hit span.
pub fn link_at(result: &LayoutResult, x: f32, y: f32) -> Option<&str> {
    let (line, span) = hit_test_span(result, x, y)?;
    result.lines[line].spans[span].href.as_deref()
}

/// Bounding box of a span, for highlighting.
pub fn span_rect(result: &LayoutResult, line: usize, span: usize) -> (f32, f32, f32, f32) {
    let l = &result.lines[line];
    let s: &RenderedSpan = &l.spans[span];
    (s.x, l.y, s.width(), l.height)
}

/// Widget geometry accessor used by focus drawing.
pub fn widget_rect(w: &PositionedWidget) -> (f32, f32, f32, f32) {
    (w.x, w.y, w.w, w.h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineDecoration, RenderedLine};
    use common::Color;

    fn span(x: f32, text: &str, href: Option<&str>) -> RenderedSpan {
        RenderedSpan {
            x,
            text: text.into(),
            color: Color::BLACK,
            font_scale: 1.0,
            bold: false,
            italic: false,
            href: href.map(String::from),
            underline: false,
            strike: false,
            code_bg: false,
            mark: false,
            search_hit: false,
        }
    }

    fn fixture() -> LayoutResult {
        LayoutResult {
            lines: vec![
                RenderedLine {
                    y: 0.0,
                    height: 20.0,
                    spans: vec![span(8.0, "hello", None), span(56.0, "link", Some("/x"))],
                    bg: None,
                    deco: LineDecoration::default(),
                },
                RenderedLine {
                    y: 20.0,
                    height: 20.0,
                    spans: vec![span(8.0, "below", None)],
                    bg: None,
                    deco: LineDecoration::default(),
                },
            ],
            widgets: vec![PositionedWidget {
                widget_index: 0,
                x: 100.0,
                y: 20.0,
                w: 80.0,
                h: 22.0,
            }],
        }
    }

    #[test]
    fn hits_correct_line_and_span() {
        let r = fixture();
        assert_eq!(hit_test_span(&r, 10.0, 5.0), Some((0, 0)));
        assert_eq!(hit_test_span(&r, 60.0, 19.0), Some((0, 1)));
        assert_eq!(hit_test_span(&r, 10.0, 25.0), Some((1, 0)));
    }

    #[test]
    fn at_most_one_span() {
        let r = fixture();
        // Between spans: x=48..56 belongs to "hello" (5 chars * 8 = 40,
        // ends at 48), so 50 hits nothing.
        assert_eq!(hit_test_span(&r, 50.0, 5.0), None);
    }

    #[test]
    fn hit_box_contains_point() {
        let r = fixture();
        let (line, sp) = hit_test_span(&r, 60.0, 10.0).unwrap();
        let (x, y, w, h) = span_rect(&r, line, sp);
        assert!(60.0 >= x && 60.0 < x + w);
        assert!(10.0 >= y && 10.0 < y + h);
    }

    #[test]
    fn misses_outside_content() {
        let r = fixture();
        assert_eq!(hit_test_span(&r, 10.0, -5.0), None);
        assert_eq!(hit_test_span(&r, 10.0, 100.0), None);
        assert_eq!(hit_test_span(&r, 500.0, 5.0), None);
    }

    #[test]
    fn link_lookup() {
        let r = fixture();
        assert_eq!(link_at(&r, 60.0, 5.0), Some("/x"));
        assert_eq!(link_at(&r, 10.0, 5.0), None);
    }

    #[test]
    fn widget_hit() {
        let r = fixture();
        assert_eq!(hit_test_widget(&r, 120.0, 30.0), Some(0));
        assert_eq!(hit_test_widget(&r, 90.0, 30.0), None);
    }

    #[test]
    fn empty_layout_misses() {
        let r = LayoutResult::default();
        assert_eq!(hit_test_span(&r, 0.0, 0.0), None);
        assert_eq!(hit_test_widget(&r, 0.0, 0.0), None);
    }
}
