//! Paint pass.
//!
//! Walks the layout output and issues canvas calls, offset by the scroll
//! position and culled to the viewport. Paint never mutates layout input;
//! it sees a consistent snapshot.

use common::Color;
use html::WidgetKind;
use layout::{CHAR_W, PAGE_PADDING, QUOTE_BAR_W, RenderedLine};

use crate::find::FindState;
use crate::host::Canvas;
use crate::tab::Tab;

const PRE_BG: Color = Color::rgb(0xf2, 0xf2, 0xf2);
const QUOTE_BG: Color = Color::rgb(0xf7, 0xf7, 0xf7);
const QUOTE_BAR: Color = Color::rgb(0xc0, 0xc0, 0xc0);
const CODE_BG: Color = Color::rgb(0xee, 0xee, 0xee);
const MARK_BG: Color = Color::rgb(0xff, 0xff, 0x00);
const HIT_BG: Color = Color::rgb(0xff, 0xe0, 0x80);
const CURRENT_HIT_BG: Color = Color::rgb(0xff, 0xa5, 0x00);
const WIDGET_BORDER: Color = Color::rgb(0x80, 0x80, 0x80);
const FOCUS_BORDER: Color = Color::rgb(0x33, 0x66, 0xcc);
const HR_COLOR: Color = Color::rgb(0xa0, 0xa0, 0xa0);
const STATUS_BG: Color = Color::rgb(0xe8, 0xe8, 0xe8);
const STATUS_H: f32 = 18.0;

/// Paint the active tab into `canvas`.
pub fn paint_tab(tab: &Tab, canvas: &mut dyn Canvas, viewport_w: f32, viewport_h: f32) {
    canvas.fill_rect(0.0, 0.0, viewport_w, viewport_h, Color::WHITE);

    let scroll = tab.scroll_y;
    for (line_idx, line) in tab.layout.lines.iter().enumerate() {
        // Simple culling: skip lines fully outside the viewport.
        if line.bottom() <= scroll || line.y >= scroll + viewport_h {
            continue;
        }
        paint_line(line, line_idx, canvas, scroll, viewport_w, &tab.find);
    }

    paint_widgets(tab, canvas, scroll, viewport_h);
    paint_status(tab, canvas, viewport_w, viewport_h);
}

fn paint_line(
    line: &RenderedLine,
    line_idx: usize,
    canvas: &mut dyn Canvas,
    scroll: f32,
    viewport_w: f32,
    find: &FindState,
) {
    let y = line.y - scroll;

    if let Some(bg) = line.bg {
        canvas.fill_rect(0.0, y, viewport_w, line.height, bg);
    }
    if line.deco.pre_bg && line.bg.is_none() {
        canvas.fill_rect(0.0, y, viewport_w, line.height, PRE_BG);
    }
    if line.deco.quote_bar {
        if line.bg.is_none() {
            canvas.fill_rect(0.0, y, viewport_w, line.height, QUOTE_BG);
        }
        canvas.fill_rect(PAGE_PADDING, y, QUOTE_BAR_W, line.height, QUOTE_BAR);
    }
    if line.deco.hr {
        let mid = y + line.height / 2.0;
        canvas.draw_line(PAGE_PADDING, mid, viewport_w - PAGE_PADDING, mid, HR_COLOR);
        return;
    }

    let current = find.current_hit();
    for (span_idx, span) in line.spans.iter().enumerate() {
        let w = span.width();

        // Backgrounds under the glyphs.
        if span.search_hit {
            let is_current =
                current.is_some_and(|h| h.line == line_idx && h.span == span_idx);
            let bg = if is_current { CURRENT_HIT_BG } else { HIT_BG };
            canvas.fill_rect(span.x, y, w, line.height, bg);
        } else if span.mark {
            canvas.fill_rect(span.x, y, w, line.height, MARK_BG);
        } else if span.code_bg {
            canvas.fill_rect(span.x, y, w, line.height, CODE_BG);
        }

        canvas.draw_text_scaled(span.x, y, &span.text, span.color, span.font_scale);

        let baseline = y + line.height - 2.0;
        if span.underline {
            canvas.draw_line(span.x, baseline, span.x + w, baseline, span.color);
        }
        if span.strike {
            let mid = y + line.height / 2.0;
            canvas.draw_line(span.x, mid, span.x + w, mid, span.color);
        }
    }
}

fn paint_widgets(tab: &Tab, canvas: &mut dyn Canvas, scroll: f32, viewport_h: f32) {
    for pw in &tab.layout.widgets {
        let y = pw.y - scroll;
        if y + pw.h < 0.0 || y > viewport_h {
            continue;
        }
        let Some(bp) = tab.extract.widgets.get(pw.widget_index) else {
            continue;
        };
        let state = tab.widget_states.get(pw.widget_index);
        let focused = tab.focused_widget == Some(pw.widget_index);
        let border = if focused { FOCUS_BORDER } else { WIDGET_BORDER };

        canvas.fill_rect(pw.x, y, pw.w, pw.h, Color::WHITE);
        canvas.draw_rect(pw.x, y, pw.w, pw.h, border);

        match bp.kind {
            WidgetKind::Checkbox | WidgetKind::Radio => {
                if state.is_some_and(|s| s.checked) {
                    canvas.fill_rect(
                        pw.x + 3.0,
                        y + 3.0,
                        pw.w - 6.0,
                        pw.h - 6.0,
                        Color::BLACK,
                    );
                }
            }
            WidgetKind::Submit | WidgetKind::Button => {
                canvas.draw_text(pw.x + 8.0, y + 3.0, &bp.value, Color::BLACK);
            }
            WidgetKind::Select => {
                let label = state
                    .and_then(|s| bp.options.get(s.selected))
                    .map(|(_, l)| l.as_str())
                    .unwrap_or("");
                canvas.draw_text(pw.x + 2.0, y + 3.0, label, Color::BLACK);
                canvas.draw_text(pw.x + pw.w - 12.0, y + 3.0, "\u{25BE}", Color::BLACK);
            }
            WidgetKind::Password => {
                let masked: String =
                    state.map(|s| "*".repeat(s.value.chars().count())).unwrap_or_default();
                canvas.draw_text(pw.x + 2.0, y + 3.0, &masked, Color::BLACK);
            }
            WidgetKind::Textarea | WidgetKind::Text => {
                let text = state.map(|s| s.value.as_str()).unwrap_or("");
                let shown = if text.is_empty() {
                    bp.placeholder.as_deref().unwrap_or("")
                } else {
                    text
                };
                let color = if text.is_empty() {
                    Color::rgb(0x99, 0x99, 0x99)
                } else {
                    Color::BLACK
                };
                if bp.kind == WidgetKind::Textarea {
                    for (i, row) in shown.split('\n').enumerate() {
                        let row_y = y + 2.0 + i as f32 * layout::LINE_BASE;
                        if row_y + layout::LINE_BASE > y + pw.h {
                            break;
                        }
                        canvas.draw_text(pw.x + 2.0, row_y, row, color);
                    }
                } else {
                    canvas.draw_text(pw.x + 2.0, y + 3.0, shown, color);
                }
                // Text cursor for the focused control.
                if focused {
                    if let Some(s) = state {
                        let cx = pw.x + 2.0 + s.cursor as f32 * CHAR_W;
                        canvas.draw_line(cx, y + 2.0, cx, y + pw.h - 2.0, Color::BLACK);
                    }
                }
            }
            WidgetKind::Hidden => {}
        }
    }
}

fn paint_status(tab: &Tab, canvas: &mut dyn Canvas, viewport_w: f32, viewport_h: f32) {
    let text = if tab.find.open {
        format!(
            "find: {} ({}/{})",
            tab.find.query,
            if tab.find.hits.is_empty() {
                0
            } else {
                tab.find.current + 1
            },
            tab.find.hits.len()
        )
    } else if !tab.status.is_empty() {
        tab.status.clone()
    } else {
        return;
    };
    let y = viewport_h - STATUS_H;
    canvas.fill_rect(0.0, y, viewport_w, STATUS_H, STATUS_BG);
    canvas.draw_text(4.0, y + 2.0, &text, Color::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use url_parser::Url;

    /// Canvas that records call kinds, enough to assert culling and
    /// content.
    #[derive(Default)]
    struct RecordingCanvas {
        texts: Vec<(f32, f32, String)>,
        rects: usize,
    }

    impl Canvas for RecordingCanvas {
        fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _c: Color) {
            self.rects += 1;
        }
        fn draw_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _c: Color) {}
        fn draw_line(&mut self, _x0: f32, _y0: f32, _x1: f32, _y1: f32, _c: Color) {}
        fn set_pixel(&mut self, _x: f32, _y: f32, _c: Color) {}
        fn draw_text(&mut self, x: f32, y: f32, text: &str, _c: Color) {
            self.texts.push((x, y, text.to_string()));
        }
        fn draw_text_scaled(&mut self, x: f32, y: f32, text: &str, _c: Color, _scale: f32) {
            self.texts.push((x, y, text.to_string()));
        }
    }

    fn tab_with(html_src: &str) -> Tab {
        let mut tab = Tab::new();
        let url = Url::parse("http://h/").unwrap();
        tab.set_document(html_src, &url);
        tab.restyle(800.0, 600.0);
        tab
    }

    #[test]
    fn paints_visible_text() {
        let tab = tab_with("<p>visible words</p>");
        let mut canvas = RecordingCanvas::default();
        paint_tab(&tab, &mut canvas, 800.0, 600.0);
        assert!(canvas.texts.iter().any(|(_, _, t)| t == "visible words"));
    }

    #[test]
    fn culls_offscreen_lines() {
        let many: String = (0..200).map(|i| format!("<p>line {i}</p>")).collect();
        let mut tab = tab_with(&many);
        tab.scroll_y = 0.0;
        let mut canvas = RecordingCanvas::default();
        paint_tab(&tab, &mut canvas, 800.0, 600.0);
        let painted = canvas.texts.len();
        assert!(painted < 200, "painted {painted} of 200 lines");
        // Scrolled far down, early lines are gone.
        tab.scroll_y = tab.layout.max_scroll(600.0);
        let mut canvas2 = RecordingCanvas::default();
        paint_tab(&tab, &mut canvas2, 800.0, 600.0);
        assert!(!canvas2.texts.iter().any(|(_, _, t)| t == "line 0"));
        assert!(canvas2.texts.iter().any(|(_, _, t)| t == "line 199"));
    }

    #[test]
    fn widget_boxes_painted() {
        let tab = tab_with("<form><input name=q value=seeded><input type=submit></form>");
        let mut canvas = RecordingCanvas::default();
        paint_tab(&tab, &mut canvas, 800.0, 600.0);
        assert!(canvas.texts.iter().any(|(_, _, t)| t == "seeded"));
        assert!(canvas.texts.iter().any(|(_, _, t)| t == "Submit"));
    }

    #[test]
    fn status_line_painted_when_set() {
        let mut tab = tab_with("<p>x</p>");
        tab.status = "HTTP 404".to_string();
        let mut canvas = RecordingCanvas::default();
        paint_tab(&tab, &mut canvas, 800.0, 600.0);
        assert!(canvas.texts.iter().any(|(_, _, t)| t == "HTTP 404"));
    }

    #[test]
    fn find_bar_shows_counter() {
        let mut tab = tab_with("<p>aaa bbb aaa</p>");
        tab.find.open();
        tab.find.query = "aaa".into();
        tab.find.update(&tab.layout.clone());
        let mut canvas = RecordingCanvas::default();
        paint_tab(&tab, &mut canvas, 800.0, 600.0);
        assert!(canvas.texts.iter().any(|(_, _, t)| t.contains("1/2")));
    }
}
