//! Text-mode shell.
//!
//! A character-grid canvas: one cell per `CHAR_W × LINE_BASE` pixels.
//! Good enough to drive the whole pipeline headlessly and to produce the
//! "printed page" artifact.

use common::Color;
use layout::{CHAR_W, LINE_BASE};
use page::Canvas;

pub struct TextCanvas {
    cols: usize,
    rows: usize,
    cells: Vec<char>,
}

impl TextCanvas {
    pub fn new(viewport_w: f32, viewport_h: f32) -> Self {
        let cols = (viewport_w / CHAR_W) as usize;
        let rows = (viewport_h / LINE_BASE) as usize;
        Self {
            cols,
            rows,
            cells: vec![' '; cols * rows],
        }
    }

    fn cell(&mut self, col: usize, row: usize) -> Option<&mut char> {
        if col < self.cols && row < self.rows {
            self.cells.get_mut(row * self.cols + col)
        } else {
            None
        }
    }

    fn put_text(&mut self, x: f32, y: f32, text: &str) {
        let row = (y / LINE_BASE) as usize;
        let start = (x / CHAR_W) as usize;
        for (i, ch) in text.chars().enumerate() {
            if let Some(cell) = self.cell(start + i, row) {
                *cell = ch;
            }
        }
    }

    /// Render the grid, dropping trailing blanks.
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = self
            .cells
            .chunks(self.cols.max(1))
            .map(|row| {
                row.iter()
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

impl Canvas for TextCanvas {
    fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _color: Color) {}

    fn draw_rect(&mut self, x: f32, y: f32, w: f32, _h: f32, _color: Color) {
        // Mark widget boxes with brackets so they are visible in text.
        self.put_text(x, y, "[");
        self.put_text(x + w - CHAR_W, y, "]");
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, _y1: f32, _color: Color) {
        let row = (y0 / LINE_BASE) as usize;
        let from = (x0 / CHAR_W) as usize;
        let to = (x1 / CHAR_W) as usize;
        for col in from..to {
            if let Some(cell) = self.cell(col, row) {
                if *cell == ' ' {
                    *cell = '─';
                }
            }
        }
    }

    fn set_pixel(&mut self, _x: f32, _y: f32, _color: Color) {}

    fn draw_text(&mut self, x: f32, y: f32, text: &str, _color: Color) {
        self.put_text(x, y, text);
    }

    fn draw_text_scaled(&mut self, x: f32, y: f32, text: &str, _color: Color, _scale: f32) {
        self.put_text(x, y, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_places_text() {
        let mut c = TextCanvas::new(160.0, 64.0);
        c.draw_text(8.0, 0.0, "hi", Color::BLACK);
        c.draw_text(0.0, 16.0, "below", Color::BLACK);
        let text = c.to_text();
        assert_eq!(text, " hi\nbelow");
    }

    #[test]
    fn clips_outside_grid() {
        let mut c = TextCanvas::new(80.0, 32.0);
        c.draw_text(0.0, 0.0, "0123456789abcdef", Color::BLACK);
        c.draw_text(0.0, 1000.0, "gone", Color::BLACK);
        assert_eq!(c.to_text(), "0123456789");
    }

    #[test]
    fn hr_renders_as_rule() {
        let mut c = TextCanvas::new(80.0, 32.0);
        c.draw_line(0.0, 0.0, 40.0, 0.0, Color::BLACK);
        assert!(c.to_text().starts_with("─────"));
    }
}
