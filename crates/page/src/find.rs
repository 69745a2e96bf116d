//! Find-in-page.
//!
//! Lowercased substring search across rendered spans. Hits are ordered by
//! position; `next`/`previous` cycle with wraparound, and the active hit
//! is what the controller scrolls into view and paints distinctly.

use layout::LayoutResult;

/// One occurrence of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindHit {
    pub line: usize,
    pub span: usize,
    /// Character offset of the match inside the span text.
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FindState {
    pub open: bool,
    pub query: String,
    pub hits: Vec<FindHit>,
    pub current: usize,
}

impl FindState {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.hits.clear();
        self.current = 0;
    }

    /// Re-run the search after the query or the layout changed.
    pub fn update(&mut self, layout: &LayoutResult) {
        self.hits = search(layout, &self.query);
        if self.current >= self.hits.len() {
            self.current = 0;
        }
    }

    /// Advance to the next hit, wrapping.
    pub fn next(&mut self) {
        if !self.hits.is_empty() {
            self.current = (self.current + 1) % self.hits.len();
        }
    }

    /// Step back to the previous hit, wrapping.
    pub fn previous(&mut self) {
        if !self.hits.is_empty() {
            self.current = (self.current + self.hits.len() - 1) % self.hits.len();
        }
    }

    pub fn current_hit(&self) -> Option<FindHit> {
        self.hits.get(self.current).copied()
    }

    /// Vertical position of the active hit, for scroll-into-view.
    pub fn current_y(&self, layout: &LayoutResult) -> Option<f32> {
        self.current_hit()
            .and_then(|h| layout.lines.get(h.line))
            .map(|l| l.y)
    }

    /// Flag hit spans so the paint pass can highlight them.
    pub fn mark_spans(&self, layout: &mut LayoutResult) {
        for line in &mut layout.lines {
            for span in &mut line.spans {
                span.search_hit = false;
            }
        }
        for hit in &self.hits {
            if let Some(span) = layout
                .lines
                .get_mut(hit.line)
                .and_then(|l| l.spans.get_mut(hit.span))
            {
                span.search_hit = true;
            }
        }
    }
}

/// All occurrences of `query` (case-insensitive), in document order.
pub fn search(layout: &LayoutResult, query: &str) -> Vec<FindHit> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for (line_idx, line) in layout.lines.iter().enumerate() {
        for (span_idx, span) in line.spans.iter().enumerate() {
            let haystack = span.text.to_lowercase();
            let mut from = 0;
            while let Some(pos) = haystack[from..].find(&needle) {
                let byte = from + pos;
                hits.push(FindHit {
                    line: line_idx,
                    span: span_idx,
                    offset: haystack[..byte].chars().count(),
                });
                from = byte + needle.len().max(1);
            }
        }
    }
    hits
}
