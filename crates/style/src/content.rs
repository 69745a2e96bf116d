//! `::before` / `::after` content resolution.
//!
//! Content pieces resolve against the host element's attributes and a
//! running counter map. The counter map is advanced by the caller walking
//! the document in order (`counter-reset` before `counter-increment`,
//! both before resolution).

use std::collections::HashMap;

use css::ContentPiece;
use html::ElementData;

/// Running counters, shared across one document walk.
#[derive(Debug, Clone, Default)]
pub struct CounterMap {
    counters: HashMap<String, i64>,
    quote_depth: usize,
}

impl CounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, name: &str, value: i64) {
        self.counters.insert(name.to_string(), value);
    }

    pub fn increment(&mut self, name: &str, by: i64) {
        *self.counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn value(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Apply an element's `counter-reset` / `counter-increment`.
    pub fn apply(&mut self, resets: &[(String, i64)], increments: &[(String, i64)]) {
        for (name, v) in resets {
            self.reset(name, *v);
        }
        for (name, v) in increments {
            self.increment(name, *v);
        }
    }

    fn open_quote(&mut self) -> &'static str {
        let q = if self.quote_depth % 2 == 0 { "\u{201C}" } else { "\u{2018}" };
        self.quote_depth += 1;
        q
    }

    fn close_quote(&mut self) -> &'static str {
        self.quote_depth = self.quote_depth.saturating_sub(1);
        if self.quote_depth % 2 == 0 { "\u{201D}" } else { "\u{2019}" }
    }
}

/// Resolve content pieces to the string injected as an inline span.
pub fn resolve_content(
    pieces: &[ContentPiece],
    el: &ElementData,
    counters: &mut CounterMap,
) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            ContentPiece::Literal(s) => out.push_str(s),
            ContentPiece::Attr(name) => out.push_str(el.attrs.get(name).unwrap_or("")),
            ContentPiece::Counter(name) => out.push_str(&counters.value(name).to_string()),
            ContentPiece::OpenQuote => out.push_str(counters.open_quote()),
            ContentPiece::CloseQuote => out.push_str(counters.close_quote()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::Attrs;

    fn element(attrs: &[(&str, &str)]) -> ElementData {
        let mut a = Attrs::new();
        for (n, v) in attrs {
            a.push(n, v.to_string());
        }
        ElementData::new("a", a)
    }

    #[test]
    fn literal_and_attr() {
        let el = element(&[("href", "/x")]);
        let mut counters = CounterMap::new();
        let pieces = vec![
            ContentPiece::Literal("[".into()),
            ContentPiece::Attr("href".into()),
            ContentPiece::Literal("]".into()),
        ];
        assert_eq!(resolve_content(&pieces, &el, &mut counters), "[/x]");
    }

    #[test]
    fn missing_attr_is_empty() {
        let el = element(&[]);
        let mut counters = CounterMap::new();
        let pieces = vec![ContentPiece::Attr("title".into())];
        assert_eq!(resolve_content(&pieces, &el, &mut counters), "");
    }

    #[test]
    fn counters_advance() {
        let el = element(&[]);
        let mut counters = CounterMap::new();
        counters.apply(&[("item".into(), 0)], &[]);

        let pieces = vec![ContentPiece::Counter("item".into())];
        counters.apply(&[], &[("item".into(), 1)]);
        assert_eq!(resolve_content(&pieces, &el, &mut counters), "1");
        counters.apply(&[], &[("item".into(), 1)]);
        assert_eq!(resolve_content(&pieces, &el, &mut counters), "2");

        counters.apply(&[("item".into(), 10)], &[]);
        assert_eq!(resolve_content(&pieces, &el, &mut counters), "10");
    }

    #[test]
    fn unknown_counter_reads_zero() {
        let el = element(&[]);
        let mut counters = CounterMap::new();
        let pieces = vec![ContentPiece::Counter("nope".into())];
        assert_eq!(resolve_content(&pieces, &el, &mut counters), "0");
    }

    #[test]
    fn quotes_nest() {
        let el = element(&[]);
        let mut counters = CounterMap::new();
        let open = vec![ContentPiece::OpenQuote];
        let close = vec![ContentPiece::CloseQuote];

        assert_eq!(resolve_content(&open, &el, &mut counters), "\u{201C}");
        assert_eq!(resolve_content(&open, &el, &mut counters), "\u{2018}");
        assert_eq!(resolve_content(&close, &el, &mut counters), "\u{2019}");
        assert_eq!(resolve_content(&close, &el, &mut counters), "\u{201D}");
    }
}
