//! Tab state.
//!
//! A tab is a self-contained snapshot: URL, title, history, the parsed
//! document and its extractions, combined author rules, layout, scroll
//! position, widget runtime, find state and per-page caches. Navigation
//! only ever mutates the active tab.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use css::{Stylesheet, VarRegistry, parse_stylesheet};
use html::{Document, DocumentExtract};
use layout::LayoutResult;
use net::FetchRequest;
use style::{MatchContext, StyleInput, compute_styles};
use url_parser::Url;

use crate::find::FindState;
use crate::form::{WidgetState, init_states};
use crate::host::JsHost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: Url,
}

/// A fetch waiting for its reactor turn. The generation stamp is the
/// cancellation handle: delivery only happens if the tab's generation
/// still matches.
pub struct PendingFetch {
    pub request: FetchRequest,
    pub generation: u64,
    /// The loading state has been painted at least once, so the next
    /// turn may block on the network.
    pub presented: bool,
}

#[derive(Default)]
pub struct Tab {
    pub url: Option<Url>,
    /// Base for relative resolution; `<base href>` overrides the page URL.
    pub base_url: Option<Url>,
    pub title: String,
    pub status: String,
    pub history: Vec<HistoryEntry>,
    pub history_idx: usize,
    pub scroll_y: f32,
    pub loading: bool,

    pub document: Option<Document>,
    pub extract: DocumentExtract,
    pub author_rules: Stylesheet,
    pub vars: VarRegistry,
    pub layout: LayoutResult,
    pub widget_states: Vec<WidgetState>,
    pub focused_widget: Option<usize>,
    pub find: FindState,

    pub image_cache: HashMap<String, Vec<u8>>,
    pub bg_image_cache: HashMap<String, Vec<u8>>,
    pub favicon: Option<Vec<u8>>,

    pub script_host: Option<Box<dyn JsHost>>,
    /// Script-driven rerender requests, applied at the start of the next
    /// reactor turn.
    pub rerender_queue: Rc<RefCell<Vec<String>>>,
    pub pending_fetch: Option<PendingFetch>,
    /// Bumped on every navigation; stale fetch results are dropped.
    pub generation: u64,
}

impl Tab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything tied to the current page. History and URL survive;
    /// caches, styles, layout and widget state do not.
    pub fn flush_page_caches(&mut self) {
        if let Some(host) = self.script_host.as_mut() {
            host.dispose();
        }
        self.script_host = None;
        self.document = None;
        self.extract = DocumentExtract::default();
        self.author_rules = Stylesheet::default();
        self.vars.clear();
        self.layout = LayoutResult::default();
        self.widget_states.clear();
        self.focused_widget = None;
        self.find = FindState::default();
        self.image_cache.clear();
        self.bg_image_cache.clear();
        self.favicon = None;
        self.rerender_queue.borrow_mut().clear();
        self.scroll_y = 0.0;
        self.title.clear();
    }

    /// Cancel any outstanding fetch; its result will never be delivered.
    pub fn cancel_fetch(&mut self) {
        self.generation += 1;
        self.pending_fetch = None;
        self.loading = false;
    }

    /// Append to history, truncating any forward entries.
    pub fn push_history(&mut self, url: Url) {
        if self.history_idx + 1 < self.history.len() {
            self.history.truncate(self.history_idx + 1);
        }
        self.history.push(HistoryEntry { url });
        self.history_idx = self.history.len() - 1;
    }

    pub fn can_go_back(&self) -> bool {
        self.history_idx > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.history_idx + 1 < self.history.len()
    }

    /// Install a parsed document. Returns the stylesheet hrefs that still
    /// need fetching, resolved against the page base.
    pub fn set_document(&mut self, html_source: &str, url: &Url) -> Vec<Url> {
        let (document, extract) = html::parse(html_source);

        self.title = extract.title.clone();
        self.base_url = extract
            .base_href
            .as_deref()
            .and_then(|href| url.join(href).ok())
            .or_else(|| Some(url.clone()));

        self.vars = VarRegistry::new();
        self.author_rules = parse_stylesheet(&extract.inline_css, &mut self.vars);

        let base = self.base_url.clone().unwrap_or_else(|| url.clone());
        let sheet_urls = extract
            .stylesheet_hrefs
            .iter()
            .filter_map(|href| base.join(href).ok())
            .collect();

        self.widget_states = init_states(&extract.widgets);
        self.focused_widget = None;
        self.document = Some(document);
        self.extract = extract;
        sheet_urls
    }

    /// Append a fetched author stylesheet to the combined rule set.
    pub fn add_author_sheet(&mut self, css_text: &str) {
        let sheet = parse_stylesheet(css_text, &mut self.vars);
        self.author_rules.rules.extend(sheet.rules);
    }

    /// Re-run cascade and layout against the current rule set.
    pub fn restyle(&mut self, viewport_w: f32, viewport_h: f32) {
        let Some(document) = &self.document else {
            self.layout = LayoutResult::default();
            return;
        };
        let focused_node = self
            .focused_widget
            .and_then(|i| self.extract.widgets.get(i))
            .map(|bp| bp.node);
        let styles = compute_styles(StyleInput {
            doc: document,
            author: &self.author_rules,
            vars: &mut self.vars,
            match_ctx: MatchContext {
                focused: focused_node,
            },
        });
        self.layout = layout::layout_document(document, &styles, &self.extract, viewport_w);

        // Widget count can change under script mutation.
        if self.widget_states.len() != self.extract.widgets.len() {
            self.widget_states = init_states(&self.extract.widgets);
        }

        self.find.update(&self.layout);
        self.find.mark_spans(&mut self.layout);
        self.clamp_scroll(viewport_h);
    }

    pub fn clamp_scroll(&mut self, viewport_h: f32) {
        self.scroll_y = self.scroll_y.clamp(0.0, self.layout.max_scroll(viewport_h));
    }

    pub fn scroll_by(&mut self, dy: f32, viewport_h: f32) {
        self.scroll_y += dy;
        self.clamp_scroll(viewport_h);
    }

    /// Bring a document-space y into view.
    pub fn scroll_into_view(&mut self, y: f32, viewport_h: f32) {
        if y < self.scroll_y || y > self.scroll_y + viewport_h - layout::LINE_BASE {
            self.scroll_y = (y - viewport_h / 3.0).max(0.0);
            self.clamp_scroll(viewport_h);
        }
    }

    /// Cycle widget focus (Tab / Shift-Tab).
    pub fn cycle_focus(&mut self, backwards: bool) {
        let count = self.layout.widgets.len();
        if count == 0 {
            self.focused_widget = None;
            return;
        }
        // Order of appearance in the layout.
        let order: Vec<usize> = self.layout.widgets.iter().map(|w| w.widget_index).collect();
        let next = match self.focused_widget {
            None => {
                if backwards {
                    count - 1
                } else {
                    0
                }
            }
            Some(current) => {
                let pos = order.iter().position(|&i| i == current).unwrap_or(0);
                if backwards {
                    (pos + count - 1) % count
                } else {
                    (pos + 1) % count
                }
            }
        };
        self.focused_widget = Some(order[next]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn loaded_tab(html_src: &str) -> Tab {
        let mut tab = Tab::new();
        let u = url("http://h/");
        tab.set_document(html_src, &u);
        tab.restyle(800.0, 600.0);
        tab
    }

    #[test]
    fn set_document_extracts_title_and_layout() {
        let tab = loaded_tab("<title>T</title><p>hello world</p>");
        assert_eq!(tab.title, "T");
        assert_eq!(tab.layout.lines.len(), 1);
        assert_eq!(tab.layout.lines[0].text(), "hello world");
    }

    #[test]
    fn inline_styles_apply_first_pass() {
        let tab = loaded_tab("<style>p { color: #ff0000 }</style><p>red</p>");
        assert_eq!(tab.layout.lines[0].spans[0].color, common::Color::RED);
    }

    #[test]
    fn sheet_hrefs_resolved_against_base() {
        let mut tab = Tab::new();
        let sheets = tab.set_document(
            "<base href='https://cdn.example/assets/'>\
             <link rel=stylesheet href='main.css'>",
            &url("http://h/page"),
        );
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].raw, "https://cdn.example/assets/main.css");
    }

    #[test]
    fn added_sheet_triggers_new_styles() {
        let mut tab = loaded_tab("<p>text</p>");
        assert_eq!(tab.layout.lines[0].spans[0].color, common::Color::BLACK);
        tab.add_author_sheet("p { color: #00ff00 }");
        tab.restyle(800.0, 600.0);
        assert_eq!(
            tab.layout.lines[0].spans[0].color,
            common::Color::rgb(0, 255, 0)
        );
    }

    #[test]
    fn history_truncates_forward_entries() {
        let mut tab = Tab::new();
        tab.push_history(url("http://h/1"));
        tab.push_history(url("http://h/2"));
        tab.push_history(url("http://h/3"));
        assert_eq!(tab.history_idx, 2);

        tab.history_idx = 0; // went back twice
        tab.push_history(url("http://h/4"));
        let urls: Vec<&str> = tab.history.iter().map(|e| e.url.raw.as_str()).collect();
        assert_eq!(urls, ["http://h/1", "http://h/4"]);
        assert!(!tab.can_go_forward());
        assert!(tab.can_go_back());
    }

    #[test]
    fn cancel_bumps_generation() {
        let mut tab = Tab::new();
        let g = tab.generation;
        tab.cancel_fetch();
        assert_eq!(tab.generation, g + 1);
        assert!(tab.pending_fetch.is_none());
    }

    #[test]
    fn flush_clears_page_but_keeps_history() {
        let mut tab = loaded_tab("<p>content</p>");
        tab.push_history(url("http://h/"));
        tab.image_cache.insert("k".into(), vec![1]);
        tab.scroll_y = 50.0;

        tab.flush_page_caches();
        assert!(tab.document.is_none());
        assert!(tab.image_cache.is_empty());
        assert_eq!(tab.scroll_y, 0.0);
        assert_eq!(tab.history.len(), 1);
    }

    #[test]
    fn scrolling_clamps() {
        let mut tab = loaded_tab("<p>a</p><p>b</p><p>c</p>");
        tab.scroll_by(-100.0, 600.0);
        assert_eq!(tab.scroll_y, 0.0);
        tab.scroll_by(1_000_000.0, 600.0);
        assert_eq!(tab.scroll_y, tab.layout.max_scroll(600.0));
    }

    #[test]
    fn focus_cycles_through_widgets() {
        let mut tab = loaded_tab(
            "<form><input name=a><input name=b><input type=submit></form>",
        );
        assert_eq!(tab.focused_widget, None);
        tab.cycle_focus(false);
        assert_eq!(tab.focused_widget, Some(0));
        tab.cycle_focus(false);
        assert_eq!(tab.focused_widget, Some(1));
        tab.cycle_focus(false);
        assert_eq!(tab.focused_widget, Some(2));
        tab.cycle_focus(false);
        assert_eq!(tab.focused_widget, Some(0));
        tab.cycle_focus(true);
        assert_eq!(tab.focused_widget, Some(2));
    }

    #[test]
    fn widget_defaults_survive_restyle() {
        let mut tab = loaded_tab("<form><input name=q value=seed></form>");
        tab.widget_states[0].value = "edited".into();
        tab.restyle(800.0, 600.0);
        assert_eq!(tab.widget_states[0].value, "edited");
    }
}
