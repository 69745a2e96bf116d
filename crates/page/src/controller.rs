//! The controller.
//!
//! Owns the tabs and drives the pipeline: navigation and history, the
//! per-tick fetch state machine, input routing, form submission, downloads
//! and printing. One reactor turn is one `render` call; at most one
//! blocking network operation happens per turn, and only after the tab's
//! loading state has been presented.

use net::{FetchRequest, FetchResponse, NetService};
use std::time::Duration;
use tracing::{debug, warn};
use url_parser::{Scheme, Url};

use crate::config::Config;
use crate::context::Context;
use crate::find::FindState;
use crate::form::{self, Submission, set_checked};
use crate::host::{
    Canvas, CursorIcon, Filesystem, JsEnv, JsHostFactory, Key, KeyEvent, PointerEvent, PointerKind,
    WindowManager,
};
use crate::paint;
use crate::tab::{PendingFetch, Tab};

/// Scroll step for arrow keys.
const SCROLL_STEP: f32 = 40.0;

/// Cap on navigations triggered while another navigation is still being
/// resolved (script- or redirect-driven loops).
const MAX_NAV_DEPTH: u32 = 8;

pub struct Browser {
    pub tabs: Vec<Tab>,
    pub current: usize,
    pub ctx: Context,
    pub net: NetService,
    pub config: Config,
    js_factory: Box<dyn JsHostFactory>,
    fs: Box<dyn Filesystem>,
    /// Minimal URL entry state (Ctrl+L); the full address-bar chrome is
    /// the embedder's business.
    pub url_input: Option<String>,
}

impl Browser {
    pub fn new(
        config: Config,
        js_factory: Box<dyn JsHostFactory>,
        fs: Box<dyn Filesystem>,
    ) -> Self {
        let net = NetService {
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
        };
        Self {
            tabs: vec![Tab::new()],
            current: 0,
            ctx: Context::new(),
            net,
            config,
            js_factory,
            fs,
            url_input: None,
        }
    }

    pub fn active(&self) -> &Tab {
        &self.tabs[self.current]
    }

    pub fn active_mut(&mut self) -> &mut Tab {
        &mut self.tabs[self.current]
    }

    fn viewport(&self) -> (f32, f32) {
        (self.config.viewport_width, self.config.viewport_height)
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Navigate the active tab to `target`, resolved against the current
    /// page when relative.
    pub fn navigate(&mut self, target: &str) {
        let resolved = match self.active().base_url.as_ref().or(self.active().url.as_ref()) {
            Some(base) => base.join(target),
            None => Url::parse(target),
        };
        match resolved {
            Ok(url) => self.navigate_url(url, None, true),
            Err(e) => {
                self.active_mut().status = format!("bad URL: {e}");
            }
        }
    }

    /// Core navigation: cancel outstanding work, flush per-page caches,
    /// update history, dispatch by scheme.
    fn navigate_url(&mut self, url: Url, post_body: Option<String>, push_history: bool) {
        if self.ctx.nav_depth >= MAX_NAV_DEPTH {
            warn!(url = %url, "navigation loop cut off");
            return;
        }
        self.ctx.nav_depth += 1;
        self.navigate_url_inner(url, post_body, push_history);
        self.ctx.nav_depth -= 1;
    }

    fn navigate_url_inner(&mut self, url: Url, post_body: Option<String>, push_history: bool) {
        debug!(url = %url, "navigate");
        let tab = self.active_mut();
        tab.cancel_fetch();
        tab.flush_page_caches();
        if push_history {
            tab.push_history(url.clone());
        }
        tab.url = Some(url.clone());
        tab.status.clear();

        match url.scheme {
            Scheme::About => {
                let body = match url.path.as_str() {
                    "blank" | "" => String::new(),
                    other => format!("<h1>about:{other}</h1><p>Nothing here.</p>"),
                };
                self.load_html(&body, &url);
            }
            Scheme::Data => match url.data_payload() {
                Some(payload) => {
                    let text = String::from_utf8_lossy(&payload.body).into_owned();
                    if payload.media_type.contains("html") {
                        self.load_html(&text, &url);
                    } else {
                        self.load_plain_text(&text, &url);
                    }
                }
                None => self.load_error_page("malformed data: URL", &url),
            },
            Scheme::Blob => match self.ctx.blobs.get(&url.raw) {
                Some((media_type, bytes)) => {
                    let media_type = media_type.clone();
                    let text = String::from_utf8_lossy(bytes).into_owned();
                    if media_type.contains("html") {
                        self.load_html(&text, &url);
                    } else {
                        self.load_plain_text(&text, &url);
                    }
                }
                None => self.load_error_page("blob is not in the store", &url),
            },
            Scheme::Http | Scheme::Https => {
                let request = match post_body {
                    Some(body) => FetchRequest::post(
                        url.clone(),
                        "application/x-www-form-urlencoded",
                        body.into_bytes(),
                    ),
                    None => FetchRequest::get(url.clone()),
                };
                let tab = self.active_mut();
                tab.loading = true;
                tab.status = "Loading\u{2026}".to_string();
                tab.pending_fetch = Some(PendingFetch {
                    request,
                    generation: tab.generation,
                    presented: false,
                });
            }
        }
    }

    pub fn reload(&mut self) {
        if let Some(url) = self.active().url.clone() {
            self.navigate_url(url, None, false);
        }
    }

    /// Reload with every per-origin cache invalidated first.
    pub fn hard_reload(&mut self) {
        if let Some(url) = self.active().url.clone() {
            let tab = self.active_mut();
            tab.image_cache.clear();
            tab.bg_image_cache.clear();
            tab.favicon = None;
            self.ctx.tickets.remove(&url.host);
            self.navigate_url(url, None, false);
        }
    }

    pub fn go_back(&mut self) {
        let tab = self.active_mut();
        if tab.can_go_back() {
            tab.history_idx -= 1;
            let url = tab.history[tab.history_idx].url.clone();
            self.navigate_url(url, None, false);
        }
    }

    pub fn go_forward(&mut self) {
        let tab = self.active_mut();
        if tab.can_go_forward() {
            tab.history_idx += 1;
            let url = tab.history[tab.history_idx].url.clone();
            self.navigate_url(url, None, false);
        }
    }

    // ── Tabs ─────────────────────────────────────────────────────────────

    pub fn new_tab(&mut self) {
        self.tabs.push(Tab::new());
        self.current = self.tabs.len() - 1;
    }

    pub fn close_tab(&mut self) {
        if self.tabs.len() <= 1 {
            return;
        }
        let mut tab = self.tabs.remove(self.current);
        tab.cancel_fetch();
        if self.current >= self.tabs.len() {
            self.current = self.tabs.len() - 1;
        }
    }

    pub fn next_tab(&mut self) {
        self.current = (self.current + 1) % self.tabs.len();
    }

    // ── Document loading ─────────────────────────────────────────────────

    /// Parse and lay out an HTML document: inline styles first, then the
    /// linked sheets, then one combined re-style.
    fn load_html(&mut self, body: &str, url: &Url) {
        let (vw, vh) = self.viewport();
        let sheet_urls = self.active_mut().set_document(body, url);

        // First pass with inline styles only.
        self.active_mut().restyle(vw, vh);

        // Linked stylesheets; the reactor is single-threaded, so these run
        // inside the loading pass. Failures are resource errors: the page
        // stands without them.
        for sheet_url in sheet_urls {
            match self.fetch_sub_resource(&sheet_url) {
                Some(response) => {
                    let text = response.text();
                    self.active_mut().add_author_sheet(&text);
                }
                None => warn!(url = %sheet_url, "stylesheet fetch failed"),
            }
        }
        self.active_mut().restyle(vw, vh);

        self.fetch_background_images();
        self.fetch_favicon(url);
        self.start_scripts();
    }

    fn load_plain_text(&mut self, text: &str, url: &Url) {
        let escaped = escape_html(text);
        self.load_html(&format!("<pre>{escaped}</pre>"), url);
    }

    fn load_error_page(&mut self, reason: &str, url: &Url) {
        let body = format!(
            "<h1>Page unavailable</h1><p>{}</p><p><i>{}</i></p>",
            escape_html(reason),
            escape_html(&url.raw)
        );
        self.load_html(&body, url);
        self.active_mut().status = format!("error: {reason}");
    }

    /// One sub-resource GET (stylesheet, favicon, background tile); opaque
    /// data/blob URLs resolve locally.
    fn fetch_sub_resource(&mut self, url: &Url) -> Option<FetchResponse> {
        match url.scheme {
            Scheme::Http | Scheme::Https => self
                .net
                .fetch(FetchRequest::get(url.clone()), &mut self.ctx.tickets)
                .ok(),
            Scheme::Data => url.data_payload().map(|p| FetchResponse {
                status: 200,
                headers: vec![("Content-Type".to_string(), p.media_type.clone())],
                body: p.body,
                final_url: url.clone(),
            }),
            Scheme::Blob => self.ctx.blobs.get(&url.raw).map(|(mt, bytes)| FetchResponse {
                status: 200,
                headers: vec![("Content-Type".to_string(), mt.clone())],
                body: bytes.clone(),
                final_url: url.clone(),
            }),
            Scheme::About => None,
        }
    }

    /// Resolve and cache the tiles layout tagged lines with.
    fn fetch_background_images(&mut self) {
        let base = match self.active().base_url.clone() {
            Some(b) => b,
            None => return,
        };
        let urls: Vec<String> = self
            .active()
            .layout
            .lines
            .iter()
            .filter_map(|l| l.deco.bg_image.clone())
            .collect();
        for raw in urls {
            if self.active().bg_image_cache.contains_key(&raw) {
                continue;
            }
            if let Ok(resolved) = base.join(&raw) {
                if let Some(response) = self.fetch_sub_resource(&resolved) {
                    self.active_mut().bg_image_cache.insert(raw, response.body);
                }
            }
        }
    }

    fn fetch_favicon(&mut self, page_url: &Url) {
        if !page_url.has_origin() {
            return;
        }
        let href = self
            .active()
            .extract
            .favicon_href
            .clone()
            .unwrap_or_else(|| "/favicon.ico".to_string());
        if let Ok(url) = page_url.join(&href) {
            if let Some(response) = self.fetch_sub_resource(&url) {
                if response.status == 200 {
                    self.active_mut().favicon = Some(response.body);
                }
            }
        }
    }

    /// Hand script blobs to the JS host; rerender requests queue for the
    /// next reactor turn.
    fn start_scripts(&mut self) {
        let scripts = self.active().extract.scripts.clone();
        if scripts.is_empty() {
            return;
        }
        let queue = self.active().rerender_queue.clone();
        let env = JsEnv {
            rerender: Box::new(move |body_html| queue.borrow_mut().push(body_html)),
            log: Box::new(|message| debug!(target: "script", "{message}")),
        };
        let host = self.js_factory.create(scripts, env);
        self.active_mut().script_host = Some(host);
    }

    // ── Reactor ──────────────────────────────────────────────────────────

    /// One reactor turn: apply queued script mutations, advance the fetch
    /// state machine (at most one blocking call, and only after loading
    /// was presented), paint. Returns whether another frame is wanted.
    pub fn render(&mut self, canvas: &mut dyn Canvas) -> bool {
        self.apply_rerenders();

        let mut needs_frame = false;
        enum Step {
            Idle,
            Present,
            Fetch(FetchRequest, u64),
        }
        let step = {
            let tab = self.active_mut();
            match tab.pending_fetch.as_mut() {
                None => Step::Idle,
                Some(pending) if !pending.presented => {
                    pending.presented = true;
                    Step::Present
                }
                Some(_) => match tab.pending_fetch.take() {
                    Some(pending) => Step::Fetch(pending.request, pending.generation),
                    None => Step::Idle,
                },
            }
        };

        match step {
            Step::Idle => {}
            Step::Present => needs_frame = true,
            Step::Fetch(request, generation) => {
                let result = self.net.fetch(request, &mut self.ctx.tickets);
                // A cancelled fetch's result is never delivered.
                if self.active().generation == generation {
                    match result {
                        Ok(response) => self.deliver_response(response),
                        Err(error) => {
                            let url = self.active().url.clone();
                            if let Some(url) = url {
                                self.load_error_page(&error.to_string(), &url);
                            }
                            self.active_mut().loading = false;
                        }
                    }
                } else {
                    debug!("dropping stale fetch result");
                }
            }
        }

        let (vw, vh) = self.viewport();
        paint::paint_tab(self.active(), canvas, vw, vh);
        needs_frame || self.active().pending_fetch.is_some()
    }

    /// Drive script timers.
    pub fn tick(&mut self, now_ms: u64) {
        for tab in &mut self.tabs {
            if let Some(host) = tab.script_host.as_mut() {
                host.tick(now_ms);
            }
        }
    }

    /// Script mutations batched during the previous turn are flushed
    /// before this turn's paint, never re-entrantly.
    fn apply_rerenders(&mut self) {
        let queued: Vec<String> = self.active().rerender_queue.borrow_mut().drain(..).collect();
        let Some(body) = queued.into_iter().last() else {
            return;
        };
        let Some(url) = self.active().url.clone() else {
            return;
        };
        let (vw, vh) = self.viewport();
        let tab = self.active_mut();
        let _ = tab.set_document(&body, &url);
        tab.restyle(vw, vh);
    }

    fn deliver_response(&mut self, response: FetchResponse) {
        let final_url = response.final_url.clone();
        let content_type = response
            .content_type()
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        {
            let tab = self.active_mut();
            tab.loading = false;
            tab.url = Some(final_url.clone());
            // An error status still renders; it just shows in the status
            // line.
            tab.status = if response.status >= 400 {
                format!("HTTP {}", response.status)
            } else {
                String::new()
            };
        }

        if content_type.contains("html") || content_type.contains("xml") {
            let text = response.text();
            let status = self.active().status.clone();
            self.load_html(&text, &final_url);
            self.active_mut().status = status;
        } else if content_type.starts_with("text/") {
            let text = response.text();
            self.load_plain_text(&text, &final_url);
        } else {
            self.download(&final_url, &response);
        }
    }

    /// Non-renderable content goes to the download directory.
    fn download(&mut self, url: &Url, response: &FetchResponse) {
        let name = url
            .path_only()
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("download")
            .to_string();
        let dir = self.config.download_dir.clone();
        self.fs.mkdir(&dir);
        let path = format!("{dir}/{name}");
        if self.fs.write(&path, &response.body) {
            self.active_mut().status = format!("downloaded {path}");
        } else {
            self.active_mut().status = "download failed".to_string();
        }
    }

    /// Write the rendered line text of the current page to `path`.
    pub fn print_to_file(&mut self, path: &str) -> bool {
        let text: String = self
            .active()
            .layout
            .lines
            .iter()
            .map(|l| {
                let mut line = l.text();
                line.push('\n');
                line
            })
            .collect();
        self.fs.write(path, text.as_bytes())
    }

    // ── Input routing ────────────────────────────────────────────────────

    /// Dispatch order: find bar, focused widget, URL entry, shortcuts,
    /// scrolling.
    pub fn handle_key(&mut self, ev: KeyEvent) {
        let (_, vh) = self.viewport();

        if self.active().find.open {
            self.find_key(ev, vh);
            return;
        }
        if self.url_input.is_some() {
            self.url_key(ev);
            return;
        }
        if self.active().focused_widget.is_some() && self.widget_key(ev) {
            return;
        }

        // Shortcuts.
        if ev.ctrl {
            match (ev.ch, ev.key) {
                (Some('f'), _) => {
                    self.active_mut().find.open();
                    return;
                }
                (Some('l'), _) => {
                    self.url_input = Some(String::new());
                    return;
                }
                (Some('r'), _) if ev.shift => {
                    self.hard_reload();
                    return;
                }
                (Some('r'), _) => {
                    self.reload();
                    return;
                }
                (Some('t'), _) => {
                    self.new_tab();
                    return;
                }
                (Some('w'), _) => {
                    self.close_tab();
                    return;
                }
                (_, Key::Tab) => {
                    self.next_tab();
                    return;
                }
                _ => {}
            }
        }
        if ev.alt {
            match ev.key {
                Key::Left => {
                    self.go_back();
                    return;
                }
                Key::Right => {
                    self.go_forward();
                    return;
                }
                _ => {}
            }
        }

        match ev.key {
            Key::Tab => self.active_mut().cycle_focus(ev.shift),
            Key::Up => self.active_mut().scroll_by(-SCROLL_STEP, vh),
            Key::Down => self.active_mut().scroll_by(SCROLL_STEP, vh),
            Key::PageUp => self.active_mut().scroll_by(-(vh - SCROLL_STEP), vh),
            Key::PageDown => self.active_mut().scroll_by(vh - SCROLL_STEP, vh),
            Key::Home => {
                self.active_mut().scroll_y = 0.0;
            }
            Key::End => {
                let max = self.active().layout.max_scroll(vh);
                self.active_mut().scroll_y = max;
            }
            _ => {
                if ev.ch == Some(' ') {
                    self.active_mut().scroll_by(vh - SCROLL_STEP, vh);
                }
            }
        }
    }

    fn find_key(&mut self, ev: KeyEvent, vh: f32) {
        let scroll_to = {
            let tab = self.active_mut();
            let find = &mut tab.find;
            match (ev.ch, ev.key) {
                (_, Key::Escape) => {
                    find.close();
                    let layout = &mut tab.layout;
                    FindState::default().mark_spans(layout);
                    None
                }
                (_, Key::Backspace) => {
                    find.query.pop();
                    find.update(&tab.layout);
                    find.current_y(&tab.layout)
                }
                (Some('n'), _) | (_, Key::Enter) if ev.shift => {
                    find.previous();
                    find.current_y(&tab.layout)
                }
                (Some('n'), _) | (_, Key::Enter) => {
                    find.next();
                    find.current_y(&tab.layout)
                }
                (Some('N'), _) => {
                    find.previous();
                    find.current_y(&tab.layout)
                }
                (Some(c), _) if !ev.ctrl => {
                    find.query.push(c);
                    find.current = 0;
                    find.update(&tab.layout);
                    find.current_y(&tab.layout)
                }
                _ => None,
            }
        };
        let tab = self.active_mut();
        let find = tab.find.clone();
        find.mark_spans(&mut tab.layout);
        if let Some(y) = scroll_to {
            tab.scroll_into_view(y, vh);
        }
    }

    fn url_key(&mut self, ev: KeyEvent) {
        let Some(buffer) = self.url_input.as_mut() else {
            return;
        };
        match (ev.ch, ev.key) {
            (_, Key::Escape) => self.url_input = None,
            (_, Key::Backspace) => {
                buffer.pop();
            }
            (_, Key::Enter) => {
                let target = buffer.clone();
                self.url_input = None;
                if !target.is_empty() {
                    self.navigate(&target);
                }
            }
            (Some(c), _) if !ev.ctrl => buffer.push(c),
            _ => {}
        }
    }

    /// Returns true when the event was consumed by the widget.
    fn widget_key(&mut self, ev: KeyEvent) -> bool {
        let Some(index) = self.active().focused_widget else {
            return false;
        };
        let kind = self.active().extract.widgets[index].kind;
        use html::WidgetKind::*;

        match (ev.ch, ev.key) {
            (_, Key::Escape) => {
                self.active_mut().focused_widget = None;
                true
            }
            (_, Key::Tab) => {
                self.active_mut().cycle_focus(ev.shift);
                true
            }
            (_, Key::Enter) => match kind {
                Textarea => {
                    self.active_mut().widget_states[index].insert('\n');
                    true
                }
                Submit | Button => {
                    self.activate_widget(index);
                    true
                }
                _ => {
                    // Enter in a field submits its form.
                    self.submit_form_of(index, None);
                    true
                }
            },
            (Some(' '), _) if matches!(kind, Checkbox | Radio | Submit | Button) => {
                self.activate_widget(index);
                true
            }
            (_, Key::Backspace) => {
                self.active_mut().widget_states[index].backspace();
                true
            }
            (_, Key::Left) => {
                self.active_mut().widget_states[index].move_cursor(-1);
                true
            }
            (_, Key::Right) => {
                self.active_mut().widget_states[index].move_cursor(1);
                true
            }
            (_, Key::Up | Key::Down) if kind == Select => {
                let delta: i32 = if ev.key == Key::Up { -1 } else { 1 };
                let options = self.active().extract.widgets[index].options.len() as i32;
                if options > 0 {
                    let state = &mut self.active_mut().widget_states[index];
                    state.selected =
                        ((state.selected as i32 + delta).rem_euclid(options)) as usize;
                }
                true
            }
            (Some(c), _) if !ev.ctrl && matches!(kind, Text | Password | Textarea) => {
                self.active_mut().widget_states[index].insert(c);
                true
            }
            _ => false,
        }
    }

    /// Toggle/activate a widget the way a click would.
    fn activate_widget(&mut self, index: usize) {
        let kind = self.active().extract.widgets[index].kind;
        use html::WidgetKind::*;
        match kind {
            Checkbox => {
                let now = !self.active().widget_states[index].checked;
                let tab = self.active_mut();
                set_checked(&tab.extract.widgets, &mut tab.widget_states, index, now);
                self.restyle_active();
            }
            Radio => {
                let tab = self.active_mut();
                set_checked(&tab.extract.widgets, &mut tab.widget_states, index, true);
                self.restyle_active();
            }
            Submit => self.submit_form_of(index, Some(index)),
            Button => {
                if let Some(host) = self.active_mut().script_host.as_mut() {
                    host.fire_event(index as u32, "click", "");
                }
            }
            Select => {
                let options = self.active().extract.widgets[index].options.len();
                if options > 0 {
                    let state = &mut self.active_mut().widget_states[index];
                    state.selected = (state.selected + 1) % options;
                }
            }
            _ => {}
        }
    }

    /// Re-run cascade/layout after a form mutation (e.g. `:checked`
    /// styles).
    fn restyle_active(&mut self) {
        let (vw, vh) = self.viewport();
        // Runtime checked state is reflected into the document so
        // selector matching sees it.
        let tab = self.active_mut();
        if let Some(document) = tab.document.as_mut() {
            for (bp, state) in tab.extract.widgets.iter().zip(&tab.widget_states) {
                if matches!(bp.kind, html::WidgetKind::Checkbox | html::WidgetKind::Radio) {
                    if state.checked {
                        document.set_attribute(bp.node, "checked", String::new());
                    } else if document
                        .element(bp.node)
                        .is_some_and(|e| e.attrs.has("checked"))
                    {
                        if let Some(el_mut) = match &mut document.nodes[bp.node].kind {
                            html::NodeKind::Element(el) => Some(el),
                            _ => None,
                        } {
                            el_mut.attrs.remove("checked");
                        }
                    }
                }
            }
        }
        self.active_mut().restyle(vw, vh);
    }

    fn submit_form_of(&mut self, widget_index: usize, submitter: Option<usize>) {
        let submission = {
            let tab = self.active();
            let bp = &tab.extract.widgets[widget_index];
            let Some(form_index) = bp.form_index else {
                return;
            };
            let form = &tab.extract.forms[form_index];
            let base = match tab.base_url.as_ref().or(tab.url.as_ref()) {
                Some(b) => b.clone(),
                None => return,
            };
            form::submit(
                form,
                &tab.extract.widgets,
                &tab.widget_states,
                form_index,
                submitter,
                &base,
            )
        };
        match submission {
            Some(Submission::Get { url }) => self.navigate(&url),
            Some(Submission::Post { url, body }) => match Url::parse(&url) {
                Ok(url) => self.navigate_url(url, Some(body), true),
                Err(_) => warn!("unresolvable form action"),
            },
            None => {}
        }
    }

    /// Pointer routing: widgets first, then links, then nothing.
    pub fn handle_pointer(&mut self, ev: PointerEvent, wm: &mut dyn WindowManager) {
        let doc_y = ev.y + self.active().scroll_y;

        match ev.kind {
            PointerKind::Move => {
                let cursor = self.cursor_at(ev.x, doc_y);
                wm.set_cursor(cursor);
            }
            PointerKind::Down => {
                if let Some(widget) = layout::hit_test_widget(&self.active().layout, ev.x, doc_y) {
                    let index = self.active().layout.widgets[widget].widget_index;
                    self.active_mut().focused_widget = Some(index);
                    self.activate_widget(index);
                    return;
                }
                let href = layout::hit::link_at(&self.active().layout, ev.x, doc_y)
                    .map(str::to_string);
                if let Some(href) = href {
                    self.navigate(&href);
                    return;
                }
                self.active_mut().focused_widget = None;
            }
            PointerKind::Up => {}
        }
    }

    fn cursor_at(&self, x: f32, doc_y: f32) -> CursorIcon {
        if self.active().loading {
            return CursorIcon::Wait;
        }
        let layout_result = &self.active().layout;
        if let Some(w) = layout::hit_test_widget(layout_result, x, doc_y) {
            let index = layout_result.widgets[w].widget_index;
            return match self.active().extract.widgets[index].kind {
                html::WidgetKind::Text | html::WidgetKind::Password | html::WidgetKind::Textarea => {
                    CursorIcon::Text
                }
                _ => CursorIcon::Pointer,
            };
        }
        if layout::hit::link_at(layout_result, x, doc_y).is_some() {
            return CursorIcon::Pointer;
        }
        CursorIcon::Default
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
