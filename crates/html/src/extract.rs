//! Extraction pass over a freshly built document.
//!
//! Walks head and body once and pulls out everything the controller acts
//! on: inline styles, stylesheet and icon links, script blobs, the base
//! URL, the title, forms and widget blueprints.

use crate::dom::{Document, ElementData, NodeId, NodeKind};
use crate::forms::{FormBlueprint, FormMethod, WidgetBlueprint, WidgetKind};

/// Everything parsing produces besides the tree itself.
#[derive(Debug, Default)]
pub struct DocumentExtract {
    pub title: String,
    pub base_href: Option<String>,
    pub favicon_href: Option<String>,
    /// Hrefs of `<link rel="stylesheet">`, in document order.
    pub stylesheet_hrefs: Vec<String>,
    /// Concatenated `<style>` contents.
    pub inline_css: String,
    /// Non-empty `<script>` bodies, in document order.
    pub scripts: Vec<String>,
    pub forms: Vec<FormBlueprint>,
    pub widgets: Vec<WidgetBlueprint>,
}

impl DocumentExtract {
    /// Widget blueprint for a node, if that node is a control.
    pub fn widget_for(&self, node: NodeId) -> Option<usize> {
        self.widgets.iter().position(|w| w.node == node)
    }
}

pub fn extract(doc: &Document) -> DocumentExtract {
    let mut out = DocumentExtract::default();
    for root in [doc.head, doc.body] {
        walk(doc, root, None, &mut out);
    }
    out
}

fn walk(doc: &Document, node: NodeId, form: Option<usize>, out: &mut DocumentExtract) {
    let mut child_form = form;

    if let NodeKind::Element(el) = &doc.get(node).kind {
        match el.tag.as_str() {
            "TITLE" => {
                if out.title.is_empty() {
                    out.title = doc.text_content(node).trim().to_string();
                }
            }
            "BASE" => {
                if out.base_href.is_none() {
                    out.base_href = el.attrs.get("href").map(str::to_string);
                }
            }
            "LINK" => {
                let rel = el.attrs.get("rel").unwrap_or("").to_ascii_lowercase();
                if let Some(href) = el.attrs.get("href") {
                    if rel.split_whitespace().any(|r| r == "stylesheet") {
                        out.stylesheet_hrefs.push(href.to_string());
                    } else if rel.split_whitespace().any(|r| r == "icon") {
                        out.favicon_href.get_or_insert_with(|| href.to_string());
                    }
                }
            }
            "STYLE" => {
                out.inline_css.push_str(&doc.text_content(node));
                out.inline_css.push('\n');
            }
            "SCRIPT" => {
                // External scripts are out of scope; inline bodies go to
                // the JS host.
                if !el.attrs.has("src") {
                    let body = doc.text_content(node);
                    if !body.trim().is_empty() {
                        out.scripts.push(body);
                    }
                }
            }
            "FORM" => {
                out.forms.push(FormBlueprint {
                    action: el.attrs.get("action").map(str::to_string),
                    method: FormMethod::parse(el.attrs.get("method").unwrap_or("")),
                    enctype: el
                        .attrs
                        .get("enctype")
                        .unwrap_or("application/x-www-form-urlencoded")
                        .to_string(),
                    node,
                });
                child_form = Some(out.forms.len() - 1);
            }
            "INPUT" => out.widgets.push(input_blueprint(el, node, form)),
            "TEXTAREA" => out.widgets.push(textarea_blueprint(doc, el, node, form)),
            "SELECT" => out.widgets.push(select_blueprint(doc, el, node, form)),
            "BUTTON" => out.widgets.push(button_blueprint(doc, el, node, form)),
            _ => {}
        }
    }

    for &child in &doc.get(node).children {
        walk(doc, child, child_form, out);
    }
}

fn base_blueprint(
    kind: WidgetKind,
    el: &ElementData,
    node: NodeId,
    form: Option<usize>,
) -> WidgetBlueprint {
    let mut w = WidgetBlueprint::new(kind, node);
    w.form_index = form;
    w.name = el.attrs.get("name").map(str::to_string);
    w.disabled = el.attrs.has("disabled");
    w.required = el.attrs.has("required");
    w.placeholder = el.attrs.get("placeholder").map(str::to_string);
    w
}

fn input_blueprint(el: &ElementData, node: NodeId, form: Option<usize>) -> WidgetBlueprint {
    let kind = match el.attrs.get("type").unwrap_or("text").to_ascii_lowercase().as_str() {
        "password" => WidgetKind::Password,
        "hidden" => WidgetKind::Hidden,
        "checkbox" => WidgetKind::Checkbox,
        "radio" => WidgetKind::Radio,
        "submit" => WidgetKind::Submit,
        "button" => WidgetKind::Button,
        _ => WidgetKind::Text,
    };
    let mut w = base_blueprint(kind, el, node, form);
    w.value = el.attrs.get("value").unwrap_or("").to_string();
    if w.value.is_empty() && kind == WidgetKind::Submit {
        w.value = "Submit".to_string();
    }
    w.checked = el.attrs.has("checked");
    if let Some(size) = el.attrs.get("size").and_then(|s| s.parse().ok()) {
        w.size = size;
    }
    w
}

fn textarea_blueprint(
    doc: &Document,
    el: &ElementData,
    node: NodeId,
    form: Option<usize>,
) -> WidgetBlueprint {
    let mut w = base_blueprint(WidgetKind::Textarea, el, node, form);
    w.value = doc.text_content(node);
    if let Some(rows) = el.attrs.get("rows").and_then(|s| s.parse().ok()) {
        w.rows = rows;
    }
    if let Some(cols) = el.attrs.get("cols").and_then(|s| s.parse().ok()) {
        w.cols = cols;
    }
    w
}

fn select_blueprint(
    doc: &Document,
    el: &ElementData,
    node: NodeId,
    form: Option<usize>,
) -> WidgetBlueprint {
    let mut w = base_blueprint(WidgetKind::Select, el, node, form);
    for opt in doc.descendants(node) {
        let Some(opt_el) = doc.element(opt) else {
            continue;
        };
        if opt_el.tag != "OPTION" {
            continue;
        }
        let label = doc.text_content(opt).trim().to_string();
        let value = opt_el
            .attrs
            .get("value")
            .map(str::to_string)
            .unwrap_or_else(|| label.clone());
        if opt_el.attrs.has("selected") {
            w.selected = w.options.len();
        }
        w.options.push((value, label));
    }
    if let Some((value, _)) = w.options.get(w.selected) {
        w.value = value.clone();
    }
    w
}

fn button_blueprint(
    doc: &Document,
    el: &ElementData,
    node: NodeId,
    form: Option<usize>,
) -> WidgetBlueprint {
    let kind = match el.attrs.get("type").unwrap_or("submit").to_ascii_lowercase().as_str() {
        "button" => WidgetKind::Button,
        _ => WidgetKind::Submit,
    };
    let mut w = base_blueprint(kind, el, node, form);
    let label = doc.text_content(node).trim().to_string();
    w.value = if label.is_empty() {
        el.attrs.get("value").unwrap_or("Submit").to_string()
    } else {
        label
    };
    w
}
