//! Document tree.
//!
//! Nodes live in a per-document arena; a `NodeId` is an index into it.
//! Children are owned by their parent's child list, parent links are plain
//! back-indices. Detaching a node from its parent's child list is the only
//! way a subtree goes away. Mutating operations enqueue a record on the
//! document's mutation queue, which the script host may observe.

use crate::token::Attrs;

pub type NodeId = usize;

/// Node payload variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    Comment(String),
    /// Parent without an element identity (the head/body roots).
    Fragment,
}

/// An element: uppercase tag, ordered case-insensitive attributes, and the
/// id/class values pulled out of the attribute map for fast lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Attrs,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl ElementData {
    pub fn new(tag: &str, attrs: Attrs) -> Self {
        let id = attrs.get("id").map(|s| s.to_string());
        let classes = attrs
            .get("class")
            .map(|c| c.split_whitespace().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        Self {
            tag: tag.to_ascii_uppercase(),
            attrs,
            id,
            classes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A DOM mutation, observable by the script host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildAppended { parent: NodeId, child: NodeId },
    ChildRemoved { parent: NodeId, child: NodeId },
    AttributeChanged { node: NodeId, name: String },
    CharacterData { node: NodeId },
}

/// A document: one arena, two root subtrees.
pub struct Document {
    pub nodes: Vec<Node>,
    pub head: NodeId,
    pub body: NodeId,
    mutations: Vec<MutationRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            head: 0,
            body: 0,
            mutations: Vec::new(),
        };
        doc.head = doc.alloc(NodeKind::Fragment, None);
        doc.body = doc.alloc(NodeKind::Fragment, None);
        doc
    }

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str, attrs: Attrs) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(tag, attrs)), None)
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(NodeKind::Text(text), None)
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(NodeKind::Comment(text), None)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.mutations
            .push(MutationRecord::ChildAppended { parent, child });
    }

    /// Detach `child` from its parent; the subtree becomes unreachable.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.retain(|&c| c != child);
        self.nodes[child].parent = None;
        self.mutations
            .push(MutationRecord::ChildRemoved { parent, child });
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: String) {
        if let NodeKind::Element(el) = &mut self.nodes[node].kind {
            el.attrs.set(name, value);
            match name.to_ascii_lowercase().as_str() {
                "id" => el.id = el.attrs.get("id").map(|s| s.to_string()),
                "class" => {
                    el.classes = el
                        .attrs
                        .get("class")
                        .map(|c| c.split_whitespace().map(|s| s.to_string()).collect())
                        .unwrap_or_default();
                }
                _ => {}
            }
            self.mutations.push(MutationRecord::AttributeChanged {
                node,
                name: name.to_ascii_lowercase(),
            });
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: String) {
        if let NodeKind::Text(t) = &mut self.nodes[node].kind {
            *t = text;
            self.mutations.push(MutationRecord::CharacterData { node });
        }
    }

    /// Drain the pending mutation records (one batch per reactor turn).
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    // ── Accessors ──

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            if self.element(p).is_some() {
                return Some(p);
            }
            cur = self.nodes[p].parent;
        }
        None
    }

    /// Element children of `id`, in order.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    /// The element siblings of `id` (including `id`), and its position
    /// among them. `None` when detached.
    pub fn element_siblings(&self, id: NodeId) -> Option<(Vec<NodeId>, usize)> {
        let parent = self.nodes[id].parent?;
        let sibs = self.child_elements(parent);
        let idx = sibs.iter().position(|&s| s == id)?;
        Some((sibs, idx))
    }

    /// Pre-order walk of the subtree rooted at `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for &c in self.nodes[n].children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Concatenated text content of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let NodeKind::Text(t) = &self.nodes[n].kind {
                out.push_str(t);
            }
        }
        out
    }

    /// Serialize the body subtree back to HTML. Re-parsing the result
    /// reproduces the same tree (modulo whitespace in text nodes).
    pub fn serialize_body(&self) -> String {
        let mut out = String::new();
        for &child in &self.nodes[self.body].children {
            self.serialize_node(child, &mut out);
        }
        out
    }

    fn serialize_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeKind::Fragment => {
                for &child in &self.nodes[id].children {
                    self.serialize_node(child, out);
                }
            }
            NodeKind::Element(el) => {
                let tag = el.tag.to_ascii_lowercase();
                out.push('<');
                out.push_str(&tag);
                for (name, value) in el.attrs.iter() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
                    out.push('"');
                }
                out.push('>');
                if !self.nodes[id].children.is_empty() {
                    for &child in &self.nodes[id].children {
                        self.serialize_node(child, out);
                    }
                }
                // Childless elements are either void or legitimately
                // empty; a close tag is only needed for the latter, and
                // is harmless for non-void ones.
                if !VOID_TAGS.contains(&tag.as_str()) {
                    out.push_str("</");
                    out.push_str(&tag);
                    out.push('>');
                }
            }
        }
    }
}

const VOID_TAGS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn escape_text(t: &str) -> String {
    t.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
