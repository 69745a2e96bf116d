//! Tree constructor: token stream → document.
//!
//! A stack of open elements with implicit closing for void elements and
//! the optional `<html>`/`<head>`/`<body>` wrappers. Head-only elements
//! that appear before any body content land in the head subtree. Unmatched
//! close tags are dropped; elements still open at end of input are closed
//! by the document end.

use crate::dom::{Document, NodeId};
use crate::token::Token;

/// Elements that never take children.
const VOID: [&str; 13] = [
    "AREA", "BASE", "BR", "COL", "EMBED", "HR", "IMG", "INPUT", "LINK", "META", "SOURCE", "TRACK",
    "WBR",
];

/// Elements routed into the head subtree while no body content exists.
const HEAD_ONLY: [&str; 5] = ["TITLE", "STYLE", "LINK", "META", "BASE"];

/// `<p>` and `<li>` close an open element of the same name implicitly.
const SELF_NESTING: [&str; 4] = ["P", "LI", "DT", "DD"];

pub fn build_document(tokens: &[Token]) -> Document {
    Builder::new().run(tokens)
}

struct Builder {
    doc: Document,
    /// Open element stack; the insertion point is the top (or body).
    stack: Vec<NodeId>,
    /// Set once body content has been seen; head routing stops then.
    in_body: bool,
    /// Inside an explicit `<head>` element.
    in_head: bool,
}

impl Builder {
    fn new() -> Self {
        Self {
            doc: Document::new(),
            stack: Vec::new(),
            in_body: false,
            in_head: false,
        }
    }

    fn run(mut self, tokens: &[Token]) -> Document {
        for token in tokens {
            match token {
                Token::Open { name, attrs } => self.open(name, attrs.clone()),
                Token::SelfClose { name, attrs } => {
                    // Treated as open+close; void elements are this anyway.
                    let upper = name.to_ascii_uppercase();
                    self.open(name, attrs.clone());
                    if !VOID.contains(&upper.as_str()) {
                        self.close(name);
                    }
                }
                Token::Close { name } => self.close(name),
                Token::Text(text) => self.text(text),
            }
        }
        self.doc
    }

    fn insertion_point(&self) -> NodeId {
        match self.stack.last() {
            Some(&top) => top,
            None if self.in_head => self.doc.head,
            None => self.doc.body,
        }
    }

    fn open(&mut self, name: &str, attrs: crate::token::Attrs) {
        let upper = name.to_ascii_uppercase();

        // Wrapper elements create no nodes of their own.
        match upper.as_str() {
            "HTML" => return,
            "HEAD" => {
                self.in_head = true;
                return;
            }
            "BODY" => {
                self.in_head = false;
                self.in_body = true;
                return;
            }
            _ => {}
        }

        // A new <p>/<li>/<dt>/<dd> implicitly closes an open one.
        if SELF_NESTING.contains(&upper.as_str()) {
            if let Some(pos) = self
                .stack
                .iter()
                .rposition(|&id| self.doc.element(id).is_some_and(|e| e.tag == upper))
            {
                self.stack.truncate(pos);
            }
        }

        let head_bound = !self.in_body && (self.in_head || HEAD_ONLY.contains(&upper.as_str()));

        let node = self.doc.create_element(name, attrs);
        let parent = if head_bound && self.stack.is_empty() {
            self.doc.head
        } else {
            if !head_bound {
                self.in_body = true;
            }
            self.insertion_point()
        };
        self.doc.append_child(parent, node);

        if !VOID.contains(&upper.as_str()) {
            self.stack.push(node);
        }
    }

    fn close(&mut self, name: &str) {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "HTML" | "BODY" => {
                self.stack.clear();
                return;
            }
            "HEAD" => {
                self.in_head = false;
                self.stack.clear();
                return;
            }
            _ => {}
        }
        // Pop to the matching open element; ignore if there is none.
        if let Some(pos) = self
            .stack
            .iter()
            .rposition(|&id| self.doc.element(id).is_some_and(|e| e.tag == upper))
        {
            self.stack.truncate(pos);
        }
    }

    fn text(&mut self, text: &str) {
        // Whitespace between head elements is noise, not body content.
        if self.stack.is_empty() && !self.in_body && text.trim().is_empty() {
            return;
        }
        let parent = self.insertion_point();
        let node = self.doc.create_text(text.to_string());
        self.doc.append_child(parent, node);
    }
}
