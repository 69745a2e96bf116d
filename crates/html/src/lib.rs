//! # HTML parsing
//!
//! Tokenizer, document tree and tree constructor. The parser is tolerant by
//! construction: any byte sequence tokenizes, unmatched tags are absorbed,
//! and the output is always a usable document. Alongside the tree, parsing
//! extracts everything the controller acts on: stylesheets, script blobs,
//! stylesheet/icon links, the base URL, the title, forms and their widget
//! blueprints.

#![forbid(unsafe_code)]

pub mod dom;
pub mod extract;
pub mod forms;
pub mod token;
pub mod tokenizer;
pub mod tree;

pub use dom::{Document, ElementData, Node, NodeId, NodeKind};
pub use extract::{DocumentExtract, extract};
pub use forms::{FormBlueprint, FormMethod, WidgetBlueprint, WidgetKind};
pub use token::{Attrs, Token};
pub use tokenizer::tokenize;
pub use tree::build_document;

/// Parse HTML into a document plus its extractions.
pub fn parse(input: &str) -> (Document, DocumentExtract) {
    let tokens = tokenize(input);
    let document = build_document(&tokens);
    let extracted = extract(&document);
    (document, extracted)
}
