//! Rule index.
//!
//! Rules are bucketed by their subject compound's tag, id and class
//! tokens, with a universal bucket for everything else. An element queries
//! the union of its buckets and only those candidates are matched in full.

use css::{Rule, Stylesheet};
use html::ElementData;
use std::collections::HashMap;

/// Indexes into a rule slice, bucketed by subject keys.
#[derive(Debug, Default)]
pub struct RuleIndex {
    by_tag: HashMap<String, Vec<usize>>,
    by_id: HashMap<String, Vec<usize>>,
    by_class: HashMap<String, Vec<usize>>,
    universal: Vec<usize>,
}

impl RuleIndex {
    /// Build an index over `sheet.rules`. A rule with several selectors is
    /// bucketed once per selector.
    pub fn build(sheet: &Stylesheet) -> Self {
        let mut index = RuleIndex::default();
        for (i, rule) in sheet.rules.iter().enumerate() {
            index.add_rule(i, rule);
        }
        index
    }

    fn add_rule(&mut self, i: usize, rule: &Rule) {
        for selector in &rule.selectors {
            let subject = selector.subject();
            if let Some(id) = subject.id_name() {
                self.by_id.entry(id.to_string()).or_default().push(i);
            } else if let Some(class) = subject.class_names().first() {
                self.by_class.entry(class.to_string()).or_default().push(i);
            } else if let Some(tag) = subject.type_name() {
                self.by_tag.entry(tag.to_string()).or_default().push(i);
            } else {
                self.universal.push(i);
            }
        }
    }

    /// Candidate rule indices for an element: the union of its buckets,
    /// deduplicated, ascending.
    pub fn candidates(&self, el: &ElementData) -> Vec<usize> {
        let mut out = self.universal.clone();
        if let Some(ids) = self.by_tag.get(&el.tag.to_ascii_lowercase()) {
            out.extend_from_slice(ids);
        }
        if let Some(id) = &el.id {
            if let Some(ids) = self.by_id.get(id) {
                out.extend_from_slice(ids);
            }
        }
        for class in &el.classes {
            if let Some(ids) = self.by_class.get(class) {
                out.extend_from_slice(ids);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}
