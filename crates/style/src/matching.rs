//! Selector matching against document elements.
//!
//! The subject compound is tested against the element itself; combinator
//! ancestors are checked by walking the parent and sibling chains. State
//! pseudo-classes other than `:focus` and `:link` are optimistically
//! accepted.

use css::{AttrOp, Combinator, ComplexSelector, CompoundSelector, PseudoClass, SimpleSelector};
use html::{Document, ElementData, NodeId};

/// Dynamic inputs to matching beyond the tree itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext {
    /// The currently focused element, for `:focus`.
    pub focused: Option<NodeId>,
}

/// Does `node` match the full selector?
pub fn matches_complex(
    doc: &Document,
    node: NodeId,
    selector: &ComplexSelector,
    ctx: &MatchContext,
) -> bool {
    if selector.parts.is_empty() || !matches_compound(doc, node, selector.subject(), ctx) {
        return false;
    }

    let mut current = node;
    let mut combinator = selector.parts[0].1;

    for (compound, next_combinator) in selector.parts.iter().skip(1) {
        match combinator {
            Some(Combinator::Descendant) => {
                let mut found = false;
                let mut ancestor = doc.parent_element(current);
                while let Some(a) = ancestor {
                    if matches_compound(doc, a, compound, ctx) {
                        current = a;
                        found = true;
                        break;
                    }
                    ancestor = doc.parent_element(a);
                }
                if !found {
                    return false;
                }
            }
            Some(Combinator::Child) => match doc.parent_element(current) {
                Some(p) if matches_compound(doc, p, compound, ctx) => current = p,
                _ => return false,
            },
            Some(Combinator::NextSibling) => match prev_element_sibling(doc, current) {
                Some(s) if matches_compound(doc, s, compound, ctx) => current = s,
                _ => return false,
            },
            Some(Combinator::SubsequentSibling) => {
                let mut found = false;
                let mut sib = prev_element_sibling(doc, current);
                while let Some(s) = sib {
                    if matches_compound(doc, s, compound, ctx) {
                        current = s;
                        found = true;
                        break;
                    }
                    sib = prev_element_sibling(doc, s);
                }
                if !found {
                    return false;
                }
            }
            None => return false,
        }
        combinator = *next_combinator;
    }
    true
}

/// All simple selectors of the compound must hold.
pub fn matches_compound(
    doc: &Document,
    node: NodeId,
    compound: &CompoundSelector,
    ctx: &MatchContext,
) -> bool {
    let Some(el) = doc.element(node) else {
        return false;
    };
    compound
        .simples
        .iter()
        .all(|s| matches_simple(doc, node, el, s, ctx))
}

fn prev_element_sibling(doc: &Document, node: NodeId) -> Option<NodeId> {
    let (sibs, idx) = doc.element_siblings(node)?;
    if idx == 0 { None } else { Some(sibs[idx - 1]) }
}

fn matches_simple(
    doc: &Document,
    node: NodeId,
    el: &ElementData,
    simple: &SimpleSelector,
    ctx: &MatchContext,
) -> bool {
    match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(tag) => el.tag.eq_ignore_ascii_case(tag),
        SimpleSelector::Id(id) => el.id.as_deref() == Some(id.as_str()),
        SimpleSelector::Class(class) => el.classes.iter().any(|c| c == class),
        SimpleSelector::Attr { name, op, value } => {
            matches_attr(el, name, *op, value.as_deref())
        }
        SimpleSelector::Pseudo(pc) => matches_pseudo(doc, node, el, pc, ctx),
        // Pseudo-elements match their host; content hooks are applied by
        // the cascade.
        SimpleSelector::PseudoElement(_) => true,
    }
}

fn matches_attr(el: &ElementData, name: &str, op: AttrOp, value: Option<&str>) -> bool {
    let Some(actual) = el.attrs.get(name) else {
        return false;
    };
    let Some(expected) = value else {
        // Bare [attr]: presence is enough.
        return true;
    };
    match op {
        AttrOp::Exists => true,
        AttrOp::Eq => actual == expected,
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOp::Contains => !expected.is_empty() && actual.contains(expected),
        AttrOp::Word => actual.split_whitespace().any(|w| w == expected),
        AttrOp::DashMatch => {
            actual == expected || actual.starts_with(&format!("{expected}-"))
        }
    }
}

fn nth_position(doc: &Document, node: NodeId, of_type: Option<&str>) -> Option<(i32, i32)> {
    let (sibs, idx) = doc.element_siblings(node)?;
    match of_type {
        None => Some((idx as i32 + 1, sibs.len() as i32)),
        Some(tag) => {
            let same: Vec<NodeId> = sibs
                .iter()
                .copied()
                .filter(|&s| doc.element(s).is_some_and(|e| e.tag == tag))
                .collect();
            let pos = same.iter().position(|&s| s == node)?;
            Some((pos as i32 + 1, same.len() as i32))
        }
    }
}

fn matches_pseudo(
    doc: &Document,
    node: NodeId,
    el: &ElementData,
    pc: &PseudoClass,
    ctx: &MatchContext,
) -> bool {
    match pc {
        // Optimistic state pseudos: the style applies whether or not the
        // interaction is live.
        PseudoClass::Hover | PseudoClass::Active | PseudoClass::Visited => true,
        PseudoClass::Focus => ctx.focused == Some(node),
        PseudoClass::Link => el.tag == "A" && el.attrs.has("href"),

        PseudoClass::Root => doc.parent_element(node).is_none(),
        PseudoClass::FirstChild => {
            nth_position(doc, node, None).is_some_and(|(pos, _)| pos == 1)
        }
        PseudoClass::LastChild => {
            nth_position(doc, node, None).is_some_and(|(pos, len)| pos == len)
        }
        PseudoClass::OnlyChild => {
            nth_position(doc, node, None).is_some_and(|(_, len)| len == 1)
        }
        PseudoClass::NthChild(nth) => {
            nth_position(doc, node, None).is_some_and(|(pos, _)| nth.matches(pos))
        }
        PseudoClass::FirstOfType => {
            nth_position(doc, node, Some(&el.tag)).is_some_and(|(pos, _)| pos == 1)
        }
        PseudoClass::LastOfType => {
            nth_position(doc, node, Some(&el.tag)).is_some_and(|(pos, len)| pos == len)
        }
        PseudoClass::OnlyOfType => {
            nth_position(doc, node, Some(&el.tag)).is_some_and(|(_, len)| len == 1)
        }
        PseudoClass::NthOfType(nth) => {
            nth_position(doc, node, Some(&el.tag)).is_some_and(|(pos, _)| nth.matches(pos))
        }

        PseudoClass::Checked => el.attrs.has("checked"),
        PseudoClass::Disabled => el.attrs.has("disabled"),
        PseudoClass::Enabled => is_form_control(el) && !el.attrs.has("disabled"),
        PseudoClass::Required => el.attrs.has("required"),
        PseudoClass::PlaceholderShown => {
            el.attrs.has("placeholder") && el.attrs.get("value").unwrap_or("").is_empty()
        }

        PseudoClass::Not(list) => !list.iter().any(|s| matches_complex(doc, node, s, ctx)),
        PseudoClass::Is(list) | PseudoClass::Where(list) => {
            list.iter().any(|s| matches_complex(doc, node, s, ctx))
        }
        PseudoClass::Has(list) => doc
            .descendants(node)
            .into_iter()
            .skip(1)
            .any(|d| list.iter().any(|s| matches_complex(doc, d, s, ctx))),

        PseudoClass::Unknown(_) => false,
    }
}

fn is_form_control(el: &ElementData) -> bool {
    matches!(el.tag.as_str(), "INPUT" | "TEXTAREA" | "SELECT" | "BUTTON")
}
