//! The cascade.
//!
//! Per element, in order: inherited values, UA defaults, author rules in
//! ascending (specificity, source order), the inline `style` attribute,
//! then `!important` author rules, then inline `!important`. CSS-wide
//! keywords recorded during parse are applied in a final pass.

use std::collections::HashMap;

use css::{
    FontSizeValue, GlobalKeyword, PseudoElement, Rule, StyleBag, Stylesheet, TextDecorationLine,
    VarRegistry, parse_declaration_block,
};
use html::{Document, NodeId};

use crate::UA_SHEET;
use crate::computed::ComputedStyle;
use crate::index::RuleIndex;
use crate::matching::{MatchContext, matches_complex};

/// Inputs to a full style pass.
pub struct StyleInput<'a> {
    pub doc: &'a Document,
    /// All author rules, already concatenated in source order.
    pub author: &'a Stylesheet,
    pub vars: &'a mut VarRegistry,
    pub match_ctx: MatchContext,
}

/// Compute the style of every element under `doc.body`.
pub fn compute_styles(input: StyleInput) -> HashMap<NodeId, ComputedStyle> {
    let StyleInput {
        doc,
        author,
        vars,
        match_ctx,
    } = input;

    let ua_index = RuleIndex::build(&UA_SHEET);
    let author_index = RuleIndex::build(author);
    let root = ComputedStyle::default();

    let mut styles = HashMap::new();
    let mut stack: Vec<(NodeId, ComputedStyle)> = doc
        .child_elements(doc.body)
        .into_iter()
        .rev()
        .map(|c| (c, root.clone()))
        .collect();

    while let Some((node, parent_style)) = stack.pop() {
        let computed = style_one(
            doc,
            node,
            &parent_style,
            &ua_index,
            author,
            &author_index,
            vars,
            &match_ctx,
        );
        for child in doc.child_elements(node).into_iter().rev() {
            stack.push((child, computed.clone()));
        }
        styles.insert(node, computed);
    }
    styles
}

/// One matched rule occurrence, ready for ordered application.
struct Matched<'a> {
    specificity: u32,
    order: usize,
    rule: &'a Rule,
    pseudo: Option<PseudoElement>,
}

fn collect_matches<'a>(
    doc: &Document,
    node: NodeId,
    sheet: &'a Stylesheet,
    index: &RuleIndex,
    ctx: &MatchContext,
) -> Vec<Matched<'a>> {
    let Some(el) = doc.element(node) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for idx in index.candidates(el) {
        let rule = &sheet.rules[idx];
        // A rule applies once; a pseudo-element selector only contributes
        // its content hook.
        let mut matched_plain = false;
        let mut matched_pseudo: Option<PseudoElement> = None;
        for selector in &rule.selectors {
            if !matches_complex(doc, node, selector, ctx) {
                continue;
            }
            match selector.subject().pseudo_element() {
                Some(pe @ (PseudoElement::Before | PseudoElement::After)) => {
                    matched_pseudo = Some(pe);
                }
                // ::first-line and friends style the host here.
                _ => matched_plain = true,
            }
        }
        if matched_plain {
            out.push(Matched {
                specificity: rule.specificity,
                order: idx,
                rule,
                pseudo: None,
            });
        }
        if let Some(pe) = matched_pseudo {
            out.push(Matched {
                specificity: rule.specificity,
                order: idx,
                rule,
                pseudo: Some(pe),
            });
        }
    }
    out.sort_by_key(|m| (m.specificity, m.order));
    out
}

#[allow(clippy::too_many_arguments)]
fn style_one(
    doc: &Document,
    node: NodeId,
    parent: &ComputedStyle,
    ua_index: &RuleIndex,
    author: &Stylesheet,
    author_index: &RuleIndex,
    vars: &mut VarRegistry,
    ctx: &MatchContext,
) -> ComputedStyle {
    let mut computed = ComputedStyle::inherit_from(parent);
    let mut globals: Vec<(String, GlobalKeyword)> = Vec::new();

    // UA defaults.
    for m in collect_matches(doc, node, &UA_SHEET, ua_index, ctx) {
        apply_matched(&mut computed, &m, false, parent, &mut globals);
    }

    // Author rules, non-important.
    let author_matches = collect_matches(doc, node, author, author_index, ctx);
    for m in &author_matches {
        apply_matched(&mut computed, m, false, parent, &mut globals);
    }

    // Inline style attribute.
    let inline = doc
        .element(node)
        .and_then(|el| el.attrs.get("style"))
        .map(|text| parse_declaration_block(text, vars));
    if let Some((normal, _)) = &inline {
        // Inline custom properties register page-wide.
        for (name, value) in &normal.vars {
            vars.define(name, value);
        }
        apply_bag(&mut computed, normal, parent, &mut globals);
    }

    // Author !important, then inline !important on top.
    for m in &author_matches {
        apply_matched(&mut computed, m, true, parent, &mut globals);
    }
    if let Some((_, important)) = &inline {
        apply_bag(&mut computed, important, parent, &mut globals);
    }

    // CSS-wide keyword post-pass.
    for (prop, kw) in &globals {
        apply_global(&mut computed, parent, prop, *kw);
    }

    computed
}

fn apply_matched(
    computed: &mut ComputedStyle,
    m: &Matched<'_>,
    important: bool,
    parent: &ComputedStyle,
    globals: &mut Vec<(String, GlobalKeyword)>,
) {
    let bag = if important {
        &m.rule.important
    } else {
        &m.rule.declarations
    };
    match m.pseudo {
        Some(PseudoElement::Before) => {
            if let Some(content) = &bag.content {
                computed.content_before = Some(content.clone());
            }
        }
        Some(PseudoElement::After) => {
            if let Some(content) = &bag.content {
                computed.content_after = Some(content.clone());
            }
        }
        _ => apply_bag(computed, bag, parent, globals),
    }
}

/// Overlay a declaration bag onto a computed style.
fn apply_bag(
    computed: &mut ComputedStyle,
    bag: &StyleBag,
    parent: &ComputedStyle,
    globals: &mut Vec<(String, GlobalKeyword)>,
) {
    if let Some(v) = bag.display {
        computed.display = v;
    }
    if let Some(v) = bag.color {
        computed.color = v;
    }
    if let Some(v) = bag.background_color {
        computed.background_color = Some(v);
    }
    if let Some(v) = &bag.background_image {
        computed.background_image = v.clone();
    }
    if let Some(v) = bag.font_size {
        computed.font_size = match v {
            FontSizeValue::Px(px) => px,
            FontSizeValue::Percent(p) => parent.font_size * p / 100.0,
        };
    }
    if let Some(v) = bag.bold {
        computed.bold = v;
    }
    if let Some(v) = bag.italic {
        computed.italic = v;
    }
    if let Some(v) = bag.line_height {
        computed.line_height = v;
    }
    if let Some(v) = bag.letter_spacing {
        computed.letter_spacing = v;
    }
    if let Some(v) = bag.text_align {
        computed.text_align = v;
    }
    if let Some(v) = bag.text_decoration {
        match v {
            TextDecorationLine::Underline => computed.underline = true,
            TextDecorationLine::LineThrough => computed.strike = true,
            TextDecorationLine::None => {
                computed.underline = false;
                computed.strike = false;
            }
        }
    }
    if let Some(v) = bag.white_space {
        computed.white_space = v;
    }
    if let Some(v) = bag.word_break {
        computed.word_break = v;
    }
    if let Some(v) = bag.overflow_wrap {
        computed.overflow_wrap = v;
    }
    if let Some(v) = bag.list_style_type {
        computed.list_style_type = v;
    }
    if let Some(v) = bag.cursor {
        computed.cursor = v;
    }
    if let Some(v) = bag.visibility {
        computed.visibility = v;
    }
    if let Some(v) = bag.width {
        computed.width = Some(v);
    }
    if let Some(v) = bag.min_width {
        computed.min_width = Some(v);
    }
    if let Some(v) = bag.max_width {
        computed.max_width = Some(v);
    }
    if let Some(v) = bag.height {
        computed.height = Some(v);
    }
    for i in 0..4 {
        if let Some(v) = bag.margin[i] {
            computed.margin[i] = Some(v);
        }
        if let Some(v) = bag.padding[i] {
            computed.padding[i] = Some(v);
        }
    }
    if let Some(v) = bag.border_width {
        computed.border_width = v;
    }
    if let Some(v) = bag.border_color {
        computed.border_color = v;
    }
    if let Some(v) = &bag.counter_reset {
        computed.counter_reset = v.clone();
    }
    if let Some(v) = &bag.counter_increment {
        computed.counter_increment = v.clone();
    }
    // `content` on the host element itself is meaningless outside
    // pseudo-element hooks and is ignored here.

    globals.extend(bag.globals.iter().cloned());
}

fn is_inherited(prop: &str) -> bool {
    matches!(
        prop,
        "color"
            | "font-size"
            | "font-weight"
            | "font-style"
            | "line-height"
            | "letter-spacing"
            | "text-align"
            | "white-space"
            | "word-break"
            | "overflow-wrap"
            | "list-style-type"
            | "cursor"
            | "visibility"
    )
}

/// `inherit` copies from the parent; `initial` resets the field; `unset`
/// and `revert` pick between those by inheritance.
fn apply_global(computed: &mut ComputedStyle, parent: &ComputedStyle, prop: &str, kw: GlobalKeyword) {
    let inherit = match kw {
        GlobalKeyword::Inherit => true,
        GlobalKeyword::Initial => false,
        GlobalKeyword::Unset | GlobalKeyword::Revert => is_inherited(prop),
    };
    let source: &ComputedStyle = if inherit {
        parent
    } else {
        &DEFAULT_STYLE
    };

    match prop {
        "color" => computed.color = source.color,
        "background-color" => computed.background_color = source.background_color,
        "background-image" => computed.background_image = source.background_image.clone(),
        "display" => computed.display = source.display,
        "font-size" => computed.font_size = source.font_size,
        "font-weight" => computed.bold = source.bold,
        "font-style" => computed.italic = source.italic,
        "line-height" => computed.line_height = source.line_height,
        "letter-spacing" => computed.letter_spacing = source.letter_spacing,
        "text-align" => computed.text_align = source.text_align,
        "text-decoration" | "text-decoration-line" => {
            computed.underline = source.underline;
            computed.strike = source.strike;
        }
        "white-space" => computed.white_space = source.white_space,
        "word-break" => computed.word_break = source.word_break,
        "overflow-wrap" => computed.overflow_wrap = source.overflow_wrap,
        "list-style-type" | "list-style" => computed.list_style_type = source.list_style_type,
        "cursor" => computed.cursor = source.cursor,
        "visibility" => computed.visibility = source.visibility,
        "width" => computed.width = source.width,
        "min-width" => computed.min_width = source.min_width,
        "max-width" => computed.max_width = source.max_width,
        "height" => computed.height = source.height,
        "margin" => computed.margin = source.margin,
        "padding" => computed.padding = source.padding,
        "border-width" | "border" => computed.border_width = source.border_width,
        _ => {}
    }
}

/// Initial values, shared by the `initial` keyword path.
static DEFAULT_STYLE: std::sync::LazyLock<ComputedStyle> =
    std::sync::LazyLock::new(ComputedStyle::default);

#[cfg(test)]
mod tests {
    use super::*;
    use common::Color;
    use css::{ContentPiece, Display, parse_stylesheet};
    use html::parse;

    fn styles_for(
        html_src: &str,
        css_src: &str,
    ) -> (html::Document, HashMap<NodeId, ComputedStyle>) {
        let (doc, _) = parse(html_src);
        let mut vars = VarRegistry::new();
        let author = parse_stylesheet(css_src, &mut vars);
        let map = compute_styles(StyleInput {
            doc: &doc,
            author: &author,
            vars: &mut vars,
            match_ctx: MatchContext::default(),
        });
        (doc, map)
    }

    fn find_by_tag(doc: &html::Document, tag: &str) -> NodeId {
        doc.descendants(doc.body)
            .into_iter()
            .find(|&n| doc.element(n).is_some_and(|e| e.tag == tag))
            .unwrap()
    }

    #[test]
    fn ua_defaults_apply() {
        let (doc, map) = styles_for("<p>x</p><b>y</b>", "");
        let p = find_by_tag(&doc, "P");
        let b = find_by_tag(&doc, "B");
        assert_eq!(map[&p].display, Display::Block);
        assert!(map[&b].bold);
        assert_eq!(map[&b].display, Display::Inline);
    }

    #[test]
    fn author_beats_ua() {
        let (doc, map) = styles_for("<p>x</p>", "p { display: inline }");
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].display, Display::Inline);
    }

    #[test]
    fn specificity_orders_rules() {
        let (doc, map) = styles_for(
            "<p class=x>hi</p>",
            "p.x { color: blue } p { color: red }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::BLUE);
    }

    #[test]
    fn source_order_breaks_ties() {
        let (doc, map) = styles_for("<p>hi</p>", "p { color: red } p { color: blue }");
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::BLUE);
    }

    // Sheet !important beats inline non-important.
    #[test]
    fn important_beats_inline() {
        let (doc, map) = styles_for(
            "<p class='x' style='color: yellow'>hi</p>",
            "p { color: red } p.x { color: blue } p { color: green !important }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::GREEN);
    }

    #[test]
    fn inline_beats_sheet_non_important() {
        let (doc, map) = styles_for(
            "<p style='color: yellow'>hi</p>",
            "p { color: red } p { color: blue }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::rgb(255, 255, 0));
    }

    #[test]
    fn inline_important_beats_sheet_important() {
        let (doc, map) = styles_for(
            "<p style='color: yellow !important'>hi</p>",
            "p { color: green !important }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::rgb(255, 255, 0));
    }

    #[test]
    fn inheritance_flows_down() {
        let (doc, map) = styles_for(
            "<div><p><b>deep</b></p></div>",
            "div { color: red; font-size: 20px }",
        );
        let b = find_by_tag(&doc, "B");
        assert_eq!(map[&b].color, Color::RED);
        assert_eq!(map[&b].font_size, 20.0);
    }

    #[test]
    fn non_inherited_does_not_flow() {
        let (doc, map) = styles_for(
            "<div><p>x</p></div>",
            "div { background-color: red; border: 2px solid blue }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].background_color, None);
        assert_eq!(map[&p].border_width, 0.0);
    }

    #[test]
    fn inherit_keyword_copies_parent() {
        let (doc, map) = styles_for(
            "<div><p>x</p></div>",
            "div { background-color: red } p { background-color: inherit }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].background_color, Some(Color::RED));
    }

    #[test]
    fn initial_keyword_resets() {
        let (doc, map) = styles_for(
            "<div><p>x</p></div>",
            "div { color: red } p { color: initial }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::BLACK);
    }

    #[test]
    fn unset_inherits_for_inherited_props() {
        let (doc, map) = styles_for(
            "<div><p>x</p></div>",
            "div { color: red } p { color: blue } p { color: unset }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::RED);
    }

    #[test]
    fn font_size_percent_of_parent() {
        let (doc, map) = styles_for(
            "<div><p>x</p></div>",
            "div { font-size: 20px } p { font-size: 50% }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].font_size, 10.0);
    }

    #[test]
    fn css_variables_resolve_through_cascade() {
        let (doc, map) = styles_for(
            "<p>x</p>",
            ":root { --accent: #ff0000 } p { color: var(--accent) }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(map[&p].color, Color::RED);
    }

    #[test]
    fn pseudo_element_content_hook() {
        let (doc, map) = styles_for(
            "<p>x</p>",
            "p::before { content: \">> \"; color: red } p::after { content: \" <<\" }",
        );
        let p = find_by_tag(&doc, "P");
        assert_eq!(
            map[&p].content_before,
            Some(vec![ContentPiece::Literal(">> ".into())])
        );
        assert_eq!(
            map[&p].content_after,
            Some(vec![ContentPiece::Literal(" <<".into())])
        );
        // The pseudo rule's color must not leak onto the host.
        assert_eq!(map[&p].color, Color::BLACK);
    }

    #[test]
    fn rule_order_insensitive_for_disjoint_selectors() {
        let (doc1, map1) = styles_for(
            "<p>a</p><b>c</b>",
            "p { color: red } b { color: blue }",
        );
        let (doc2, map2) = styles_for(
            "<p>a</p><b>c</b>",
            "b { color: blue } p { color: red }",
        );
        assert_eq!(
            map1[&find_by_tag(&doc1, "P")].color,
            map2[&find_by_tag(&doc2, "P")].color
        );
        assert_eq!(
            map1[&find_by_tag(&doc1, "B")].color,
            map2[&find_by_tag(&doc2, "B")].color
        );
    }

    #[test]
    fn links_get_ua_affordances() {
        let (doc, map) = styles_for("<a href='/x'>link</a>", "");
        let a = find_by_tag(&doc, "A");
        assert!(map[&a].underline);
        assert_eq!(map[&a].cursor, css::CursorKind::Pointer);
    }
}
