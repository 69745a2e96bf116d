//! # Style resolution
//!
//! Selector matching with a rule index, the cascade, and pseudo-element
//! content resolution. Output is a computed style per element; this layer
//! never fails — unmatched or malformed input just contributes nothing.

#![forbid(unsafe_code)]

pub mod cascade;
pub mod computed;
pub mod content;
pub mod index;
pub mod matching;

use lazy_static::lazy_static;

pub use cascade::{StyleInput, compute_styles};
pub use computed::ComputedStyle;
pub use content::CounterMap;
pub use index::RuleIndex;
pub use matching::{MatchContext, matches_complex, matches_compound};

lazy_static! {
    /// The user-agent default stylesheet, parsed once.
    pub static ref UA_SHEET: css::Stylesheet = {
        let mut vars = css::VarRegistry::new();
        css::parse_stylesheet(include_str!("ua.css"), &mut vars)
    };
}
