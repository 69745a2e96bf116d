//! Page-scoped CSS custom-property registry.
//!
//! `--name: value` declarations register here from `:root` rules and from
//! inline styles; `var(--name, fallback)` substitution resolves against it
//! recursively. A missing name yields its fallback, or the empty string.

use std::collections::HashMap;

/// Guard against self-referential variable chains.
const MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct VarRegistry {
    map: HashMap<String, String>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `--name` (the leading dashes may be present or not).
    pub fn define(&mut self, name: &str, value: &str) {
        let key = name.trim_start_matches("--").to_string();
        self.map.insert(key, value.trim().to_string());
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.map.get(name.trim_start_matches("--")).map(|s| s.as_str())
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Replace every `var(--name[, fallback])` in `value`.
    pub fn resolve(&self, value: &str) -> String {
        self.resolve_depth(value, 0)
    }

    fn resolve_depth(&self, value: &str, depth: usize) -> String {
        if depth >= MAX_DEPTH || !value.contains("var(") {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("var(") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 4..];
            let Some(end) = matching_paren(after) else {
                // Unbalanced; emit as-is and stop substituting.
                out.push_str(&rest[start..]);
                return out;
            };
            let inner = &after[..end];
            let (name, fallback) = match split_top_level_comma(inner) {
                Some((n, f)) => (n.trim(), Some(f.trim())),
                None => (inner.trim(), None),
            };
            let replacement = match self.lookup(name) {
                Some(v) => v.to_string(),
                None => fallback.unwrap_or("").to_string(),
            };
            out.push_str(&self.resolve_depth(&replacement, depth + 1));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Index of the `)` closing the paren already opened before `s`.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 1;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on the first comma not inside parentheses.
fn split_top_level_comma(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_variable_substitutes() {
        let mut v = VarRegistry::new();
        v.define("--main", "red");
        assert_eq!(v.resolve("var(--main)"), "red");
        assert_eq!(v.resolve("1px solid var(--main)"), "1px solid red");
    }

    #[test]
    fn missing_variable_uses_fallback() {
        let v = VarRegistry::new();
        assert_eq!(v.resolve("var(--nope, blue)"), "blue");
        assert_eq!(v.resolve("var(--nope)"), "");
    }

    #[test]
    fn nested_fallback() {
        let mut v = VarRegistry::new();
        v.define("--b", "green");
        assert_eq!(v.resolve("var(--a, var(--b))"), "green");
    }

    #[test]
    fn recursive_definition_resolves() {
        let mut v = VarRegistry::new();
        v.define("--a", "var(--b)");
        v.define("--b", "black");
        assert_eq!(v.resolve("var(--a)"), "black");
    }

    #[test]
    fn self_reference_terminates() {
        let mut v = VarRegistry::new();
        v.define("--a", "var(--a)");
        // Must not loop forever; the value degrades to itself or empty.
        let _ = v.resolve("var(--a)");
    }

    #[test]
    fn unbalanced_left_alone() {
        let v = VarRegistry::new();
        assert_eq!(v.resolve("var(--x"), "var(--x");
    }

    #[test]
    fn define_with_or_without_dashes() {
        let mut v = VarRegistry::new();
        v.define("main", "1");
        assert_eq!(v.lookup("--main"), Some("1"));
        assert_eq!(v.lookup("main"), Some("1"));
    }
}
