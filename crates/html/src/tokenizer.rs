//! Single-pass HTML scanner.
//!
//! Emits open/close/self-closing tags and text runs. Comments, doctypes and
//! processing instructions are skipped. Inside `<script>` and `<style>` the
//! scanner switches to raw-text mode and ignores `<` until the matching end
//! tag. Malformed input is consumed without aborting; tokenization always
//! terminates.

use crate::token::{Attrs, Token};

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT: [&str; 2] = ["script", "style"];

pub fn tokenize(input: &str) -> Vec<Token> {
    Scanner::new(input).run()
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    out: Vec<Token>,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            out: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Case-insensitive lookahead without consuming.
    fn looking_at(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, expected)| {
            self.chars
                .get(self.pos + i)
                .is_some_and(|c| c.eq_ignore_ascii_case(&expected))
        })
    }

    fn skip_until(&mut self, terminator: &str) {
        while self.pos < self.chars.len() {
            if self.looking_at(terminator) {
                self.pos += terminator.chars().count();
                return;
            }
            self.pos += 1;
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if c != '<' {
                self.pos += 1;
                if c == '&' {
                    text.push_str(&self.entity());
                } else {
                    text.push(c);
                }
                continue;
            }

            // '<' — decide what it opens.
            match self.chars.get(self.pos + 1) {
                Some('!') if self.looking_at("<!--") => {
                    self.flush_text(&mut text);
                    self.pos += 4;
                    self.skip_until("-->");
                }
                Some('!') | Some('?') => {
                    // doctype or processing instruction
                    self.flush_text(&mut text);
                    self.skip_until(">");
                }
                Some('/') => {
                    self.flush_text(&mut text);
                    self.pos += 2;
                    self.close_tag();
                }
                Some(c2) if c2.is_ascii_alphabetic() => {
                    self.flush_text(&mut text);
                    self.pos += 1;
                    self.open_tag();
                }
                // A stray '<' is literal text.
                _ => {
                    text.push('<');
                    self.pos += 1;
                }
            }
        }
        self.flush_text(&mut text);
        self.out
    }

    fn flush_text(&mut self, text: &mut String) {
        if !text.is_empty() {
            self.out.push(Token::Text(std::mem::take(text)));
        }
    }

    fn close_tag(&mut self) {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '>' {
                self.pos += 1;
                break;
            }
            if !c.is_whitespace() {
                name.push(c.to_ascii_lowercase());
            }
            self.pos += 1;
        }
        if !name.is_empty() {
            self.out.push(Token::Close { name });
        }
    }

    fn open_tag(&mut self) {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '>' || c == '/' {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.pos += 1;
        }

        let (attrs, self_closing) = self.attributes();
        if self_closing {
            self.out.push(Token::SelfClose { name, attrs });
            return;
        }

        let raw = RAW_TEXT.contains(&name.as_str());
        self.out.push(Token::Open {
            name: name.clone(),
            attrs,
        });
        if raw {
            self.raw_text(&name);
        }
    }

    /// Parse attributes up to (and including) the closing `>`.
    fn attributes(&mut self) -> (Attrs, bool) {
        let mut attrs = Attrs::new();
        let mut self_closing = false;

        loop {
            // skip whitespace
            while self.peek().is_some_and(|c| c.is_whitespace()) {
                self.pos += 1;
            }
            match self.peek() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    if self.peek() == Some('>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                    // stray slash, ignore
                }
                Some(_) => {
                    let mut name = String::new();
                    while let Some(c) = self.peek() {
                        if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                            break;
                        }
                        name.push(c);
                        self.pos += 1;
                    }
                    while self.peek().is_some_and(|c| c.is_whitespace()) {
                        self.pos += 1;
                    }
                    let value = if self.peek() == Some('=') {
                        self.pos += 1;
                        self.attribute_value()
                    } else {
                        String::new()
                    };
                    if !name.is_empty() {
                        attrs.push(&name, value);
                    }
                }
            }
        }
        (attrs, self_closing)
    }

    fn attribute_value(&mut self) -> String {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
        let mut value = String::new();
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                while let Some(c) = self.bump() {
                    if c == q {
                        break;
                    }
                    if c == '&' {
                        value.push_str(&self.entity());
                    } else {
                        value.push(c);
                    }
                }
            }
            _ => {
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    self.pos += 1;
                    value.push(c);
                }
            }
        }
        value
    }

    /// Raw-text content for `<script>` / `<style>`: everything up to the
    /// matching end tag, `<` included.
    fn raw_text(&mut self, tag: &str) {
        let end = format!("</{tag}");
        let mut content = String::new();
        while self.pos < self.chars.len() {
            if self.looking_at(&end) {
                break;
            }
            content.push(self.chars[self.pos]);
            self.pos += 1;
        }
        if !content.is_empty() {
            self.out.push(Token::Text(content));
        }
        if self.pos < self.chars.len() {
            self.pos += end.chars().count();
            self.skip_until(">");
            self.out.push(Token::Close {
                name: tag.to_string(),
            });
        }
    }

    /// Decode a character reference; the leading `&` is already consumed.
    /// Unknown entities are left verbatim.
    fn entity(&mut self) -> String {
        let start = self.pos;
        let mut body = String::new();
        let mut terminated = false;
        for _ in 0..10 {
            match self.peek() {
                Some(';') => {
                    self.pos += 1;
                    terminated = true;
                    break;
                }
                Some(c) if c.is_ascii_alphanumeric() || c == '#' || c == 'x' || c == 'X' => {
                    body.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if !terminated {
            self.pos = start;
            return "&".to_string();
        }

        let decoded = match body.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "nbsp" => Some('\u{00A0}'),
            _ => {
                if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = body.strip_prefix('#') {
                    dec.parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    None
                }
            }
        };

        match decoded {
            Some(c) => c.to_string(),
            None => {
                self.pos = start;
                "&".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(name: &str) -> Token {
        Token::Open {
            name: name.into(),
            attrs: Attrs::new(),
        }
    }

    fn close(name: &str) -> Token {
        Token::Close { name: name.into() }
    }

    fn text(s: &str) -> Token {
        Token::Text(s.into())
    }

    #[test]
    fn simple_tags_and_text() {
        let toks = tokenize("<p>Hello <b>world</b>!</p>");
        assert_eq!(
            toks,
            vec![
                open("p"),
                text("Hello "),
                open("b"),
                text("world"),
                close("b"),
                text("!"),
                close("p"),
            ]
        );
    }

    #[test]
    fn attributes_quoted_and_unquoted() {
        let toks = tokenize(r#"<a href="/x" title='t' data-n=5 checked>"#);
        let Token::Open { name, attrs } = &toks[0] else {
            panic!("expected open tag");
        };
        assert_eq!(name, "a");
        assert_eq!(attrs.get("href"), Some("/x"));
        assert_eq!(attrs.get("title"), Some("t"));
        assert_eq!(attrs.get("data-n"), Some("5"));
        assert_eq!(attrs.get("checked"), Some(""));
    }

    #[test]
    fn self_closing() {
        let toks = tokenize("<br/><img src=x />");
        assert!(matches!(&toks[0], Token::SelfClose { name, .. } if name == "br"));
        assert!(matches!(&toks[1], Token::SelfClose { name, .. } if name == "img"));
    }

    #[test]
    fn comments_and_doctype_skipped() {
        let toks = tokenize("<!DOCTYPE html><!-- a <b> comment --><p>x</p>");
        assert_eq!(toks, vec![open("p"), text("x"), close("p")]);
    }

    #[test]
    fn script_raw_text_mode() {
        let toks = tokenize("<script>if (a < b) { x(\"<p>\"); }</script><p>y</p>");
        assert_eq!(toks[0], open("script"));
        assert_eq!(toks[1], text("if (a < b) { x(\"<p>\"); }"));
        assert_eq!(toks[2], close("script"));
        assert_eq!(toks[3], open("p"));
    }

    #[test]
    fn style_raw_text_mode() {
        let toks = tokenize("<style>a > b { color: red }</style>");
        assert_eq!(toks[1], text("a > b { color: red }"));
    }

    #[test]
    fn unterminated_raw_text() {
        let toks = tokenize("<script>var x = 1;");
        assert_eq!(toks[1], text("var x = 1;"));
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn named_and_numeric_entities() {
        let toks = tokenize("a &amp; b &lt;c&gt; &quot;d&quot; &#39;e&#39; &#x41;&nbsp;f");
        assert_eq!(toks, vec![text("a & b <c> \"d\" 'e' A\u{00A0}f")]);
    }

    #[test]
    fn unknown_entity_left_verbatim() {
        let toks = tokenize("x &bogus; y &incomplete");
        assert_eq!(toks, vec![text("x &bogus; y &incomplete")]);
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let toks = tokenize("1 < 2 and <3");
        assert_eq!(toks, vec![text("1 < 2 and <3")]);
    }

    #[test]
    fn uppercase_names_lowered() {
        let toks = tokenize("<DIV CLASS=a></DIV>");
        let Token::Open { name, attrs } = &toks[0] else {
            panic!()
        };
        assert_eq!(name, "div");
        assert_eq!(attrs.get("class"), Some("a"));
        assert_eq!(toks[1], close("div"));
    }

    #[test]
    fn never_panics_on_garbage() {
        // Malformed input is consumed without aborting.
        for s in [
            "<", "<<", "</", "<a", "<a href", "<a href=", "<a href='x", "<!--", "<!", "&", "&#",
            "&#x", "<p/q>", "\u{0}\u{fffd}<>",
        ] {
            let _ = tokenize(s);
        }
    }
}
