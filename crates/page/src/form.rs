//! Form runtime and submission.
//!
//! Widget blueprints carry the static shape; this module holds the
//! mutable side — current value, cursor, checked flag, selected index —
//! plus radio-group exclusion and `application/x-www-form-urlencoded`
//! serialization of a form's field set.

use common::form_urlencode;
use html::{FormBlueprint, FormMethod, WidgetBlueprint, WidgetKind};

/// Mutable state of one widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetState {
    pub value: String,
    pub cursor: usize,
    pub checked: bool,
    pub selected: usize,
}

impl WidgetState {
    pub fn from_blueprint(bp: &WidgetBlueprint) -> Self {
        Self {
            value: bp.value.clone(),
            cursor: bp.value.chars().count(),
            checked: bp.checked,
            selected: bp.selected,
        }
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        let byte = byte_index(&self.value, self.cursor);
        self.value.insert(byte, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte = byte_index(&self.value, self.cursor);
        self.value.remove(byte);
    }

    pub fn move_cursor(&mut self, delta: i32) {
        let len = self.value.chars().count() as i32;
        self.cursor = (self.cursor as i32 + delta).clamp(0, len) as usize;
    }
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Fresh runtime states for a new document.
pub fn init_states(blueprints: &[WidgetBlueprint]) -> Vec<WidgetState> {
    blueprints.iter().map(WidgetState::from_blueprint).collect()
}

/// Check a checkbox or radio. Radio groups, keyed by
/// `(form_index, name)`, are mutually exclusive.
pub fn set_checked(
    blueprints: &[WidgetBlueprint],
    states: &mut [WidgetState],
    index: usize,
    checked: bool,
) {
    let bp = &blueprints[index];
    match bp.kind {
        WidgetKind::Checkbox => states[index].checked = checked,
        WidgetKind::Radio => {
            if !checked {
                return;
            }
            for (i, other) in blueprints.iter().enumerate() {
                if other.kind == WidgetKind::Radio
                    && other.form_index == bp.form_index
                    && other.name == bp.name
                {
                    states[i].checked = i == index;
                }
            }
        }
        _ => {}
    }
}

/// Serialize the submittable fields of form `form_index`.
///
/// `submitter` is the submit control that fired, included when named.
/// Encoding: `name=value` pairs joined by `&`, space as `+`, everything
/// outside `[A-Za-z0-9-_.~]` percent-escaped.
pub fn serialize_form(
    blueprints: &[WidgetBlueprint],
    states: &[WidgetState],
    form_index: usize,
    submitter: Option<usize>,
) -> String {
    let mut pairs = Vec::new();
    for (i, bp) in blueprints.iter().enumerate() {
        if bp.form_index != Some(form_index) || bp.disabled || !bp.kind.submits() {
            continue;
        }
        let Some(name) = &bp.name else { continue };
        let state = &states[i];

        match bp.kind {
            WidgetKind::Checkbox | WidgetKind::Radio => {
                if state.checked {
                    let value = if bp.value.is_empty() { "on" } else { &bp.value };
                    pairs.push(form_urlencode(name, value));
                }
            }
            WidgetKind::Select => {
                if let Some((value, _)) = bp.options.get(state.selected) {
                    pairs.push(form_urlencode(name, value));
                }
            }
            WidgetKind::Submit => {
                if submitter == Some(i) {
                    pairs.push(form_urlencode(name, &state.value));
                }
            }
            _ => pairs.push(form_urlencode(name, &state.value)),
        }
    }
    pairs.join("&")
}

/// Where and how a form submission navigates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Navigate to the action with the query attached.
    Get { url: String },
    /// POST the payload to the action.
    Post { url: String, body: String },
}

/// Build the submission for a form against its document's base URL.
pub fn submit(
    form: &FormBlueprint,
    blueprints: &[WidgetBlueprint],
    states: &[WidgetState],
    form_index: usize,
    submitter: Option<usize>,
    base: &url_parser::Url,
) -> Option<Submission> {
    let payload = serialize_form(blueprints, states, form_index, submitter);
    let action = form.action.as_deref().unwrap_or("");
    let target = base.join(action).ok()?;

    Some(match form.method {
        FormMethod::Get => {
            // A GET submission replaces any existing query.
            let path = target.path_only();
            Submission::Get {
                url: format!("{}{}?{}", target.origin(), path, payload),
            }
        }
        FormMethod::Post => Submission::Post {
            url: target.raw.clone(),
            body: payload,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use url_parser::Url;

    fn parse_widgets(html_src: &str) -> (Vec<FormBlueprint>, Vec<WidgetBlueprint>) {
        let (_, extract) = html::parse(html_src);
        (extract.forms, extract.widgets)
    }

    // q="a b" submits as http://h/s?q=a+b
    #[test]
    fn get_submit_builds_query() {
        let (forms, bps) = parse_widgets(
            "<form action='/s' method='get'>\
             <input name='q' value='a b'>\
             <input type='submit'>\
             </form>",
        );
        let states = init_states(&bps);
        let base = Url::parse("http://h/").unwrap();
        let sub = submit(&forms[0], &bps, &states, 0, Some(1), &base).unwrap();
        assert_eq!(
            sub,
            Submission::Get {
                url: "http://h/s?q=a+b".to_string()
            }
        );
    }

    #[test]
    fn post_submit_carries_body() {
        let (forms, bps) = parse_widgets(
            "<form action='/login' method='post'>\
             <input name='user' value='jo'>\
             <input name='pass' type='password' value='p w'>\
             </form>",
        );
        let states = init_states(&bps);
        let base = Url::parse("https://h/app/").unwrap();
        let sub = submit(&forms[0], &bps, &states, 0, None, &base).unwrap();
        assert_eq!(
            sub,
            Submission::Post {
                url: "https://h/login".to_string(),
                body: "user=jo&pass=p+w".to_string()
            }
        );
    }

    #[test]
    fn unchecked_boxes_omitted() {
        let (_, bps) = parse_widgets(
            "<form><input type=checkbox name=a checked>\
             <input type=checkbox name=b></form>",
        );
        let states = init_states(&bps);
        assert_eq!(serialize_form(&bps, &states, 0, None), "a=on");
    }

    #[test]
    fn radio_groups_are_exclusive() {
        let (_, bps) = parse_widgets(
            "<form><input type=radio name=r value=1 checked>\
             <input type=radio name=r value=2>\
             <input type=radio name=other value=x checked></form>",
        );
        let mut states = init_states(&bps);
        assert!(states[0].checked);

        set_checked(&bps, &mut states, 1, true);
        assert!(!states[0].checked);
        assert!(states[1].checked);
        // A different group is untouched.
        assert!(states[2].checked);

        assert_eq!(serialize_form(&bps, &states, 0, None), "r=2&other=x");
    }

    #[test]
    fn select_submits_selected_value() {
        let (_, bps) = parse_widgets(
            "<form><select name=s>\
             <option value=a>A</option><option value=b selected>B</option>\
             </select></form>",
        );
        let mut states = init_states(&bps);
        assert_eq!(serialize_form(&bps, &states, 0, None), "s=b");
        states[0].selected = 0;
        assert_eq!(serialize_form(&bps, &states, 0, None), "s=a");
    }

    #[test]
    fn disabled_and_nameless_fields_skipped() {
        let (_, bps) = parse_widgets(
            "<form><input name=a value=1 disabled>\
             <input value=2>\
             <input name=c value=3></form>",
        );
        let states = init_states(&bps);
        assert_eq!(serialize_form(&bps, &states, 0, None), "c=3");
    }

    #[test]
    fn named_submitter_included() {
        let (_, bps) = parse_widgets(
            "<form><input type=submit name=go value=Send>\
             <input type=submit name=alt value=Other></form>",
        );
        let states = init_states(&bps);
        assert_eq!(serialize_form(&bps, &states, 0, Some(0)), "go=Send");
        assert_eq!(serialize_form(&bps, &states, 0, Some(1)), "alt=Other");
        assert_eq!(serialize_form(&bps, &states, 0, None), "");
    }

    #[test]
    fn hidden_fields_submit() {
        let (_, bps) = parse_widgets("<form><input type=hidden name=t value=tok></form>");
        let states = init_states(&bps);
        assert_eq!(serialize_form(&bps, &states, 0, None), "t=tok");
    }

    #[test]
    fn editing_tracks_cursor() {
        let mut s = WidgetState {
            value: "ab".into(),
            cursor: 2,
            checked: false,
            selected: 0,
        };
        s.insert('c');
        assert_eq!(s.value, "abc");
        s.move_cursor(-2);
        s.insert('x');
        assert_eq!(s.value, "axbc");
        s.backspace();
        assert_eq!(s.value, "abc");
        assert_eq!(s.cursor, 1);
        s.move_cursor(10);
        assert_eq!(s.cursor, 3);
    }

    #[test]
    fn special_characters_escape() {
        let (_, bps) = parse_widgets("<form><input name='k' value='a&b=c?'></form>");
        let states = init_states(&bps);
        assert_eq!(serialize_form(&bps, &states, 0, None), "k=a%26b%3Dc%3F");
    }
}
