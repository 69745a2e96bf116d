//! Widget box sizing.

use html::{WidgetBlueprint, WidgetKind};

use crate::{CHAR_W, LINE_BASE};

/// Height of single-line controls.
pub const CONTROL_H: f32 = 22.0;
/// Checkbox/radio square.
pub const TOGGLE_SIZE: f32 = 14.0;
/// Horizontal padding inside buttons.
pub const BUTTON_PAD: f32 = 8.0;
/// Room for the select drop arrow.
pub const SELECT_ARROW_W: f32 = 16.0;

/// The box a widget reserves in the inline flow.
pub fn widget_size(bp: &WidgetBlueprint) -> (f32, f32) {
    match bp.kind {
        WidgetKind::Text | WidgetKind::Password => {
            (bp.size.max(1) as f32 * CHAR_W, CONTROL_H)
        }
        WidgetKind::Hidden => (0.0, 0.0),
        WidgetKind::Checkbox | WidgetKind::Radio => (TOGGLE_SIZE, TOGGLE_SIZE),
        WidgetKind::Submit | WidgetKind::Button => (
            bp.value.chars().count().max(1) as f32 * CHAR_W + 2.0 * BUTTON_PAD,
            CONTROL_H,
        ),
        WidgetKind::Textarea => (
            bp.cols.max(1) as f32 * CHAR_W,
            bp.rows.max(1) as f32 * LINE_BASE,
        ),
        WidgetKind::Select => {
            let longest = bp
                .options
                .iter()
                .map(|(_, label)| label.chars().count())
                .max()
                .unwrap_or(1) as f32;
            (longest * CHAR_W + SELECT_ARROW_W, CONTROL_H)
        }
    }
}
