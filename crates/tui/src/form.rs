//! Form fields shared by every screen that edits a draft.

use autoparts_core::{validation::FORM_FIELD, FieldErrors, FormDraft};
use crossterm::event::KeyCode;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// One editable input on a form.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire name of the field in the draft.
    pub key: &'static str,
    /// Label shown to the user.
    pub label: &'static str,
    /// Render the value as asterisks.
    pub masked: bool,
}

const fn field(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        masked: false,
    }
}

const fn secret(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        masked: true,
    }
}

pub const LOGIN_FIELDS: &[FieldSpec] = &[field("email", "Email"), secret("password", "Password")];

pub const REGISTER_FIELDS: &[FieldSpec] = &[
    field("name", "Name"),
    field("lastname", "Last name"),
    field("email", "Email"),
    secret("password", "Password"),
];

pub const CATEGORY_FIELDS: &[FieldSpec] =
    &[field("name", "Name"), field("description", "Description")];

pub const PART_FIELDS: &[FieldSpec] = &[
    field("name", "Name"),
    field("categoryId", "Category"),
    field("price", "Price"),
    field("stock", "Stock"),
];

/// Cursor and error state of the form currently on screen.
#[derive(Debug, Default)]
pub struct FormView {
    pub focus: usize,
    pub errors: FieldErrors,
}

impl FormView {
    pub fn reset(&mut self) {
        self.focus = 0;
        self.errors = FieldErrors::new();
    }

    pub fn move_focus(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.focus = 0;
            return;
        }
        let total = total as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(total) as usize;
    }

    /// Drop the message shown under `key` once the user edits it.
    pub fn clear_error(&mut self, key: &str) {
        self.errors.remove(key);
    }

    /// Message for errors that do not belong to a single field.
    pub fn form_error(&self) -> Option<&str> {
        self.errors.get(FORM_FIELD)
    }
}

/// Apply a text-editing key to `key` in `draft`. Returns whether it was used.
pub fn edit_text(draft: &mut dyn FormDraft, key: &str, code: KeyCode) -> bool {
    let mut value = draft.field(key).unwrap_or_default().to_string();
    match code {
        KeyCode::Char(ch) => value.push(ch),
        KeyCode::Backspace => {
            value.pop();
        }
        _ => return false,
    }
    draft.set_field(key, value);
    true
}

/// Lines for every field: label and value, then the field's error if any.
///
/// `display` may replace a raw value (e.g. an id) with something readable.
pub fn render_fields<'a>(
    fields: &[FieldSpec],
    draft: &dyn FormDraft,
    view: &FormView,
    focused: bool,
    display: impl Fn(&FieldSpec, &str) -> String,
) -> Vec<Line<'a>> {
    let mut lines = Vec::with_capacity(fields.len() * 3);
    for (idx, spec) in fields.iter().enumerate() {
        let raw = draft.field(spec.key).unwrap_or_default();
        let value = if spec.masked {
            "*".repeat(raw.chars().count())
        } else {
            display(spec, raw)
        };
        let active = focused && idx == view.focus;
        let label_style = if active {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if active { "▏" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", spec.label), label_style),
            Span::raw(format!("{value}{cursor}")),
        ]));
        if let Some(message) = view.errors.get(spec.key) {
            lines.push(Line::from(Span::styled(
                format!("{:<12}{message}", ""),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(""));
    }
    if let Some(message) = view.form_error() {
        lines.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoparts_core::validation::LoginForm;

    #[test]
    fn typing_and_backspace_edit_the_focused_field() {
        let mut form = LoginForm::default();
        assert!(edit_text(&mut form, "email", KeyCode::Char('a')));
        assert!(edit_text(&mut form, "email", KeyCode::Char('b')));
        assert!(edit_text(&mut form, "email", KeyCode::Backspace));
        assert!(!edit_text(&mut form, "email", KeyCode::Left));
        assert_eq!(form.email, "a");
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut view = FormView::default();
        view.errors.insert("email", "Email is invalid");
        view.errors.insert("password", "Password is required");
        view.clear_error("email");
        assert_eq!(view.errors.get("email"), None);
        assert_eq!(view.errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn focus_wraps_around() {
        let mut view = FormView::default();
        view.move_focus(-1, 4);
        assert_eq!(view.focus, 3);
        view.move_focus(1, 4);
        assert_eq!(view.focus, 0);
    }
}
