//! Bindings between the selector and whatever draws it.
//!
//! The host hands in one handle per field plus one for the submit button.
//! Each handle is re-rendered whenever the state it shows changes.

use crate::fields::{Control, Field, FieldController, FieldKind};
use crate::submit::SubmitButton;
use tracing::trace;

pub trait FieldHandle: Send {
    fn render(&mut self, field: &Field);
}

pub trait SubmitHandle: Send {
    fn render(&mut self, button: &SubmitButton);
}

pub struct Handles {
    pub type_: Box<dyn FieldHandle>,
    pub year: Box<dyn FieldHandle>,
    pub make: Box<dyn FieldHandle>,
    pub model: Box<dyn FieldHandle>,
    pub submit: Box<dyn SubmitHandle>,
}

impl Handles {
    /// Handles that only trace what they would draw.
    pub fn detached() -> Self {
        Self {
            type_: Box::new(Detached),
            year: Box::new(Detached),
            make: Box::new(Detached),
            model: Box::new(Detached),
            submit: Box::new(Detached),
        }
    }

    pub fn field_mut(&mut self, kind: FieldKind) -> &mut dyn FieldHandle {
        match kind {
            FieldKind::Type => self.type_.as_mut(),
            FieldKind::Year => self.year.as_mut(),
            FieldKind::Make => self.make.as_mut(),
            FieldKind::Model => self.model.as_mut(),
        }
    }

    pub(crate) fn render(&mut self, changes: Vec<Control>, controller: &FieldController) {
        for control in changes {
            match control {
                Control::Field(kind) => self.field_mut(kind).render(controller.field(kind)),
                Control::Submit => self.submit.render(controller.submit_button()),
            }
        }
    }
}

struct Detached;

impl FieldHandle for Detached {
    fn render(&mut self, field: &Field) {
        trace!(
            field = %field.kind,
            enabled = field.enabled,
            value = field.value().unwrap_or(""),
            options = field.options.len(),
            "render field"
        );
    }
}

impl SubmitHandle for Detached {
    fn render(&mut self, button: &SubmitButton) {
        trace!(enabled = button.enabled, label = %button.label, "render submit");
    }
}
