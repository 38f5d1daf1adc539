//! # Vehicle fields
//!
//! The four dependent dropdowns of the selector and the values they hold.
//!
//! ```text
//! Type ──┬──> Year ──┐
//!        └──> Make ──┴──> Model ──> Submit
//! ```
//!
//! Year and Make depend only on Type; Model depends on all three. The
//! [`FieldController`] keeps the chain consistent as upstream values change.

pub mod controller;

pub use controller::{Control, FetchTicket, FieldController, Resolution, SelectorPhase};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Type,
    Year,
    Make,
    Model,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Type,
        FieldKind::Year,
        FieldKind::Make,
        FieldKind::Model,
    ];

    /// Lowercase name, as used in element ids and query parameters.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Type => "type",
            FieldKind::Year => "year",
            FieldKind::Make => "make",
            FieldKind::Model => "model",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Type => "Type",
            FieldKind::Year => "Year",
            FieldKind::Make => "Make",
            FieldKind::Model => "Model",
        }
    }

    /// Fields whose values must be non-empty before this one can be enabled.
    pub fn upstream(self) -> &'static [FieldKind] {
        match self {
            FieldKind::Type => &[],
            FieldKind::Year | FieldKind::Make => &[FieldKind::Type],
            FieldKind::Model => &[FieldKind::Type, FieldKind::Year, FieldKind::Make],
        }
    }

    /// Fields that are cleared whenever this one changes.
    pub fn downstream(self) -> &'static [FieldKind] {
        match self {
            FieldKind::Type => &[FieldKind::Year, FieldKind::Make, FieldKind::Model],
            FieldKind::Year | FieldKind::Make => &[FieldKind::Model],
            FieldKind::Model => &[],
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            FieldKind::Type => 0,
            FieldKind::Year => 1,
            FieldKind::Make => 2,
            FieldKind::Model => 3,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a dropdown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }

    /// The neutral "no selection" entry that heads every option list.
    pub fn placeholder(kind: FieldKind) -> Self {
        Self {
            value: String::new(),
            label: format!("Select {}", kind.label()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub kind: FieldKind,
    pub value: Option<String>,
    pub enabled: bool,
    pub options: Vec<SelectOption>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            value: None,
            enabled: false,
            options: vec![SelectOption::placeholder(kind)],
        }
    }

    /// The selected value, if any. The placeholder counts as no value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn has_value(&self) -> bool {
        self.value().is_some()
    }

    /// Whether `value` is one of the loaded options (the placeholder included).
    pub fn offers(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }

    /// Option values without the placeholder.
    pub fn option_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|option| !option.is_placeholder())
            .map(|option| option.value.as_str())
            .collect()
    }

    pub(crate) fn reset(&mut self) {
        self.value = None;
        self.enabled = false;
        self.options = vec![SelectOption::placeholder(self.kind)];
    }

    pub(crate) fn populate(&mut self, values: Vec<String>) {
        let mut options = Vec::with_capacity(values.len() + 1);
        options.push(SelectOption::placeholder(self.kind));
        options.extend(
            values
                .into_iter()
                .filter(|value| !value.is_empty())
                .map(SelectOption::new),
        );
        self.options = options;
        self.value = None;
    }
}

/// The four field values at a point in time.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub year: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl Selection {
    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        let value = match kind {
            FieldKind::Type => &self.type_,
            FieldKind::Year => &self.year,
            FieldKind::Make => &self.make,
            FieldKind::Model => &self.model,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// First field, in chain order, that holds no value.
    pub fn missing(&self) -> Option<FieldKind> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| self.get(*kind).is_none())
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_none()
    }

    /// Value of `kind`, or the error naming it as missing.
    pub fn require(&self, kind: FieldKind) -> Result<&str, InvalidSelectionError> {
        self.get(kind).ok_or(InvalidSelectionError::Missing(kind))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidSelectionError {
    #[error("{0} has no value selected")]
    Missing(FieldKind),

    #[error("{0} is disabled")]
    Disabled(FieldKind),

    #[error("'{value}' is not an option of {field}")]
    UnknownOption { field: FieldKind, value: String },

    #[error("A submission is already in progress")]
    SubmissionInFlight,
}
