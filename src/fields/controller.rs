//! Cascade rules for the Type → Year → Make → Model chain.
//!
//! The controller never performs I/O. Selecting a value returns the
//! [`FetchTicket`]s the caller has to run; each ticket carries the upstream
//! filters it was issued for and the field's request generation. A result is
//! applied only while its ticket is still the field's latest request and the
//! upstream selection still matches, so a slow answer for an old combination
//! can never overwrite newer state.

use super::{Field, FieldKind, InvalidSelectionError, Selection};
use crate::fetcher::{LookupError, OptionFilters, ProductQuery};
use crate::submit::{SubmitButton, SubmitState};
use tracing::{debug, error};

/// Finite state of the whole selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorPhase {
    FetchingTypes,
    Idle,
    FetchingYearsAndMakes,
    FetchingModels,
    Submitting,
    NavigatedAway,
}

/// A rendered control whose state changed since the last render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Field(FieldKind),
    Submit,
}

/// An options fetch the controller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: FieldKind,
    pub filters: OptionFilters,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Options were loaded and the field enabled.
    Applied,
    /// The ticket was stale; nothing changed.
    Discarded,
    /// The lookup failed; the field was left disabled and empty.
    Failed,
}

pub struct FieldController {
    fields: [Field; 4],
    issued: [u64; 4],
    pending: [Option<u64>; 4],
    submit: SubmitButton,
    changed: Vec<Control>,
}

impl FieldController {
    pub fn new(idle_label: impl Into<String>) -> Self {
        Self {
            fields: FieldKind::ALL.map(Field::new),
            issued: [0; 4],
            pending: [None; 4],
            submit: SubmitButton::new(idle_label),
            changed: Vec::new(),
        }
    }

    pub fn field(&self, kind: FieldKind) -> &Field {
        &self.fields[kind.index()]
    }

    pub fn submit_button(&self) -> &SubmitButton {
        &self.submit
    }

    pub fn selection(&self) -> Selection {
        let owned = |kind| self.field(kind).value().map(str::to_owned);
        Selection {
            type_: owned(FieldKind::Type),
            year: owned(FieldKind::Year),
            make: owned(FieldKind::Make),
            model: owned(FieldKind::Model),
        }
    }

    pub fn phase(&self) -> SelectorPhase {
        match self.submit.state {
            SubmitState::Submitting => return SelectorPhase::Submitting,
            SubmitState::NavigatedAway => return SelectorPhase::NavigatedAway,
            SubmitState::Idle => {}
        }

        if self.is_pending(FieldKind::Type) {
            SelectorPhase::FetchingTypes
        } else if self.is_pending(FieldKind::Year) || self.is_pending(FieldKind::Make) {
            SelectorPhase::FetchingYearsAndMakes
        } else if self.is_pending(FieldKind::Model) {
            SelectorPhase::FetchingModels
        } else {
            SelectorPhase::Idle
        }
    }

    pub fn is_pending(&self, kind: FieldKind) -> bool {
        self.pending[kind.index()].is_some()
    }

    /// Controls touched since the previous call.
    pub fn take_changes(&mut self) -> Vec<Control> {
        std::mem::take(&mut self.changed)
    }

    /* ---------- FETCH LIFECYCLE ---------- */

    /// Requests the Type options. Called once when the selector is attached,
    /// and again by hosts that want to retry a failed load.
    pub fn load_types(&mut self) -> FetchTicket {
        self.issue(FieldKind::Type, OptionFilters::none())
    }

    /// True while `ticket` is the latest request for its field and the
    /// upstream values it was issued for are still selected.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.pending[ticket.kind.index()] == Some(ticket.generation)
            && self.current_filters(ticket.kind).as_ref() == Some(&ticket.filters)
    }

    pub fn resolve(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<String>, &LookupError>,
    ) -> Resolution {
        let kind = ticket.kind;
        if !self.is_current(ticket) {
            debug!(
                field = %kind,
                generation = ticket.generation,
                "Discarding stale options response"
            );
            return Resolution::Discarded;
        }

        self.pending[kind.index()] = None;
        let had_value = self.field(kind).has_value();

        let resolution = match result {
            Ok(values) => {
                debug!(field = %kind, count = values.len(), "Options loaded");
                let field = self.field_mut(kind);
                field.populate(values);
                field.enabled = true;
                Resolution::Applied
            }
            Err(e) => {
                error!(field = %kind, error = %e, "Error fetching options");
                self.field_mut(kind).reset();
                Resolution::Failed
            }
        };

        // Repopulating drops the current value, which invalidates everything below.
        if had_value {
            self.clear_downstream(kind);
        }

        resolution
    }

    /* ---------- USER INPUT ---------- */

    /// Applies a user choice on `kind`. An empty `value` is the placeholder.
    pub fn select(
        &mut self,
        kind: FieldKind,
        value: &str,
    ) -> Result<Vec<FetchTicket>, InvalidSelectionError> {
        if self.submit.state != SubmitState::Idle {
            return Err(InvalidSelectionError::SubmissionInFlight);
        }

        let field = self.field(kind);
        if !field.enabled {
            return Err(InvalidSelectionError::Disabled(kind));
        }
        if !field.offers(value) {
            return Err(InvalidSelectionError::UnknownOption {
                field: kind,
                value: value.to_string(),
            });
        }

        debug!(field = %kind, value, "Field selected");
        self.field_mut(kind).value = (!value.is_empty()).then(|| value.to_string());

        Ok(match kind {
            FieldKind::Type => self.on_type_selected(),
            FieldKind::Year | FieldKind::Make => self.on_year_or_make_selected(),
            FieldKind::Model => {
                self.on_model_selected();
                Vec::new()
            }
        })
    }

    fn on_type_selected(&mut self) -> Vec<FetchTicket> {
        self.clear_downstream(FieldKind::Type);

        match self.current_filters(FieldKind::Year) {
            Some(filters) => vec![
                self.issue(FieldKind::Year, filters.clone()),
                self.issue(FieldKind::Make, filters),
            ],
            None => Vec::new(),
        }
    }

    fn on_year_or_make_selected(&mut self) -> Vec<FetchTicket> {
        self.clear_downstream(FieldKind::Year);

        match self.current_filters(FieldKind::Model) {
            Some(filters) => vec![self.issue(FieldKind::Model, filters)],
            None => Vec::new(),
        }
    }

    fn on_model_selected(&mut self) {
        let enabled = self.field(FieldKind::Model).has_value();
        self.set_submit_enabled(enabled);
    }

    /* ---------- SUBMISSION ---------- */

    /// Moves Submit into its in-progress state. Type is informational at
    /// this point; the product lookup only needs make, year and model.
    pub(crate) fn begin_submission(
        &mut self,
        busy_label: &str,
    ) -> Result<(Selection, ProductQuery), InvalidSelectionError> {
        if self.submit.state != SubmitState::Idle {
            return Err(InvalidSelectionError::SubmissionInFlight);
        }

        let selection = self.selection();
        let query = ProductQuery::from_selection(&selection)?;

        self.submit.begin(busy_label);
        self.mark(Control::Submit);
        Ok((selection, query))
    }

    pub(crate) fn fail_submission(&mut self, idle_label: &str) {
        self.submit.revert(idle_label);
        self.mark(Control::Submit);
    }

    pub(crate) fn finish_submission(&mut self) {
        self.submit.navigated();
        self.mark(Control::Submit);
    }

    /* ---------- INTERNALS ---------- */

    fn current_filters(&self, kind: FieldKind) -> Option<OptionFilters> {
        let value = |kind| self.field(kind).value();
        match kind {
            FieldKind::Type => Some(OptionFilters::none()),
            FieldKind::Year | FieldKind::Make => value(FieldKind::Type).map(OptionFilters::for_type),
            FieldKind::Model => match (
                value(FieldKind::Type),
                value(FieldKind::Year),
                value(FieldKind::Make),
            ) {
                (Some(type_), Some(year), Some(make)) => {
                    Some(OptionFilters::for_vehicle(type_, year, make))
                }
                _ => None,
            },
        }
    }

    fn clear_downstream(&mut self, kind: FieldKind) {
        for &below in kind.downstream() {
            self.pending[below.index()] = None;
            self.field_mut(below).reset();
        }
        self.set_submit_enabled(false);
    }

    fn issue(&mut self, kind: FieldKind, filters: OptionFilters) -> FetchTicket {
        let idx = kind.index();
        self.issued[idx] += 1;
        let generation = self.issued[idx];
        self.pending[idx] = Some(generation);

        debug!(field = %kind, generation, ?filters, "Issuing options fetch");
        FetchTicket {
            kind,
            filters,
            generation,
        }
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        if self.submit.state == SubmitState::Idle && self.submit.enabled != enabled {
            self.submit.enabled = enabled;
            self.mark(Control::Submit);
        }
    }

    fn field_mut(&mut self, kind: FieldKind) -> &mut Field {
        self.mark(Control::Field(kind));
        &mut self.fields[kind.index()]
    }

    fn mark(&mut self, control: Control) {
        if !self.changed.contains(&control) {
            self.changed.push(control);
        }
    }
}

impl Default for FieldController {
    fn default() -> Self {
        Self::new(crate::config::SubmitLabels::default().idle)
    }
}
