//! # Submission Handler
//!
//! Turns a complete selection into a navigation to product search.
//!
//! ```text
//! Idle ──submit──> Submitting ──lookup ok──> NavigatedAway
//!   ^                  │
//!   └────lookup failed─┘
//! ```

pub mod record;
pub mod store;

pub use record::{Destination, FitmentProduct, FitmentProductSet, VehicleRecord};
pub use store::{MemorySessionStore, SessionStore, StoreError};

use crate::config::SubmitLabels;
use crate::fetcher::{LookupError, ProductQuery};
use crate::fields::{FieldController, InvalidSelectionError, Selection};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    /// Terminal; the page is leaving.
    NavigatedAway,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    pub enabled: bool,
    pub label: String,
    pub state: SubmitState,
}

impl SubmitButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            enabled: false,
            label: label.into(),
            state: SubmitState::Idle,
        }
    }

    pub(crate) fn begin(&mut self, busy_label: &str) {
        self.state = SubmitState::Submitting;
        self.enabled = false;
        self.label = busy_label.to_string();
    }

    pub(crate) fn revert(&mut self, idle_label: &str) {
        self.state = SubmitState::Idle;
        self.enabled = true;
        self.label = idle_label.to_string();
    }

    pub(crate) fn navigated(&mut self) {
        self.state = SubmitState::NavigatedAway;
        self.enabled = false;
    }
}

/// Sends the browser somewhere else.
pub trait Navigator: Send {
    fn navigate(&mut self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Navigated(Destination),
    /// The lookup or the session write failed; Submit is usable again.
    Reverted,
}

pub struct SubmissionHandler {
    store: Box<dyn SessionStore>,
    navigator: Box<dyn Navigator>,
    labels: SubmitLabels,
}

impl SubmissionHandler {
    pub fn new(
        store: Box<dyn SessionStore>,
        navigator: Box<dyn Navigator>,
        labels: SubmitLabels,
    ) -> Self {
        Self {
            store,
            navigator,
            labels,
        }
    }

    /// Validates the selection and flips Submit to its busy state.
    pub fn begin(
        &self,
        controller: &mut FieldController,
    ) -> Result<(Selection, ProductQuery), InvalidSelectionError> {
        controller.begin_submission(&self.labels.busy)
    }

    /// Finishes a submission started with [`SubmissionHandler::begin`].
    pub fn complete(
        &mut self,
        controller: &mut FieldController,
        selection: &Selection,
        lookup: Result<Vec<FitmentProduct>, LookupError>,
    ) -> SubmitOutcome {
        let products = match lookup {
            Ok(products) => FitmentProductSet::new(products),
            Err(e) => {
                error!(error = %e, "Error fetching products");
                controller.fail_submission(&self.labels.idle);
                return SubmitOutcome::Reverted;
            }
        };

        let vehicle = VehicleRecord::from(selection);
        if let Err(e) = store::persist(&mut *self.store, &vehicle, &products) {
            error!(error = %e, "Error saving vehicle search");
            controller.fail_submission(&self.labels.idle);
            return SubmitOutcome::Reverted;
        }

        let destination = Destination::for_products(&products);
        let url = destination.url();
        info!(products = products.len(), %url, "Navigating to fitment search");

        controller.finish_submission();
        self.navigator.navigate(&url);
        SubmitOutcome::Navigated(destination)
    }
}
