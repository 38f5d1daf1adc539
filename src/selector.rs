//! # Fitment Selector
//!
//! One selector instance: the field controller, the option fetcher and the
//! submission handler wired to the host's handles, session store and
//! navigator.
//!
//! Fetches never block user input. [`FitmentSelector::select`] queues the
//! lookups it triggers and returns at once; the host drives them with
//! [`FitmentSelector::next_resolution`] or [`FitmentSelector::settle`] from
//! its own event loop. Answers that arrive for an upstream selection that is
//! no longer current are dropped.

use crate::config::{ConfigError, SelectorConfig};
use crate::fetcher::{FitmentService, HttpFitmentService, LookupError, OptionFetcher};
use crate::fields::{
    Control, FetchTicket, Field, FieldController, FieldKind, InvalidSelectionError, Resolution,
    Selection, SelectorPhase,
};
use crate::handles::Handles;
use crate::submit::{Navigator, SessionStore, SubmissionHandler, SubmitButton, SubmitOutcome};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] InvalidSelectionError),

    #[error("The selector has already navigated away")]
    NavigatedAway,
}

pub type SelectorResult<T> = Result<T, SelectorError>;

struct FetchOutcome {
    ticket: FetchTicket,
    result: Result<Vec<String>, LookupError>,
}

pub struct FitmentSelector {
    config: SelectorConfig,
    controller: FieldController,
    fetcher: OptionFetcher,
    submission: SubmissionHandler,
    handles: Handles,
    in_flight: FuturesUnordered<BoxFuture<'static, FetchOutcome>>,
}

impl FitmentSelector {
    pub fn new(
        config: SelectorConfig,
        service: Arc<dyn FitmentService>,
        store: Box<dyn SessionStore>,
        navigator: Box<dyn Navigator>,
        handles: Handles,
    ) -> Self {
        let controller = FieldController::new(config.labels.idle.clone());
        let submission = SubmissionHandler::new(store, navigator, config.labels.clone());

        Self {
            config,
            controller,
            fetcher: OptionFetcher::new(service),
            submission,
            handles,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Builds a selector that talks to the fitment API named in `config`.
    pub fn from_config(
        config: SelectorConfig,
        store: Box<dyn SessionStore>,
        navigator: Box<dyn Navigator>,
        handles: Handles,
    ) -> SelectorResult<Self> {
        config.validate()?;
        let service = Arc::new(HttpFitmentService::new(&config)?);
        Ok(Self::new(config, service, store, navigator, handles))
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn field(&self, kind: FieldKind) -> &Field {
        self.controller.field(kind)
    }

    pub fn submit_button(&self) -> &SubmitButton {
        self.controller.submit_button()
    }

    pub fn selection(&self) -> Selection {
        self.controller.selection()
    }

    pub fn phase(&self) -> SelectorPhase {
        self.controller.phase()
    }

    /// Number of fetches not yet resolved, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Draws every control and starts loading the Type options.
    #[instrument(skip(self), fields(section = %self.config.section_id))]
    pub fn connect(&mut self) {
        info!("Connecting fitment selector");
        let ticket = self.controller.load_types();
        self.dispatch(ticket);

        self.controller.take_changes();
        let all = FieldKind::ALL
            .into_iter()
            .map(Control::Field)
            .chain(std::iter::once(Control::Submit))
            .collect();
        self.handles.render(all, &self.controller);
    }

    /* ---------- USER INPUT ---------- */

    #[instrument(skip(self), fields(section = %self.config.section_id))]
    pub fn select(&mut self, kind: FieldKind, value: &str) -> SelectorResult<()> {
        self.ensure_attached()?;
        let tickets = self.controller.select(kind, value)?;
        for ticket in tickets {
            self.dispatch(ticket);
        }
        self.render();
        Ok(())
    }

    pub fn on_type_selected(&mut self, value: &str) -> SelectorResult<()> {
        self.select(FieldKind::Type, value)
    }

    pub fn on_year_selected(&mut self, value: &str) -> SelectorResult<()> {
        self.select(FieldKind::Year, value)
    }

    pub fn on_make_selected(&mut self, value: &str) -> SelectorResult<()> {
        self.select(FieldKind::Make, value)
    }

    pub fn on_model_selected(&mut self, value: &str) -> SelectorResult<()> {
        self.select(FieldKind::Model, value)
    }

    /// Resolves products for the current vehicle, stores the search for the
    /// destination page and navigates. A failed lookup is not an error here:
    /// it comes back as [`SubmitOutcome::Reverted`] with Submit usable again.
    #[instrument(skip(self), fields(section = %self.config.section_id))]
    pub async fn submit(&mut self) -> SelectorResult<SubmitOutcome> {
        self.ensure_attached()?;
        let (selection, query) = self.submission.begin(&mut self.controller)?;
        self.render();

        let lookup = self.fetcher.fetch_products(&query).await;
        let outcome = self
            .submission
            .complete(&mut self.controller, &selection, lookup);
        self.render();
        Ok(outcome)
    }

    /* ---------- FETCH DRIVING ---------- */

    /// Waits for the next fetch to finish and applies it if still current.
    /// Returns `None` when nothing is in flight.
    pub async fn next_resolution(&mut self) -> Option<(FieldKind, Resolution)> {
        let FetchOutcome { ticket, result } = self.in_flight.next().await?;

        let resolution = match result {
            Ok(values) => self.controller.resolve(&ticket, Ok(values)),
            Err(e) => self.controller.resolve(&ticket, Err(&e)),
        };
        self.render();
        Some((ticket.kind, resolution))
    }

    /// Drives every in-flight fetch to completion.
    pub async fn settle(&mut self) {
        while self.next_resolution().await.is_some() {}
    }

    fn dispatch(&mut self, ticket: FetchTicket) {
        let fetcher = self.fetcher.clone();
        self.in_flight.push(
            async move {
                let result = fetcher.fetch_options(ticket.kind, &ticket.filters).await;
                FetchOutcome { ticket, result }
            }
            .boxed(),
        );
    }

    fn render(&mut self) {
        let changes = self.controller.take_changes();
        self.handles.render(changes, &self.controller);
    }

    fn ensure_attached(&self) -> SelectorResult<()> {
        if self.controller.phase() == SelectorPhase::NavigatedAway {
            return Err(SelectorError::NavigatedAway);
        }
        Ok(())
    }
}
