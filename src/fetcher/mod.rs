//! # Option Fetcher
//!
//! Turns the current upstream selection into the option list of one field,
//! and the final make/year/model into the matching product set.
//!
//! [`FitmentService`] is the transport seam; [`HttpFitmentService`] talks to
//! the fitment API over HTTP. [`OptionFetcher`] sits on top of any service and
//! applies the display order each field expects.

pub mod client;

pub use client::HttpFitmentService;

use crate::fields::{FieldKind, InvalidSelectionError, Selection};
use crate::submit::FitmentProduct;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Connection error - unable to reach the fitment service: {0}")]
    Connection(String),

    #[error("Request timeout - the fitment service took too long to respond")]
    Timeout,

    #[error("Authentication failed - check the API token")]
    Unauthorized,

    #[error("Access forbidden - insufficient permissions")]
    Forbidden,

    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// The upstream values an options lookup is scoped to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OptionFilters {
    pub type_: Option<String>,
    pub year: Option<String>,
    pub make: Option<String>,
}

impl OptionFilters {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_type(type_: impl Into<String>) -> Self {
        Self {
            type_: Some(type_.into()),
            ..Self::default()
        }
    }

    pub fn for_vehicle(
        type_: impl Into<String>,
        year: impl Into<String>,
        make: impl Into<String>,
    ) -> Self {
        Self {
            type_: Some(type_.into()),
            year: Some(year.into()),
            make: Some(make.into()),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("type", self.type_.as_deref()),
            ("year", self.year.as_deref()),
            ("make", self.make.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Make, year and model of a complete selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub make: String,
    pub year: String,
    pub model: String,
}

impl ProductQuery {
    pub fn from_selection(selection: &Selection) -> Result<Self, InvalidSelectionError> {
        Ok(Self {
            make: selection.require(FieldKind::Make)?.to_string(),
            year: selection.require(FieldKind::Year)?.to_string(),
            model: selection.require(FieldKind::Model)?.to_string(),
        })
    }

    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("make", self.make.as_str()),
            ("year", self.year.as_str()),
            ("model", self.model.as_str()),
        ]
    }
}

#[async_trait]
pub trait FitmentService: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Raw option values for `kind`, in service order.
    async fn options(
        &self,
        kind: FieldKind,
        filters: &OptionFilters,
    ) -> Result<Vec<String>, LookupError>;

    async fn products(&self, query: &ProductQuery) -> Result<Vec<FitmentProduct>, LookupError>;
}

#[derive(Clone)]
pub struct OptionFetcher {
    service: Arc<dyn FitmentService>,
}

impl OptionFetcher {
    pub fn new(service: Arc<dyn FitmentService>) -> Self {
        Self { service }
    }

    #[instrument(skip_all, fields(service = self.service.name(), kind = %kind))]
    pub async fn fetch_options(
        &self,
        kind: FieldKind,
        filters: &OptionFilters,
    ) -> Result<Vec<String>, LookupError> {
        let values = self.service.options(kind, filters).await?;
        Ok(order_options(kind, values))
    }

    #[instrument(skip_all, fields(service = self.service.name(), model = %query.model))]
    pub async fn fetch_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<FitmentProduct>, LookupError> {
        self.service.products(query).await
    }
}

/// Display order per field: years newest first, makes and models
/// alphabetical, types as the service sends them.
pub fn order_options(kind: FieldKind, mut values: Vec<String>) -> Vec<String> {
    match kind {
        FieldKind::Type => {}
        FieldKind::Year => {
            values.sort();
            values.reverse();
        }
        FieldKind::Make | FieldKind::Model => values.sort(),
    }
    values
}
