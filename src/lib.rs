//! Cascading vehicle fitment selector.
//!
//! A shopper narrows the catalog by vehicle type, year, make and model, each
//! dropdown fed by the fitment service from the values above it, then is sent
//! to a product search scoped to the parts that fit.

pub mod config;
pub mod fetcher;
pub mod fields;
pub mod handles;
pub mod selector;
pub mod submit;
pub mod telemetry;

pub use config::{ConfigError, SelectorConfig, SubmitLabels};
pub use fetcher::{FitmentService, HttpFitmentService, LookupError, OptionFetcher, OptionFilters, ProductQuery};
pub use fields::{Field, FieldKind, InvalidSelectionError, Resolution, Selection, SelectorPhase};
pub use handles::{FieldHandle, Handles, SubmitHandle};
pub use selector::{FitmentSelector, SelectorError, SelectorResult};
pub use submit::{
    Destination, FitmentProduct, FitmentProductSet, MemorySessionStore, Navigator, SessionStore,
    SubmitButton, SubmitOutcome, SubmitState, VehicleRecord,
};
