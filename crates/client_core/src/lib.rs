//! Client side of the marks prediction service: binds a form to the
//! `/predict` endpoint and renders what comes back.

pub mod config;
mod controller;
pub mod error;
pub mod page;
pub mod payload;
pub mod transport;

pub use config::{load_settings, ClientSettings};
pub use controller::{
    SubmissionController, SubmissionEvent, SubmissionPhase, SubmitOutcome, PROCESSING_TEXT,
};
pub use error::{MissingElement, SubmitError};
pub use page::{DisplayTargets, MemoryPage, Page, SubmitEvent};
pub use transport::{HttpPredictionEndpoint, PredictionEndpoint, RawResponse};
