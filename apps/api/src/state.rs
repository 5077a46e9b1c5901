use std::sync::Arc;

use crate::autofill::orchestrator::AutofillEngine;
use crate::resume::parser::ResumeParser;
use crate::store::{DocumentPayloadStore, ProfileStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Catalogs and tuning, built once at startup. Each request wraps it in its own
    /// `Orchestrator`, since the busy flag guards one page, not the whole service.
    pub engine: Arc<AutofillEngine>,
    pub profiles: Arc<dyn ProfileStore>,
    pub documents: Arc<dyn DocumentPayloadStore>,
    pub resume_parser: Arc<ResumeParser>,
}
