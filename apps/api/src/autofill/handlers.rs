use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::autofill::classifier::MatchResult;
use crate::autofill::collector::FieldDescriptor;
use crate::autofill::orchestrator::{Orchestrator, RunSummary};
use crate::autofill::platform::Platform;
use crate::dom::{ControlState, PageSnapshot, VirtualDocument};
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::hydrate_resume;

#[derive(Deserialize)]
pub struct RunRequest {
    pub user_id: Uuid,
    pub page: PageSnapshot,
}

#[derive(Serialize)]
pub struct RunResponse {
    pub summary: RunSummary,
    /// Control values after the run, in document order.
    pub controls: Vec<ControlState>,
}

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub page: PageSnapshot,
}

#[derive(Serialize)]
pub struct ClassifiedField {
    pub field: FieldDescriptor,
    #[serde(rename = "match")]
    pub result: MatchResult,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    pub platform: Platform,
    pub fields: Vec<ClassifiedField>,
}

/// POST /api/v1/autofill/run
pub async fn handle_run(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let mut profile = state
        .profiles
        .load(req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {} not found", req.user_id)))?;

    // The payload is only needed when the page has somewhere to upload it.
    let mut resume_error = None;
    if req.page.has_file_input() {
        if let Err(e) = hydrate_resume(&mut profile, state.documents.as_ref()).await {
            warn!(user_id = %req.user_id, "Resume payload unavailable, continuing without it: {e:#}");
            resume_error = Some(format!("{e:#}"));
        }
    }

    let doc = VirtualDocument::new(req.page);
    let mut summary = Orchestrator::new(state.engine.clone())
        .run(&doc, &profile)
        .await;
    if let Some(reason) = resume_error {
        summary.record_unavailable_resume(&reason);
    }
    info!(
        user_id = %req.user_id,
        platform = ?summary.platform,
        filled = summary.filled_count,
        "Autofill run served"
    );

    Ok(Json(RunResponse {
        summary,
        controls: doc.states().await,
    }))
}

/// POST /api/v1/autofill/classify
pub async fn handle_classify(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let doc = VirtualDocument::new(req.page);
    let (platform, matches) = state
        .engine
        .classify_page(&doc)
        .await
        .map_err(|e| AppError::Validation(format!("Could not read page: {e}")))?;

    Ok(Json(ClassifyResponse {
        platform: platform.platform,
        fields: matches
            .into_iter()
            .map(|(field, result)| ClassifiedField { field, result })
            .collect(),
    }))
}
