use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::resume::extract::extract_text;
use crate::resume::parser::ParsedResume;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MergeQuery {
    /// When set, the parse result is merged into this user's stored profile for preview.
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct ParseTextRequest {
    pub text: String,
    pub user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ParseResumeResponse {
    pub parsed: ParsedResume,
    /// The stored profile with empty fields filled from `parsed`. Not persisted.
    pub merged_profile: Option<Profile>,
    pub fields_applied: usize,
}

/// POST /api/v1/resume/parse
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    Query(params): Query<MergeQuery>,
    mut multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let media_type = field
            .content_type()
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        upload = Some((bytes, media_type));
        break;
    }
    let (bytes, media_type) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let text = tokio::task::spawn_blocking(move || extract_text(&bytes, &media_type))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))??;
    info!("Extracted {} characters of resume text", text.len());

    parse_and_merge(&state, &text, params.user_id).await.map(Json)
}

/// POST /api/v1/resume/parse-text
pub async fn handle_parse_text(
    State(state): State<AppState>,
    Json(req): Json<ParseTextRequest>,
) -> Result<Json<ParseResumeResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    parse_and_merge(&state, &req.text, req.user_id).await.map(Json)
}

async fn parse_and_merge(
    state: &AppState,
    text: &str,
    user_id: Option<Uuid>,
) -> Result<ParseResumeResponse, AppError> {
    let parsed = state.resume_parser.parse(text);

    let Some(user_id) = user_id else {
        return Ok(ParseResumeResponse {
            parsed,
            merged_profile: None,
            fields_applied: 0,
        });
    };

    let mut profile = state
        .profiles
        .load(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))?;
    let fields_applied = parsed.apply_to(&mut profile);

    Ok(ParseResumeResponse {
        parsed,
        merged_profile: Some(profile),
        fields_applied,
    })
}
