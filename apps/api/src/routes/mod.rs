pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::autofill::handlers as autofill;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Autofill API
        .route("/api/v1/autofill/run", post(autofill::handle_run))
        .route("/api/v1/autofill/classify", post(autofill::handle_classify))
        // Resume API
        .route("/api/v1/resume/parse", post(resume::handle_parse_resume))
        .route("/api/v1/resume/parse-text", post(resume::handle_parse_text))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::autofill::field_types::FieldTypeCatalog;
    use crate::autofill::orchestrator::AutofillEngine;
    use crate::autofill::platform::PlatformCatalog;
    use crate::config::AutofillSettings;
    use crate::models::profile::{Answer, Profile, StoredDocument};
    use crate::resume::parser::ResumeParser;
    use crate::store::memory::{MemoryDocumentStore, MemoryProfileStore};

    async fn app_with(user_id: Uuid, profile: Profile) -> Router {
        let profiles = MemoryProfileStore::default();
        profiles.insert(user_id, profile).await;
        let documents = MemoryDocumentStore::default();
        documents
            .insert(
                "resumes/jane.pdf",
                StoredDocument::from_bytes("jane.pdf", "application/pdf", b"%PDF-1.4"),
            )
            .await;

        build_router(AppState {
            engine: Arc::new(AutofillEngine::new(
                Arc::new(FieldTypeCatalog::builtin().unwrap()),
                Arc::new(PlatformCatalog::builtin().unwrap()),
                AutofillSettings::default(),
            )),
            profiles: Arc::new(profiles),
            documents: Arc::new(documents),
            resume_parser: Arc::new(ResumeParser::new().unwrap()),
        })
    }

    fn jane() -> Profile {
        Profile {
            full_name: Some("Jane Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            work_authorization: Some(Answer::Flag(true)),
            resume_key: Some("resumes/jane.pdf".to_string()),
            ..Default::default()
        }
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn page() -> Value {
        json!({
            "url": "https://boards.greenhouse.io/acme/jobs/1",
            "controls": [
                { "handle": 1, "tag": "input", "input_type": "text", "label": "First Name" },
                { "handle": 2, "tag": "input", "input_type": "email", "label": "Email" },
                { "handle": 3, "tag": "input", "input_type": "file", "label": "Resume/CV" }
            ]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Uuid::new_v4(), Profile::default()).await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_run_fills_page_and_returns_control_values() {
        let user_id = Uuid::new_v4();
        let app = app_with(user_id, jane()).await;

        let (status, body) = post_json(
            app,
            "/api/v1/autofill/run",
            json!({ "user_id": user_id, "page": page() }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["platform"], "greenhouse");
        assert_eq!(body["summary"]["filled_count"], 3);
        assert_eq!(body["controls"][0]["value"], "Jane");
        assert_eq!(body["controls"][1]["value"], "jane@example.com");
        assert_eq!(body["controls"][2]["file_name"], "jane.pdf");
    }

    #[tokio::test]
    async fn test_run_unknown_user_is_not_found() {
        let app = app_with(Uuid::new_v4(), jane()).await;
        let (status, body) = post_json(
            app,
            "/api/v1/autofill/run",
            json!({ "user_id": Uuid::new_v4(), "page": page() }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_run_with_missing_resume_payload_fails_only_the_upload() {
        let user_id = Uuid::new_v4();
        let profile = Profile {
            resume_key: Some("resumes/missing.pdf".to_string()),
            ..jane()
        };
        let app = app_with(user_id, profile).await;
        let (status, body) = post_json(
            app,
            "/api/v1/autofill/run",
            json!({ "user_id": user_id, "page": page() }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["filled_count"], 2);
        assert_eq!(body["controls"][0]["value"], "Jane");
        assert!(body["controls"][2]["file_name"].is_null());

        let outcomes = body["summary"]["outcomes"].as_array().unwrap();
        let upload = outcomes.iter().find(|o| o["handle"] == 3).unwrap();
        assert_eq!(upload["status"], "failed");
        assert!(upload["reason"]
            .as_str()
            .unwrap()
            .starts_with("resume payload unavailable"));
    }

    #[tokio::test]
    async fn test_run_without_file_input_ignores_missing_resume() {
        let user_id = Uuid::new_v4();
        let profile = Profile {
            resume_key: Some("resumes/missing.pdf".to_string()),
            ..jane()
        };
        let app = app_with(user_id, profile).await;
        let page = json!({
            "url": "https://careers.acme.com/apply",
            "controls": [
                { "handle": 1, "tag": "input", "input_type": "text", "label": "First Name" }
            ]
        });
        let (status, body) = post_json(
            app,
            "/api/v1/autofill/run",
            json!({ "user_id": user_id, "page": page }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["filled_count"], 1);
        assert_eq!(body["controls"][0]["value"], "Jane");
    }

    #[tokio::test]
    async fn test_classify_reports_match_per_field() {
        let app = app_with(Uuid::new_v4(), Profile::default()).await;
        let (status, body) =
            post_json(app, "/api/v1/autofill/classify", json!({ "page": page() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["platform"], "greenhouse");
        assert_eq!(body["fields"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["fields"][1]["match"]["field_type"], "email");
    }

    #[tokio::test]
    async fn test_parse_text_merges_into_stored_profile() {
        let user_id = Uuid::new_v4();
        let app = app_with(user_id, jane()).await;
        let (status, body) = post_json(
            app,
            "/api/v1/resume/parse-text",
            json!({
                "text": "Jane Doe\nother@example.com | 555-123-4567\n\nSkills\nRust, Go",
                "user_id": user_id
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parsed"]["email"], "other@example.com");
        // The stored email wins; the phone slot was empty.
        assert_eq!(body["merged_profile"]["email"], "jane@example.com");
        assert_eq!(body["merged_profile"]["phone"], "555-123-4567");
        assert_eq!(body["fields_applied"], 2);
    }

    #[tokio::test]
    async fn test_parse_text_rejects_blank_input() {
        let app = app_with(Uuid::new_v4(), Profile::default()).await;
        let (status, _) =
            post_json(app, "/api/v1/resume/parse-text", json!({ "text": "   " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_parse_multipart_plain_text_upload() {
        let app = app_with(Uuid::new_v4(), Profile::default()).await;
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"cv.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             John Smith\njohn@smith.io\r\n\
             --{boundary}--\r\n"
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/resume/parse")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["parsed"]["fullName"], "John Smith");
        assert_eq!(json["parsed"]["email"], "john@smith.io");
    }
}
