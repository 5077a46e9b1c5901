//! Autofill Orchestrator — sequences detect → collect → classify → resolve → fill for one page.
//!
//! `AutofillEngine` owns the injected catalogs and does the work. `Orchestrator` wraps it
//! with the single-flight busy flag: a run requested while another is in progress is
//! logged and dropped, never queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::autofill::classifier::{FieldClassifier, MatchResult};
use crate::autofill::collector::{collect_fields, CollectOptions, ControlKind, FieldDescriptor};
use crate::autofill::executor::{FillExecutor, FillOutcome, FillStatus};
use crate::autofill::field_types::{FieldTypeCatalog, FieldTypeId};
use crate::autofill::platform::{Platform, PlatformCatalog, PlatformDetector, PlatformProfile};
use crate::autofill::resolver::ValueResolver;
use crate::config::AutofillSettings;
use crate::dom::{ControlHandle, DocumentTree, DomError};
use crate::models::profile::Profile;

#[derive(Debug, Error)]
pub enum AutofillError {
    #[error("could not enumerate form controls: {0}")]
    Collect(#[source] DomError),

    #[error("field type '{0}' is missing from the catalog")]
    UnknownFieldType(FieldTypeId),
}

/// What a caller gets back from every run, including runs that failed or were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub platform: Platform,
    pub filled_count: usize,
    pub outcomes: Vec<FillOutcome>,
    /// The request was dropped because another run was in progress.
    pub busy_skipped: bool,
    /// The platform carries legal/compliance questions worth a manual review.
    pub legal_questions: bool,
}

impl RunSummary {
    fn new(platform: &PlatformProfile) -> Self {
        Self {
            platform: platform.platform,
            filled_count: 0,
            outcomes: Vec::new(),
            busy_skipped: false,
            legal_questions: platform.special.legal_questions,
        }
    }

    fn busy() -> Self {
        Self {
            platform: Platform::Generic,
            filled_count: 0,
            outcomes: Vec::new(),
            busy_skipped: true,
            legal_questions: false,
        }
    }

    pub fn count(&self, status: FillStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn failed_count(&self) -> usize {
        self.count(FillStatus::Failed)
    }

    /// Marks resume uploads that had no value because the stored payload could not be fetched.
    pub fn record_unavailable_resume(&mut self, reason: &str) {
        for outcome in self.outcomes.iter_mut().filter(|o| {
            o.field_type == Some(FieldTypeId::Resume) && o.status == FillStatus::SkippedNoValue
        }) {
            outcome.status = FillStatus::Failed;
            outcome.reason = Some(format!("resume payload unavailable: {reason}"));
        }
    }

    fn record_run_failure(&mut self, error: &AutofillError) {
        self.outcomes.push(FillOutcome {
            handle: ControlHandle::default(),
            field_label: "autofill run".to_string(),
            field_type: None,
            status: FillStatus::Failed,
            reason: Some(error.to_string()),
            value: None,
            attempts: 0,
        });
    }
}

/// Immutable engine: catalogs and tuning, shared by every run.
pub struct AutofillEngine {
    field_types: Arc<FieldTypeCatalog>,
    platforms: Arc<PlatformCatalog>,
    classifier: FieldClassifier,
    resolver: ValueResolver,
    settings: AutofillSettings,
}

impl AutofillEngine {
    pub fn new(
        field_types: Arc<FieldTypeCatalog>,
        platforms: Arc<PlatformCatalog>,
        settings: AutofillSettings,
    ) -> Self {
        Self {
            classifier: FieldClassifier::new(
                field_types.clone(),
                settings.weights,
                settings.confidence_threshold,
            ),
            resolver: ValueResolver::new(field_types.clone()),
            field_types,
            platforms,
            settings,
        }
    }

    pub fn settings(&self) -> &AutofillSettings {
        &self.settings
    }

    pub fn classifier(&self) -> &FieldClassifier {
        &self.classifier
    }

    /// Detects the platform and classifies every collected field without touching the page.
    pub async fn classify_page<D: DocumentTree + ?Sized>(
        &self,
        doc: &D,
    ) -> Result<(Arc<PlatformProfile>, Vec<(FieldDescriptor, MatchResult)>), DomError> {
        let platform = PlatformDetector::new(self.platforms.clone()).detect(doc).await;
        let fields = collect_fields(doc, CollectOptions::default()).await?;
        let matches = fields
            .into_iter()
            .map(|f| {
                let m = self.classifier.classify(&f, &platform);
                (f, m)
            })
            .collect();
        Ok((platform, matches))
    }

    async fn run<D: DocumentTree + ?Sized>(&self, doc: &D, profile: &Profile) -> RunSummary {
        // Fresh detector per run: the platform is memoized for this run only.
        let platform = PlatformDetector::new(self.platforms.clone()).detect(doc).await;
        let mut summary = RunSummary::new(&platform);

        if let Err(e) = self.fill_page(doc, profile, &platform, &mut summary).await {
            error!(platform = ?platform.platform, "Autofill run aborted: {e}");
            summary.record_run_failure(&e);
        }

        summary.filled_count = summary.count(FillStatus::Filled);
        info!(
            platform = ?summary.platform,
            filled = summary.filled_count,
            failed = summary.failed_count(),
            fields = summary.outcomes.len(),
            "Autofill run complete"
        );
        summary
    }

    async fn fill_page<D: DocumentTree + ?Sized>(
        &self,
        doc: &D,
        profile: &Profile,
        platform: &Arc<PlatformProfile>,
        summary: &mut RunSummary,
    ) -> Result<(), AutofillError> {
        let fields = collect_fields(doc, CollectOptions::default())
            .await
            .map_err(AutofillError::Collect)?;

        let classified: Vec<(FieldDescriptor, MatchResult)> = fields
            .into_iter()
            .map(|f| {
                let m = self.classifier.classify(&f, platform);
                (f, m)
            })
            .collect();

        // Resume upload goes before or after everything else, depending on the platform.
        let (uploads, others): (Vec<_>, Vec<_>) = classified.into_iter().partition(|(f, m)| {
            f.kind == ControlKind::File || m.field_type == Some(FieldTypeId::Resume)
        });
        let ordered = if platform.special.upload_first {
            uploads.into_iter().chain(others)
        } else {
            others.into_iter().chain(uploads)
        };

        let mut executor =
            FillExecutor::new(doc, platform.clone(), self.settings.executor_settings());
        let mut any_fill_attempted = false;

        for (field, matched) in ordered {
            let Some(id) = matched.field_type else {
                debug!(field = %field.display_name(), "Classification miss: {}", matched.evidence);
                summary.outcomes.push(
                    FillOutcome::new(&field, None, FillStatus::SkippedNoMatch)
                        .with_reason(matched.evidence),
                );
                continue;
            };
            let field_type = self
                .field_types
                .get(id)
                .ok_or(AutofillError::UnknownFieldType(id))?;

            let Some(value) = self.resolver.resolve(id, profile, &field) else {
                debug!(field = %field.display_name(), field_type = %id, "Resolution miss");
                summary.outcomes.push(
                    FillOutcome::new(&field, Some(id), FillStatus::SkippedNoValue)
                        .with_reason(format!("profile has no value for {id}")),
                );
                continue;
            };

            if any_fill_attempted && platform.requires_delays() {
                tokio::time::sleep(Duration::from_millis(platform.delay_ms())).await;
            }
            any_fill_attempted = true;

            let outcome = executor.fill(&field, id, field_type.nature, &value).await;
            debug!(
                field = %outcome.field_label,
                field_type = %id,
                status = ?outcome.status,
                "Field processed"
            );
            summary.outcomes.push(outcome);
        }

        for (handle, e) in executor.flush_deferred().await {
            if let Some(outcome) = summary.outcomes.iter_mut().find(|o| o.handle == handle) {
                outcome.status = FillStatus::Failed;
                outcome.reason = Some(e.to_string());
            }
        }
        Ok(())
    }
}

/// Clears the busy flag when dropped, including on panic unwind.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Single-flight front door to the engine.
pub struct Orchestrator {
    engine: Arc<AutofillEngine>,
    busy: AtomicBool,
}

impl Orchestrator {
    pub fn new(engine: Arc<AutofillEngine>) -> Self {
        Self {
            engine,
            busy: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &Arc<AutofillEngine> {
        &self.engine
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs once over the page. Always returns a summary; errors end up in its outcomes.
    pub async fn run<D: DocumentTree + ?Sized>(&self, doc: &D, profile: &Profile) -> RunSummary {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            info!("Autofill already in progress; ignoring request");
            return RunSummary::busy();
        };
        self.engine.run(doc, profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ControlOption, ControlSnapshot, PageSnapshot, VirtualDocument};
    use crate::models::profile::{Answer, StoredDocument};

    fn engine() -> Arc<AutofillEngine> {
        Arc::new(AutofillEngine::new(
            Arc::new(FieldTypeCatalog::builtin().unwrap()),
            Arc::new(PlatformCatalog::builtin().unwrap()),
            AutofillSettings::default(),
        ))
    }

    fn input(handle: u32, label: &str) -> ControlSnapshot {
        ControlSnapshot {
            handle: ControlHandle(handle),
            tag: "input".to_string(),
            input_type: Some("text".to_string()),
            label: Some(label.to_string()),
            ..Default::default()
        }
    }

    fn jane_form(url: &str) -> VirtualDocument {
        VirtualDocument::new(PageSnapshot {
            url: url.to_string(),
            selectors: vec![],
            controls: vec![
                input(1, "First Name"),
                input(2, "Last Name"),
                input(3, "Email"),
                ControlSnapshot {
                    handle: ControlHandle(4),
                    tag: "select".to_string(),
                    label: Some("Are you authorized to work?".to_string()),
                    options: vec![
                        ControlOption::new("Yes", "Yes"),
                        ControlOption::new("No", "No"),
                    ],
                    ..Default::default()
                },
            ],
        })
    }

    fn jane() -> Profile {
        Profile {
            full_name: Some("Jane Doe".to_string()),
            email: Some("jane@x.com".to_string()),
            work_authorization: Some(Answer::Flag(true)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_jane_doe_end_to_end() {
        let doc = jane_form("https://careers.acme.com/apply");
        let orchestrator = Orchestrator::new(engine());

        let summary = orchestrator.run(&doc, &jane()).await;
        assert_eq!(summary.filled_count, 4, "{:#?}", summary.outcomes);
        assert_eq!(summary.failed_count(), 0);
        assert_eq!(summary.platform, Platform::Generic);

        let value = |h| doc.value_of(ControlHandle(h));
        assert_eq!(value(1).await.as_deref(), Some("Jane"));
        assert_eq!(value(2).await.as_deref(), Some("Doe"));
        assert_eq!(value(3).await.as_deref(), Some("jane@x.com"));
        assert_eq!(value(4).await.as_deref(), Some("Yes"));

        let auth = &summary.outcomes[3];
        assert_eq!(auth.field_type, Some(FieldTypeId::WorkAuthorization));
        assert_eq!(auth.value.as_deref(), Some("Yes"));
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_preselected_select_answer_is_corrected() {
        let doc = VirtualDocument::new(PageSnapshot {
            url: "https://careers.acme.com/apply".to_string(),
            selectors: vec![],
            controls: vec![ControlSnapshot {
                handle: ControlHandle(1),
                tag: "select".to_string(),
                label: Some("Will you require visa sponsorship?".to_string()),
                options: vec![
                    ControlOption::new("Yes", "Yes"),
                    ControlOption::new("No", "No"),
                ],
                value: "Yes".to_string(),
                ..Default::default()
            }],
        });
        let profile = Profile {
            requires_sponsorship: Some(Answer::Flag(false)),
            ..jane()
        };

        let summary = Orchestrator::new(engine()).run(&doc, &profile).await;
        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.field_type, Some(FieldTypeId::RequiresSponsorship));
        assert_eq!(outcome.status, FillStatus::Filled, "{outcome:?}");
        assert_eq!(outcome.value.as_deref(), Some("No"));
        assert_eq!(doc.value_of(ControlHandle(1)).await.as_deref(), Some("No"));
    }

    #[tokio::test]
    async fn test_second_run_fills_nothing() {
        let doc = jane_form("https://careers.acme.com/apply");
        let orchestrator = Orchestrator::new(engine());

        orchestrator.run(&doc, &jane()).await;
        let writes_after_first = doc.write_count().await;

        let second = orchestrator.run(&doc, &jane()).await;
        assert_eq!(second.filled_count, 0);
        assert_eq!(second.count(FillStatus::SkippedAlreadyFilled), 4);
        assert_eq!(doc.write_count().await, writes_after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_run_is_a_no_op() {
        // Workday pauses between fields, so the first run is still in flight.
        let doc = jane_form("https://acme.wd5.myworkdayjobs.com/en-US/careers/apply");
        let orchestrator = Orchestrator::new(engine());
        let profile = jane();

        let (first, second) = tokio::join!(orchestrator.run(&doc, &profile), async {
            tokio::task::yield_now().await;
            orchestrator.run(&doc, &profile).await
        });

        assert!(!first.busy_skipped);
        assert_eq!(first.platform, Platform::Workday);
        assert!(second.busy_skipped);
        assert!(second.outcomes.is_empty());
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_misses_are_reported_separately() {
        let doc = VirtualDocument::new(PageSnapshot {
            url: "https://careers.acme.com/apply".to_string(),
            selectors: vec![],
            controls: vec![input(1, "Favourite colour"), input(2, "Phone")],
        });
        let summary = Orchestrator::new(engine()).run(&doc, &jane()).await;
        assert_eq!(summary.outcomes[0].status, FillStatus::SkippedNoMatch);
        assert_eq!(summary.outcomes[1].status, FillStatus::SkippedNoValue);
        assert_eq!(summary.outcomes[1].field_type, Some(FieldTypeId::Phone));
        assert_eq!(summary.filled_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_first_platform_orders_resume_before_fields() {
        let mut controls = vec![input(1, "First Name")];
        controls.push(ControlSnapshot {
            handle: ControlHandle(9),
            tag: "input".to_string(),
            input_type: Some("file".to_string()),
            label: Some("Resume/CV".to_string()),
            ..Default::default()
        });
        let doc = VirtualDocument::new(PageSnapshot {
            url: "https://acme.wd1.myworkdayjobs.com/careers/job/apply".to_string(),
            selectors: vec![],
            controls,
        });
        let mut profile = jane();
        profile.resume = Some(StoredDocument::from_bytes(
            "jane.pdf",
            "application/pdf",
            b"%PDF-1.4",
        ));

        let summary = Orchestrator::new(engine()).run(&doc, &profile).await;
        assert_eq!(summary.outcomes[0].handle, ControlHandle(9));
        assert_eq!(summary.outcomes[0].status, FillStatus::Filled);
        assert_eq!(summary.outcomes[0].attempts, 1);
        assert_eq!(summary.filled_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupted_resume_fails_without_aborting_run() {
        let doc = VirtualDocument::new(PageSnapshot {
            url: "https://careers.acme.com/apply".to_string(),
            selectors: vec![],
            controls: vec![
                ControlSnapshot {
                    handle: ControlHandle(9),
                    tag: "input".to_string(),
                    input_type: Some("file".to_string()),
                    label: Some("Upload your resume".to_string()),
                    ..Default::default()
                },
                input(1, "First Name"),
            ],
        });
        let mut profile = jane();
        profile.resume = Some(StoredDocument {
            file_name: "jane.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            data: "not*base64".to_string(),
        });

        let summary = Orchestrator::new(engine()).run(&doc, &profile).await;
        // Generic platform uploads last.
        let upload = summary.outcomes.last().unwrap();
        assert_eq!(upload.status, FillStatus::Failed);
        assert_eq!(upload.attempts, 3);
        assert_eq!(summary.filled_count, 1);
    }

    #[test]
    fn test_busy_guard_clears_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = BusyGuard::acquire(&flag).unwrap();
            assert!(flag.load(Ordering::Acquire));
            assert!(BusyGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
    }
}
