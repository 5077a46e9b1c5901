//! Fill Executor — applies a resolved value to one control.
//!
//! Each control walks idle → focused → value-assigned → events-dispatched → settled.
//! A control that reached `Settled` is never filled again by the same executor, and the
//! orchestrator builds one executor per run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::autofill::collector::{ControlKind, FieldDescriptor};
use crate::autofill::field_types::{FieldTypeId, ValueNature};
use crate::autofill::platform::{DispatchTiming, EventKind, PlatformProfile};
use crate::autofill::resolver::ResolvedValue;
use crate::dom::{ControlAdapter, ControlHandle, ControlOption, DomError, DomEvent, SyntheticFile};
use crate::models::profile::StoredDocument;

const MAX_TOKENS: usize = 10;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("stored document is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("stored document '{0}' decodes to zero bytes")]
    Empty(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStatus {
    Filled,
    SkippedNoMatch,
    SkippedNoValue,
    SkippedAlreadyFilled,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FillOutcome {
    pub handle: ControlHandle,
    pub field_label: String,
    pub field_type: Option<FieldTypeId>,
    pub status: FillStatus,
    pub reason: Option<String>,
    /// Value written, for filled fields.
    pub value: Option<String>,
    /// Upload attempts made; zero for non-file fields.
    #[serde(skip_serializing_if = "is_zero")]
    pub attempts: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl FillOutcome {
    pub fn new(
        descriptor: &FieldDescriptor,
        field_type: Option<FieldTypeId>,
        status: FillStatus,
    ) -> Self {
        Self {
            handle: descriptor.handle,
            field_label: descriptor.display_name(),
            field_type,
            status,
            reason: None,
            value: None,
            attempts: 0,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    fn with_status(mut self, status: FillStatus) -> Self {
        self.status = status;
        self
    }

    fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillState {
    Idle,
    Focused,
    ValueAssigned,
    EventsDispatched,
    Settled,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorSettings {
    pub upload_attempts: u32,
    pub upload_backoff: Duration,
    pub token_delay: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            upload_attempts: 3,
            upload_backoff: Duration::from_millis(1000),
            token_delay: Duration::from_millis(100),
        }
    }
}

/// Which select-matching strategy picked the option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectStrategy {
    ExactValue,
    ExactText,
    ValueContainsTerm,
    TextContainsTerm,
    TermContainsText,
}

/// First option matched by the five strategies, tried in order. Placeholders never match.
pub fn match_option<'o>(
    options: &'o [ControlOption],
    term: &str,
) -> Option<(&'o ControlOption, SelectStrategy)> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let term_lc = term.to_lowercase();
    let usable: Vec<&ControlOption> = options.iter().filter(|o| !o.is_placeholder()).collect();

    let strategies: [(SelectStrategy, &dyn Fn(&ControlOption) -> bool); 5] = [
        (SelectStrategy::ExactValue, &|o: &ControlOption| {
            o.value.trim() == term
        }),
        (SelectStrategy::ExactText, &|o: &ControlOption| {
            o.text.trim().to_lowercase() == term_lc
        }),
        (SelectStrategy::ValueContainsTerm, &|o: &ControlOption| {
            o.value.to_lowercase().contains(&term_lc)
        }),
        (SelectStrategy::TextContainsTerm, &|o: &ControlOption| {
            o.text.to_lowercase().contains(&term_lc)
        }),
        (SelectStrategy::TermContainsText, &|o: &ControlOption| {
            let text = o.text.trim().to_lowercase();
            !text.is_empty() && term_lc.contains(&text)
        }),
    ];

    strategies.iter().find_map(|(strategy, matches)| {
        usable
            .iter()
            .find(|o| matches(**o))
            .map(|o| (*o, *strategy))
    })
}

/// Decodes a stored payload, accepting a bare base64 string or a `data:` URL.
pub fn decode_document(doc: &StoredDocument) -> Result<SyntheticFile, UploadError> {
    let encoded = match doc.data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => doc.data.as_str(),
    };
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    if bytes.is_empty() {
        return Err(UploadError::Empty(doc.file_name.clone()));
    }
    Ok(SyntheticFile {
        name: doc.file_name.clone(),
        media_type: doc.media_type.clone(),
        bytes: Bytes::from(bytes),
    })
}

pub struct FillExecutor<'a, A: ControlAdapter + ?Sized> {
    adapter: &'a A,
    platform: Arc<PlatformProfile>,
    settings: ExecutorSettings,
    states: HashMap<ControlHandle, FillState>,
    deferred: Vec<ControlHandle>,
}

impl<'a, A: ControlAdapter + ?Sized> FillExecutor<'a, A> {
    pub fn new(adapter: &'a A, platform: Arc<PlatformProfile>, settings: ExecutorSettings) -> Self {
        Self {
            adapter,
            platform,
            settings,
            states: HashMap::new(),
            deferred: Vec::new(),
        }
    }

    pub fn state_of(&self, handle: ControlHandle) -> FillState {
        self.states.get(&handle).copied().unwrap_or(FillState::Idle)
    }

    fn advance(&mut self, handle: ControlHandle, state: FillState) {
        self.states.insert(handle, state);
    }

    pub async fn fill(
        &mut self,
        descriptor: &FieldDescriptor,
        field_type: FieldTypeId,
        nature: ValueNature,
        value: &ResolvedValue,
    ) -> FillOutcome {
        let handle = descriptor.handle;
        let outcome = |status| FillOutcome::new(descriptor, Some(field_type), status);

        if self.state_of(handle) == FillState::Settled {
            return outcome(FillStatus::SkippedAlreadyFilled)
                .with_reason("already settled in this run");
        }

        match self.already_filled(descriptor).await {
            Ok(true) => {
                self.advance(handle, FillState::Settled);
                return outcome(FillStatus::SkippedAlreadyFilled)
                    .with_reason("control already holds a value");
            }
            Ok(false) => {}
            Err(e) => return outcome(FillStatus::Failed).with_reason(e.to_string()),
        }

        match (value, descriptor.kind) {
            (ResolvedValue::File(doc), ControlKind::File) => {
                let (result, attempts) = self.upload_with_retry(handle, doc).await;
                match result {
                    Ok(()) => outcome(FillStatus::Filled)
                        .with_value(doc.file_name.clone())
                        .with_attempts(attempts),
                    Err(e) => {
                        warn!(control = %handle, attempts, "Resume upload failed: {e}");
                        outcome(FillStatus::Failed)
                            .with_reason(format!("upload failed after {attempts} attempts: {e}"))
                            .with_attempts(attempts)
                    }
                }
            }
            (ResolvedValue::File(_), _) => {
                outcome(FillStatus::Failed).with_reason("file value for a non-file control")
            }
            (ResolvedValue::Text(_), ControlKind::File) => {
                outcome(FillStatus::SkippedNoValue).with_reason("text value for a file control")
            }
            (ResolvedValue::Text(text), ControlKind::Select) => {
                self.fill_select(descriptor, text, outcome(FillStatus::Filled))
                    .await
            }
            (ResolvedValue::Text(text), _) if nature == ValueNature::Tokens => {
                match self.fill_tokens(handle, text).await {
                    Ok(()) => outcome(FillStatus::Filled).with_value(text.clone()),
                    Err(e) => fill_failed(outcome(FillStatus::Failed), e),
                }
            }
            (ResolvedValue::Text(text), _) => match self.fill_text(handle, text).await {
                Ok(()) => outcome(FillStatus::Filled).with_value(text.clone()),
                Err(e) => fill_failed(outcome(FillStatus::Failed), e),
            },
        }
    }

    /// Dispatches the platform events for controls deferred until every field is assigned.
    /// Returns the controls whose dispatch failed.
    pub async fn flush_deferred(&mut self) -> Vec<(ControlHandle, DomError)> {
        let mut failures = Vec::new();
        for handle in std::mem::take(&mut self.deferred) {
            match self.dispatch_platform_events(handle, "").await {
                Ok(()) => {
                    self.advance(handle, FillState::EventsDispatched);
                    self.advance(handle, FillState::Settled);
                }
                Err(e) => failures.push((handle, e)),
            }
        }
        if !failures.is_empty() {
            warn!(failed = failures.len(), "Deferred event dispatch failed");
        }
        failures
    }

    /// Selects always report some option, so they are judged in `fill_select` against the
    /// option the value maps to.
    async fn already_filled(&self, descriptor: &FieldDescriptor) -> Result<bool, DomError> {
        if descriptor.kind == ControlKind::Select {
            return Ok(false);
        }
        let current = self.adapter.read_value(descriptor.handle).await?;
        Ok(!current.trim().is_empty())
    }

    async fn fill_text(&mut self, handle: ControlHandle, text: &str) -> Result<(), DomError> {
        self.adapter.focus(handle).await?;
        self.advance(handle, FillState::Focused);
        self.adapter.write_value(handle, text).await?;
        self.advance(handle, FillState::ValueAssigned);
        self.finish(handle, text).await
    }

    async fn fill_select(
        &mut self,
        descriptor: &FieldDescriptor,
        term: &str,
        filled: FillOutcome,
    ) -> FillOutcome {
        let handle = descriptor.handle;
        let mut options = match self.adapter.list_options(handle).await {
            Ok(options) => options,
            Err(e) => return fill_failed(filled.with_status(FillStatus::Failed), e),
        };
        if options.is_empty() {
            options = descriptor.options.clone();
        }

        let Some((option, strategy)) = match_option(&options, term) else {
            debug!(control = %handle, term, "No select option matched");
            return filled
                .with_status(FillStatus::SkippedNoMatch)
                .with_reason(format!("no option matched '{term}'"));
        };
        debug!(control = %handle, ?strategy, option = %option.text, "Matched select option");

        let chosen = option.value.clone();
        let shown = option.text.trim().to_string();

        let current = match self.adapter.read_value(handle).await {
            Ok(current) => current.trim().to_string(),
            Err(e) => return fill_failed(filled.with_status(FillStatus::Failed), e),
        };
        if current == chosen.trim() {
            self.advance(handle, FillState::Settled);
            return filled
                .with_status(FillStatus::SkippedAlreadyFilled)
                .with_reason("control already holds the matching option")
                .with_value(shown);
        }
        if holds_deliberate_choice(&options, &current) {
            self.advance(handle, FillState::Settled);
            return filled
                .with_status(FillStatus::SkippedAlreadyFilled)
                .with_reason("control already holds a value");
        }

        let result = self.fill_text(handle, &chosen).await;

        match result {
            Ok(()) => filled.with_value(shown),
            Err(e) => fill_failed(filled.with_status(FillStatus::Failed), e),
        }
    }

    /// Raw comma-joined value first, then each token committed with Enter.
    async fn fill_tokens(&mut self, handle: ControlHandle, joined: &str) -> Result<(), DomError> {
        self.adapter.focus(handle).await?;
        self.advance(handle, FillState::Focused);
        self.adapter.write_value(handle, joined).await?;
        self.advance(handle, FillState::ValueAssigned);
        let deferred = self.defer_events(handle);
        if !deferred {
            self.dispatch_platform_events(handle, joined).await?;
        }

        let tokens: Vec<&str> = joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .take(MAX_TOKENS)
            .collect();
        for token in &tokens {
            if let Err(e) = self.commit_token(handle, token).await {
                warn!(control = %handle, token, "Token entry failed, keeping raw value: {e}");
                break;
            }
        }

        // Plain inputs keep whichever token was typed last; put the full list back.
        match self.adapter.read_value(handle).await {
            Ok(current) if current != joined && tokens.contains(&current.as_str()) => {
                if let Err(e) = self.adapter.write_value(handle, joined).await {
                    warn!(control = %handle, "Could not restore joined tokens: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(control = %handle, "Could not read back token field: {e}"),
        }

        if !deferred {
            self.advance(handle, FillState::EventsDispatched);
            self.settle(handle).await;
        }
        Ok(())
    }

    async fn commit_token(&self, handle: ControlHandle, token: &str) -> Result<(), DomError> {
        self.adapter.write_value(handle, token).await?;
        self.adapter.dispatch_event(handle, DomEvent::Input).await?;
        tokio::time::sleep(self.settings.token_delay).await;
        self.adapter.dispatch_event(handle, DomEvent::enter()).await
    }

    async fn upload_with_retry(
        &mut self,
        handle: ControlHandle,
        doc: &StoredDocument,
    ) -> (Result<(), UploadError>, u32) {
        let max_attempts = self.settings.upload_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                warn!(
                    control = %handle,
                    "Upload attempt {} failed, retrying after {}ms...",
                    attempt - 1,
                    self.settings.upload_backoff.as_millis()
                );
                tokio::time::sleep(self.settings.upload_backoff).await;
            }

            match self.try_upload(handle, doc).await {
                Ok(()) => {
                    self.advance(handle, FillState::Settled);
                    return (Ok(()), attempt);
                }
                Err(e) => last_error = Some(e),
            }
        }

        let error = last_error.unwrap_or_else(|| UploadError::Empty(doc.file_name.clone()));
        (Err(error), max_attempts)
    }

    async fn try_upload(&mut self, handle: ControlHandle, doc: &StoredDocument) -> Result<(), UploadError> {
        let file = decode_document(doc)?;
        self.adapter.attach_file(handle, file).await?;
        self.advance(handle, FillState::ValueAssigned);
        self.adapter.dispatch_event(handle, DomEvent::Change).await?;
        self.adapter.dispatch_event(handle, DomEvent::Input).await?;
        self.advance(handle, FillState::EventsDispatched);
        Ok(())
    }

    /// Events (now or deferred), then the settle delay.
    async fn finish(&mut self, handle: ControlHandle, value: &str) -> Result<(), DomError> {
        if self.defer_events(handle) {
            return Ok(());
        }
        self.dispatch_platform_events(handle, value).await?;
        self.advance(handle, FillState::EventsDispatched);
        self.settle(handle).await;
        Ok(())
    }

    /// Queues the control for `flush_deferred` when the platform dispatches after all fields.
    fn defer_events(&mut self, handle: ControlHandle) -> bool {
        if self.platform.event_strategy().timing != DispatchTiming::AfterAll {
            return false;
        }
        self.deferred.push(handle);
        true
    }

    async fn settle(&mut self, handle: ControlHandle) {
        if self.platform.fill.uses_delays && self.platform.fill.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.platform.fill.settle_ms)).await;
        }
        self.advance(handle, FillState::Settled);
    }

    async fn dispatch_platform_events(&self, handle: ControlHandle, value: &str) -> Result<(), DomError> {
        let key = value
            .chars()
            .last()
            .map(String::from)
            .unwrap_or_else(|| "Unidentified".to_string());
        for kind in &self.platform.event_strategy().events {
            let event = match kind {
                EventKind::Input => DomEvent::Input,
                EventKind::Change => DomEvent::Change,
                EventKind::Blur => DomEvent::Blur,
                EventKind::KeyDown => DomEvent::KeyDown { key: key.clone() },
                EventKind::KeyUp => DomEvent::KeyUp { key: key.clone() },
            };
            self.adapter.dispatch_event(handle, event).await?;
        }
        Ok(())
    }
}

/// An untouched select shows its first option, so only a later non-placeholder option
/// counts as an answer someone picked.
fn holds_deliberate_choice(options: &[ControlOption], current: &str) -> bool {
    options
        .iter()
        .skip(1)
        .any(|o| !o.is_placeholder() && o.value.trim() == current)
}

fn fill_failed(outcome: FillOutcome, error: DomError) -> FillOutcome {
    warn!(control = %outcome.handle, "Fill failed: {error}");
    outcome.with_reason(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofill::platform::{Platform, PlatformCatalog};
    use crate::dom::{ControlSnapshot, PageSnapshot, VirtualDocument};

    fn platform(p: Platform) -> Arc<PlatformProfile> {
        PlatformCatalog::builtin().unwrap().get(p)
    }

    fn snapshot(handle: u32, tag: &str, input_type: Option<&str>) -> ControlSnapshot {
        ControlSnapshot {
            handle: ControlHandle(handle),
            tag: tag.to_string(),
            input_type: input_type.map(String::from),
            ..Default::default()
        }
    }

    fn descriptor(snap: &ControlSnapshot, kind: ControlKind) -> FieldDescriptor {
        FieldDescriptor {
            handle: snap.handle,
            kind,
            input_type: snap.input_type.clone(),
            options: snap.options.clone(),
            label: Some("field".to_string()),
            ..Default::default()
        }
    }

    fn doc_with(controls: Vec<ControlSnapshot>) -> VirtualDocument {
        VirtualDocument::new(PageSnapshot {
            url: "https://careers.acme.com/apply".to_string(),
            controls,
            ..Default::default()
        })
    }

    fn text(value: &str) -> ResolvedValue {
        ResolvedValue::Text(value.to_string())
    }

    #[test]
    fn test_select_strategies_in_order() {
        let options = vec![
            ControlOption::new("", "Select..."),
            ControlOption::new("hs", "High School"),
            ControlOption::new("ba", "Bachelor's Degree"),
            ControlOption::new("ms", "Master's Degree"),
        ];
        let (option, strategy) = match_option(&options, "Bachelor").unwrap();
        assert_eq!(option.value, "ba");
        assert_eq!(strategy, SelectStrategy::TextContainsTerm);

        let (_, strategy) = match_option(&options, "ms").unwrap();
        assert_eq!(strategy, SelectStrategy::ExactValue);
        let (_, strategy) = match_option(&options, "high school").unwrap();
        assert_eq!(strategy, SelectStrategy::ExactText);
        let (option, strategy) = match_option(&options, "Master's Degree in CS").unwrap();
        assert_eq!(option.value, "ms");
        assert_eq!(strategy, SelectStrategy::TermContainsText);

        assert!(match_option(&options, "Doctorate").is_none());
        assert!(match_option(&options, "select").is_none());
    }

    #[tokio::test]
    async fn test_select_without_match_leaves_control_untouched() {
        let mut snap = snapshot(1, "select", None);
        snap.options = vec![ControlOption::new("", "Select..."), ControlOption::new("y", "Yes")];
        let desc = descriptor(&snap, ControlKind::Select);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::Degree, ValueNature::Choice, &text("PhD"))
            .await;
        assert_eq!(outcome.status, FillStatus::SkippedNoMatch);
        assert_eq!(doc.write_count().await, 0);
        assert!(doc.events_of(ControlHandle(1)).await.is_empty());
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::Idle);
    }

    fn yes_no_select(options: Vec<ControlOption>, value: &str) -> (ControlSnapshot, FieldDescriptor) {
        let mut snap = snapshot(1, "select", None);
        snap.options = options;
        snap.value = value.to_string();
        let desc = descriptor(&snap, ControlKind::Select);
        (snap, desc)
    }

    #[tokio::test]
    async fn test_select_on_page_default_is_overwritten() {
        let (snap, desc) = yes_no_select(
            vec![ControlOption::new("Yes", "Yes"), ControlOption::new("No", "No")],
            "Yes",
        );
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::RequiresSponsorship, ValueNature::YesNo, &text("No"))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        assert_eq!(outcome.value.as_deref(), Some("No"));
        assert_eq!(doc.value_of(ControlHandle(1)).await.as_deref(), Some("No"));
    }

    #[tokio::test]
    async fn test_select_already_on_matching_option_is_skipped() {
        let (snap, desc) = yes_no_select(
            vec![ControlOption::new("Yes", "Yes"), ControlOption::new("No", "No")],
            "Yes",
        );
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::WorkAuthorization, ValueNature::YesNo, &text("Yes"))
            .await;
        assert_eq!(outcome.status, FillStatus::SkippedAlreadyFilled);
        assert_eq!(outcome.value.as_deref(), Some("Yes"));
        assert_eq!(doc.write_count().await, 0);
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::Settled);
    }

    #[tokio::test]
    async fn test_select_with_picked_answer_is_kept() {
        let (snap, desc) = yes_no_select(
            vec![
                ControlOption::new("", "Select..."),
                ControlOption::new("Yes", "Yes"),
                ControlOption::new("No", "No"),
            ],
            "Yes",
        );
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::RequiresSponsorship, ValueNature::YesNo, &text("No"))
            .await;
        assert_eq!(outcome.status, FillStatus::SkippedAlreadyFilled);
        assert_eq!(doc.value_of(ControlHandle(1)).await.as_deref(), Some("Yes"));
        assert_eq!(doc.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_text_fill_walks_state_machine_and_dispatches_events() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::City, ValueNature::Text, &text("Denver"))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::Settled);
        assert_eq!(
            doc.events_of(ControlHandle(1)).await,
            vec![DomEvent::Focus, DomEvent::Input, DomEvent::Change, DomEvent::Blur]
        );

        let again = exec
            .fill(&desc, FieldTypeId::City, ValueNature::Text, &text("Boulder"))
            .await;
        assert_eq!(again.status, FillStatus::SkippedAlreadyFilled);
        assert_eq!(doc.value_of(ControlHandle(1)).await.as_deref(), Some("Denver"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dynamic_platform_adds_key_events() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Workday), ExecutorSettings::default());

        exec.fill(&desc, FieldTypeId::City, ValueNature::Text, &text("Austin"))
            .await;
        let events = doc.events_of(ControlHandle(1)).await;
        assert!(events.contains(&DomEvent::KeyDown { key: "n".to_string() }));
        assert!(events.contains(&DomEvent::KeyUp { key: "n".to_string() }));
    }

    #[tokio::test]
    async fn test_after_all_timing_defers_events_until_flush() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Icims), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::City, ValueNature::Text, &text("Reno"))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::ValueAssigned);
        assert_eq!(doc.events_of(ControlHandle(1)).await, vec![DomEvent::Focus]);

        assert!(exec.flush_deferred().await.is_empty());
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::Settled);
        assert_eq!(doc.events_of(ControlHandle(1)).await.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_filled_in_two_phases() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::Skills, ValueNature::Tokens, &text("Rust, Go, SQL"))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        let enters = doc
            .events_of(ControlHandle(1))
            .await
            .into_iter()
            .filter(|e| *e == DomEvent::enter())
            .count();
        assert_eq!(enters, 3);
        assert_eq!(doc.value_of(ControlHandle(1)).await.as_deref(), Some("Rust, Go, SQL"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_capped_at_ten() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());
        let skills = (1..=12).map(|i| format!("skill{i}")).collect::<Vec<_>>().join(", ");

        let outcome = exec
            .fill(&desc, FieldTypeId::Skills, ValueNature::Tokens, &text(&skills))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        let enters = doc
            .events_of(ControlHandle(1))
            .await
            .into_iter()
            .filter(|e| *e == DomEvent::enter())
            .count();
        assert_eq!(enters, 10);
        assert_eq!(doc.value_of(ControlHandle(1)).await.as_deref(), Some(skills.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_entry_failure_keeps_joined_value() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        doc.fail_key_events(ControlHandle(1)).await;
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::Skills, ValueNature::Tokens, &text("Rust, Go, SQL"))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        assert_eq!(outcome.value.as_deref(), Some("Rust, Go, SQL"));
        assert_eq!(doc.value_of(ControlHandle(1)).await.as_deref(), Some("Rust, Go, SQL"));
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::Settled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_all_timing_defers_token_field_events() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Icims), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::Skills, ValueNature::Tokens, &text("Rust, Go"))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::ValueAssigned);
        let before = doc.events_of(ControlHandle(1)).await;
        assert!(!before.contains(&DomEvent::Change));
        assert!(!before.contains(&DomEvent::Blur));

        assert!(exec.flush_deferred().await.is_empty());
        assert_eq!(exec.state_of(ControlHandle(1)), FillState::Settled);
        let after = doc.events_of(ControlHandle(1)).await;
        assert_eq!(after.iter().filter(|e| **e == DomEvent::Change).count(), 1);
        assert_eq!(after.last(), Some(&DomEvent::Blur));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_raised() {
        let snap = snapshot(1, "input", Some("text"));
        let desc = descriptor(&snap, ControlKind::Input);
        let doc = doc_with(vec![snap]);
        doc.fail_writes(ControlHandle(1)).await;
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());

        let outcome = exec
            .fill(&desc, FieldTypeId::City, ValueNature::Text, &text("Reno"))
            .await;
        assert_eq!(outcome.status, FillStatus::Failed);
        assert!(outcome.reason.unwrap().contains("rejected"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_succeeds_on_first_attempt() {
        let snap = snapshot(1, "input", Some("file"));
        let desc = descriptor(&snap, ControlKind::File);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());
        let resume = StoredDocument::from_bytes("jane.pdf", "application/pdf", b"%PDF-1.4 resume");

        let outcome = exec
            .fill(&desc, FieldTypeId::Resume, ValueNature::File, &ResolvedValue::File(resume))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        assert_eq!(outcome.attempts, 1);
        let file = doc.file_of(ControlHandle(1)).await.unwrap();
        assert_eq!(file.name, "jane.pdf");
        assert_eq!(&file.bytes[..], b"%PDF-1.4 resume");
        assert_eq!(
            doc.events_of(ControlHandle(1)).await,
            vec![DomEvent::Change, DomEvent::Input]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupted_upload_fails_after_exactly_three_attempts() {
        let snap = snapshot(1, "input", Some("file"));
        let desc = descriptor(&snap, ControlKind::File);
        let doc = doc_with(vec![snap]);
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());
        let corrupted = StoredDocument {
            file_name: "jane.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            data: "%%% not base64 %%%".to_string(),
        };

        let started = tokio::time::Instant::now();
        let outcome = exec
            .fill(&desc, FieldTypeId::Resume, ValueNature::File, &ResolvedValue::File(corrupted))
            .await;
        assert_eq!(outcome.status, FillStatus::Failed);
        assert_eq!(outcome.attempts, 3);
        // Two backoffs between three attempts.
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
        assert!(doc.file_of(ControlHandle(1)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_recovers_after_transient_rejection() {
        let snap = snapshot(1, "input", Some("file"));
        let desc = descriptor(&snap, ControlKind::File);
        let doc = doc_with(vec![snap]);
        doc.reject_files(ControlHandle(1), 2).await;
        let mut exec = FillExecutor::new(&doc, platform(Platform::Generic), ExecutorSettings::default());
        let resume = StoredDocument::from_bytes("jane.pdf", "application/pdf", b"%PDF");

        let outcome = exec
            .fill(&desc, FieldTypeId::Resume, ValueNature::File, &ResolvedValue::File(resume))
            .await;
        assert_eq!(outcome.status, FillStatus::Filled);
        assert_eq!(outcome.attempts, 3);
    }

    #[test]
    fn test_decode_accepts_data_url() {
        let doc = StoredDocument {
            file_name: "cv.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            data: "data:application/pdf;base64,JVBERg==".to_string(),
        };
        assert_eq!(&decode_document(&doc).unwrap().bytes[..], b"%PDF");
    }
}
