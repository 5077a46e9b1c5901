//! In-memory document tree built from a page snapshot.
//!
//! Backs the HTTP surface (a client posts the page it sees, the engine fills it here and
//! returns the resulting values) and every engine test.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::dom::{
    ControlAdapter, ControlHandle, ControlOption, ControlSnapshot, DocumentTree, DomError,
    DomEvent, SyntheticFile,
};

/// Serializable view of a page: its location, the DOM signatures present, and its controls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    /// Selectors that match at least one element on the page.
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default)]
    pub controls: Vec<ControlSnapshot>,
}

impl PageSnapshot {
    pub fn has_file_input(&self) -> bool {
        self.controls
            .iter()
            .any(|c| c.input_type.as_deref() == Some("file"))
    }
}

/// Final state of one control after a run.
#[derive(Debug, Clone, Serialize)]
pub struct ControlState {
    pub handle: ControlHandle,
    pub value: String,
    pub file_name: Option<String>,
    pub events: Vec<DomEvent>,
}

#[derive(Debug)]
struct VirtualControl {
    snapshot: ControlSnapshot,
    file: Option<SyntheticFile>,
    events: Vec<DomEvent>,
    fail_writes: bool,
    fail_key_events: bool,
    file_rejections: u32,
}

impl VirtualControl {
    fn new(snapshot: ControlSnapshot) -> Self {
        Self {
            snapshot,
            file: None,
            events: Vec::new(),
            fail_writes: false,
            fail_key_events: false,
            file_rejections: 0,
        }
    }
}

#[derive(Debug, Default)]
struct VirtualState {
    url: String,
    selectors: HashSet<String>,
    order: Vec<ControlHandle>,
    controls: HashMap<ControlHandle, VirtualControl>,
    write_count: usize,
}

impl VirtualState {
    fn control(&self, handle: ControlHandle) -> Result<&VirtualControl, DomError> {
        self.controls
            .get(&handle)
            .ok_or(DomError::Detached(handle))
    }

    fn control_mut(&mut self, handle: ControlHandle) -> Result<&mut VirtualControl, DomError> {
        self.controls
            .get_mut(&handle)
            .ok_or(DomError::Detached(handle))
    }
}

pub struct VirtualDocument {
    state: Mutex<VirtualState>,
}

impl VirtualDocument {
    pub fn new(page: PageSnapshot) -> Self {
        let mut state = VirtualState {
            url: page.url,
            selectors: page.selectors.into_iter().collect(),
            ..Default::default()
        };
        for snapshot in page.controls {
            state.order.push(snapshot.handle);
            state.controls.insert(snapshot.handle, VirtualControl::new(snapshot));
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Simulates a client-side navigation.
    pub async fn navigate(&self, url: &str) {
        self.state.lock().await.url = url.to_string();
    }

    /// Replaces the page content, as a multi-step form does when it renders the next step.
    pub async fn replace_controls(&self, controls: Vec<ControlSnapshot>) {
        let mut state = self.state.lock().await;
        state.order.clear();
        state.controls.clear();
        for snapshot in controls {
            state.order.push(snapshot.handle);
            state.controls.insert(snapshot.handle, VirtualControl::new(snapshot));
        }
    }

    /// Makes every value write to `handle` fail.
    pub async fn fail_writes(&self, handle: ControlHandle) {
        if let Some(control) = self.state.lock().await.controls.get_mut(&handle) {
            control.fail_writes = true;
        }
    }

    /// Makes keydown/keyup dispatch to `handle` fail, as a widget that swallows key events does.
    pub async fn fail_key_events(&self, handle: ControlHandle) {
        if let Some(control) = self.state.lock().await.controls.get_mut(&handle) {
            control.fail_key_events = true;
        }
    }

    /// Makes the next `count` file attachments to `handle` fail.
    pub async fn reject_files(&self, handle: ControlHandle, count: u32) {
        if let Some(control) = self.state.lock().await.controls.get_mut(&handle) {
            control.file_rejections = count;
        }
    }

    /// Number of successful value writes and file attachments since construction.
    pub async fn write_count(&self) -> usize {
        self.state.lock().await.write_count
    }

    pub async fn value_of(&self, handle: ControlHandle) -> Option<String> {
        let state = self.state.lock().await;
        state.controls.get(&handle).map(|c| c.snapshot.value.clone())
    }

    pub async fn file_of(&self, handle: ControlHandle) -> Option<SyntheticFile> {
        let state = self.state.lock().await;
        state.controls.get(&handle).and_then(|c| c.file.clone())
    }

    pub async fn events_of(&self, handle: ControlHandle) -> Vec<DomEvent> {
        let state = self.state.lock().await;
        state
            .controls
            .get(&handle)
            .map(|c| c.events.clone())
            .unwrap_or_default()
    }

    /// Final state of every control, in document order.
    pub async fn states(&self) -> Vec<ControlState> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|h| state.controls.get(h))
            .map(|c| ControlState {
                handle: c.snapshot.handle,
                value: c.snapshot.value.clone(),
                file_name: c.file.as_ref().map(|f| f.name.clone()),
                events: c.events.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl ControlAdapter for VirtualDocument {
    async fn focus(&self, handle: ControlHandle) -> Result<(), DomError> {
        let mut state = self.state.lock().await;
        state.control_mut(handle)?.events.push(DomEvent::Focus);
        Ok(())
    }

    async fn read_value(&self, handle: ControlHandle) -> Result<String, DomError> {
        let state = self.state.lock().await;
        let control = state.control(handle)?;
        if control.snapshot.input_type.as_deref() == Some("file") {
            return Ok(control
                .file
                .as_ref()
                .map(|f| f.name.clone())
                .unwrap_or_default());
        }
        Ok(control.snapshot.value.clone())
    }

    async fn write_value(&self, handle: ControlHandle, value: &str) -> Result<(), DomError> {
        let mut state = self.state.lock().await;
        let control = state.control_mut(handle)?;
        if control.fail_writes {
            return Err(DomError::WriteRejected {
                handle,
                reason: "control is not writable".to_string(),
            });
        }
        if control.snapshot.tag == "select"
            && !control.snapshot.options.iter().any(|o| o.value == value)
        {
            return Err(DomError::UnknownOption {
                handle,
                value: value.to_string(),
            });
        }
        control.snapshot.value = value.to_string();
        state.write_count += 1;
        Ok(())
    }

    async fn list_options(&self, handle: ControlHandle) -> Result<Vec<ControlOption>, DomError> {
        let state = self.state.lock().await;
        Ok(state.control(handle)?.snapshot.options.clone())
    }

    async fn attach_file(
        &self,
        handle: ControlHandle,
        file: SyntheticFile,
    ) -> Result<(), DomError> {
        let mut state = self.state.lock().await;
        let control = state.control_mut(handle)?;
        if control.snapshot.input_type.as_deref() != Some("file") {
            return Err(DomError::NotAFileInput(handle));
        }
        if control.file_rejections > 0 {
            control.file_rejections -= 1;
            return Err(DomError::WriteRejected {
                handle,
                reason: "file list is read-only".to_string(),
            });
        }
        control.file = Some(file);
        state.write_count += 1;
        Ok(())
    }

    async fn dispatch_event(&self, handle: ControlHandle, event: DomEvent) -> Result<(), DomError> {
        let mut state = self.state.lock().await;
        let control = state.control_mut(handle)?;
        if control.fail_key_events
            && matches!(event, DomEvent::KeyDown { .. } | DomEvent::KeyUp { .. })
        {
            return Err(DomError::Dispatch {
                handle,
                reason: "key events are not accepted".to_string(),
            });
        }
        control.events.push(event);
        Ok(())
    }
}

#[async_trait]
impl DocumentTree for VirtualDocument {
    async fn location(&self) -> Result<String, DomError> {
        Ok(self.state.lock().await.url.clone())
    }

    async fn has_selector(&self, selector: &str) -> Result<bool, DomError> {
        Ok(self.state.lock().await.selectors.contains(selector))
    }

    async fn controls(&self) -> Result<Vec<ControlSnapshot>, DomError> {
        let state = self.state.lock().await;
        Ok(state
            .order
            .iter()
            .filter_map(|h| state.controls.get(h))
            .map(|c| c.snapshot.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(handle: u32) -> ControlSnapshot {
        ControlSnapshot {
            handle: ControlHandle(handle),
            tag: "select".to_string(),
            options: vec![
                ControlOption::new("", "Select..."),
                ControlOption::new("yes", "Yes"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_select_rejects_unknown_option() {
        let doc = VirtualDocument::new(PageSnapshot {
            url: "https://example.com".to_string(),
            controls: vec![select(1)],
            ..Default::default()
        });
        let err = doc.write_value(ControlHandle(1), "maybe").await.unwrap_err();
        assert!(matches!(err, DomError::UnknownOption { .. }));
        doc.write_value(ControlHandle(1), "yes").await.unwrap();
        assert_eq!(doc.value_of(ControlHandle(1)).await.unwrap(), "yes");
        assert_eq!(doc.write_count().await, 1);
    }

    #[tokio::test]
    async fn test_file_input_reports_attached_name_as_value() {
        let doc = VirtualDocument::new(PageSnapshot {
            url: "https://example.com".to_string(),
            controls: vec![ControlSnapshot {
                handle: ControlHandle(2),
                tag: "input".to_string(),
                input_type: Some("file".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });
        assert_eq!(doc.read_value(ControlHandle(2)).await.unwrap(), "");
        doc.attach_file(
            ControlHandle(2),
            SyntheticFile {
                name: "resume.pdf".to_string(),
                media_type: "application/pdf".to_string(),
                bytes: bytes::Bytes::from_static(b"%PDF"),
            },
        )
        .await
        .unwrap();
        assert_eq!(doc.read_value(ControlHandle(2)).await.unwrap(), "resume.pdf");
    }

    #[tokio::test]
    async fn test_detached_handle_errors() {
        let doc = VirtualDocument::new(PageSnapshot::default());
        let err = doc.focus(ControlHandle(9)).await.unwrap_err();
        assert!(matches!(err, DomError::Detached(ControlHandle(9))));
    }
}
