//! Document seam — everything the autofill engine knows about a page goes through here.
//!
//! The classifier, resolver and executor never touch a rendering engine directly.
//! They see `ControlSnapshot`s (read once per collection pass) and talk to controls
//! through `ControlAdapter`. `DocumentTree` adds the page-level reads the collector,
//! platform detector and page watcher need.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod virtual_doc;

pub use virtual_doc::{ControlState, PageSnapshot, VirtualDocument};

/// Opaque identity of one control on the page. Stable for the lifetime of the control.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ControlHandle(pub u32);

impl std::fmt::Display for ControlHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum DomError {
    #[error("control {0} no longer exists")]
    Detached(ControlHandle),

    #[error("control {handle} rejected the write: {reason}")]
    WriteRejected {
        handle: ControlHandle,
        reason: String,
    },

    #[error("control {handle} has no option with value '{value}'")]
    UnknownOption { handle: ControlHandle, value: String },

    #[error("control {0} does not accept files")]
    NotAFileInput(ControlHandle),

    #[error("event dispatch failed on {handle}: {reason}")]
    Dispatch {
        handle: ControlHandle,
        reason: String,
    },
}

/// One entry of a select-like control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlOption {
    pub value: String,
    pub text: String,
}

impl ControlOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }

    /// Placeholder entries such as "Select..." or "-- Choose --" carry no answer.
    pub fn is_placeholder(&self) -> bool {
        if self.value.trim().is_empty() {
            return true;
        }
        let text = self.text.trim().to_lowercase();
        text.is_empty()
            || text.starts_with("select")
            || text.starts_with("choose")
            || text.starts_with("please select")
            || text.starts_with("--")
    }
}

/// Computed style subset used for the visibility test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    #[serde(default = "default_display")]
    pub display: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_display() -> String {
    "block".to_string()
}

fn default_visibility() -> String {
    "visible".to_string()
}

fn default_opacity() -> f32 {
    1.0
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: default_display(),
            visibility: default_visibility(),
            opacity: default_opacity(),
        }
    }
}

/// Layout box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub width: f32,
    pub height: f32,
}

impl Default for LayoutBox {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 32.0,
        }
    }
}

/// Raw attributes of one interactive element, as read from the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub handle: ControlHandle,
    /// Lowercase tag name: `input`, `textarea` or `select`.
    pub tag: String,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Text of the associated `<label>`.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub accept: Option<String>,
    /// Nearest heading text above the control.
    #[serde(default)]
    pub section_heading: Option<String>,
    #[serde(default)]
    pub options: Vec<ControlOption>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub layout: LayoutBox,
}

/// Synthetic events dispatched after a value is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomEvent {
    Focus,
    Input,
    Change,
    Blur,
    KeyDown { key: String },
    KeyUp { key: String },
}

impl DomEvent {
    pub fn enter() -> Self {
        DomEvent::KeyDown {
            key: "Enter".to_string(),
        }
    }
}

/// A file object built from a stored document, ready to hand to a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Bytes,
}

/// Per-control operations. The only way the engine mutates a page.
#[async_trait]
pub trait ControlAdapter: Send + Sync {
    async fn focus(&self, handle: ControlHandle) -> Result<(), DomError>;

    /// Current value. For file inputs this is the attached file name, or empty.
    async fn read_value(&self, handle: ControlHandle) -> Result<String, DomError>;

    /// Assigns a value. For selects `value` must be one of the option values.
    async fn write_value(&self, handle: ControlHandle, value: &str) -> Result<(), DomError>;

    async fn list_options(&self, handle: ControlHandle) -> Result<Vec<ControlOption>, DomError>;

    async fn attach_file(&self, handle: ControlHandle, file: SyntheticFile)
        -> Result<(), DomError>;

    async fn dispatch_event(&self, handle: ControlHandle, event: DomEvent)
        -> Result<(), DomError>;
}

/// Page-level reads on top of the control adapter.
#[async_trait]
pub trait DocumentTree: ControlAdapter {
    /// Full navigable location of the page.
    async fn location(&self) -> Result<String, DomError>;

    /// Whether any element matches a DOM-signature selector.
    async fn has_selector(&self, selector: &str) -> Result<bool, DomError>;

    /// Every interactive control, in document order, with its current value.
    async fn controls(&self) -> Result<Vec<ControlSnapshot>, DomError>;
}

/// Extracts the lowercase hostname from an absolute URL.
pub fn hostname_of(url: &str) -> String {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    let host = host.split(':').next().unwrap_or_default();
    host.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_of_strips_scheme_path_and_port() {
        assert_eq!(
            hostname_of("https://boards.greenhouse.io/acme/jobs/123?gh_src=x"),
            "boards.greenhouse.io"
        );
        assert_eq!(hostname_of("http://LOCALHOST:3000/apply"), "localhost");
        assert_eq!(hostname_of("https://user@jobs.lever.co"), "jobs.lever.co");
    }

    #[test]
    fn test_placeholder_options_detected() {
        assert!(ControlOption::new("", "Select...").is_placeholder());
        assert!(ControlOption::new("0", "-- Choose one --").is_placeholder());
        assert!(!ControlOption::new("yes", "Yes").is_placeholder());
    }

    #[test]
    fn test_snapshot_deserializes_with_defaults() {
        let json = r#"{"handle": 4, "tag": "input", "label": "Email"}"#;
        let snap: ControlSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.handle, ControlHandle(4));
        assert_eq!(snap.style.display, "block");
        assert!((snap.style.opacity - 1.0).abs() < f32::EPSILON);
        assert!(snap.options.is_empty());
        assert!(snap.value.is_empty());
    }
}
