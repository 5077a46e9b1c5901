//! Field Inventory Collector — turns the page's interactive controls into `FieldDescriptor`s.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{ControlHandle, ControlOption, ControlSnapshot, DocumentTree, DomError};

/// Broad control family. Decides the fill strategy together with the field type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    #[default]
    Input,
    Textarea,
    Select,
    File,
}

/// Immutable snapshot of one control's identifying attributes, taken once per collection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub handle: ControlHandle,
    pub kind: ControlKind,
    pub input_type: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
    pub label: Option<String>,
    pub aria_label: Option<String>,
    pub test_id: Option<String>,
    pub title: Option<String>,
    pub class_hint: Option<String>,
    pub accept: Option<String>,
    /// Nearest heading text; feeds the classifier's context signal.
    pub section_hint: Option<String>,
    pub options: Vec<ControlOption>,
    pub current_value: String,
}

impl FieldDescriptor {
    /// Lowercased concatenation of every textual attribute the classifier reads.
    pub fn search_text(&self) -> String {
        [
            &self.label,
            &self.name,
            &self.id,
            &self.placeholder,
            &self.aria_label,
            &self.test_id,
            &self.title,
            &self.class_hint,
        ]
        .iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }

    /// Declared control type as the field-type catalog names it.
    pub fn control_type(&self) -> String {
        match self.kind {
            ControlKind::Select => "select".to_string(),
            ControlKind::Textarea => "textarea".to_string(),
            ControlKind::File => "file".to_string(),
            ControlKind::Input => self
                .input_type
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| "text".to_string()),
        }
    }

    /// Human-readable name for reports.
    pub fn display_name(&self) -> String {
        [&self.label, &self.aria_label, &self.placeholder, &self.name, &self.id]
            .iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("control {}", self.handle))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Collect visually hidden controls too. File inputs are always collected.
    pub include_hidden: bool,
}

pub(crate) const SKIPPED_INPUT_TYPES: &[&str] = &[
    "hidden", "submit", "button", "reset", "image", "checkbox", "radio",
];

/// Enumerates the page's fillable controls in document order.
pub async fn collect_fields<D: DocumentTree + ?Sized>(
    doc: &D,
    options: CollectOptions,
) -> Result<Vec<FieldDescriptor>, DomError> {
    let snapshots = doc.controls().await?;
    let total = snapshots.len();
    let fields: Vec<FieldDescriptor> = snapshots
        .into_iter()
        .filter_map(|s| descriptor_from_snapshot(s, options))
        .collect();
    debug!(total, collected = fields.len(), "Collected form fields");
    Ok(fields)
}

/// Builds a descriptor, or `None` when the control is not something we fill.
pub fn descriptor_from_snapshot(
    snapshot: ControlSnapshot,
    options: CollectOptions,
) -> Option<FieldDescriptor> {
    let input_type = snapshot
        .input_type
        .as_deref()
        .map(|t| t.trim().to_lowercase());

    let kind = match snapshot.tag.to_lowercase().as_str() {
        "textarea" => ControlKind::Textarea,
        "select" => ControlKind::Select,
        "input" if input_type.as_deref() == Some("file") => ControlKind::File,
        "input" => ControlKind::Input,
        _ => return None,
    };

    if kind == ControlKind::Input
        && input_type
            .as_deref()
            .is_some_and(|t| SKIPPED_INPUT_TYPES.contains(&t))
    {
        return None;
    }
    if snapshot.disabled || (snapshot.read_only && kind != ControlKind::File) {
        return None;
    }
    // Upload widgets are routinely hidden behind a styled button.
    if kind != ControlKind::File && !options.include_hidden && !is_visible(&snapshot) {
        return None;
    }

    Some(FieldDescriptor {
        handle: snapshot.handle,
        kind,
        input_type,
        name: snapshot.name,
        id: snapshot.id,
        placeholder: snapshot.placeholder,
        label: snapshot.label,
        aria_label: snapshot.aria_label,
        test_id: snapshot.test_id,
        title: snapshot.title,
        class_hint: snapshot.class_name,
        accept: snapshot.accept,
        section_hint: snapshot.section_heading,
        options: snapshot.options,
        current_value: snapshot.value,
    })
}

/// Computed display/visibility/opacity not hidden and a non-zero layout box.
pub fn is_visible(snapshot: &ControlSnapshot) -> bool {
    let style = &snapshot.style;
    let display_hidden = style.display.eq_ignore_ascii_case("none");
    let visibility_hidden = matches!(
        style.visibility.to_lowercase().as_str(),
        "hidden" | "collapse"
    );
    let transparent = style.opacity <= 0.0;
    let zero_box = snapshot.layout.width <= 0.0 || snapshot.layout.height <= 0.0;
    !(display_hidden || visibility_hidden || transparent || zero_box)
}
