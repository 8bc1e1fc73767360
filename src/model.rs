//! Extraction output model — the wire contract consumed by the harness.
//!
//! Everything here serializes to the camelCase shape the test-generation
//! harness reads (`domDataV2`, `timingMs`, …). The model is rebuilt from
//! scratch on every extraction; nothing survives between calls.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify;
use crate::dom::{short, NodeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    #[serde(rename = "visible")]
    Visible,
    #[serde(rename = "non-visible")]
    NonVisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interactability {
    #[serde(rename = "interactable")]
    Interactable,
    #[serde(rename = "non-interactable")]
    NonInteractable,
}

/// Fine-grained element state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElementState {
    pub visible: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub focusable: bool,
    pub editable: bool,
    pub expanded: bool,
    pub checked: bool,
    pub required: bool,
}

/// The interaction category a node supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Fill,
    Select,
    Check,
    Uncheck,
    Click,
}

impl ControlKind {
    /// Action verb emitted into v2 rows.
    pub fn action(self) -> &'static str {
        match self {
            ControlKind::Fill => "fill",
            ControlKind::Select => "select",
            ControlKind::Check => "check",
            ControlKind::Uncheck => "uncheck",
            ControlKind::Click => "click",
        }
    }
}

/// How the harness should actually drive the node. Mirrors [`ControlKind`]
/// except where the interaction needs more than a plain action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionHint {
    Fill,
    SelectOption,
    OpenAndPick,
    RichTextFill,
    Check,
    Uncheck,
    Click,
}

/// One way to re-locate a node later, with a stability weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorCandidate {
    #[serde(rename = "type")]
    pub kind: SelectorKind,
    pub expression: String,
    pub weight: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorKind {
    TestId,
    Role,
    Label,
    Placeholder,
    Id,
    Css,
    Text,
    Title,
    RichTextFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSection {
    Header,
    Filter,
    Body,
}

/// Position of a table-derived row within the snapshot that produced it.
/// Indices reflect DOM order at scan time only; nothing is stable across
/// reloads or re-sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRef {
    pub table_index: usize,
    pub section: GridSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

/// One discovered node with everything the harness needs to act on it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub visibility: Visibility,
    pub interactability: Interactability,
    pub state: ElementState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    pub control_kind: ControlKind,
    pub action_hint: ActionHint,
    /// Non-empty, sorted by descending weight; first entry is `locator`.
    pub selectors: Vec<SelectorCandidate>,
    pub locator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_preview: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridRef>,
}

/// Raw element facts attached to v2 rows for harness-side debugging.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub disabled: bool,
    pub visible: bool,
}

impl BasicInfo {
    pub fn from_node(node: NodeRef<'_>) -> Self {
        Self {
            tag: node.tag().to_string(),
            id: node.dom_id().map(String::from),
            classes: node.attr("class").filter(|c| !c.is_empty()).map(String::from),
            input_type: node.input_type(),
            placeholder: node.attr("placeholder").filter(|p| !p.is_empty()).map(String::from),
            value: node.value().filter(|v| !v.is_empty()).map(String::from),
            text: short(node.text_raw(), 120),
            role: node.explicit_role(),
            disabled: classify::is_disabled(node),
            visible: classify::is_visible(node),
        }
    }
}

/// Canonical emitted record. Identity key is `type|name|action|selector`;
/// the orchestrator emits each key at most once per snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct V2Row {
    #[serde(rename = "type")]
    pub row_type: String,
    pub name: String,
    pub action: String,
    pub selector: String,
    #[serde(rename = "requiresInjection", skip_serializing_if = "std::ops::Not::not")]
    pub requires_injection: bool,
    #[serde(flatten)]
    pub info: Option<BasicInfo>,
}

impl V2Row {
    pub fn new(
        row_type: impl Into<String>,
        name: impl Into<String>,
        action: impl Into<String>,
        selector: impl Into<String>,
        info: Option<BasicInfo>,
    ) -> Self {
        Self {
            row_type: row_type.into(),
            name: name.into(),
            action: action.into(),
            selector: selector.into(),
            requires_injection: false,
            info,
        }
    }

    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.row_type, self.name, self.action, self.selector
        )
    }

    /// Position in the fixed emission order:
    /// textbox < combobox < checkbox < radio < link < button < grid < other.
    pub fn type_priority(&self) -> u8 {
        match self.row_type.as_str() {
            "textbox" => 1,
            "combobox" => 2,
            "checkbox" => 3,
            "radio" => 4,
            "link" => 5,
            "button" => 6,
            "grid" => 7,
            "node" => 99,
            _ => 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayType {
    Dropdown,
    Menu,
    Popup,
    Modal,
    Dialog,
    Overlay,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlayTrigger {
    pub text: String,
    pub selectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub text: String,
    pub tag: String,
    pub selector: String,
    pub clickable: bool,
    pub data_attributes: BTreeMap<String, String>,
}

/// A currently-open transient surface and its harvested items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRecord {
    pub trigger: OverlayTrigger,
    pub menu_items: Vec<MenuItem>,
    pub overlay_type: OverlayType,
    pub panel_id: String,
}

/// Why a node was left out of the snapshot. Tallied in [`Summary`], never
/// fatal to the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing stronger than the bare-tag CSS fallback could be formed.
    NoStableLocator,
    /// No accessible name, text or id to key a v2 row on.
    Unnamed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipTally {
    pub no_stable_locator: usize,
    pub unnamed: usize,
}

impl SkipTally {
    pub fn bump(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NoStableLocator => self.no_stable_locator += 1,
            SkipReason::Unnamed => self.unnamed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.no_stable_locator + self.unnamed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub url: String,
    pub title: String,
    pub lang: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_elements: usize,
    pub scanned: usize,
    pub visible_count: usize,
    pub dom_v2_count: usize,
    pub skipped: SkipTally,
}

/// Complete result of one extraction pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageExtraction {
    pub meta: PageMeta,
    pub summary: Summary,
    pub elements: Vec<ElementSnapshot>,
    pub dom_data_v2: Vec<V2Row>,
    pub overlays: Vec<OverlayRecord>,
    pub timing_ms: u64,
}
