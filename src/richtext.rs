//! Rich-text editor detection.
//!
//! Targets embedded editing surfaces (editor iframes such as TinyMCE) and
//! same-document content-editable regions. Frame readability is a typed
//! outcome reported by the capture script — a cross-origin frame yields a
//! degraded row that the harness must fill through script injection, never a
//! scan failure.

use serde::Serialize;

use crate::dom::{DomSnapshot, FrameStatus, NodeRef};
use crate::model::{BasicInfo, SelectorCandidate, SelectorKind, V2Row};
use crate::selector::{attr_esc, css_escape};
use crate::classify;

/// Class markers of editor-hosting containers for same-document regions.
const EDITOR_CONTAINER_CLASSES: &[&str] = &["tox-edit-area", "editor", "rich-text"];

/// Whether the iframe's own attributes mark it as an editor surface.
fn editor_signal(node: NodeRef<'_>) -> bool {
    let title = node.attr("title").unwrap_or("").to_lowercase();
    let class = node.attr("class").unwrap_or("").to_lowercase();
    let id = node.attr("id").unwrap_or("").to_lowercase();
    title.contains("rich text")
        || title.contains("editor")
        || class.contains("tox-edit-area")
        || class.contains("editor")
        || id.contains("editor")
        || id.contains("jseditor")
}

/// Whether an iframe is an editable editor surface. Attribute signals count
/// even when the embedded document cannot be read; a readable frame with an
/// editable body counts regardless of markup.
pub fn is_editor_frame(node: NodeRef<'_>) -> bool {
    if node.tag() != "iframe" {
        return false;
    }
    match node.frame() {
        Some(FrameStatus::Readable { editable_body }) => editable_body || editor_signal(node),
        Some(FrameStatus::Denied) | None => editor_signal(node),
    }
}

/// Frame-piercing selector candidates for an editor iframe, preferring id,
/// then title substring, then editor-framework class.
pub fn frame_candidates(node: NodeRef<'_>) -> Vec<SelectorCandidate> {
    let mut out = Vec::new();
    let mut push = |expression: String, weight: u8| {
        out.push(SelectorCandidate {
            kind: SelectorKind::RichTextFrame,
            expression,
            weight,
        });
    };

    if let Some(id) = node.dom_id() {
        push(
            format!("locator('#{}').contentLocator('body')", css_escape(id)),
            95,
        );
    }
    if let Some(title) = node.attr("title").filter(|t| !t.is_empty()) {
        push(
            format!(
                "locator('iframe[title*=\"{}\"]').contentLocator('body')",
                attr_esc(title)
            ),
            90,
        );
    }
    if node.class_contains("tox-edit-area") {
        push("locator('.tox-edit-area iframe').contentLocator('body')".into(), 85);
    }
    push(
        "locator('iframe[title*=\"Rich Text\"]').contentLocator('body')".into(),
        70,
    );
    push(
        "locator('iframe.tox-edit-area__iframe').contentLocator('body')".into(),
        65,
    );
    out
}

fn best_frame_selector(node: NodeRef<'_>) -> String {
    frame_candidates(node)
        .into_iter()
        .next()
        .map(|c| c.expression)
        .unwrap_or_else(|| "locator('iframe[title*=\"Rich Text\"]').contentLocator('body')".into())
}

fn editor_name(node: NodeRef<'_>) -> String {
    node.attr("title")
        .filter(|t| !t.is_empty())
        .or_else(|| node.attr("aria-label").filter(|t| !t.is_empty()))
        .map(String::from)
        .unwrap_or_else(|| "Rich Text Editor".into())
}

/// Harvest v2 rows for every detected editor surface.
pub fn extract(snap: &DomSnapshot) -> Vec<V2Row> {
    let mut rows = Vec::new();

    for iframe in snap.iter().filter(|x| x.tag() == "iframe") {
        if !classify::is_visible(iframe) || !editor_signal(iframe) {
            continue;
        }
        match iframe.frame() {
            Some(FrameStatus::Readable { editable_body: true }) => {
                rows.push(V2Row::new(
                    "textbox",
                    editor_name(iframe),
                    "richTextFill",
                    best_frame_selector(iframe),
                    Some(BasicInfo::from_node(iframe)),
                ));
            }
            Some(FrameStatus::Denied) => {
                let mut row = V2Row::new(
                    "textbox",
                    editor_name(iframe),
                    "richTextFill",
                    best_frame_selector(iframe),
                    Some(BasicInfo::from_node(iframe)),
                );
                row.requires_injection = true;
                rows.push(row);
            }
            // Readable but no editable body: not an editing surface after all.
            _ => {}
        }
    }

    // Same-document content-editable regions inside editor-ish containers.
    for region in snap.iter() {
        if region.tag() == "iframe" || !region.content_editable() {
            continue;
        }
        if !classify::is_visible(region) {
            continue;
        }
        let in_editor_container = region
            .closest(|a| {
                EDITOR_CONTAINER_CLASSES.iter().any(|c| a.has_class(c))
                    || a.class_contains("editor")
            })
            .is_some();
        if !in_editor_container {
            continue;
        }
        let name = region
            .attr("aria-label")
            .or_else(|| region.attr("title"))
            .filter(|t| !t.is_empty())
            .map(String::from)
            .unwrap_or_else(|| "Rich Text Editor".into());
        rows.push(V2Row::new(
            "textbox",
            name,
            "fill",
            "locator('[contenteditable=\"true\"]')",
            Some(BasicInfo::from_node(region)),
        ));
    }

    rows
}

/// Per-iframe classification report for harness-side troubleshooting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IframeProbe {
    pub id: Option<String>,
    pub title: Option<String>,
    pub classes: Option<String>,
    pub visible: bool,
    pub is_rich_text_editor: bool,
    pub has_editable_body: bool,
    pub cross_origin: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionProbe {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Option<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorDiagnostics {
    pub iframes: Vec<IframeProbe>,
    pub rich_text_editors: Vec<IframeProbe>,
    pub content_editables: Vec<RegionProbe>,
}

/// Enumerate embedded-document candidates and report which are classified as
/// editors.
pub fn diagnose(snap: &DomSnapshot) -> EditorDiagnostics {
    let mut diag = EditorDiagnostics::default();

    for iframe in snap.iter().filter(|x| x.tag() == "iframe") {
        let probe = IframeProbe {
            id: iframe.dom_id().map(String::from),
            title: iframe.attr("title").map(String::from),
            classes: iframe.attr("class").map(String::from),
            visible: classify::is_visible(iframe),
            is_rich_text_editor: is_editor_frame(iframe),
            has_editable_body: matches!(
                iframe.frame(),
                Some(FrameStatus::Readable { editable_body: true })
            ),
            cross_origin: iframe.frame() == Some(FrameStatus::Denied),
        };
        if probe.is_rich_text_editor {
            diag.rich_text_editors.push(probe.clone());
        }
        diag.iframes.push(probe);
    }

    for region in snap.iter() {
        if region.tag() != "iframe" && region.content_editable() {
            diag.content_editables.push(RegionProbe {
                tag: region.tag().to_string(),
                id: region.dom_id().map(String::from),
                classes: region.attr("class").map(String::from),
                visible: classify::is_visible(region),
            });
        }
    }

    diag
}
