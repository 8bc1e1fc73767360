//! Snapshot orchestration — walks the captured DOM, applies the classifiers
//! to every element, merges table/overlay/editor/widget harvests, dedups and
//! orders the v2 rows, and returns one structured result.
//!
//! The whole result is rebuilt on every call; a per-node failure only bumps
//! the skip tally and never aborts the pass.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use eoka::Page;
use serde::Deserialize;

use crate::capture;
use crate::classify;
use crate::control;
use crate::dom::{short, DomSnapshot, NodeRef};
use crate::model::{
    BasicInfo, ElementSnapshot, Interactability, PageExtraction, PageMeta, SelectorKind,
    SkipReason, SkipTally, Summary, V2Row, Visibility,
};
use crate::overlay;
use crate::richtext::{self, EditorDiagnostics};
use crate::selector;
use crate::table;
use crate::widgets;
use crate::{name, role};

pub const DEFAULT_TABLE_WAIT_MS: u64 = 5000;

const TABLE_POLL_INTERVAL_MS: u64 = 100;

/// Options accepted by [`extract_page`].
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Restrict the generic scan to interactive nodes.
    pub only_interactives: bool,
    /// Keep non-visible nodes in the generic scan.
    pub include_hidden: bool,
    /// Poll for table readiness before capturing.
    pub wait_for_tables: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            only_interactives: true,
            include_hidden: false,
            wait_for_tables: true,
        }
    }
}

/// The extraction engine. Construct one per embedding context; it holds no
/// page state and every [`Extractor::extract`] call starts fresh.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Run the full pipeline over a captured snapshot.
    pub fn extract(&self, snap: &DomSnapshot) -> PageExtraction {
        let started = Instant::now();
        let mut skipped = SkipTally::default();
        let mut elements: Vec<ElementSnapshot> = Vec::new();
        let mut v2: Vec<V2Row> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut scanned = 0usize;

        for node in snap.iter() {
            if self.options.only_interactives && !classify::is_interactive(node) {
                continue;
            }
            if !self.options.include_hidden && !classify::is_visible(node) {
                continue;
            }
            scanned += 1;
            match pack(node) {
                Ok(el) => {
                    match v2_row(&el, Some(BasicInfo::from_node(node))) {
                        Ok(row) => push_unique(&mut v2, &mut seen, row),
                        Err(reason) => skipped.bump(reason),
                    }
                    elements.push(el);
                }
                Err(reason) => skipped.bump(reason),
            }
        }

        let table_rows = table::extract_tables(snap);
        for el in &table_rows {
            if let Ok(row) = v2_row(el, None) {
                push_unique(&mut v2, &mut seen, row);
            }
        }

        let overlays = overlay::detect(snap);
        for record in &overlays {
            for item in &record.menu_items {
                let row_type = match item.tag.as_str() {
                    "a" => "link",
                    "button" => "button",
                    _ => "menuitem",
                };
                push_unique(
                    &mut v2,
                    &mut seen,
                    V2Row::new(row_type, item.text.clone(), "click", item.selector.clone(), None),
                );
            }
        }

        for row in richtext::extract(snap) {
            push_unique(&mut v2, &mut seen, row);
        }
        for row in widgets::extract(snap) {
            push_unique(&mut v2, &mut seen, row);
        }

        elements.extend(table_rows);

        v2.sort_by(|a, b| {
            a.type_priority()
                .cmp(&b.type_priority())
                .then_with(|| a.name.cmp(&b.name))
        });

        let summary = Summary {
            total_elements: snap.len(),
            scanned,
            visible_count: elements.len(),
            dom_v2_count: v2.len(),
            skipped,
        };
        PageExtraction {
            meta: PageMeta {
                url: snap.url.clone(),
                title: snap.title.clone(),
                lang: snap
                    .lang
                    .clone()
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| "N/A".into()),
            },
            summary,
            elements,
            dom_data_v2: v2,
            overlays,
            timing_ms: started.elapsed().as_millis() as u64,
        }
    }
}

fn push_unique(rows: &mut Vec<V2Row>, seen: &mut HashSet<String>, row: V2Row) {
    if row.selector.is_empty() {
        return;
    }
    if seen.insert(row.key()) {
        rows.push(row);
    }
}

/// Classify one node into a full element snapshot. A node that cannot be
/// reliably re-located is skipped, never emitted with a null locator.
pub(crate) fn pack(node: NodeRef<'_>) -> Result<ElementSnapshot, SkipReason> {
    let selectors = selector::candidates(node);
    let locator = selector::best(&selectors)
        .map(|c| c.expression.clone())
        .ok_or(SkipReason::NoStableLocator)?;

    let visible = classify::is_visible(node);
    let interactable = visible && classify::is_interactive(node);
    Ok(ElementSnapshot {
        tag: node.tag().to_string(),
        role: role::resolve(node),
        id: node.dom_id().map(String::from),
        name: name::resolve(node).and_then(|n| short(&n, 120)),
        text: short(node.text_raw(), 120),
        visibility: if visible { Visibility::Visible } else { Visibility::NonVisible },
        interactability: if interactable {
            Interactability::Interactable
        } else {
            Interactability::NonInteractable
        },
        state: classify::element_state(node),
        input_type: node.input_type(),
        control_kind: control::control_kind(node),
        action_hint: control::action_hint(node),
        options_preview: control::options_preview(node).filter(|o| !o.is_empty()),
        selectors,
        locator,
        grid: None,
    })
}

/// Derive the canonical v2 record from an element snapshot. Role-based
/// selectors are preferred over the raw locator when available.
fn v2_row(el: &ElementSnapshot, info: Option<BasicInfo>) -> Result<V2Row, SkipReason> {
    let row_type = control::v2_type(el.role.as_deref(), &el.tag, el.input_type.as_deref());
    let name = el
        .name
        .clone()
        .or_else(|| el.text.clone())
        .or_else(|| el.id.clone())
        .ok_or(SkipReason::Unnamed)?;
    let selector = el
        .selectors
        .iter()
        .find(|c| c.kind == SelectorKind::Role)
        .map(|c| c.expression.clone())
        .unwrap_or_else(|| el.locator.clone());
    Ok(V2Row::new(
        row_type,
        name,
        el.control_kind.action(),
        selector,
        info,
    ))
}

/// Extract the current page state. Optionally waits for tables to finish
/// loading first; a poll timeout is not an error and extraction proceeds with
/// whatever is there.
pub async fn extract_page(page: &Page, options: ExtractOptions) -> eoka::Result<PageExtraction> {
    if options.wait_for_tables {
        let _ = wait_for_table_load(page, DEFAULT_TABLE_WAIT_MS).await?;
    }
    let snap = capture::capture_snapshot(page).await?;
    Ok(Extractor::new(options).extract(&snap))
}

/// Standalone readiness probe: true once every table on the page has body
/// rows or a second header row, false if the bounded wait elapses first.
pub async fn wait_for_table_load(page: &Page, max_wait_ms: u64) -> eoka::Result<bool> {
    let deadline = Instant::now() + Duration::from_millis(max_wait_ms);
    loop {
        let ready: bool = page.evaluate(capture::TABLES_READY_JS).await?;
        if ready {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_millis(TABLE_POLL_INTERVAL_MS)).await;
    }
}

/// Diagnostic probe: which embedded documents classify as rich-text editors.
pub async fn diagnose_editors(page: &Page) -> eoka::Result<EditorDiagnostics> {
    let snap = capture::capture_snapshot(page).await?;
    Ok(richtext::diagnose(&snap))
}
