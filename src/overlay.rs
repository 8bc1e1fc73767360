//! Overlay & dynamic-content detection.
//!
//! Two passes find currently-open transient surfaces: a fixed set of common
//! overlay markers (roles and framework class patterns), then a heuristic
//! sweep over positioned, high-stacking-order nodes with interactive content.
//! A candidate is accepted only if it is already visually open.

use std::collections::HashSet;

use crate::classify;
use crate::dom::{DomSnapshot, NodeRef};
use crate::model::{MenuItem, OverlayRecord, OverlayTrigger, OverlayType};
use crate::selector::{self, esc};

const OVERLAY_CLASS_FRAGMENTS: &[&str] =
    &["dropdown", "menu", "popup", "overlay", "popover", "tooltip"];

const OVERLAY_EXACT_CLASSES: &[&str] = &[
    "p-overlaypanel",
    "p-dropdown-panel",
    "p-menu",
    "dropdown-menu",
    "popover",
    "tooltip",
    "modal",
    "overlay",
    "popup",
    "MuiPopover-root",
    "MuiMenu-root",
    "MuiSelect-menu",
    "ant-dropdown",
    "ant-select-dropdown",
    "ant-menu",
];

const OVERLAY_ROLES: &[&str] = &["menu", "listbox", "combobox"];

const HIGH_STACKING_ORDER: i64 = 100;

const MAX_ITEM_TEXT_LEN: usize = 100;

fn is_common_overlay(node: NodeRef<'_>) -> bool {
    if let Some(role) = node.explicit_role() {
        if role == "dialog" && node.attr("aria-modal") == Some("true") {
            return true;
        }
        if OVERLAY_ROLES.contains(&role.as_str()) {
            return true;
        }
    }
    OVERLAY_EXACT_CLASSES.iter().any(|c| node.has_class(c))
        || OVERLAY_CLASS_FRAGMENTS.iter().any(|f| node.class_contains(f))
}

/// Fixed precedence when the heuristics could disagree: modal marker first,
/// dropdown marker second, computed visibility otherwise.
fn is_already_open(node: NodeRef<'_>) -> bool {
    if node.has_class("modal") {
        return node.has_class("show")
            || node.css().display == "block"
            || node.attr("aria-modal") == Some("true");
    }
    if node.has_class("dropdown-menu") {
        return node.has_class("show") || node.css().display == "block";
    }
    classify::is_visible(node)
}

fn matches_interactive(node: NodeRef<'_>) -> bool {
    if matches!(node.tag(), "button" | "a" | "input" | "select" | "textarea") {
        return true;
    }
    if matches!(
        node.explicit_role().as_deref(),
        Some("button") | Some("menuitem") | Some("option") | Some("menu") | Some("menubar")
            | Some("tab")
    ) {
        return true;
    }
    if node.has_attr("tabindex")
        || node.has_onclick()
        || node.has_attr("aria-haspopup")
        || node.has_attr("aria-expanded")
        || node.has_attr("aria-controls")
    {
        return true;
    }
    ["item", "option", "choice", "menu", "dropdown"]
        .iter()
        .any(|f| node.class_contains(f))
}

fn has_interactive_content(node: NodeRef<'_>) -> bool {
    if matches_interactive(node) || node.descendants().any(|d| matches_interactive(d)) {
        return true;
    }
    let text = node.text();
    !text.is_empty()
        && text.chars().count() < 200
        && (node.css().cursor == "pointer" || node.has_onclick())
}

fn is_item(node: NodeRef<'_>) -> bool {
    if matches!(node.explicit_role().as_deref(), Some("menuitem") | Some("option")) {
        return true;
    }
    if matches!(node.tag(), "li" | "a" | "button") {
        return true;
    }
    if ["item", "option", "choice"].iter().any(|f| node.class_contains(f)) {
        return true;
    }
    node.has_attr("data-value") || node.has_attr("data-option") || node.has_attr("data-item")
}

fn is_clickable(node: NodeRef<'_>) -> bool {
    matches!(node.tag(), "button" | "a" | "input")
        || matches!(
            node.explicit_role().as_deref(),
            Some("button") | Some("menuitem") | Some("option")
        )
        || node.has_onclick()
        || node.css().cursor == "pointer"
        || node.tab_index() >= 0
}

fn item_selector(item: NodeRef<'_>, text: &str) -> String {
    selector::candidates(item)
        .into_iter()
        .find(|c| c.weight >= 60)
        .map(|c| c.expression)
        .unwrap_or_else(|| format!("getByText('{}')", esc(text)))
}

fn data_attributes(node: NodeRef<'_>) -> std::collections::BTreeMap<String, String> {
    let mut out = std::collections::BTreeMap::new();
    for key in ["data-value", "data-option", "data-item", "data-field", "data-testid"] {
        if let Some(v) = node.attr(key) {
            out.insert(key.to_string(), v.to_string());
        }
    }
    out
}

/// Items inside an accepted overlay, collapsed by text.
fn menu_items(overlay: NodeRef<'_>) -> Vec<MenuItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for d in overlay.descendants() {
        if !is_item(d) {
            continue;
        }
        let text = d.text();
        if text.is_empty() || text.chars().count() >= MAX_ITEM_TEXT_LEN {
            continue;
        }
        if !seen.insert(text.clone()) {
            continue;
        }
        items.push(MenuItem {
            selector: item_selector(d, &text),
            tag: d.tag().to_string(),
            clickable: is_clickable(d),
            data_attributes: data_attributes(d),
            text,
        });
    }
    items
}

fn overlay_type(node: NodeRef<'_>) -> OverlayType {
    if node.class_contains("dropdown") {
        return OverlayType::Dropdown;
    }
    if node.class_contains("menu") {
        return OverlayType::Menu;
    }
    if node.class_contains("popup") || node.class_contains("popover") {
        return OverlayType::Popup;
    }
    if node.class_contains("modal") || node.class_contains("dialog") {
        return OverlayType::Modal;
    }
    match node.explicit_role().as_deref() {
        Some("menu") => OverlayType::Menu,
        Some("dialog") => OverlayType::Dialog,
        _ => OverlayType::Overlay,
    }
}

fn record_for(overlay: NodeRef<'_>) -> Option<OverlayRecord> {
    let items = menu_items(overlay);
    if items.is_empty() {
        return None;
    }
    let selectors = selector::candidates(overlay)
        .into_iter()
        .take(3)
        .map(|c| c.expression)
        .collect();
    Some(OverlayRecord {
        trigger: OverlayTrigger {
            text: format!("Active Menu ({} items)", items.len()),
            selectors,
        },
        menu_items: items,
        overlay_type: overlay_type(overlay),
        panel_id: overlay
            .dom_id()
            .map(String::from)
            .unwrap_or_else(|| "detected-overlay".into()),
    })
}

/// Find all currently-open overlays and harvest their item lists.
pub fn detect(snap: &DomSnapshot) -> Vec<OverlayRecord> {
    let mut accepted: Vec<usize> = Vec::new();
    let mut accepted_set = HashSet::new();

    for node in snap.iter() {
        if is_common_overlay(node)
            && classify::is_visible(node)
            && has_interactive_content(node)
            && is_already_open(node)
            && accepted_set.insert(node.id())
        {
            accepted.push(node.id());
        }
    }

    for node in snap.iter() {
        let css = node.css();
        if (css.position == "absolute" || css.position == "fixed")
            && css.z_index > HIGH_STACKING_ORDER
            && classify::is_visible(node)
            && has_interactive_content(node)
            && accepted_set.insert(node.id())
        {
            accepted.push(node.id());
        }
    }

    let mut records = Vec::new();
    for id in accepted {
        if let Some(record) = record_for(snap.node(id)) {
            records.push(record);
        }
    }

    // Trigger-paired dropdowns: a toggle plus its (visible) menu inside one
    // container. Skipped when the menu itself was already accepted above.
    for container in snap.iter() {
        if !(container.has_class("dropdown") || container.has_attr("aria-haspopup")) {
            continue;
        }
        let trigger = container.descendants().find(|d| {
            d.has_attr("data-toggle") || d.has_attr("aria-haspopup") || d.has_class("dropdown-toggle")
        });
        let menu = container.descendants().find(|d| {
            d.has_class("dropdown-menu")
                || d.explicit_role().as_deref() == Some("menu")
                || matches!(d.tag(), "ul" | "ol")
        });
        let (Some(trigger), Some(menu)) = (trigger, menu) else {
            continue;
        };
        if accepted_set.contains(&menu.id()) || !classify::is_visible(menu) {
            continue;
        }
        let items = menu_items(menu);
        if items.is_empty() {
            continue;
        }
        records.push(OverlayRecord {
            trigger: OverlayTrigger {
                text: trigger.text(),
                selectors: selector::candidates(trigger)
                    .into_iter()
                    .take(3)
                    .map(|c| c.expression)
                    .collect(),
            },
            menu_items: items,
            overlay_type: OverlayType::Dropdown,
            panel_id: menu
                .dom_id()
                .map(String::from)
                .unwrap_or_else(|| "detected-overlay".into()),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fixtures::{n, snapshot};

    #[test]
    fn test_open_dropdown_menu_is_detected() {
        let snap = snapshot(vec![n("ul")
            .attr("id", "actions")
            .attr("class", "dropdown-menu show")
            .child(n("li").child(n("a").attr("href", "#edit").text("Edit")))
            .child(n("li").child(n("a").attr("href", "#delete").text("Delete")))]);
        let records = detect(&snap);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.overlay_type, OverlayType::Dropdown);
        assert_eq!(record.panel_id, "actions");
        let texts: Vec<&str> = record.menu_items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Edit", "Delete"]);
        assert!(record.menu_items.iter().all(|i| i.clickable));
        assert_eq!(record.trigger.text, "Active Menu (2 items)");
    }

    #[test]
    fn test_closed_dropdown_is_ignored() {
        let snap = snapshot(vec![n("ul")
            .attr("class", "dropdown-menu")
            .hidden()
            .child(n("li").child(n("a").attr("href", "#x").text("Edit")))]);
        assert!(detect(&snap).is_empty());
    }

    #[test]
    fn test_duplicate_item_text_is_collapsed() {
        let snap = snapshot(vec![n("div")
            .attr("class", "p-menu")
            .child(n("li").attr("class", "p-menuitem").text("Copy"))
            .child(n("li").attr("class", "p-menuitem").text("Copy"))]);
        let records = detect(&snap);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].menu_items.len(), 1);
    }

    #[test]
    fn test_modal_dialog_classification() {
        let snap = snapshot(vec![n("div")
            .attr("id", "confirm")
            .attr("role", "dialog")
            .attr("aria-modal", "true")
            .child(n("button").text("Confirm"))
            .child(n("button").text("Cancel"))]);
        let records = detect(&snap);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].overlay_type, OverlayType::Dialog);
        assert_eq!(records[0].panel_id, "confirm");
    }

    #[test]
    fn test_positioned_high_z_surface_is_detected() {
        let snap = snapshot(vec![n("div")
            .attr("id", "floating")
            .positioned("absolute", 999)
            .child(n("button").text("Apply"))
            .child(n("button").text("Reset"))]);
        let records = detect(&snap);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].overlay_type, OverlayType::Overlay);
        let texts: Vec<&str> = records[0].menu_items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Apply", "Reset"]);
    }

    #[test]
    fn test_trigger_paired_dropdown() {
        let snap = snapshot(vec![n("div")
            .attr("class", "dropdown")
            .child(
                n("button")
                    .attr("class", "dropdown-toggle")
                    .attr("data-toggle", "dropdown")
                    .text("Options"),
            )
            .child(
                n("ul")
                    .attr("id", "opts")
                    .child(n("li").child(n("a").attr("href", "#a").text("First")))
                    .child(n("li").child(n("a").attr("href", "#b").text("Second"))),
            )]);
        let records = detect(&snap);
        let paired = records
            .iter()
            .find(|r| r.trigger.text == "Options")
            .expect("trigger-paired record");
        assert_eq!(paired.overlay_type, OverlayType::Dropdown);
        assert_eq!(paired.panel_id, "opts");
        assert_eq!(paired.menu_items.len(), 2);
    }
}
