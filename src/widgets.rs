//! Dynamic widget harvesting: date-range inputs, open calendar grids,
//! enhanced (chosen.js-style) selects, and standalone checkboxes whose label
//! needs inference.

use crate::classify;
use crate::dom::{DomSnapshot, NodeRef};
use crate::model::{BasicInfo, V2Row};
use crate::name;
use crate::selector::{self, attr_esc, css_escape, esc};

const DATE_NAME_HINTS: &[&str] = &[
    "check-in", "checkin", "check in", "check-out", "checkout", "check out", "date",
];

const CALENDAR_CLASSES: &[&str] =
    &["datepicker", "ui-datepicker-calendar", "p-datepicker-calendar"];

const MAX_CALENDAR_DAYS: usize = 6;

pub fn extract(snap: &DomSnapshot) -> Vec<V2Row> {
    let mut rows = Vec::new();
    rows.extend(date_inputs(snap));
    rows.extend(calendar_grid(snap));
    rows.extend(enhanced_selects(snap));
    rows.extend(standalone_checkboxes(snap));
    rows
}

fn mentions_date(s: &str) -> bool {
    let s = s.to_lowercase();
    DATE_NAME_HINTS.iter().any(|h| s.contains(h))
}

/// Datepicker entry fields open on click rather than accepting typed text.
fn date_inputs(snap: &DomSnapshot) -> Vec<V2Row> {
    let mut rows = Vec::new();
    for node in snap.iter() {
        let textish = node.tag() == "input"
            || node.explicit_role().as_deref() == Some("textbox");
        if !textish || !classify::is_visible(node) {
            continue;
        }
        let nm = name::resolve(node);
        let placeholder = node.attr("placeholder").unwrap_or("");
        let hit = nm.as_deref().map(mentions_date).unwrap_or(false) || mentions_date(placeholder);
        if !hit {
            continue;
        }
        let candidates = selector::candidates(node);
        let Some(best) = selector::best(&candidates) else {
            continue;
        };
        let display = nm
            .or_else(|| Some(placeholder.to_string()).filter(|p| !p.is_empty()))
            .unwrap_or_else(|| "Check-in / Check-out".into());
        rows.push(V2Row::new(
            "textbox",
            display,
            "click",
            best.expression.clone(),
            Some(BasicInfo::from_node(node)),
        ));
    }
    rows
}

/// The first open calendar grid plus a few of its day buttons.
fn calendar_grid(snap: &DomSnapshot) -> Vec<V2Row> {
    let mut rows = Vec::new();
    let grid = snap.iter().find(|node| {
        let by_role = node.explicit_role().as_deref() == Some("grid")
            && node
                .attr("aria-label")
                .map(|l| l.to_lowercase().contains("calendar"))
                .unwrap_or(false);
        let by_class = CALENDAR_CLASSES.iter().any(|c| node.has_class(c));
        (by_role || by_class) && classify::is_visible(*node)
    });
    let Some(grid) = grid else {
        return rows;
    };

    rows.push(V2Row::new(
        "grid",
        "Calendar",
        "none",
        "getByRole('grid',{ name:'Calendar' })",
        None,
    ));

    let days = grid
        .descendants()
        .filter(|d| {
            (d.tag() == "button" || d.explicit_role().as_deref() == Some("button"))
                && classify::is_visible(*d)
        })
        .filter(|d| {
            let text = d.text();
            !text.is_empty() && text.len() <= 2 && text.chars().all(|c| c.is_ascii_digit())
        })
        .take(MAX_CALENDAR_DAYS);
    for day in days {
        let text = day.text();
        rows.push(V2Row::new(
            "button",
            text.clone(),
            "click",
            format!("getByRole('button',{{ name:'{}' }})", esc(&text)),
            None,
        ));
    }
    rows
}

/// Selects enhanced by a companion widget container (`#<id>_chosen`); the
/// native select stays the scripting target.
fn enhanced_selects(snap: &DomSnapshot) -> Vec<V2Row> {
    let mut rows = Vec::new();
    let mut emitted = std::collections::HashSet::new();

    let mut emit = |select: NodeRef<'_>| {
        let Some(id) = select.dom_id() else { return };
        if !emitted.insert(id.to_string()) {
            return;
        }
        let placeholder = select
            .attr("data-placeholder")
            .filter(|p| !p.is_empty())
            .unwrap_or("Select option");
        rows.push(V2Row::new(
            "combobox",
            placeholder,
            "select",
            format!("locator('#{}')", css_escape(id)),
            Some(BasicInfo::from_node(select)),
        ));
    };

    for select in snap.iter().filter(|x| x.tag() == "select") {
        if !(select.has_class("chosen") || select.has_attr("data-placeholder")) {
            continue;
        }
        let Some(id) = select.dom_id() else { continue };
        if snap.by_dom_id(&format!("{}_chosen", id)).is_some() {
            emit(select);
        }
    }

    for container in snap.iter() {
        let chosen_like = container.has_class("chosen-container")
            || container.dom_id().map(|id| id.ends_with("_chosen")).unwrap_or(false);
        if !chosen_like || !classify::is_visible(container) {
            continue;
        }
        let Some(container_id) = container.dom_id() else { continue };
        let select_id = container_id.trim_end_matches("_chosen");
        if let Some(select) = snap.by_dom_id(select_id) {
            emit(select);
        }
    }
    rows
}

/// Every checkbox on the page, with label inference for the unlabeled ones.
/// Visibility is relaxed: a zero-opacity styled checkbox still gets a row as
/// long as it occupies space.
fn standalone_checkboxes(snap: &DomSnapshot) -> Vec<V2Row> {
    let mut rows = Vec::new();
    for cb in snap.iter() {
        if cb.input_type().as_deref() != Some("checkbox") {
            continue;
        }
        if !classify::is_visible(cb) && cb.rect().width <= 0.0 {
            continue;
        }

        let label = name::resolve(cb)
            .or_else(|| {
                cb.parent()
                    .map(|p| p.text())
                    .filter(|t| !t.is_empty() && t.chars().count() < 50)
            })
            .unwrap_or_else(|| {
                format!("Checkbox {}", cb.value().unwrap_or(""))
                    .trim_end()
                    .to_string()
            });

        let selector = if let Some(id) = cb.dom_id() {
            format!("locator('#{}')", css_escape(id))
        } else if let Some(value) = cb.value().filter(|v| !v.is_empty()) {
            format!("locator('input[type=\"checkbox\"][value=\"{}\"]')", attr_esc(value))
        } else {
            "locator('input[type=\"checkbox\"]')".to_string()
        };

        rows.push(V2Row::new(
            "checkbox",
            label,
            "check",
            selector,
            Some(BasicInfo::from_node(cb)),
        ));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fixtures::{n, snapshot};

    #[test]
    fn test_date_input_by_placeholder() {
        let snap = snapshot(vec![
            n("input").attr("id", "when").attr("placeholder", "Check-in date"),
            n("input").attr("id", "who").attr("placeholder", "Guest name"),
        ]);
        let rows = extract(&snap);
        let dates: Vec<_> = rows.iter().filter(|r| r.action == "click").collect();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].row_type, "textbox");
        assert_eq!(dates[0].name, "Check-in date");
    }

    #[test]
    fn test_calendar_grid_and_day_buttons() {
        let snap = snapshot(vec![n("div")
            .attr("role", "grid")
            .attr("aria-label", "Calendar, June 2024")
            .child(n("button").text("14"))
            .child(n("button").text("15"))
            .child(n("button").text("Next month"))]);
        let rows = extract(&snap);
        let grid = rows.iter().find(|r| r.row_type == "grid").unwrap();
        assert_eq!(grid.name, "Calendar");
        assert_eq!(grid.action, "none");
        let days: Vec<&str> = rows
            .iter()
            .filter(|r| r.row_type == "button")
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(days, vec!["14", "15"]);
    }

    #[test]
    fn test_enhanced_select_targets_native_element() {
        let snap = snapshot(vec![
            n("select")
                .attr("id", "country")
                .attr("data-placeholder", "Choose a country")
                .hidden(),
            n("div").attr("id", "country_chosen").attr("class", "chosen-container"),
        ]);
        let rows = extract(&snap);
        let combo: Vec<_> = rows.iter().filter(|r| r.row_type == "combobox").collect();
        assert_eq!(combo.len(), 1);
        assert_eq!(combo[0].name, "Choose a country");
        assert_eq!(combo[0].selector, "locator('#country')");
        assert_eq!(combo[0].action, "select");
    }

    #[test]
    fn test_checkbox_label_inference() {
        let snap = snapshot(vec![
            n("label").text("Subscribe").child(
                n("input").attr("id", "sub").attr("type", "checkbox"),
            ),
            n("div")
                .text("Free shipping")
                .child(n("input").attr("type", "checkbox").value("ship")),
            n("input").attr("type", "checkbox").value("bare"),
        ]);
        let rows: Vec<_> = extract(&snap)
            .into_iter()
            .filter(|r| r.row_type == "checkbox")
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "Subscribe");
        assert_eq!(rows[0].selector, "locator('#sub')");
        assert_eq!(rows[1].name, "Free shipping");
        assert_eq!(
            rows[1].selector,
            "locator('input[type=\"checkbox\"][value=\"ship\"]')"
        );
        assert_eq!(rows[2].name, "Checkbox bare");
    }
}
