//! Table/grid extraction: header discovery, filter-row controls, per-row and
//! per-cell interactive elements, row-scoped locators.
//!
//! Row/column indices name rows 1-based for legibility and locate them 0-based
//! (`.nth()`), both valid only for the DOM order seen by this snapshot.

use crate::classify;
use crate::control;
use crate::dom::{short, DomSnapshot, NodeRef};
use crate::extract::pack;
use crate::model::{
    ActionHint, ControlKind, ElementSnapshot, GridRef, GridSection, Interactability,
    SelectorCandidate, SelectorKind, Visibility,
};
use crate::role;
use crate::selector::{attr_esc, esc};

pub fn extract_tables(snap: &DomSnapshot) -> Vec<ElementSnapshot> {
    let mut out = Vec::new();
    for (table_index, table) in snap.iter().filter(|x| x.tag() == "table").enumerate() {
        out.extend(filter_row_elements(table, table_index));
        out.extend(body_elements(table, table_index));
    }
    out
}

/// First `<thead>` row, else the first row containing header cells.
fn header_row<'a>(table: NodeRef<'a>) -> Option<NodeRef<'a>> {
    if let Some(thead) = table.descendants().find(|d| d.tag() == "thead") {
        if let Some(tr) = thead.descendants().find(|d| d.tag() == "tr") {
            return Some(tr);
        }
    }
    table
        .descendants()
        .find(|d| d.tag() == "tr" && d.descendants().any(|c| c.tag() == "th"))
}

fn header_cells<'a>(row: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    row.descendants().filter(|d| d.tag() == "th").collect()
}

fn is_filter_control(node: NodeRef<'_>) -> bool {
    matches!(node.tag(), "input" | "select")
        || node.explicit_role().as_deref() == Some("combobox")
}

fn data_field<'a>(node: NodeRef<'a>) -> Option<&'a str> {
    node.attr("data-field").filter(|f| !f.is_empty())
}

/// Row scope for a locator, discovered by position within `thead`, `tbody`,
/// or an ARIA rowgroup, in that search order.
fn row_scope(table: NodeRef<'_>, row: NodeRef<'_>) -> String {
    if let Some(thead) = table.descendants().find(|d| d.tag() == "thead") {
        if thead.contains(row) {
            if let Some(i) = thead
                .descendants()
                .filter(|d| d.tag() == "tr")
                .position(|r| r.id() == row.id())
            {
                return format!("locator('thead tr').nth({})", i);
            }
        }
    }
    if let Some(tbody) = table.descendants().find(|d| d.tag() == "tbody") {
        if tbody.contains(row) {
            if let Some(i) = tbody
                .descendants()
                .filter(|d| d.tag() == "tr")
                .position(|r| r.id() == row.id())
            {
                return format!("locator('tbody tr').nth({})", i);
            }
        }
    }
    if let Some(rowgroup) = row.closest(|a| a.explicit_role().as_deref() == Some("rowgroup")) {
        if let Some(i) = rowgroup
            .descendants()
            .filter(|d| d.explicit_role().as_deref() == Some("row"))
            .position(|r| r.id() == row.id())
        {
            return format!("locator('[role=\"rowgroup\"] [role=\"row\"]').nth({})", i);
        }
    }
    let i = table
        .descendants()
        .filter(|d| d.tag() == "tr")
        .position(|r| r.id() == row.id())
        .unwrap_or(0);
    format!("locator('tr').nth({})", i)
}

/// Filter-row controls, one row per populated column, named `"<header> (filter)"`.
fn filter_row_elements(table: NodeRef<'_>, table_index: usize) -> Vec<ElementSnapshot> {
    let mut out = Vec::new();
    let Some(hrow) = header_row(table) else {
        return out;
    };
    let hcells = header_cells(hrow);
    let headers: Vec<String> = hcells.iter().map(|c| c.text()).collect();

    // The filter row lives in the header area: a non-header row outside tbody
    // that carries entry controls.
    let in_tbody = |r: NodeRef<'_>| {
        table
            .descendants()
            .find(|d| d.tag() == "tbody")
            .map(|tbody| tbody.contains(r))
            .unwrap_or(false)
    };
    let Some(frow) = table.descendants().find(|d| {
        d.tag() == "tr"
            && d.id() != hrow.id()
            && !in_tbody(*d)
            && d.descendants().any(is_filter_control)
    }) else {
        return out;
    };

    let scope = row_scope(table, frow);
    let cells: Vec<NodeRef<'_>> = frow
        .children()
        .filter(|c| matches!(c.tag(), "td" | "th"))
        .collect();

    for (col, header) in headers.iter().enumerate() {
        let Some(cell) = cells.get(col) else { continue };
        let Some(ctrl) = cell.descendants().find(|d| is_filter_control(*d)) else {
            continue;
        };

        let native_select = ctrl.tag() == "select";
        let resolved = role::resolve(ctrl);
        let combo = native_select || resolved.as_deref() == Some("combobox");
        let entry_role = if combo { "combobox" } else { "textbox" };

        let field: Option<String> = data_field(ctrl)
            .or_else(|| data_field(*cell))
            .or_else(|| hcells.get(col).copied().and_then(data_field))
            .map(String::from);

        // data-field survives re-sorts and column re-ordering; a raw column
        // index is valid only for the current layout.
        let locator = match &field {
            Some(f) => format!("{}.locator('[data-field=\"{}\"]')", scope, attr_esc(f)),
            None => format!(
                "{}.locator('th, td').nth({}).getByRole('{}')",
                scope, col, entry_role
            ),
        };

        let mut selectors = vec![SelectorCandidate {
            kind: SelectorKind::Css,
            expression: locator.clone(),
            weight: 95,
        }];
        if let Some(aria) = ctrl.attr("aria-label").filter(|a| !a.trim().is_empty()) {
            selectors.push(SelectorCandidate {
                kind: SelectorKind::Role,
                expression: format!("getByRole('{}',{{ name:'{}' }})", entry_role, esc(aria)),
                weight: 90,
            });
        }
        selectors.push(SelectorCandidate {
            kind: SelectorKind::Css,
            expression: format!(
                "getByRole('cell',{{ name:'{}' }}).getByRole('{}')",
                esc(header),
                entry_role
            ),
            weight: 75,
        });
        if let Some(ph) = ctrl.attr("placeholder").filter(|p| !p.trim().is_empty()) {
            selectors.push(SelectorCandidate {
                kind: SelectorKind::Placeholder,
                expression: format!("getByPlaceholder('{}')", esc(ph)),
                weight: 70,
            });
        }

        let visible = classify::is_visible(ctrl);
        out.push(ElementSnapshot {
            tag: ctrl.tag().to_string(),
            role: Some(resolved.unwrap_or_else(|| entry_role.to_string())),
            id: ctrl.dom_id().map(String::from),
            name: Some(format!("{} (filter)", header)),
            text: None,
            visibility: if visible { Visibility::Visible } else { Visibility::NonVisible },
            interactability: if visible {
                Interactability::Interactable
            } else {
                Interactability::NonInteractable
            },
            state: classify::element_state(ctrl),
            input_type: ctrl.input_type(),
            control_kind: if combo { ControlKind::Select } else { ControlKind::Fill },
            action_hint: if native_select {
                ActionHint::SelectOption
            } else if combo {
                ActionHint::OpenAndPick
            } else {
                ActionHint::Fill
            },
            selectors,
            locator,
            options_preview: control::options_preview(ctrl).filter(|o| !o.is_empty()),
            grid: Some(GridRef {
                table_index,
                section: GridSection::Filter,
                row: None,
                col: Some(col),
                field,
                header: Some(header.clone()),
            }),
        });
    }
    out
}

/// Body rows: row checkboxes, `data-field` cells, and interactive descendants
/// with row/column-scoped locators.
fn body_elements(table: NodeRef<'_>, table_index: usize) -> Vec<ElementSnapshot> {
    let mut out = Vec::new();
    let Some(tbody) = table.descendants().find(|d| d.tag() == "tbody") else {
        return out;
    };
    let Some(hrow) = header_row(table) else {
        return out;
    };
    let hcells = header_cells(hrow);
    let headers: Vec<String> = hcells.iter().map(|c| c.text()).collect();

    for (row_index, row) in tbody.descendants().filter(|d| d.tag() == "tr").enumerate() {
        let row_checkbox = row.descendants().find(|d| {
            d.input_type().as_deref() == Some("checkbox")
                || d.explicit_role().as_deref() == Some("checkbox")
        });
        if let Some(checkbox) = row_checkbox {
            let locator = format!("locator('tbody tr').nth({}).getByRole('checkbox')", row_index);
            let visible = classify::is_visible(checkbox);
            out.push(ElementSnapshot {
                tag: checkbox.tag().to_string(),
                role: Some("checkbox".into()),
                id: checkbox.dom_id().map(String::from),
                name: Some(format!("row {}: checkbox", row_index + 1)),
                text: None,
                visibility: if visible { Visibility::Visible } else { Visibility::NonVisible },
                interactability: if visible {
                    Interactability::Interactable
                } else {
                    Interactability::NonInteractable
                },
                state: classify::element_state(checkbox),
                input_type: checkbox.input_type(),
                control_kind: if checkbox.checked() {
                    ControlKind::Uncheck
                } else {
                    ControlKind::Check
                },
                action_hint: if checkbox.checked() {
                    ActionHint::Uncheck
                } else {
                    ActionHint::Check
                },
                selectors: vec![SelectorCandidate {
                    kind: SelectorKind::Css,
                    expression: locator.clone(),
                    weight: 80,
                }],
                locator,
                options_preview: None,
                grid: Some(GridRef {
                    table_index,
                    section: GridSection::Body,
                    row: Some(row_index),
                    col: None,
                    field: None,
                    header: None,
                }),
            });
        }

        for (col, cell) in row
            .children()
            .filter(|c| matches!(c.tag(), "td" | "th"))
            .enumerate()
        {
            let header_text = headers
                .get(col)
                .filter(|h| !h.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Column {}", col + 1));
            let field: Option<String> = data_field(cell)
                .or_else(|| hcells.get(col).copied().and_then(data_field))
                .map(String::from);

            if let Some(f) = &field {
                let locator = format!(
                    "locator('tbody tr').nth({}).locator('[data-field=\"{}\"]')",
                    row_index,
                    attr_esc(f)
                );
                let visible = classify::is_visible(cell);
                out.push(ElementSnapshot {
                    tag: cell.tag().to_string(),
                    role: Some("cell".into()),
                    id: cell.dom_id().map(String::from),
                    name: Some(format!("row {}: {}", row_index + 1, f)),
                    text: short(cell.text_raw(), 120),
                    visibility: if visible { Visibility::Visible } else { Visibility::NonVisible },
                    interactability: Interactability::NonInteractable,
                    state: classify::element_state(cell),
                    input_type: None,
                    control_kind: ControlKind::Click,
                    action_hint: ActionHint::Click,
                    selectors: vec![SelectorCandidate {
                        kind: SelectorKind::Css,
                        expression: locator.clone(),
                        weight: 80,
                    }],
                    locator,
                    options_preview: None,
                    grid: Some(GridRef {
                        table_index,
                        section: GridSection::Body,
                        row: Some(row_index),
                        col: Some(col),
                        field: field.clone(),
                        header: Some(header_text.clone()),
                    }),
                });
            }

            for interactive in cell.descendants().filter(|d| {
                // The row checkbox already has its own dedicated row.
                if row_checkbox.map(|cb| cb.id()) == Some(d.id()) {
                    return false;
                }
                matches!(d.tag(), "button" | "a" | "input" | "select")
                    || matches!(d.explicit_role().as_deref(), Some("button") | Some("link"))
            }) {
                let Ok(mut packed) = pack(interactive) else { continue };
                let base_name = packed
                    .name
                    .clone()
                    .or_else(|| packed.text.clone())
                    .unwrap_or_default();
                packed.name = Some(format!("row {}: {}", row_index + 1, base_name));
                if let Some(f) = &field {
                    let role_suffix = packed
                        .role
                        .as_deref()
                        .map(|r| format!(".getByRole('{}')", esc(r)))
                        .unwrap_or_default();
                    let locator = format!(
                        "locator('tbody tr').nth({}).locator('[data-field=\"{}\"]'){}",
                        row_index,
                        attr_esc(f),
                        role_suffix
                    );
                    let weight = packed
                        .selectors
                        .first()
                        .map(|c| c.weight)
                        .unwrap_or(90)
                        .max(95);
                    packed.selectors.insert(
                        0,
                        SelectorCandidate {
                            kind: SelectorKind::Css,
                            expression: locator.clone(),
                            weight,
                        },
                    );
                    packed.locator = locator;
                }
                packed.grid = Some(GridRef {
                    table_index,
                    section: GridSection::Body,
                    row: Some(row_index),
                    col: Some(col),
                    field: field.clone(),
                    header: Some(header_text.clone()),
                });
                out.push(packed);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fixtures::{n, snapshot, N};

    fn orders_table() -> N {
        n("table")
            .child(
                n("thead")
                    .child(
                        n("tr")
                            .child(n("th").text("Status").attr("data-field", "status"))
                            .child(n("th").text("Amount")),
                    )
                    .child(
                        n("tr")
                            .child(n("td").child(
                                n("select").attr("data-field", "status").options(&[
                                    ("", "Any"),
                                    ("open", "Open"),
                                    ("closed", "Closed"),
                                ]),
                            ))
                            .child(n("td").child(
                                n("input").attr("type", "text").attr("placeholder", "Min amount"),
                            )),
                    ),
            )
            .child(
                n("tbody")
                    .child(
                        n("tr")
                            .child(n("td").attr("data-field", "status").text("Open"))
                            .child(n("td").text("120").child(n("button").text("Edit"))),
                    )
                    .child(
                        n("tr")
                            .child(n("td").attr("data-field", "status").text("Closed"))
                            .child(n("td").text("80")),
                    ),
            )
    }

    #[test]
    fn test_filter_row_with_data_field() {
        let snap = snapshot(vec![orders_table()]);
        let rows = extract_tables(&snap);
        let status = rows
            .iter()
            .find(|r| r.name.as_deref() == Some("Status (filter)"))
            .expect("status filter row");
        assert_eq!(status.control_kind, ControlKind::Select);
        assert_eq!(status.action_hint, ActionHint::SelectOption);
        assert!(status.locator.contains("[data-field=\"status\"]"));
        assert!(status.locator.starts_with("locator('thead tr').nth(1)"));
        let grid = status.grid.as_ref().unwrap();
        assert_eq!(grid.section, GridSection::Filter);
        assert_eq!(grid.col, Some(0));
        assert_eq!(grid.field.as_deref(), Some("status"));
        assert_eq!(
            status.options_preview.as_deref(),
            Some(&["Any".to_string(), "Open".into(), "Closed".into()][..])
        );
    }

    #[test]
    fn test_filter_row_without_field_uses_column_index() {
        let snap = snapshot(vec![orders_table()]);
        let rows = extract_tables(&snap);
        let amount = rows
            .iter()
            .find(|r| r.name.as_deref() == Some("Amount (filter)"))
            .expect("amount filter row");
        assert_eq!(amount.control_kind, ControlKind::Fill);
        assert_eq!(
            amount.locator,
            "locator('thead tr').nth(1).locator('th, td').nth(1).getByRole('textbox')"
        );
        assert!(amount
            .selectors
            .iter()
            .any(|c| c.expression == "getByPlaceholder('Min amount')"));
    }

    #[test]
    fn test_data_field_cells() {
        let snap = snapshot(vec![orders_table()]);
        let rows = extract_tables(&snap);
        let cells: Vec<_> = rows
            .iter()
            .filter(|r| r.role.as_deref() == Some("cell"))
            .collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].name.as_deref(), Some("row 1: status"));
        assert_eq!(
            cells[0].locator,
            "locator('tbody tr').nth(0).locator('[data-field=\"status\"]')"
        );
        assert_eq!(cells[1].name.as_deref(), Some("row 2: status"));
    }

    #[test]
    fn test_interactive_cell_descendant_is_row_scoped() {
        let snap = snapshot(vec![orders_table()]);
        let rows = extract_tables(&snap);
        let edit = rows
            .iter()
            .find(|r| r.name.as_deref() == Some("row 1: Edit"))
            .expect("edit button row");
        let grid = edit.grid.as_ref().unwrap();
        assert_eq!(grid.row, Some(0));
        assert_eq!(grid.col, Some(1));
        assert_eq!(grid.header.as_deref(), Some("Amount"));
    }

    #[test]
    fn test_row_checkboxes_index_in_dom_order() {
        let mut tbody = n("tbody");
        for i in 0..3 {
            tbody = tbody.child(
                n("tr")
                    .child(n("td").child(
                        n("input").attr("type", "checkbox").attr("id", &format!("cb{}", i)),
                    ))
                    .child(n("td").text("data")),
            );
        }
        let table = n("table")
            .child(n("thead").child(n("tr").child(n("th").text("Pick")).child(n("th").text("Val"))))
            .child(tbody);
        let snap = snapshot(vec![table]);
        let rows = extract_tables(&snap);
        let checkboxes: Vec<_> = rows
            .iter()
            .filter(|r| r.role.as_deref() == Some("checkbox"))
            .collect();
        assert_eq!(checkboxes.len(), 3);
        for (i, cb) in checkboxes.iter().enumerate() {
            assert_eq!(cb.name.as_deref().unwrap(), format!("row {}: checkbox", i + 1));
            assert_eq!(
                cb.locator,
                format!("locator('tbody tr').nth({}).getByRole('checkbox')", i)
            );
        }
    }

    #[test]
    fn test_table_without_tbody_or_headers_yields_nothing() {
        let bare = n("table").child(n("tr").child(n("td").text("loose")));
        let snap = snapshot(vec![bare]);
        assert!(extract_tables(&snap).is_empty());
    }
}
