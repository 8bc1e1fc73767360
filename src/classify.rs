//! Visibility, interactivity and fine-grained state classification.

use crate::dom::NodeRef;
use crate::model::ElementState;
use crate::richtext;

const INTERACTIVE_TAGS: &[&str] = &["button", "input", "select", "textarea", "summary"];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "combobox", "menuitem", "option", "tab", "switch", "checkbox", "radio",
];

/// Input types that do not accept typed text.
const NON_TEXT_INPUT_TYPES: &[&str] =
    &["button", "submit", "reset", "checkbox", "radio", "file", "image"];

/// A hyperlink with a destination.
pub fn has_href(node: NodeRef<'_>) -> bool {
    node.tag() == "a" && node.has_attr("href")
}

/// Rendered and not styled away: needs a non-hidden computed style and a
/// non-zero box.
pub fn is_visible(node: NodeRef<'_>) -> bool {
    let css = node.css();
    if css.display == "none" || css.visibility == "hidden" || css.opacity == 0.0 {
        return false;
    }
    let rect = node.rect();
    rect.width > 0.0 && rect.height > 0.0
}

/// Whether the node is something a user can operate.
pub fn is_interactive(node: NodeRef<'_>) -> bool {
    let tag = node.tag();
    if INTERACTIVE_TAGS.contains(&tag) {
        return true;
    }
    if has_href(node) {
        return true;
    }
    if let Some(role) = node.explicit_role() {
        if INTERACTIVE_ROLES.contains(&role.as_str()) {
            return true;
        }
    }
    if node.has_onclick() {
        return true;
    }
    node.tab_index() >= 0
}

pub fn is_disabled(node: NodeRef<'_>) -> bool {
    if node.has_attr("disabled") {
        return true;
    }
    if node
        .closest(|a| a.attr("aria-disabled") == Some("true") || a.has_attr("inert"))
        .is_some()
    {
        return true;
    }
    // A disabled fieldset disables its descendants, except controls living in
    // the fieldset's own legend.
    if let Some(fieldset) = node.closest(|a| a.tag() == "fieldset" && a.has_attr("disabled")) {
        let in_legend = node
            .closest(|a| a.tag() == "legend")
            .map(|legend| fieldset.contains(legend))
            .unwrap_or(false);
        if !in_legend {
            return true;
        }
    }
    false
}

pub fn is_readonly(node: NodeRef<'_>) -> bool {
    node.has_attr("readonly") || node.attr("aria-readonly") == Some("true")
}

pub fn is_focusable(node: NodeRef<'_>) -> bool {
    if !is_visible(node) || is_disabled(node) {
        return false;
    }
    node.tab_index() >= 0
        || matches!(node.tag(), "input" | "select" | "textarea" | "button" | "a")
}

/// Whether text can be entered into the node, including embedded editor
/// surfaces reached through an iframe.
pub fn is_editable(node: NodeRef<'_>) -> bool {
    if is_readonly(node) || is_disabled(node) {
        return false;
    }
    match node.tag() {
        "textarea" => true,
        "input" => {
            let t = node.input_type().unwrap_or_else(|| "text".into());
            !NON_TEXT_INPUT_TYPES.contains(&t.as_str())
        }
        "iframe" => richtext::is_editor_frame(node),
        _ => {
            node.content_editable() || node.explicit_role().as_deref() == Some("textbox")
        }
    }
}

pub fn is_expanded(node: NodeRef<'_>) -> bool {
    node.attr("aria-expanded") == Some("true")
}

pub fn is_required(node: NodeRef<'_>) -> bool {
    node.has_attr("required") || node.attr("aria-required") == Some("true")
}

/// Derive the full state record for one node.
pub fn element_state(node: NodeRef<'_>) -> ElementState {
    ElementState {
        visible: is_visible(node),
        disabled: is_disabled(node),
        readonly: is_readonly(node),
        focusable: is_focusable(node),
        editable: is_editable(node),
        expanded: is_expanded(node),
        checked: node.checked(),
        required: is_required(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fixtures::{n, snapshot};

    #[test]
    fn test_visibility() {
        let snap = snapshot(vec![
            n("button").attr("id", "ok").text("OK"),
            n("button").attr("id", "hidden").hidden(),
            n("button").attr("id", "flat").zero_sized(),
        ]);
        assert!(is_visible(snap.by_dom_id("ok").unwrap()));
        assert!(!is_visible(snap.by_dom_id("hidden").unwrap()));
        assert!(!is_visible(snap.by_dom_id("flat").unwrap()));
    }

    #[test]
    fn test_interactive_classification() {
        let snap = snapshot(vec![
            n("button").attr("id", "b"),
            n("a").attr("id", "plain-anchor"),
            n("a").attr("id", "link").attr("href", "/x"),
            n("div").attr("id", "role-btn").attr("role", "button"),
            n("div").attr("id", "clicky").onclick(),
            n("div").attr("id", "tabbable").tab_index(0),
            n("div").attr("id", "inert-div"),
            n("summary").attr("id", "s"),
        ]);
        assert!(is_interactive(snap.by_dom_id("b").unwrap()));
        assert!(!is_interactive(snap.by_dom_id("plain-anchor").unwrap()));
        assert!(is_interactive(snap.by_dom_id("link").unwrap()));
        assert!(is_interactive(snap.by_dom_id("role-btn").unwrap()));
        assert!(is_interactive(snap.by_dom_id("clicky").unwrap()));
        assert!(is_interactive(snap.by_dom_id("tabbable").unwrap()));
        assert!(!is_interactive(snap.by_dom_id("inert-div").unwrap()));
        assert!(is_interactive(snap.by_dom_id("s").unwrap()));
    }

    #[test]
    fn test_fieldset_disables_descendants_except_legend() {
        let snap = snapshot(vec![n("fieldset")
            .attr("disabled", "")
            .child(
                n("legend").child(n("input").attr("id", "in-legend").attr("type", "checkbox")),
            )
            .child(n("input").attr("id", "in-body").attr("type", "text"))]);
        assert!(!is_disabled(snap.by_dom_id("in-legend").unwrap()));
        assert!(is_disabled(snap.by_dom_id("in-body").unwrap()));
    }

    #[test]
    fn test_aria_disabled_ancestor() {
        let snap = snapshot(vec![n("div")
            .attr("aria-disabled", "true")
            .child(n("button").attr("id", "b"))]);
        assert!(is_disabled(snap.by_dom_id("b").unwrap()));
    }

    #[test]
    fn test_editable() {
        let snap = snapshot(vec![
            n("textarea").attr("id", "ta"),
            n("input").attr("id", "email").attr("type", "email"),
            n("input").attr("id", "cb").attr("type", "checkbox"),
            n("input").attr("id", "ro").attr("readonly", ""),
            n("div").attr("id", "ce").content_editable(),
            n("div").attr("id", "rt").attr("role", "textbox"),
        ]);
        assert!(is_editable(snap.by_dom_id("ta").unwrap()));
        assert!(is_editable(snap.by_dom_id("email").unwrap()));
        assert!(!is_editable(snap.by_dom_id("cb").unwrap()));
        assert!(!is_editable(snap.by_dom_id("ro").unwrap()));
        assert!(is_editable(snap.by_dom_id("ce").unwrap()));
        assert!(is_editable(snap.by_dom_id("rt").unwrap()));
    }

    #[test]
    fn test_state_record() {
        let snap = snapshot(vec![n("input")
            .attr("id", "cb")
            .attr("type", "checkbox")
            .attr("required", "")
            .attr("aria-expanded", "true")
            .tab_index(0)
            .checked()]);
        let state = element_state(snap.by_dom_id("cb").unwrap());
        assert!(state.visible);
        assert!(state.focusable);
        assert!(state.checked);
        assert!(state.required);
        assert!(state.expanded);
        assert!(!state.editable);
        assert!(!state.disabled);
    }
}
