//! Control classification: what category of interaction a node supports and
//! how the harness should drive it.

use crate::classify;
use crate::dom::NodeRef;
use crate::model::{ActionHint, ControlKind};
use crate::{richtext, role};

const OPTIONS_PREVIEW_LIMIT: usize = 15;

pub fn control_kind(node: NodeRef<'_>) -> ControlKind {
    let tag = node.tag();
    let resolved = role::resolve(node);
    let resolved = resolved.as_deref();

    if resolved == Some("button") || tag == "button" {
        return ControlKind::Click;
    }
    if resolved == Some("link") || classify::has_href(node) {
        return ControlKind::Click;
    }
    if resolved == Some("checkbox") {
        return if node.checked() {
            ControlKind::Uncheck
        } else {
            ControlKind::Check
        };
    }
    if resolved == Some("radio") {
        return ControlKind::Check;
    }
    if tag == "select" || resolved == Some("combobox") {
        return ControlKind::Select;
    }
    if classify::is_editable(node) {
        return ControlKind::Fill;
    }
    ControlKind::Click
}

/// Mirrors [`control_kind`] except where the interaction needs more than a
/// plain action: native selects take an option, non-native comboboxes need an
/// open+choose sequence, and editor iframes are filled through the frame
/// boundary.
pub fn action_hint(node: NodeRef<'_>) -> ActionHint {
    match control_kind(node) {
        ControlKind::Fill => {
            if node.tag() == "iframe" && richtext::is_editor_frame(node) {
                ActionHint::RichTextFill
            } else {
                ActionHint::Fill
            }
        }
        ControlKind::Select => {
            if node.tag() == "select" {
                ActionHint::SelectOption
            } else {
                ActionHint::OpenAndPick
            }
        }
        ControlKind::Check => ActionHint::Check,
        ControlKind::Uncheck => ActionHint::Uncheck,
        ControlKind::Click => ActionHint::Click,
    }
}

/// Map role/tag/input-type onto the coarse v2 row type.
pub fn v2_type(role: Option<&str>, tag: &str, input_type: Option<&str>) -> String {
    let role = role.unwrap_or("");
    let input_type = input_type.unwrap_or("");
    let non_text_input = matches!(
        input_type,
        "button" | "submit" | "reset" | "checkbox" | "radio" | "file" | "image"
    );

    if role == "textbox" || tag == "textarea" || (tag == "input" && !non_text_input) {
        return "textbox".into();
    }
    if role == "combobox" || tag == "select" {
        return "combobox".into();
    }
    if role == "checkbox" {
        return "checkbox".into();
    }
    if role == "radio" {
        return "radio".into();
    }
    if role == "link" {
        return "link".into();
    }
    if role == "button"
        || tag == "button"
        || (tag == "input" && matches!(input_type, "button" | "submit" | "reset"))
    {
        return "button".into();
    }
    if !role.is_empty() {
        return role.into();
    }
    if !tag.is_empty() {
        return tag.into();
    }
    "node".into()
}

/// First option texts of a select, or of the listbox a combobox points at via
/// `aria-controls`/`aria-owns`.
pub fn options_preview(node: NodeRef<'_>) -> Option<Vec<String>> {
    if node.tag() == "select" {
        let texts: Vec<String> = node
            .options()
            .iter()
            .map(|o| o.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(OPTIONS_PREVIEW_LIMIT)
            .collect();
        return Some(texts);
    }
    let list_id = node.attr("aria-controls").or_else(|| node.attr("aria-owns"))?;
    let listbox = node.snapshot().by_dom_id(list_id)?;
    let texts: Vec<String> = listbox
        .descendants()
        .filter(|d| d.explicit_role().as_deref() == Some("option"))
        .map(|d| d.text())
        .filter(|t| !t.is_empty())
        .take(OPTIONS_PREVIEW_LIMIT)
        .collect();
    Some(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fixtures::{n, snapshot};

    #[test]
    fn test_control_kinds() {
        let snap = snapshot(vec![
            n("button").attr("id", "b").text("Go"),
            n("a").attr("id", "l").attr("href", "/").text("Home"),
            n("input").attr("id", "cb").attr("type", "checkbox"),
            n("input").attr("id", "cbc").attr("type", "checkbox").checked(),
            n("input").attr("id", "r").attr("type", "radio"),
            n("select").attr("id", "s"),
            n("div").attr("id", "combo").attr("role", "combobox"),
            n("input").attr("id", "t").attr("type", "text"),
            n("div").attr("id", "d").onclick(),
        ]);
        let kind = |id: &str| control_kind(snap.by_dom_id(id).unwrap());
        assert_eq!(kind("b"), ControlKind::Click);
        assert_eq!(kind("l"), ControlKind::Click);
        assert_eq!(kind("cb"), ControlKind::Check);
        assert_eq!(kind("cbc"), ControlKind::Uncheck);
        assert_eq!(kind("r"), ControlKind::Check);
        assert_eq!(kind("s"), ControlKind::Select);
        assert_eq!(kind("combo"), ControlKind::Select);
        assert_eq!(kind("t"), ControlKind::Fill);
        assert_eq!(kind("d"), ControlKind::Click);
    }

    #[test]
    fn test_action_hints_for_selects() {
        let snap = snapshot(vec![
            n("select").attr("id", "s"),
            n("div").attr("id", "combo").attr("role", "combobox"),
        ]);
        assert_eq!(
            action_hint(snap.by_dom_id("s").unwrap()),
            ActionHint::SelectOption
        );
        assert_eq!(
            action_hint(snap.by_dom_id("combo").unwrap()),
            ActionHint::OpenAndPick
        );
    }

    #[test]
    fn test_v2_type_mapping() {
        assert_eq!(v2_type(Some("textbox"), "div", None), "textbox");
        assert_eq!(v2_type(None, "input", Some("email")), "textbox");
        assert_eq!(v2_type(None, "input", Some("submit")), "button");
        assert_eq!(v2_type(None, "select", Some("select")), "combobox");
        assert_eq!(v2_type(Some("checkbox"), "div", None), "checkbox");
        assert_eq!(v2_type(Some("link"), "a", None), "link");
        assert_eq!(v2_type(Some("tab"), "button", None), "button");
        assert_eq!(v2_type(Some("cell"), "td", None), "cell");
        assert_eq!(v2_type(None, "td", None), "td");
        assert_eq!(v2_type(None, "", None), "node");
    }

    #[test]
    fn test_options_preview_for_select() {
        let snap = snapshot(vec![n("select")
            .attr("id", "s")
            .options(&[("r", "Red"), ("g", "Green"), ("", "")])]);
        let opts = options_preview(snap.by_dom_id("s").unwrap()).unwrap();
        assert_eq!(opts, vec!["Red", "Green"]);
    }

    #[test]
    fn test_options_preview_via_aria_controls() {
        let snap = snapshot(vec![
            n("div")
                .attr("id", "combo")
                .attr("role", "combobox")
                .attr("aria-controls", "listbox"),
            n("ul")
                .attr("id", "listbox")
                .child(n("li").attr("role", "option").text("Alpha"))
                .child(n("li").attr("role", "option").text("Beta")),
        ]);
        let opts = options_preview(snap.by_dom_id("combo").unwrap()).unwrap();
        assert_eq!(opts, vec!["Alpha", "Beta"]);
    }
}
