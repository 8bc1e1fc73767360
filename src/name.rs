//! Accessible-name resolution.
//!
//! The precedence chain is an ordered table of independent strategies; the
//! first one producing a non-empty string wins. Whitespace is collapsed and
//! the result trimmed everywhere, so an all-whitespace source never names a
//! node.

use crate::dom::{squeeze, NodeRef};

const FORM_TAGS: &[&str] = &["input", "select", "textarea"];

type Strategy = fn(NodeRef<'_>) -> Option<String>;

/// Precedence order; first non-empty result wins.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("aria-label", aria_label),
    ("aria-labelledby", aria_labelledby),
    ("label", associated_label_name),
    ("placeholder", placeholder),
    ("alt", image_alt),
    ("text", own_text),
    ("title", title),
];

/// Resolve the human-facing name for a node.
pub fn resolve(node: NodeRef<'_>) -> Option<String> {
    STRATEGIES.iter().find_map(|(_, strategy)| strategy(node))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn aria_label(node: NodeRef<'_>) -> Option<String> {
    node.attr("aria-label").and_then(|v| non_empty(squeeze(v)))
}

fn aria_labelledby(node: NodeRef<'_>) -> Option<String> {
    let ids = node.attr("aria-labelledby")?;
    let joined = ids
        .split_whitespace()
        .filter_map(|id| node.snapshot().by_dom_id(id))
        .map(|label| label.text())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(joined)
}

fn associated_label_name(node: NodeRef<'_>) -> Option<String> {
    if !FORM_TAGS.contains(&node.tag()) {
        return None;
    }
    associated_label(node)
}

/// Text of the first label associated with a form control, via `for=`, a
/// wrapping `<label>` ancestor, or `aria-labelledby` references.
pub fn associated_label(node: NodeRef<'_>) -> Option<String> {
    labels_for(node)
        .into_iter()
        .map(|label| label.text())
        .find(|t| !t.is_empty())
}

fn labels_for<'a>(node: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let mut labels = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut push = |label: NodeRef<'a>| {
        if seen.insert(label.id()) {
            labels.push(label);
        }
    };

    if let Some(id) = node.dom_id() {
        for candidate in node.snapshot().iter() {
            if candidate.tag() == "label" && candidate.attr("for") == Some(id) {
                push(candidate);
            }
        }
    }
    if let Some(wrapping) = node.ancestors().find(|a| a.tag() == "label") {
        push(wrapping);
    }
    if let Some(ids) = node.attr("aria-labelledby") {
        for id in ids.split_whitespace() {
            if let Some(referenced) = node.snapshot().by_dom_id(id) {
                push(referenced);
            }
        }
    }
    labels
}

fn placeholder(node: NodeRef<'_>) -> Option<String> {
    if !FORM_TAGS.contains(&node.tag()) {
        return None;
    }
    node.attr("placeholder").and_then(|v| non_empty(squeeze(v)))
}

fn image_alt(node: NodeRef<'_>) -> Option<String> {
    if node.tag() != "img" {
        return None;
    }
    node.attr("alt").and_then(|v| non_empty(squeeze(v)))
}

fn own_text(node: NodeRef<'_>) -> Option<String> {
    non_empty(node.text())
}

fn title(node: NodeRef<'_>) -> Option<String> {
    node.attr("title").and_then(|v| non_empty(squeeze(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fixtures::{n, snapshot};

    #[test]
    fn test_aria_label_beats_everything() {
        let snap = snapshot(vec![n("button")
            .attr("id", "b")
            .attr("aria-label", "  Save  draft ")
            .attr("title", "tooltip")
            .text("Submit")]);
        assert_eq!(
            resolve(snap.by_dom_id("b").unwrap()).as_deref(),
            Some("Save draft")
        );
    }

    #[test]
    fn test_blank_aria_label_falls_through() {
        let snap = snapshot(vec![n("button")
            .attr("id", "b")
            .attr("aria-label", "   ")
            .text("Submit")]);
        assert_eq!(
            resolve(snap.by_dom_id("b").unwrap()).as_deref(),
            Some("Submit")
        );
    }

    #[test]
    fn test_aria_labelledby_concatenates_references() {
        let snap = snapshot(vec![
            n("span").attr("id", "a").text("Billing"),
            n("span").attr("id", "b").text("address"),
            n("input").attr("id", "in").attr("aria-labelledby", "a b"),
        ]);
        assert_eq!(
            resolve(snap.by_dom_id("in").unwrap()).as_deref(),
            Some("Billing address")
        );
    }

    #[test]
    fn test_label_beats_placeholder() {
        let snap = snapshot(vec![
            n("label").attr("for", "email").text("Email"),
            n("input")
                .attr("id", "email")
                .attr("type", "email")
                .attr("placeholder", "you@example.com"),
        ]);
        assert_eq!(
            resolve(snap.by_dom_id("email").unwrap()).as_deref(),
            Some("Email")
        );
    }

    #[test]
    fn test_wrapping_label() {
        let snap = snapshot(vec![n("label")
            .text("Remember me")
            .child(n("input").attr("id", "r").attr("type", "checkbox"))]);
        assert_eq!(
            resolve(snap.by_dom_id("r").unwrap()).as_deref(),
            Some("Remember me")
        );
    }

    #[test]
    fn test_placeholder_only_for_form_controls() {
        let snap = snapshot(vec![
            n("input").attr("id", "in").attr("placeholder", "Search…"),
            n("div").attr("id", "d").attr("placeholder", "Search…"),
        ]);
        assert_eq!(
            resolve(snap.by_dom_id("in").unwrap()).as_deref(),
            Some("Search…")
        );
        assert_eq!(resolve(snap.by_dom_id("d").unwrap()), None);
    }

    #[test]
    fn test_alt_then_text_then_title() {
        let snap = snapshot(vec![
            n("img").attr("id", "pic").attr("alt", "Logo"),
            n("span").attr("id", "txt").text("  plain   text "),
            n("span").attr("id", "tip").attr("title", "hover help"),
            n("span").attr("id", "nothing"),
        ]);
        assert_eq!(resolve(snap.by_dom_id("pic").unwrap()).as_deref(), Some("Logo"));
        assert_eq!(
            resolve(snap.by_dom_id("txt").unwrap()).as_deref(),
            Some("plain text")
        );
        assert_eq!(
            resolve(snap.by_dom_id("tip").unwrap()).as_deref(),
            Some("hover help")
        );
        assert_eq!(resolve(snap.by_dom_id("nothing").unwrap()), None);
    }
}
