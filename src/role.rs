//! Role resolution: explicit `role` attribute first, then an implicit table
//! keyed by tag (and input type).

use crate::dom::NodeRef;

/// Resolve the semantic role of a node, lowercased. None when the node has no
/// explicit role and its tag carries no implicit one.
pub fn resolve(node: NodeRef<'_>) -> Option<String> {
    node.explicit_role()
        .or_else(|| implicit(node).map(String::from))
}

/// Implicit ARIA-like role for a tag.
pub fn implicit(node: NodeRef<'_>) -> Option<&'static str> {
    match node.tag() {
        "button" => Some("button"),
        "a" => node.has_attr("href").then_some("link"),
        "img" => Some("img"),
        "form" => Some("form"),
        "select" => Some("combobox"),
        "textarea" => Some("textbox"),
        "input" => input_role(node),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some("heading"),
        "nav" => Some("navigation"),
        "main" => Some("main"),
        "header" => Some("banner"),
        "footer" => Some("contentinfo"),
        "aside" => Some("complementary"),
        "section" => Some("region"),
        "article" => Some("article"),
        "table" => Some("table"),
        "ul" | "ol" => Some("list"),
        "li" => Some("listitem"),
        _ => None,
    }
}

fn input_role(node: NodeRef<'_>) -> Option<&'static str> {
    match node.input_type().as_deref() {
        Some("button") | Some("submit") | Some("reset") => Some("button"),
        Some("checkbox") => Some("checkbox"),
        Some("radio") => Some("radio"),
        Some("number") => Some("spinbutton"),
        Some("text") | Some("email") | Some("password") | Some("search") | Some("tel")
        | Some("url") => Some("textbox"),
        _ => None,
    }
}
