//! Raw DOM snapshot model — the typed form of the capture script's payload.
//!
//! The capture script serializes every element in document order; `DomSnapshot`
//! holds them as a flat arena with parent/child indices. `NodeRef` is a cheap
//! cursor used by all classifiers. Nothing here interprets the page — that is
//! the job of the modules layered on top.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Collapse runs of whitespace to single spaces and trim.
pub fn squeeze(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Squeeze and truncate to `max` chars (ellipsis on overflow). Empty → None.
pub fn short(s: &str, max: usize) -> Option<String> {
    let t = squeeze(s);
    if t.is_empty() {
        return None;
    }
    if t.chars().count() > max {
        let cut: String = t.chars().take(max.saturating_sub(1)).collect();
        Some(format!("{}…", cut))
    } else {
        Some(t)
    }
}

/// Subset of computed style the capture script reports per element.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Css {
    pub display: String,
    pub visibility: String,
    pub position: String,
    pub cursor: String,
    pub opacity: f64,
    pub z_index: i64,
}

impl Default for Css {
    fn default() -> Self {
        Self {
            display: "block".into(),
            visibility: "visible".into(),
            position: "static".into(),
            cursor: "auto".into(),
            opacity: 1.0,
            z_index: 0,
        }
    }
}

/// Bounding client rect in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One `<option>` of a native select.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

/// Whether a nested document could be read from the enclosing page.
///
/// The capture script probes `iframe.contentDocument`; a cross-origin frame
/// throws, which it reports as `Denied` instead of letting the scan fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum FrameStatus {
    Readable {
        #[serde(default)]
        editable_body: bool,
    },
    Denied,
}

/// One element as serialized by the capture script.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DomNode {
    /// Lowercased tag name.
    pub tag: String,
    /// All attributes, verbatim.
    pub attrs: BTreeMap<String, String>,
    /// innerText of the subtree (un-squeezed).
    pub text: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub css: Css,
    pub rect: Rect,
    /// Live checked property (radio/checkbox).
    pub checked: bool,
    /// Live value property of form controls.
    pub value: Option<String>,
    /// Options of a native select, in DOM order.
    pub options: Vec<SelectOption>,
    /// Effective tabIndex property (-1 when not keyboard-reachable).
    pub tab_index: i64,
    pub content_editable: bool,
    /// Element has an onclick property or attribute.
    pub has_onclick: bool,
    /// Present only on iframes.
    pub frame: Option<FrameStatus>,
}

impl Default for DomNode {
    fn default() -> Self {
        Self {
            tag: String::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            css: Css::default(),
            rect: Rect::default(),
            checked: false,
            value: None,
            options: Vec::new(),
            tab_index: -1,
            content_editable: false,
            has_onclick: false,
            frame: None,
        }
    }
}

/// A full page capture: document metadata plus the element arena.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DomSnapshot {
    pub url: String,
    pub title: String,
    pub lang: Option<String>,
    pub nodes: Vec<DomNode>,
}

impl DomSnapshot {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cursor over the node at `id`. Out-of-range ids (a malformed capture)
    /// yield a cursor over nothing via the guarded accessors.
    pub fn node(&self, id: usize) -> NodeRef<'_> {
        NodeRef { snap: self, id }
    }

    /// All nodes in document order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len()).map(move |id| NodeRef { snap: self, id })
    }

    /// First node with the given `id` attribute.
    pub fn by_dom_id(&self, dom_id: &str) -> Option<NodeRef<'_>> {
        self.iter().find(|n| n.dom_id() == Some(dom_id))
    }
}

/// Cheap cursor into a snapshot.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    snap: &'a DomSnapshot,
    id: usize,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn snapshot(&self) -> &'a DomSnapshot {
        self.snap
    }

    fn raw(&self) -> Option<&'a DomNode> {
        self.snap.nodes.get(self.id)
    }

    pub fn tag(&self) -> &'a str {
        self.raw().map(|n| n.tag.as_str()).unwrap_or("")
    }

    /// Raw subtree innerText.
    pub fn text_raw(&self) -> &'a str {
        self.raw().map(|n| n.text.as_str()).unwrap_or("")
    }

    /// Whitespace-squeezed subtree text.
    pub fn text(&self) -> String {
        squeeze(self.text_raw())
    }

    pub fn css(&self) -> Css {
        self.raw().map(|n| n.css.clone()).unwrap_or_default()
    }

    pub fn rect(&self) -> Rect {
        self.raw().map(|n| n.rect).unwrap_or_default()
    }

    pub fn checked(&self) -> bool {
        self.raw().map(|n| n.checked).unwrap_or(false)
    }

    pub fn value(&self) -> Option<&'a str> {
        self.raw().and_then(|n| n.value.as_deref())
    }

    pub fn options(&self) -> &'a [SelectOption] {
        self.raw().map(|n| n.options.as_slice()).unwrap_or(&[])
    }

    pub fn tab_index(&self) -> i64 {
        self.raw().map(|n| n.tab_index).unwrap_or(-1)
    }

    pub fn content_editable(&self) -> bool {
        self.raw().map(|n| n.content_editable).unwrap_or(false)
    }

    pub fn has_onclick(&self) -> bool {
        self.raw().map(|n| n.has_onclick).unwrap_or(false)
    }

    pub fn frame(&self) -> Option<FrameStatus> {
        self.raw().and_then(|n| n.frame)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.raw().and_then(|n| n.attrs.get(name)).map(|s| s.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Non-empty `id` attribute.
    pub fn dom_id(&self) -> Option<&'a str> {
        self.attr("id").filter(|s| !s.is_empty())
    }

    /// Lowercased `role` attribute, when non-empty.
    pub fn explicit_role(&self) -> Option<String> {
        self.attr("role")
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
    }

    /// Lowercased input `type` attribute ("text" default for inputs).
    pub fn input_type(&self) -> Option<String> {
        match self.tag() {
            "input" => Some(
                self.attr("type")
                    .map(|t| t.to_lowercase())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "text".into()),
            ),
            "select" => Some("select".into()),
            _ => None,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &'a str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes().any(|c| c == name)
    }

    /// Any class containing `fragment`, case-insensitive.
    pub fn class_contains(&self, fragment: &str) -> bool {
        let fragment = fragment.to_lowercase();
        self.classes().any(|c| c.to_lowercase().contains(&fragment))
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let pid = self.raw()?.parent?;
        if pid < self.snap.nodes.len() {
            Some(NodeRef { snap: self.snap, id: pid })
        } else {
            None
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> {
        let snap = self.snap;
        let ids = self.raw().map(|n| n.children.clone()).unwrap_or_default();
        ids.into_iter()
            .filter(move |&c| c < snap.nodes.len())
            .map(move |c| NodeRef { snap, id: c })
    }

    /// Ancestors from parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> {
        let mut current = self.parent();
        std::iter::from_fn(move || {
            let node = current?;
            current = node.parent();
            Some(node)
        })
    }

    /// First self-or-ancestor matching `pred`.
    pub fn closest(&self, pred: impl Fn(NodeRef<'a>) -> bool) -> Option<NodeRef<'a>> {
        if pred(*self) {
            return Some(*self);
        }
        self.ancestors().find(|n| pred(*n))
    }

    /// Pre-order descendants, self excluded.
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'a>> {
        let snap = self.snap;
        let mut stack: Vec<usize> = self
            .raw()
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            if id >= snap.nodes.len() {
                return Some(None);
            }
            for &c in snap.nodes[id].children.iter().rev() {
                stack.push(c);
            }
            Some(Some(NodeRef { snap, id }))
        })
        .flatten()
    }

    /// Whether `other` is inside this subtree (self included).
    pub fn contains(&self, other: NodeRef<'a>) -> bool {
        other.id == self.id || other.ancestors().any(|a| a.id == self.id)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeRef(#{} <{}>)", self.id, self.tag())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Tree builder for tests. Defaults to a visible, laid-out element.

    use super::*;

    pub(crate) struct N {
        node: DomNode,
        kids: Vec<N>,
    }

    pub(crate) fn n(tag: &str) -> N {
        N {
            node: DomNode {
                tag: tag.to_string(),
                rect: Rect { x: 0.0, y: 0.0, width: 120.0, height: 24.0 },
                ..DomNode::default()
            },
            kids: Vec::new(),
        }
    }

    impl N {
        pub fn attr(mut self, k: &str, v: &str) -> Self {
            self.node.attrs.insert(k.to_string(), v.to_string());
            self
        }

        pub fn text(mut self, t: &str) -> Self {
            self.node.text = t.to_string();
            self
        }

        pub fn hidden(mut self) -> Self {
            self.node.css.display = "none".into();
            self
        }

        pub fn zero_sized(mut self) -> Self {
            self.node.rect = Rect::default();
            self
        }

        pub fn positioned(mut self, position: &str, z_index: i64) -> Self {
            self.node.css.position = position.into();
            self.node.css.z_index = z_index;
            self
        }

        pub fn checked(mut self) -> Self {
            self.node.checked = true;
            self
        }

        pub fn value(mut self, v: &str) -> Self {
            self.node.value = Some(v.to_string());
            self
        }

        pub fn options(mut self, opts: &[(&str, &str)]) -> Self {
            self.node.options = opts
                .iter()
                .map(|(value, text)| SelectOption {
                    value: value.to_string(),
                    text: text.to_string(),
                    selected: false,
                })
                .collect();
            self
        }

        pub fn tab_index(mut self, i: i64) -> Self {
            self.node.tab_index = i;
            self
        }

        pub fn content_editable(mut self) -> Self {
            self.node.content_editable = true;
            self
        }

        pub fn onclick(mut self) -> Self {
            self.node.has_onclick = true;
            self
        }

        pub fn frame(mut self, status: FrameStatus) -> Self {
            self.node.frame = Some(status);
            self
        }

        pub fn child(mut self, c: N) -> Self {
            self.kids.push(c);
            self
        }
    }

    fn flatten(tree: N, parent: Option<usize>, nodes: &mut Vec<DomNode>) -> usize {
        let id = nodes.len();
        let mut node = tree.node;
        node.parent = parent;
        nodes.push(node);
        let mut child_ids = Vec::new();
        for kid in tree.kids {
            child_ids.push(flatten(kid, Some(id), nodes));
        }
        nodes[id].children = child_ids;
        id
    }

    pub(crate) fn snapshot(roots: Vec<N>) -> DomSnapshot {
        let body = roots
            .into_iter()
            .fold(n("body"), |acc, root| acc.child(root));
        let mut nodes = Vec::new();
        flatten(body, None, &mut nodes);
        DomSnapshot {
            url: "http://localhost/fixture".into(),
            title: "Fixture".into(),
            lang: Some("en".into()),
            nodes,
        }
    }
}
