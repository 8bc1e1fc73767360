//! Ranked locator-candidate generation.
//!
//! Each strategy is independent; candidates are collected in precedence order
//! and stable-sorted by descending weight, so equal weights keep the
//! registration order. The first candidate is the node's canonical locator.
//! Expressions use the harness locator DSL (`getByRole`, `getByLabel`,
//! `locator('css')`, `.nth(i)`, …).

use crate::dom::NodeRef;
use crate::model::{SelectorCandidate, SelectorKind};
use crate::{name, richtext, role};

pub const TEST_ID_ATTRS: &[&str] = &[
    "data-testid",
    "data-test-id",
    "data-test",
    "data-cy",
    "data-qa",
    "data-automation-id",
];

const FORM_TAGS: &[&str] = &["input", "select", "textarea"];

/// Text longer than this is too fragile to locate by.
const MAX_TEXT_LOCATOR_LEN: usize = 50;

const WEIGHT_TEST_ID: u8 = 100;
/// Label outranks role+name for form controls: the label is the purpose-built
/// handle there, and role+name merely restates it.
const WEIGHT_LABEL: u8 = 90;
const WEIGHT_ROLE: u8 = 90;
const WEIGHT_ROLE_FORM: u8 = 85;
const WEIGHT_TITLE: u8 = 75;
const WEIGHT_PLACEHOLDER: u8 = 70;
const WEIGHT_TEXT: u8 = 70;
const WEIGHT_ID: u8 = 60;
const WEIGHT_CSS_QUALIFIED: u8 = 30;
const WEIGHT_CSS_CLASS: u8 = 20;
const WEIGHT_CSS_TAG: u8 = 10;

/// Candidates at or above this weight can re-locate the node reliably; a node
/// whose best candidate falls below is excluded from the snapshot.
pub const MIN_STABLE_WEIGHT: u8 = 20;

/// Escape for single-quoted DSL string literals.
pub(crate) fn esc(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Escape for double-quoted CSS attribute values.
pub(crate) fn attr_esc(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Minimal CSS identifier escaping for `#id` selectors.
pub(crate) fn css_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// First purpose-built test-id attribute present on the node.
pub fn test_id<'a>(node: NodeRef<'a>) -> Option<(&'static str, &'a str)> {
    TEST_ID_ATTRS
        .iter()
        .find_map(|&key| node.attr(key).filter(|v| !v.is_empty()).map(|v| (key, v)))
}

fn candidate(kind: SelectorKind, expression: String, weight: u8) -> SelectorCandidate {
    SelectorCandidate { kind, expression, weight }
}

/// Generate the full ranked candidate list for a node. Never empty: the CSS
/// fallback always exists, though it may be too weak to count as stable.
pub fn candidates(node: NodeRef<'_>) -> Vec<SelectorCandidate> {
    let mut out = Vec::new();
    let is_form = FORM_TAGS.contains(&node.tag());

    if let Some((_, value)) = test_id(node) {
        out.push(candidate(
            SelectorKind::TestId,
            format!("getByTestId('{}')", esc(value)),
            WEIGHT_TEST_ID,
        ));
    }

    if let (Some(role), Some(nm)) = (role::resolve(node), name::resolve(node)) {
        let weight = if is_form { WEIGHT_ROLE_FORM } else { WEIGHT_ROLE };
        out.push(candidate(
            SelectorKind::Role,
            role_name_expr(node, &role, &nm),
            weight,
        ));
    }

    if is_form {
        if let Some(label) = name::associated_label(node) {
            out.push(candidate(
                SelectorKind::Label,
                format!("getByLabel('{}')", esc(&label)),
                WEIGHT_LABEL,
            ));
        }
    }

    if let Some(title) = node.attr("title").filter(|t| !t.trim().is_empty()) {
        out.push(candidate(
            SelectorKind::Title,
            format!("locator('[title=\"{}\"]')", attr_esc(title)),
            WEIGHT_TITLE,
        ));
    }

    if is_form {
        if let Some(placeholder) = node.attr("placeholder").filter(|p| !p.trim().is_empty()) {
            out.push(candidate(
                SelectorKind::Placeholder,
                format!("getByPlaceholder('{}')", esc(placeholder)),
                WEIGHT_PLACEHOLDER,
            ));
        }
    }

    let text = node.text();
    if !text.is_empty() && text.chars().count() < MAX_TEXT_LOCATOR_LEN {
        out.push(candidate(
            SelectorKind::Text,
            format!("getByText('{}')", esc(&text)),
            WEIGHT_TEXT,
        ));
    }

    if let Some(id) = node.dom_id() {
        out.push(candidate(
            SelectorKind::Id,
            format!("locator('#{}')", css_escape(id)),
            WEIGHT_ID,
        ));
    }

    if node.tag() == "iframe" && richtext::is_editor_frame(node) {
        out.extend(richtext::frame_candidates(node));
    }

    out.push(css_fallback(node));

    // Stable sort: equal weights keep registration order.
    out.sort_by(|a, b| b.weight.cmp(&a.weight));
    out
}

/// Best candidate, or None when the node cannot be reliably re-located.
pub fn best(candidates: &[SelectorCandidate]) -> Option<&SelectorCandidate> {
    candidates.first().filter(|c| c.weight >= MIN_STABLE_WEIGHT)
}

/// `getByRole('r',{ name:'n' })`, with a positional qualifier appended when
/// other nodes resolve to the same role and name.
fn role_name_expr(node: NodeRef<'_>, role: &str, nm: &str) -> String {
    let expr = format!("getByRole('{}',{{ name:'{}' }})", esc(role), esc(nm));
    let matches: Vec<usize> = node
        .snapshot()
        .iter()
        .filter(|c| {
            role::resolve(*c).as_deref() == Some(role) && name::resolve(*c).as_deref() == Some(nm)
        })
        .map(|c| c.id())
        .collect();
    if matches.len() > 1 {
        if let Some(pos) = matches.iter().position(|&id| id == node.id()) {
            return format!("{}.nth({})", expr, pos);
        }
    }
    expr
}

/// Generic CSS fallback, strongest variant available:
/// name-qualified form selector > small-set class selector > bare tag.
fn css_fallback(node: NodeRef<'_>) -> SelectorCandidate {
    let tag = node.tag();

    if FORM_TAGS.contains(&tag) {
        if let Some(form_name) = node.attr("name").filter(|v| !v.is_empty()) {
            let input_type = node.input_type().unwrap_or_default();
            let expr = if matches!(input_type.as_str(), "radio" | "checkbox")
                && node.value().map(|v| !v.is_empty()).unwrap_or(false)
            {
                format!(
                    "locator('{}[name=\"{}\"][value=\"{}\"]')",
                    tag,
                    attr_esc(form_name),
                    attr_esc(node.value().unwrap_or_default())
                )
            } else {
                format!("locator('{}[name=\"{}\"]')", tag, attr_esc(form_name))
            };
            return candidate(SelectorKind::Css, expr, WEIGHT_CSS_QUALIFIED);
        }
    }

    let classes: Vec<&str> = node.classes().take(2).collect();
    if !classes.is_empty() {
        let matches: Vec<usize> = node
            .snapshot()
            .iter()
            .filter(|c| c.tag() == tag && classes.iter().all(|cls| c.has_class(cls)))
            .map(|c| c.id())
            .collect();
        // Only worth emitting when the class set is near-unique on the page.
        if matches.len() <= 3 {
            let selector = format!(
                "{}.{}",
                tag,
                classes.iter().map(|c| css_escape(c)).collect::<Vec<_>>().join(".")
            );
            let expr = if matches.len() > 1 {
                let pos = matches.iter().position(|&id| id == node.id()).unwrap_or(0);
                format!("locator('{}').nth({})", selector, pos)
            } else {
                format!("locator('{}')", selector)
            };
            return candidate(SelectorKind::Css, expr, WEIGHT_CSS_CLASS);
        }
    }

    candidate(SelectorKind::Css, format!("locator('{}')", tag), WEIGHT_CSS_TAG)
}
