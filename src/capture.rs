//! Browser bridge: installs the capture function into the page and pulls
//! typed snapshots out of it.
//!
//! The in-page script is a pure serializer — every heuristic lives on the
//! Rust side. Attachment is idempotent; a ready flag on the page's global
//! scope signals that the entry point exists.

use eoka::{Page, Result};

use crate::dom::DomSnapshot;

/// Defines `window.__pagelensCapture` and sets the ready flag. Safe to
/// evaluate repeatedly.
const ATTACH_JS: &str = r#"
(() => {
    if (window.__pagelensReady) return true;

    window.__pagelensCapture = function () {
        const nodes = [];

        function serialize(el, parent) {
            const idx = nodes.length;
            const style = getComputedStyle(el);
            const rect = el.getBoundingClientRect();

            const attrs = {};
            for (const a of el.attributes) attrs[a.name] = a.value;
            // Live disabled state may come from script, not markup.
            if (el.disabled && !('disabled' in attrs)) attrs['disabled'] = '';

            const node = {
                tag: el.tagName.toLowerCase(),
                attrs,
                text: el.innerText || el.textContent || '',
                parent,
                children: [],
                css: {
                    display: style.display,
                    visibility: style.visibility,
                    position: style.position,
                    cursor: style.cursor,
                    opacity: parseFloat(style.opacity),
                    z_index: parseInt(style.zIndex, 10) || 0
                },
                rect: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
                checked: !!el.checked,
                value: typeof el.value === 'string' ? el.value : null,
                options: el.tagName === 'SELECT'
                    ? Array.from(el.options).map(o => ({ value: o.value, text: o.text, selected: o.selected }))
                    : [],
                tab_index: typeof el.tabIndex === 'number' ? el.tabIndex : -1,
                content_editable: !!el.isContentEditable,
                has_onclick: el.onclick != null || el.getAttribute('onclick') != null,
                frame: null
            };

            if (el.tagName === 'IFRAME') {
                try {
                    const doc = el.contentDocument || (el.contentWindow && el.contentWindow.document);
                    if (doc) {
                        const editable = doc.querySelector('body[contenteditable="true"], [contenteditable="true"]');
                        node.frame = { access: 'readable', editable_body: !!editable };
                    } else {
                        node.frame = { access: 'denied' };
                    }
                } catch (e) {
                    node.frame = { access: 'denied' };
                }
            }

            nodes.push(node);
            for (const child of el.children) {
                node.children.push(serialize(child, idx));
            }
            return idx;
        }

        if (document.body) serialize(document.body, null);

        return JSON.stringify({
            url: location.href,
            title: document.title,
            lang: document.documentElement.getAttribute('lang'),
            nodes
        });
    };

    window.__pagelensReady = true;
    return true;
})()
"#;

/// True once every table on the page has body rows or a second header row.
/// Pages without tables are trivially ready.
pub const TABLES_READY_JS: &str = r#"
(() => {
    const tables = document.querySelectorAll('table');
    for (const table of tables) {
        const hasRows = table.querySelector('tbody tr');
        const hasFilters = table.querySelector('thead tr:nth-child(2)');
        if (!hasRows && !hasFilters) return false;
    }
    return true;
})()
"#;

/// Install the capture entry point. Idempotent.
pub async fn attach(page: &Page) -> Result<()> {
    let _: bool = page.evaluate(ATTACH_JS).await?;
    Ok(())
}

/// Whether the capture entry point is present on the page.
pub async fn is_attached(page: &Page) -> Result<bool> {
    page.evaluate("typeof window.__pagelensCapture === 'function'")
        .await
}

/// Capture and deserialize the current DOM state.
pub async fn capture_snapshot(page: &Page) -> Result<DomSnapshot> {
    attach(page).await?;
    let json: String = page.evaluate("window.__pagelensCapture()").await?;
    serde_json::from_str(&json)
        .map_err(|e| eoka::Error::CdpSimple(format!("snapshot parse error: {}", e)))
}
