//! JavaScript snippets evaluated in the page
//!
//! Matched elements are tagged with a `data-autopost-ref` attribute so later
//! calls can address them again without holding remote object handles.

use crate::session::matcher::Matcher;

/// Attribute carrying the element reference
pub const REF_ATTRIBUTE: &str = "data-autopost-ref";

/// Encode a Rust string as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    // JSON strings are valid JS string literals
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Expression evaluating to the element tagged `element_ref`, or null
pub fn element_expr(element_ref: &str) -> String {
    format!(
        "document.querySelector('[{}=' + {} + ']')",
        REF_ATTRIBUTE,
        js_string(&format!("\"{}\"", element_ref))
    )
}

/// Function `(root) => Element[]` implementing `matcher`
fn match_fn(matcher: &Matcher) -> String {
    match matcher {
        Matcher::Css(selector) => format!(
            "(root) => Array.from(root.querySelectorAll({}))",
            js_string(selector)
        ),
        Matcher::CssWithText { selector, text } => format!(
            r#"(root) => {{
                const needle = {}.toLowerCase();
                return Array.from(root.querySelectorAll({})).filter((el) =>
                    (el.innerText || el.textContent || '').toLowerCase().includes(needle));
            }}"#,
            js_string(text),
            js_string(selector)
        ),
        Matcher::Role { role, name } => format!(
            r#"(root) => {{
                const role = {};
                const name = {};
                const implicit = {{
                    button: 'button, input[type="button"], input[type="submit"]',
                    textbox: 'textarea, input:not([type]), input[type="text"]',
                    dialog: 'dialog',
                }};
                const selector = '[role="' + role + '"]' + (implicit[role] ? ', ' + implicit[role] : '');
                return Array.from(root.querySelectorAll(selector)).filter((el) => {{
                    const label = el.getAttribute('aria-label') || el.innerText || el.textContent || el.value || '';
                    return label.trim() === name;
                }});
            }}"#,
            js_string(role),
            js_string(name)
        ),
        Matcher::Text(text) => format!(
            r#"(root) => {{
                const needle = {}.toLowerCase();
                const walker = document.createTreeWalker(
                    root,
                    NodeFilter.SHOW_TEXT,
                    {{
                        acceptNode: (node) => {{
                            return node.textContent.toLowerCase().includes(needle) ? NodeFilter.FILTER_ACCEPT : NodeFilter.FILTER_REJECT;
                        }}
                    }}
                );
                const results = [];
                let node;
                while (node = walker.nextNode()) {{
                    const el = node.parentElement;
                    if (el && !results.includes(el)) {{
                        results.push(el);
                    }}
                }}
                return results;
            }}"#,
            js_string(text)
        ),
    }
}

/// Tag every element matching `matcher` under `scope` (or the document) and
/// return the tags as a JSON array. Returns null when `scope` is detached.
pub fn query_all(matcher: &Matcher, scope: Option<&str>) -> String {
    let root = match scope {
        Some(element_ref) => element_expr(element_ref),
        None => "document".to_string(),
    };

    format!(
        r#"
        (() => {{
            const root = {root};
            if (!root) return null;
            const found = ({matcher})(root);
            window.__autopostRef = window.__autopostRef || 0;
            return JSON.stringify(found.map((el) => {{
                if (!el.hasAttribute('{attr}')) {{
                    window.__autopostRef += 1;
                    el.setAttribute('{attr}', 'ref-' + window.__autopostRef);
                }}
                return el.getAttribute('{attr}');
            }}));
        }})()
        "#,
        root = root,
        matcher = match_fn(matcher),
        attr = REF_ATTRIBUTE,
    )
}

/// `true` when the element is connected to the document
pub fn is_attached(element_ref: &str) -> String {
    format!(
        "(() => {{ const el = {}; return !!el && el.isConnected; }})()",
        element_expr(element_ref)
    )
}

/// Attribute value, or null
pub fn get_attribute(element_ref: &str, name: &str) -> String {
    format!(
        "(() => {{ const el = {}; return el ? el.getAttribute({}) : null; }})()",
        element_expr(element_ref),
        js_string(name)
    )
}

/// `true` when the element shows a pointer cursor or has an onclick handler
pub fn is_pointer_interactive(element_ref: &str) -> String {
    format!(
        r#"
        (() => {{
            const el = {};
            if (!el) return false;
            return window.getComputedStyle(el).cursor === 'pointer' || typeof el.onclick === 'function';
        }})()
        "#,
        element_expr(element_ref)
    )
}

/// Scroll the element to the viewport centre and return its box as JSON
pub fn scroll_and_measure(element_ref: &str) -> String {
    format!(
        r#"
        (() => {{
            const el = {};
            if (!el) return null;
            el.scrollIntoView({{ block: 'center', inline: 'center' }});
            const rect = el.getBoundingClientRect();
            return JSON.stringify({{ x: rect.x, y: rect.y, width: rect.width, height: rect.height }});
        }})()
        "#,
        element_expr(element_ref)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a"b'c"#), r#""a\"b'c""#);
        assert_eq!(js_string("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn test_element_expr_quotes_ref() {
        let expr = element_expr("ref-7");
        assert!(expr.contains("data-autopost-ref"));
        assert!(expr.contains(r#""\"ref-7\"""#));
    }

    #[test]
    fn test_query_all_scoped_and_unscoped() {
        let matcher = Matcher::css(r#"div[role="dialog"]"#);

        let global = query_all(&matcher, None);
        assert!(global.contains("const root = document;"));
        assert!(global.contains(r#"div[role=\"dialog\"]"#));

        let scoped = query_all(&matcher, Some("ref-1"));
        assert!(scoped.contains("ref-1"));
        assert!(scoped.contains("if (!root) return null;"));
    }

    #[test]
    fn test_text_matchers_are_case_insensitive() {
        let script = query_all(&Matcher::css_with_text("div", "Write something"), None);
        assert!(script.contains(".toLowerCase().includes(needle)"));

        let script = query_all(&Matcher::text("Post"), None);
        assert!(script.contains("createTreeWalker"));
        assert!(script.contains("toLowerCase"));
    }

    #[test]
    fn test_role_matcher_uses_exact_name() {
        let script = query_all(&Matcher::role("button", "Post"), None);
        assert!(script.contains("label.trim() === name"));
        assert!(script.contains(r#"const role = "button";"#));
    }
}
