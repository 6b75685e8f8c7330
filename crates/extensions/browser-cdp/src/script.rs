//! Page-side scripts evaluated by the driver.
//!
//! Every argument is embedded as a JSON literal, so selectors and prompt
//! text never need escaping by hand.

use serde_json::Value;

/// Binding the mutation observer calls on every batch of DOM changes.
pub const MUTATION_BINDING: &str = "__snaprelayMutation";

fn literal(value: impl Into<Value>) -> String {
    value.into().to_string()
}

/// Installs the mutation observer, replacing one left by an earlier attach.
pub fn install_observer() -> String {
    format!(
        r#"(() => {{
  const binding = {binding};
  if (window.__snaprelayObserver) window.__snaprelayObserver.disconnect();
  const observer = new MutationObserver(() => {{
    if (typeof window[binding] === 'function') window[binding]('');
  }});
  observer.observe(document.documentElement, {{
    childList: true, subtree: true, attributes: true, characterData: true
  }});
  window.__snaprelayObserver = observer;
  return true;
}})()"#,
        binding = literal(MUTATION_BINDING)
    )
}

pub fn location() -> String {
    "location.href".to_string()
}

pub fn count(selector: &str) -> String {
    format!("document.querySelectorAll({}).length", literal(selector))
}

/// Evaluates to `false` when nothing matches.
pub fn click(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({selector});
  if (!el) return false;
  el.click();
  return true;
}})()"#,
        selector = literal(selector)
    )
}

/// Assigns a file built from base64 `data` and fires `change`. Evaluates to
/// `false` when nothing matches.
pub fn attach_file(selector: &str, data: &str, file_name: &str, mime: &str) -> String {
    format!(
        r#"(() => {{
  const input = document.querySelector({selector});
  if (!input) return false;
  const raw = atob({data});
  const bytes = new Uint8Array(raw.length);
  for (let i = 0; i < raw.length; i++) bytes[i] = raw.charCodeAt(i);
  const file = new File([bytes], {file_name}, {{ type: {mime} }});
  const transfer = new DataTransfer();
  transfer.items.add(file);
  input.files = transfer.files;
  input.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})()"#,
        selector = literal(selector),
        data = literal(data),
        file_name = literal(file_name),
        mime = literal(mime)
    )
}

/// Replaces the content of a text control and fires `input`. Evaluates to
/// `false` when nothing matches.
pub fn replace_text(selector: &str, text: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({selector});
  if (!el) return false;
  el.focus();
  if (el instanceof HTMLTextAreaElement || el instanceof HTMLInputElement) {{
    el.value = {text};
  }} else {{
    el.textContent = {text};
  }}
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  return true;
}})()"#,
        selector = literal(selector),
        text = literal(text)
    )
}

fn last_match(scope: Option<&str>, selector: &str) -> String {
    format!(
        r#"const last = (root, sel) => {{
    const all = root.querySelectorAll(sel);
    return all.length ? all[all.length - 1] : null;
  }};
  const scope = {scope};
  const root = scope === null ? document : last(document, scope);
  const el = root ? last(root, {selector}) : null;"#,
        scope = literal(scope),
        selector = literal(selector)
    )
}

/// Rendered text of the last match, or `null`.
pub fn last_text(scope: Option<&str>, selector: &str) -> String {
    format!(
        r#"(() => {{
  {find}
  return el ? el.innerText : null;
}})()"#,
        find = last_match(scope, selector)
    )
}

/// Inner markup of the last match, or `null`.
pub fn last_markup(selector: &str) -> String {
    format!(
        r#"(() => {{
  {find}
  return el ? el.innerHTML : null;
}})()"#,
        find = last_match(None, selector)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_json_literals() {
        let script = count(r#"[aria-label="Add image"], .x"#);
        assert_eq!(
            script,
            r#"document.querySelectorAll("[aria-label=\"Add image\"], .x").length"#
        );
    }

    #[test]
    fn test_prompt_text_cannot_break_out() {
        let script = replace_text("textarea", "it's \"quoted\"\n</script>");
        assert!(script.contains(r#""it's \"quoted\"\n</script>""#));
    }

    #[test]
    fn test_last_text_scope() {
        let scoped = last_text(Some(".model-response"), ".message-content");
        assert!(scoped.contains(r#"const scope = ".model-response";"#));
        assert!(scoped.contains("innerText"));

        let unscoped = last_text(None, ".model-response");
        assert!(unscoped.contains("const scope = null;"));
    }

    #[test]
    fn test_attach_file_names_the_file() {
        let script = attach_file("input[type=\"file\"]", "iVBORw0=", "screenshot.png", "image/png");
        assert!(script.contains(r#"new File([bytes], "screenshot.png", { type: "image/png" })"#));
        assert!(script.contains("new Event('change'"));
    }

    #[test]
    fn test_observer_reinstall_disconnects_previous() {
        let script = install_observer();
        assert!(script.contains("__snaprelayObserver.disconnect()"));
        assert!(script.contains(r#"const binding = "__snaprelayMutation";"#));
    }
}
