//! API utilities for widget-backend communication
//!
//! Provides the request adapter used by every widget and the CSRF lookup.

use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, HtmlInputElement};

use crate::shared::dom;
use crate::shared::http::{CsrfToken, FetchAdapter, GlooTransport};

/// Django CSRF cookie
const CSRF_COOKIE: &str = "csrftoken";

/// Build the fetch adapter for a widget
///
/// # Arguments
/// * `base_url` - prefix for relative endpoint URLs ("" = same origin)
/// * `csrf_field` - name of the CSRF form field rendered by the server
///
/// # Example
/// ```rust,ignore
/// let adapter = api_adapter("", "csrfmiddlewaretoken");
/// let turmas: TurmasPayload = adapter.get_json("/turmas-por-curso/", &filters).await?;
/// ```
pub fn api_adapter(base_url: &str, csrf_field: &str) -> FetchAdapter<GlooTransport> {
    FetchAdapter::new(GlooTransport)
        .with_base_url(base_url)
        .with_csrf(csrf_token(csrf_field))
}

/// CSRF token of the page
///
/// Looks for the hidden form field first (`{% csrf_token %}`), then for the
/// `csrftoken` cookie.
///
/// # Returns
/// - token with the field name it must be sent under
/// - `None` when the page rendered neither
pub fn csrf_token(field: &str) -> Option<CsrfToken> {
    let from_field = dom::query_document(&format!("input[name=\"{}\"]", field))
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .filter(|value| !value.is_empty());

    let value = from_field.or_else(|| {
        let cookies = dom::document()?
            .dyn_into::<HtmlDocument>()
            .ok()?
            .cookie()
            .ok()?;
        csrf_from_cookie(&cookies, CSRF_COOKIE)
    })?;

    Some(CsrfToken {
        field: field.to_string(),
        value,
    })
}

/// Extract a cookie value from `document.cookie`
pub fn csrf_from_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_from_cookie() {
        let cookies = "sessionid=abc; csrftoken=XyZ123; theme=dark";
        assert_eq!(csrf_from_cookie(cookies, "csrftoken"), Some("XyZ123".to_string()));
        assert_eq!(csrf_from_cookie(cookies, "missing"), None);
        assert_eq!(csrf_from_cookie("csrftoken=", "csrftoken"), None);
        assert_eq!(csrf_from_cookie("", "csrftoken"), None);
    }
}
