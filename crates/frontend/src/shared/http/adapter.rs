use contracts::shared::endpoint::{Endpoint, HttpMethod, ResponseKind};
use contracts::shared::filter_state::FilterState;
use log::{debug, warn};
use serde::de::DeserializeOwned;

use super::error::FetchError;
use super::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Маркер AJAX-запроса: сервер отвечает ошибкой вместо редиректа на логин
pub const AJAX_HEADER: &str = "X-Requested-With";
pub const AJAX_HEADER_VALUE: &str = "XMLHttpRequest";
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const DEFAULT_CSRF_FIELD: &str = "csrfmiddlewaretoken";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// CSRF token rendered by the server into the page form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub field: String,
    pub value: String,
}

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            field: DEFAULT_CSRF_FIELD.to_string(),
            value: value.into(),
        }
    }
}

/// Разобранный ответ, в зависимости от `ResponseKind` эндпоинта
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Html(String),
}

/// HTTP fetch adapter: standard headers, CSRF, query/body encoding and
/// response classification around an `HttpTransport`.
#[derive(Debug, Clone)]
pub struct FetchAdapter<T> {
    transport: T,
    base_url: String,
    csrf: Option<CsrfToken>,
}

impl<T: HttpTransport> FetchAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_url: String::new(),
            csrf: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_csrf(mut self, csrf: Option<CsrfToken>) -> Self {
        self.csrf = csrf;
        self
    }

    /// Name of the CSRF form field; it is never sent as a filter
    pub fn csrf_field(&self) -> &str {
        self.csrf
            .as_ref()
            .map(|t| t.field.as_str())
            .unwrap_or(DEFAULT_CSRF_FIELD)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `request(endpoint, filterState)`: GET puts the filters into the query
    /// string, POST sends them as a form body.
    pub async fn request(
        &self,
        endpoint: &Endpoint,
        filters: &FilterState,
    ) -> Result<Payload, FetchError> {
        let body = match endpoint.method {
            HttpMethod::Get => self.fetch_text(&endpoint.url, filters).await?,
            HttpMethod::Post => {
                let fields: Vec<(String, String)> = filters
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                self.execute(self.form_request(&endpoint.url, &fields))
                    .await?
            }
        };

        match endpoint.response {
            ResponseKind::Json => serde_json::from_str(&body)
                .map(Payload::Json)
                .map_err(|e| FetchError::Malformed(e.to_string())),
            ResponseKind::Html => Ok(Payload::Html(body)),
        }
    }

    /// GET и разбор JSON в нужный тип
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        filters: &FilterState,
    ) -> Result<R, FetchError> {
        let body = self.fetch_text(url, filters).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    /// GET returning the raw body (HTML fragments)
    pub async fn fetch_text(&self, url: &str, filters: &FilterState) -> Result<String, FetchError> {
        let url = build_url(&self.resolve(url), filters)?;
        self.execute(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: self.base_headers(),
            body: None,
        })
        .await
    }

    /// POST form-encoded fields (repeated names allowed) and parse the JSON answer
    pub async fn post_form<R: DeserializeOwned>(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<R, FetchError> {
        let body = self.execute(self.form_request(url, fields)).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    fn form_request(&self, url: &str, fields: &[(String, String)]) -> HttpRequest {
        let mut fields = fields.to_vec();
        let mut headers = self.base_headers();
        headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));

        // Токен из самой формы важнее токена страницы
        let form_token = fields
            .iter()
            .find(|(name, _)| name == self.csrf_field())
            .map(|(_, value)| value.clone());
        match (form_token, &self.csrf) {
            (Some(token), _) => headers.push((CSRF_HEADER.to_string(), token)),
            (None, Some(csrf)) => {
                headers.push((CSRF_HEADER.to_string(), csrf.value.clone()));
                fields.push((csrf.field.clone(), csrf.value.clone()));
            }
            (None, None) => warn!("POST {} without CSRF token", url),
        }

        HttpRequest {
            method: HttpMethod::Post,
            url: self.resolve(url),
            headers,
            body: Some(encode_form(&fields)),
        }
    }

    fn base_headers(&self) -> Vec<(String, String)> {
        vec![(AJAX_HEADER.to_string(), AJAX_HEADER_VALUE.to_string())]
    }

    fn resolve(&self, url: &str) -> String {
        if self.base_url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), url)
        }
    }

    async fn execute(&self, request: HttpRequest) -> Result<String, FetchError> {
        debug!("{:?} {}", request.method, request.url);
        let url = request.url.clone();
        let response = self
            .transport
            .send(request)
            .await
            .map_err(FetchError::Network)?;
        classify(response).inspect_err(|e| warn!("{} failed: {}", url, e))
    }
}

/// 401 and redirects mean the session is gone; any other non-2xx is a server error.
///
/// The body of a failed response is never inspected.
pub fn classify(response: HttpResponse) -> Result<String, FetchError> {
    if response.status == 401 || response.redirected {
        return Err(FetchError::SessionExpired {
            status: response.status,
        });
    }
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    Ok(response.body)
}

/// Appends the filters to `url` as a query string; a `#fragment` stays last
pub fn build_url(url: &str, filters: &FilterState) -> Result<String, FetchError> {
    if filters.is_empty() {
        return Ok(url.to_string());
    }
    let query =
        serde_qs::to_string(filters.as_map()).map_err(|e| FetchError::Encode(e.to_string()))?;
    let (path, fragment) = match url.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (url, None),
    };
    let separator = if path.contains('?') { '&' } else { '?' };
    Ok(match fragment {
        Some(fragment) => format!("{}{}{}#{}", path, separator, query, fragment),
        None => format!("{}{}{}", path, separator, query),
    })
}

/// `application/x-www-form-urlencoded` body; keeps field order and repeated names
pub fn encode_form(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
