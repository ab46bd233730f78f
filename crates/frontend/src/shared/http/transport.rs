use async_trait::async_trait;
use contracts::shared::endpoint::HttpMethod;
use gloo_net::http::Request;
use web_sys::{RequestCredentials, RequestRedirect};

/// Запрос в том виде, в каком он уходит в сеть
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Ответ сервера.
///
/// `body` is only read for successful, non-redirected responses; for anything
/// else it stays empty so a login page is never parsed as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub redirected: bool,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            redirected: false,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            redirected: false,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && !self.redirected
    }
}

/// Network seam: the browser implementation uses `gloo-net`, tests use an in-memory double.
///
/// Futures are `?Send`: everything runs on the single wasm event loop.
#[async_trait(?Send)]
pub trait HttpTransport {
    /// `Err` only when the request never produced a response (fetch rejected).
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// `fetch()` через gloo-net
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTransport;

#[async_trait(?Send)]
impl HttpTransport for GlooTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let mut builder = match request.method {
            HttpMethod::Get => Request::get(&request.url),
            HttpMethod::Post => Request::post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        // Редирект на страницу логина не должен исполняться внутри AJAX
        builder = builder
            .redirect(RequestRedirect::Manual)
            .credentials(RequestCredentials::SameOrigin);

        let prepared = match request.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| format!("Failed to build request: {}", e))?;

        let response = prepared
            .send()
            .await
            .map_err(|e| format!("Failed to send request: {}", e))?;

        let status = response.status();
        // manual redirect gives an opaque response with status 0
        let redirected = response.redirected() || status == 0 || (300..400).contains(&status);

        let body = if (200..300).contains(&status) && !redirected {
            response
                .text()
                .await
                .map_err(|e| format!("Failed to read response: {}", e))?
        } else {
            String::new()
        };

        Ok(HttpResponse {
            status,
            redirected,
            body,
        })
    }
}
