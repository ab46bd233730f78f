use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// What the endpoint answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    Json,
    Html,
}

/// Endpoint descriptor of one logical action (child options, listing, form submission).
///
/// Fixed when a widget is bound; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub response: ResponseKind,
}

impl Endpoint {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            response: ResponseKind::Json,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            response: ResponseKind::Json,
        }
    }

    pub fn with_response(mut self, response: ResponseKind) -> Self {
        self.response = response;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_defaults_from_json() {
        let endpoint: Endpoint = serde_json::from_str(r#"{"url": "/turmas-por-curso/"}"#).unwrap();
        assert_eq!(endpoint, Endpoint::get("/turmas-por-curso/"));
    }

    #[test]
    fn test_endpoint_explicit_fields() {
        let endpoint: Endpoint =
            serde_json::from_str(r#"{"url": "/alunos/", "method": "POST", "response": "html"}"#)
                .unwrap();
        assert_eq!(endpoint.method, HttpMethod::Post);
        assert_eq!(endpoint.response, ResponseKind::Html);
    }
}
