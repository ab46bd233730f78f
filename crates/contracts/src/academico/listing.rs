use serde::{Deserialize, Serialize};

/// JSON-ответ отфильтрованного списка (таблица + необязательные фрагменты).
///
/// `tabela_html` is mandatory: a payload without it is treated as a malformed
/// server response. Every other fragment is applied only when present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListingPayload {
    pub tabela_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursos_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turmas_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rodape_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paginacao_html: Option<String>,
}

impl ListingPayload {
    /// Listing built from a bare HTML fragment (endpoints that answer with markup)
    pub fn from_fragment(html: impl Into<String>) -> Self {
        Self {
            tabela_html: html.into(),
            ..Self::default()
        }
    }

    /// Footer markup: `rodape_html`, or `paginacao_html` on older endpoints
    pub fn footer_html(&self) -> Option<&str> {
        self.rodape_html
            .as_deref()
            .or(self.paginacao_html.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload() {
        let payload: ListingPayload = serde_json::from_str(
            r#"{"tabela_html":"<tr></tr>","cursos_html":"<option>","turmas_html":"<option>","rodape_html":"<nav>1</nav>"}"#,
        )
        .unwrap();
        assert_eq!(payload.tabela_html, "<tr></tr>");
        assert_eq!(payload.footer_html(), Some("<nav>1</nav>"));
        assert!(payload.turmas_html.is_some());
    }

    #[test]
    fn test_footer_falls_back_to_paginacao() {
        let payload: ListingPayload =
            serde_json::from_str(r#"{"tabela_html":"","paginacao_html":"<ul></ul>"}"#).unwrap();
        assert_eq!(payload.footer_html(), Some("<ul></ul>"));
        assert_eq!(payload.cursos_html, None);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        assert!(serde_json::from_str::<ListingPayload>(r#"{"rodape_html":"x"}"#).is_err());
    }
}
