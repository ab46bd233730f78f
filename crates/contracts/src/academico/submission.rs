use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Ключ ошибок, не относящихся к конкретному полю (как в Django forms)
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Ошибки валидации формы: поле → список сообщений
pub type FormErrors = BTreeMap<String, Vec<String>>;

/// Ответ `POST` формы (регистрация присутствия и т.п.)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_errors",
        skip_serializing_if = "FormErrors::is_empty"
    )]
    pub errors: FormErrors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmitResponse {
    /// Messages that are not attached to a field
    pub fn non_field_errors(&self) -> &[String] {
        self.errors
            .get(NON_FIELD_ERRORS)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `(field, messages)` pairs for field-level errors only
    pub fn field_errors(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors
            .iter()
            .filter(|(field, _)| field.as_str() != NON_FIELD_ERRORS)
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

/// Accepts `{"field": ["a", "b"]}`, `{"field": "a"}`, `["a", "b"]`, `"a"` or `null`.
fn lenient_errors<'de, D>(deserializer: D) -> Result<FormErrors, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Messages {
        One(String),
        Many(Vec<String>),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawErrors {
        ByField(BTreeMap<String, Messages>),
        List(Vec<String>),
        Text(String),
    }

    let raw = Option::<RawErrors>::deserialize(deserializer)?;
    let mut errors = FormErrors::new();
    match raw {
        None => {}
        Some(RawErrors::ByField(map)) => {
            for (field, messages) in map {
                let messages = match messages {
                    Messages::One(m) => vec![m],
                    Messages::Many(list) => list,
                };
                if !messages.is_empty() {
                    errors.insert(field, messages);
                }
            }
        }
        Some(RawErrors::List(list)) => {
            if !list.is_empty() {
                errors.insert(NON_FIELD_ERRORS.to_string(), list);
            }
        }
        Some(RawErrors::Text(text)) => {
            errors.insert(NON_FIELD_ERRORS.to_string(), vec![text]);
        }
    }
    Ok(errors)
}
