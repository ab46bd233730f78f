use serde::{Deserialize, Deserializer, Serialize};

/// Один элемент зависимого списка (например, турма выбранного курса)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(alias = "nome")]
    pub label: String,
}

impl OptionItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Ответ `GET turmas-por-curso/?curso_id=<id>`.
///
/// The server answers either `{"turmas": [...]}` or a bare array of the same items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurmasPayload {
    Wrapped { turmas: Vec<OptionItem> },
    Bare(Vec<OptionItem>),
}

impl TurmasPayload {
    /// Items in server order
    pub fn into_items(self) -> Vec<OptionItem> {
        match self {
            TurmasPayload::Wrapped { turmas } => turmas,
            TurmasPayload::Bare(items) => items,
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}
