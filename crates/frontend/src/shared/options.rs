//! Option list renderer: содержимое зависимого `<select>`

use contracts::academico::turmas::OptionItem;
use leptos::prelude::*;

/// Одна строка `<option>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectEntry {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Options of a dependent control: always one sentinel (empty value) first,
/// then the items of the last applied fetch in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionList {
    sentinel_label: String,
    items: Vec<OptionItem>,
    selected: Vec<String>,
}

impl OptionList {
    /// Only the sentinel
    pub fn sentinel_only(sentinel_label: impl Into<String>) -> Self {
        Self {
            sentinel_label: sentinel_label.into(),
            items: Vec::new(),
            selected: Vec::new(),
        }
    }

    /// `render(items, sentinelLabel, selectedIds)`.
    ///
    /// Items keep the server order. Ids in `selected_ids` that are not among
    /// the new items are dropped, so a stale selection never survives a refresh.
    pub fn render(items: Vec<OptionItem>, sentinel_label: &str, selected_ids: &[String]) -> Self {
        let selected = selected_ids
            .iter()
            .filter(|id| !id.is_empty() && items.iter().any(|item| &item.id == *id))
            .cloned()
            .collect();
        Self {
            sentinel_label: sentinel_label.to_string(),
            items,
            selected,
        }
    }

    pub fn items(&self) -> &[OptionItem] {
        &self.items
    }

    pub fn sentinel_label(&self) -> &str {
        &self.sentinel_label
    }

    /// No items: only the sentinel is shown together with the "no options" notice
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Value the control reports: the first selected item, or "" (sentinel)
    pub fn selected_value(&self) -> String {
        self.selected.first().cloned().unwrap_or_default()
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    /// Entries in display order, sentinel first
    pub fn entries(&self) -> Vec<SelectEntry> {
        let mut entries = Vec::with_capacity(self.items.len() + 1);
        entries.push(SelectEntry {
            value: String::new(),
            label: self.sentinel_label.clone(),
            selected: self.selected.is_empty(),
        });
        entries.extend(self.items.iter().map(|item| SelectEntry {
            value: item.id.clone(),
            label: item.label.clone(),
            selected: self.selected.contains(&item.id),
        }));
        entries
    }
}

/// `<option>` elements of a list; mounted inside an existing `<select>`
#[component]
pub fn OptionEntries(#[prop(into)] list: Signal<OptionList>) -> impl IntoView {
    move || {
        list.get()
            .entries()
            .into_iter()
            .map(|entry| {
                view! {
                    <option value=entry.value prop:selected=entry.selected>
                        {entry.label}
                    </option>
                }
            })
            .collect_view()
    }
}

/// Сообщение "нет вариантов" рядом с зависимым списком
#[component]
pub fn NoOptionsNotice(
    #[prop(into)] visible: Signal<bool>,
    #[prop(into)] message: String,
) -> impl IntoView {
    view! {
        <small class="omaum-no-options text-muted" hidden=move || !visible.get()>
            {message}
        </small>
    }
}
