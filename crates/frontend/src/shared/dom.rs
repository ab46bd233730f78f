//! Тонкие обёртки над web-sys.
//!
//! Widgets receive element handles from here; nothing else in the crate
//! queries the document directly.

use contracts::academico::turmas::OptionItem;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlButtonElement, HtmlElement, HtmlFormElement,
    HtmlInputElement, HtmlOptionElement, HtmlSelectElement, SubmitEvent,
};

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// `root.querySelector(selector)`; an invalid selector counts as "not found"
pub fn query_in(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub fn query_document(selector: &str) -> Option<Element> {
    document()?.query_selector(selector).ok().flatten()
}

/// All elements matching `selector` in document order
pub fn query_all(selector: &str) -> Vec<Element> {
    let Some(list) = document().and_then(|d| d.query_selector_all(selector).ok()) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn select_in(root: &Element, selector: &str) -> Option<HtmlSelectElement> {
    query_in(root, selector)?.dyn_into::<HtmlSelectElement>().ok()
}

pub fn form_in(root: &Element, selector: Option<&str>) -> Option<HtmlFormElement> {
    match selector {
        Some(selector) => query_in(root, selector)?.dyn_into::<HtmlFormElement>().ok(),
        None => root.clone().dyn_into::<HtmlFormElement>().ok(),
    }
}

pub fn html_in(root: &Element, selector: &str) -> Option<HtmlElement> {
    query_in(root, selector)?.dyn_into::<HtmlElement>().ok()
}

/// `new FormData(form)` as `(name, value)` pairs; file inputs are skipped.
///
/// Disabled controls are not part of FormData, so a disabled dependent
/// select is naturally left out of the filters.
pub fn form_fields(form: &HtmlFormElement) -> Vec<(String, String)> {
    let Ok(data) = web_sys::FormData::new_with_form(form) else {
        return Vec::new();
    };
    let Ok(Some(entries)) = js_sys::try_iter(&data) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pair = entry.dyn_into::<js_sys::Array>().ok()?;
            let name = pair.get(0).as_string()?;
            let value = pair.get(1).as_string()?;
            Some((name, value))
        })
        .collect()
}

/// `(name, value)` of the button that submitted the form, when it has a name.
///
/// FormData built from the form alone leaves it out.
pub fn submitter_field(event: &Event) -> Option<(String, String)> {
    let submitter = event.dyn_ref::<SubmitEvent>()?.submitter()?;
    let name = submitter.get_attribute("name").filter(|n| !n.is_empty())?;
    let value = if let Some(button) = submitter.dyn_ref::<HtmlButtonElement>() {
        button.value()
    } else if let Some(input) = submitter.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else {
        submitter.get_attribute("value").unwrap_or_default()
    };
    Some((name, value))
}

/// Values currently selected in a `<select>` (several for `multiple`)
pub fn selected_values(select: &HtmlSelectElement) -> Vec<String> {
    let options = select.options();
    (0..options.length())
        .filter_map(|i| options.item(i))
        .filter_map(|el| el.dyn_into::<HtmlOptionElement>().ok())
        .filter(|opt| opt.selected())
        .map(|opt| opt.value())
        .collect()
}

/// Reads `<option>` items out of a select, skipping the empty-value sentinel.
/// Returns the items and the ids marked selected.
pub fn read_options(select: &HtmlSelectElement) -> (Vec<OptionItem>, Vec<String>) {
    let options = select.options();
    let mut items = Vec::new();
    let mut selected = Vec::new();
    for opt in (0..options.length())
        .filter_map(|i| options.item(i))
        .filter_map(|el| el.dyn_into::<HtmlOptionElement>().ok())
    {
        let value = opt.value();
        if value.is_empty() {
            continue;
        }
        if opt.selected() {
            selected.push(value.clone());
        }
        items.push(OptionItem::new(value, opt.text().trim()));
    }
    (items, selected)
}

/// Parses server `<option>` markup (e.g. `turmas_html`) with the browser's parser
pub fn options_from_markup(html: &str) -> Option<(Vec<OptionItem>, Vec<String>)> {
    let select = document()?
        .create_element("select")
        .ok()?
        .dyn_into::<HtmlSelectElement>()
        .ok()?;
    select.set_inner_html(html);
    Some(read_options(&select))
}

/// Attaches a listener for the page lifetime.
///
/// The closure is leaked on purpose: the widgets live as long as the page.
pub fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    if target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .is_ok()
    {
        closure.forget();
    }
}

/// `href` of the link the event happened in, if any
pub fn link_href(event: &Event) -> Option<String> {
    let element = event.target()?.dyn_into::<Element>().ok()?;
    let link = element.closest("a[href]").ok()??;
    link.get_attribute("href")
}

/// Free-text inputs are debounced; everything else refreshes on `change`
pub fn is_text_input(target: &EventTarget) -> bool {
    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        return matches!(input.type_().as_str(), "text" | "search" | "email" | "tel" | "number");
    }
    target
        .dyn_ref::<Element>()
        .map(|el| el.tag_name().eq_ignore_ascii_case("textarea"))
        .unwrap_or(false)
}

/// Creates an empty `<div>`/`<span>` right after `anchor` to mount a widget part into
pub fn insert_after(anchor: &Element, tag: &str, class: &str) -> Option<HtmlElement> {
    let el = document()?.create_element(tag).ok()?;
    el.set_class_name(class);
    anchor.after_with_node_1(&el).ok()?;
    el.dyn_into::<HtmlElement>().ok()
}

/// Creates an element at the end of `parent`
pub fn append_child(parent: &Element, tag: &str, class: &str) -> Option<HtmlElement> {
    let el = document()?.create_element(tag).ok()?;
    el.set_class_name(class);
    parent.append_child(&el).ok()?;
    el.dyn_into::<HtmlElement>().ok()
}

pub fn navigate(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().assign(url) {
            log::error!("Failed to navigate to {}: {:?}", url, e);
        }
    }
}
