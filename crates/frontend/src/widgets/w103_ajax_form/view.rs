use contracts::academico::submission::FormErrors;
use leptos::mount::mount_to;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;
use std::rc::Rc;
use thaw::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, HtmlButtonElement, HtmlFormElement, HtmlInputElement};

use super::controller::{with_submitter, SubmissionController, SubmissionModel, SubmitOutcome};
use crate::config::{FormConfig, PageSettings};
use crate::shared::api_utils::api_adapter;
use crate::shared::dom;
use crate::shared::messages;

const ERROR_SLOT_ATTR: &str = "data-error-for";
const INVALID_CLASS: &str = "is-invalid";
const SUBMIT_CONTROLS: &str = "button[type=\"submit\"], button:not([type]), input[type=\"submit\"]";

/// Binds a server-rendered form so it posts in the background.
///
/// Field errors go into `[data-error-for="<field>"]` elements of the form;
/// errors for fields without such a slot are listed in the status region.
pub fn bind(root: &Element, config: FormConfig, settings: &PageSettings) -> bool {
    let Some(form) = dom::form_in(root, config.form.as_deref())
        .or_else(|| dom::form_in(root, Some("form")))
    else {
        debug!("ajax-form: no form under mount point");
        return false;
    };

    let controller = Rc::new(SubmissionController::new(
        api_adapter(&settings.base_url, &settings.csrf_field),
        config.success_message.clone(),
    ));
    let model = RwSignal::new(SubmissionModel::default());
    let unslotted = RwSignal::new(Vec::<String>::new());

    if let Some(slot) = dom::append_child(&form, "div", "omaum-form-status") {
        mount_to(slot, move || view! { <SubmitStatus model=model unslotted=unslotted /> }).forget();
    }

    {
        let form = form.clone();
        Effect::new(move |_| {
            let in_flight = model.with(|m| m.in_flight);
            for control in submit_controls(&form) {
                set_control_disabled(&control, in_flight);
            }
        });
    }

    let target: EventTarget = form.clone().into();
    let endpoint = config.endpoint.clone();
    dom::listen(&target, "submit", move |event: Event| {
        event.prevent_default();

        let url = endpoint.clone().unwrap_or_else(|| form.action());
        let fields = with_submitter(dom::form_fields(&form), dom::submitter_field(&event));
        let Some(pending) = model
            .try_update(|m| controller.begin(m, &url, fields))
            .flatten()
        else {
            return;
        };
        clear_field_errors(&form);
        unslotted.set(Vec::new());

        let controller = Rc::clone(&controller);
        let form = form.clone();
        spawn_local(async move {
            let result = controller.send(&pending).await;
            let Some(outcome) = model.try_update(|m| controller.complete(m, pending, result)) else {
                return;
            };
            match outcome {
                SubmitOutcome::Redirect(url) => dom::navigate(&url),
                SubmitOutcome::Invalid { field_errors, .. } => {
                    unslotted.set(show_field_errors(&form, &field_errors));
                }
                _ => {}
            }
        });
    });

    debug!(
        "ajax-form bound: {}",
        config.endpoint.as_deref().unwrap_or("<form action>")
    );
    true
}

fn submit_controls(form: &HtmlFormElement) -> Vec<Element> {
    let Ok(list) = form.query_selector_all(SUBMIT_CONTROLS) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn set_control_disabled(control: &Element, disabled: bool) {
    if let Some(button) = control.dyn_ref::<HtmlButtonElement>() {
        button.set_disabled(disabled);
    } else if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
        input.set_disabled(disabled);
    }
}

fn clear_field_errors(form: &HtmlFormElement) {
    for selector in [format!("[{}]", ERROR_SLOT_ATTR), format!(".{}", INVALID_CLASS)] {
        let Ok(list) = form.query_selector_all(&selector) else {
            continue;
        };
        for el in (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
        {
            if el.has_attribute(ERROR_SLOT_ATTR) {
                el.set_text_content(None);
            }
            let _ = el.class_list().remove_1(INVALID_CLASS);
        }
    }
}

/// Writes field messages next to their fields; returns the ones with no slot
fn show_field_errors(form: &HtmlFormElement, errors: &FormErrors) -> Vec<String> {
    let mut unslotted = Vec::new();
    for (field, messages) in errors {
        let text = messages.join(" ");

        if let Some(input) = dom::query_in(form, &format!("[name=\"{}\"]", field)) {
            let _ = input.class_list().add_1(INVALID_CLASS);
        }
        match dom::query_in(form, &format!("[{}=\"{}\"]", ERROR_SLOT_ATTR, field)) {
            Some(slot) => slot.set_text_content(Some(&text)),
            None => unslotted.push(format!("{}: {}", field, text)),
        }
    }
    unslotted
}

#[component]
fn SubmitStatus(model: RwSignal<SubmissionModel>, unslotted: RwSignal<Vec<String>>) -> impl IntoView {
    let in_flight = Signal::derive(move || model.with(|m| m.in_flight));

    view! {
        <Show when=move || in_flight.get()>
            <span class="omaum-form-sending">
                <Spinner size=SpinnerSize::Small />
                {messages::SUBMITTING}
            </span>
        </Show>
        {move || {
            let outcome = model.with(|m| m.outcome.clone())?;
            let text = outcome.summary()?;
            let intent = match outcome {
                SubmitOutcome::Saved(_) => MessageBarIntent::Success,
                SubmitOutcome::SessionExpired => MessageBarIntent::Warning,
                _ => MessageBarIntent::Error,
            };
            Some(view! {
                <MessageBar intent=intent>
                    <div>
                        <div>{text}</div>
                        <ul>
                            {move || unslotted.get().into_iter().map(|line| view! { <li>{line}</li> }).collect_view()}
                        </ul>
                    </div>
                </MessageBar>
            })
        }}
    }
}
