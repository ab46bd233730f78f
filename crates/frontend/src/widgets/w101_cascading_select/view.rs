use leptos::mount::mount_to;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use thaw::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, EventTarget, HtmlElement, HtmlSelectElement};

use super::controller::{CascadeModel, CascadeState, CascadingController};
use crate::config::{CascadingConfig, PageSettings};
use crate::shared::api_utils::api_adapter;
use crate::shared::dom;
use crate::shared::options::{NoOptionsNotice, OptionEntries};

/// Handle to a bound cascading pair, used by a results panel that contains it.
#[derive(Clone)]
pub struct CascadeHandle {
    pub parent: HtmlSelectElement,
    pub child: HtmlSelectElement,
    pub model: RwSignal<CascadeModel>,
    listeners: Rc<RefCell<Vec<Rc<dyn Fn()>>>>,
}

impl CascadeHandle {
    /// Called after every parent change has been resolved (loaded, failed or reset)
    pub fn on_settled(&self, listener: impl Fn() + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn selected_value(&self) -> String {
        self.model.with_untracked(|m| m.selected_value())
    }

    /// Applies `<option>` markup sent by the server for this child
    pub fn apply_markup(&self, html: &str) {
        match dom::options_from_markup(html) {
            Some((items, selected)) => self.model.update(|m| m.replace(items, &selected)),
            None => debug!("could not parse option markup for child select"),
        }
    }

    fn notify(&self) {
        // snapshot: a listener may register another one
        let listeners: Vec<Rc<dyn Fn()>> = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}

/// `bind(parentControl, childControl, endpoint)`.
///
/// Both selects are looked up inside `root`; when either is missing the
/// binding is a no-op and `None` is returned.
pub fn bind(
    root: &Element,
    config: CascadingConfig,
    settings: &PageSettings,
) -> Option<CascadeHandle> {
    let Some(parent) = dom::select_in(root, &config.parent) else {
        debug!("cascading-select: parent '{}' not on this page", config.parent);
        return None;
    };
    let Some(child) = dom::select_in(root, &config.child) else {
        debug!("cascading-select: child '{}' not on this page", config.child);
        return None;
    };

    let (items, selected) = dom::read_options(&child);
    let model = RwSignal::new(CascadeModel::with_initial(
        items,
        &selected,
        &config.sentinel_label,
    ));
    let controller = Rc::new(CascadingController::new(
        api_adapter(&settings.base_url, &settings.csrf_field),
        config.clone(),
    ));
    let handle = CascadeHandle {
        parent: parent.clone(),
        child: child.clone(),
        model,
        listeners: Rc::new(RefCell::new(Vec::new())),
    };

    // The child's <option>s are rendered from the model from now on
    child.set_inner_html("");
    let list = Signal::derive(move || model.with(|m| m.options.clone()));
    let child_el: HtmlElement = child.clone().unchecked_into();
    mount_to(child_el, move || view! { <OptionEntries list=list /> }).forget();

    if let Some(slot) = dom::insert_after(&child, "span", "omaum-cascade-status") {
        let empty_message = config.empty_message.clone();
        mount_to(slot, move || view! { <CascadeStatus model=model empty_message=empty_message /> })
            .forget();
    }

    {
        let child = child.clone();
        Effect::new(move |_| {
            child.set_disabled(model.with(|m| m.disabled));
        });
    }

    {
        let child_for_values = child.clone();
        let target: EventTarget = child.clone().into();
        dom::listen(&target, "change", move |_| {
            let values = dom::selected_values(&child_for_values);
            model.update(|m| m.select(&values));
        });
    }

    {
        let handle = handle.clone();
        let target: EventTarget = parent.clone().into();
        dom::listen(&target, "change", move |_| {
            let parent_value = handle.parent.value();
            let current = dom::selected_values(&handle.child);
            let pending = model
                .try_update(|m| controller.begin(m, &parent_value, &current))
                .flatten();
            // FormData must not see the old child value while options load
            handle
                .child
                .set_disabled(model.with_untracked(|m| m.disabled));

            let Some(pending) = pending else {
                handle.notify();
                return;
            };

            let controller = Rc::clone(&controller);
            let handle = handle.clone();
            spawn_local(async move {
                let result = controller.fetch(&pending).await;
                let settled = model
                    .try_update(|m| controller.complete(m, pending, result))
                    .map(|completion| completion.settles())
                    .unwrap_or(false);
                if settled {
                    handle.notify();
                }
            });
        });
    }

    debug!(
        "cascading-select bound: {} -> {} via {}",
        config.parent, config.child, config.endpoint
    );
    Some(handle)
}

/// Loading spinner, "no options" notice and load errors next to the child select
#[component]
fn CascadeStatus(model: RwSignal<CascadeModel>, empty_message: String) -> impl IntoView {
    let loading = Signal::derive(move || model.with(|m| m.state == CascadeState::Loading));
    let empty = Signal::derive(move || model.with(|m| m.show_empty_notice()));

    view! {
        <Show when=move || loading.get()>
            <Spinner size=SpinnerSize::Small />
        </Show>
        <NoOptionsNotice visible=empty message=empty_message />
        {move || model.with(|m| m.notice).map(|notice| view! {
            <small class="omaum-cascade-error text-danger">{notice}</small>
        })}
    }
}
