use contracts::shared::filter_state::FilterState;
use leptos::mount::mount_to;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;
use std::rc::Rc;
use thaw::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, HtmlElement, HtmlFormElement, Node};

use super::controller::{PanelEvent, Reaction, RefreshController, RefreshModel, SiblingUpdates, Trigger};
use crate::config::{PageSettings, ResultsConfig};
use crate::shared::api_utils::api_adapter;
use crate::shared::debounce::{debounce, Debouncer};
use crate::shared::dom;
use crate::shared::http::GlooTransport;
use crate::shared::sequence::RequestTicket;
use crate::widgets::w101_cascading_select::CascadeHandle;

/// Hides the loading indicator of one refresh cycle when dropped,
/// whichever way the cycle ends.
struct LoadingGuard {
    model: RwSignal<RefreshModel>,
    ticket: RequestTicket,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.model.try_update(|m| m.finish(ticket));
    }
}

struct ResultsBinding {
    config: ResultsConfig,
    form: Option<HtmlFormElement>,
    controller: RefreshController<GlooTransport>,
    model: RwSignal<RefreshModel>,
    cascade: Option<CascadeHandle>,
    debouncer: StoredValue<Debouncer>,
}

impl ResultsBinding {
    /// Filters as the controls hold them right now
    fn current_filters(&self) -> FilterState {
        let mut filters = self
            .form
            .as_ref()
            .map(|form| FilterState::from_pairs(dom::form_fields(form)))
            .unwrap_or_default();
        // the dependent select may be disabled while it loads
        if let Some(cascade) = &self.cascade {
            filters.set(self.config.turma_field.as_str(), cascade.selected_value());
        }
        filters
    }

    fn refresh(self: &Rc<Self>, extra: FilterState) {
        let filters = self.current_filters();
        let Some(pending) = self
            .model
            .try_update(|m| self.controller.begin(m, &filters, &extra))
        else {
            return;
        };
        let guard = LoadingGuard {
            model: self.model,
            ticket: pending.ticket(),
        };

        let this = Rc::clone(self);
        spawn_local(async move {
            let result = this.controller.fetch(&pending).await;
            let siblings = this
                .model
                .try_update(|m| this.controller.complete(m, pending, result))
                .flatten();
            drop(guard);
            if let Some(siblings) = siblings {
                this.apply_siblings(siblings);
            }
        });
    }

    /// `cursos_html` / `turmas_html` of a listing replace the filter options
    fn apply_siblings(&self, siblings: SiblingUpdates) {
        let Some(form) = &self.form else { return };

        if let Some(html) = siblings.cursos_html {
            let selector = format!("select[name=\"{}\"]", self.config.curso_field);
            match dom::select_in(form, &selector) {
                Some(select) => select.set_inner_html(&html),
                None => debug!("filtered-results: no '{}' select for cursos_html", selector),
            }
        }

        if let Some(html) = siblings.turmas_html {
            match &self.cascade {
                Some(cascade) => cascade.apply_markup(&html),
                None => {
                    let selector = format!("select[name=\"{}\"]", self.config.turma_field);
                    if let Some(select) = dom::select_in(form, &selector) {
                        select.set_inner_html(&html);
                    }
                }
            }
        }
    }

    fn react(self: &Rc<Self>, dom_event: &Event, event: PanelEvent<'_>) {
        let reaction = Reaction::to(event);
        if reaction.prevent_default {
            dom_event.prevent_default();
        }
        match reaction.trigger {
            Trigger::Now(extra) => {
                self.debouncer.update_value(|d| d.cancel());
                self.refresh(extra);
            }
            Trigger::Debounced => {
                let this = Rc::clone(self);
                debounce(self.debouncer, move || this.refresh(FilterState::new()));
            }
            Trigger::Ignore => {}
        }
    }

    fn is_cascade_parent(&self, target: &EventTarget) -> bool {
        self.cascade
            .as_ref()
            .map(|c| {
                let parent: &EventTarget = c.parent.as_ref();
                parent == target
            })
            .unwrap_or(false)
    }
}

/// `bind(filterControls, resultsContainer, endpoint, options)`.
///
/// `root` is the mount element; the form, results container and footer
/// are looked up inside it (the results container also in the document).
pub fn bind(
    root: &Element,
    config: ResultsConfig,
    settings: &PageSettings,
    cascades: &[CascadeHandle],
) -> bool {
    let Some(results_el) =
        dom::html_in(root, &config.results).or_else(|| html_in_document(&config.results))
    else {
        debug!("filtered-results: container '{}' not on this page", config.results);
        return false;
    };
    let form = dom::form_in(root, config.form.as_deref())
        .or_else(|| dom::form_in(root, Some("form")));
    let footer_el = config
        .footer
        .as_deref()
        .and_then(|selector| dom::html_in(root, selector).or_else(|| html_in_document(selector)));
    let loading_el = config
        .loading
        .as_deref()
        .and_then(|selector| dom::html_in(root, selector).or_else(|| html_in_document(selector)));

    let cascade = form.as_ref().and_then(|form| {
        cascades
            .iter()
            .find(|c| {
                let parent: &Node = c.parent.as_ref();
                form.contains(Some(parent))
            })
            .cloned()
    });

    let model = RwSignal::new(RefreshModel::new(
        results_el.inner_html(),
        footer_el.as_ref().map(|el| el.inner_html()),
    ));
    let binding = Rc::new(ResultsBinding {
        controller: RefreshController::new(
            api_adapter(&settings.base_url, &settings.csrf_field),
            config.endpoint.clone(),
        ),
        debouncer: StoredValue::new(Debouncer::new(config.debounce_ms)),
        config,
        form,
        model,
        cascade,
    });

    let rows = matches!(
        results_el.tag_name().to_ascii_lowercase().as_str(),
        "tbody" | "thead" | "tfoot" | "table"
    );
    sync_markup(model, rows, results_el.clone(), footer_el.clone(), loading_el);

    if let Some(slot) = dom::insert_after(&results_el, "div", "omaum-results-status") {
        mount_to(slot, move || view! { <ResultsStatus model=model /> }).forget();
    }

    if let Some(form) = &binding.form {
        let target: &EventTarget = form.as_ref();

        let this = Rc::clone(&binding);
        dom::listen(target, "submit", move |event: Event| {
            this.react(&event, PanelEvent::Submit);
        });

        let this = Rc::clone(&binding);
        dom::listen(target, "change", move |event: Event| {
            let Some(target) = event.target() else { return };
            let change = PanelEvent::Change {
                text_input: dom::is_text_input(&target),
                cascade_parent: this.is_cascade_parent(&target),
            };
            this.react(&event, change);
        });

        let this = Rc::clone(&binding);
        dom::listen(target, "input", move |event: Event| {
            let Some(target) = event.target() else { return };
            let input = PanelEvent::Input {
                text_input: dom::is_text_input(&target),
            };
            this.react(&event, input);
        });
    }

    // pagination and sort links
    for container in std::iter::once(results_el.clone()).chain(footer_el) {
        let this = Rc::clone(&binding);
        let target: &EventTarget = container.as_ref();
        dom::listen(target, "click", move |event: Event| {
            let href = dom::link_href(&event);
            let click = PanelEvent::LinkClick {
                href: href.as_deref(),
            };
            this.react(&event, click);
        });
    }

    if let Some(cascade) = &binding.cascade {
        let this = Rc::clone(&binding);
        cascade.on_settled(move || this.refresh(FilterState::new()));
    }

    debug!("filtered-results bound to {}", binding.config.endpoint.url);
    if binding.config.load_on_mount {
        binding.refresh(FilterState::new());
    }
    true
}

fn html_in_document(selector: &str) -> Option<HtmlElement> {
    dom::query_document(selector)?.dyn_into().ok()
}

/// Server fragments and error messages go straight into the page's own containers
fn sync_markup(
    model: RwSignal<RefreshModel>,
    rows: bool,
    results_el: HtmlElement,
    footer_el: Option<HtmlElement>,
    loading_el: Option<HtmlElement>,
) {
    let markup = Memo::new(move |_| model.with(|m| m.content.container_markup(rows)));
    let footer = Memo::new(move |_| model.with(|m| m.footer_html.clone()));
    let loading = Memo::new(move |_| model.with(|m| m.loading));

    {
        let results_el = results_el.clone();
        Effect::new(move |_| {
            let html = markup.get();
            if results_el.inner_html() != html {
                results_el.set_inner_html(&html);
            }
        });
    }

    if let Some(footer_el) = footer_el {
        Effect::new(move |_| {
            if let Some(html) = footer.get() {
                if footer_el.inner_html() != html {
                    footer_el.set_inner_html(&html);
                }
            }
        });
    }

    Effect::new(move |_| {
        let loading = loading.get();
        results_el.set_hidden(loading);
        if let Some(indicator) = &loading_el {
            indicator.set_hidden(!loading);
        }
    });
}

/// Spinner while a cycle runs
#[component]
fn ResultsStatus(model: RwSignal<RefreshModel>) -> impl IntoView {
    let loading = Signal::derive(move || model.with(|m| m.loading));

    view! {
        <Show when=move || loading.get()>
            <Spinner size=SpinnerSize::Small />
        </Show>
    }
}
