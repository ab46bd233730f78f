//! Виджеты, которые прикрепляются к серверным страницам.
//!
//! Mount points are found by `data-omaum-widget`; each one is bound once.

pub mod w101_cascading_select;
pub mod w102_filtered_results;
pub mod w103_ajax_form;

use leptos::prelude::Owner;
use log::{debug, warn};
use std::cell::RefCell;
use web_sys::Element;

use crate::config::{self, PageSettings, WidgetConfig, WidgetKind};
use crate::shared::dom;
use w101_cascading_select::CascadeHandle;

const MOUNTED_ATTR: &str = "data-omaum-mounted";

thread_local! {
    // Reactive owners of mounted widgets; they live as long as the page
    static OWNERS: RefCell<Vec<Owner>> = const { RefCell::new(Vec::new()) };
    static CASCADES: RefCell<Vec<CascadeHandle>> = const { RefCell::new(Vec::new()) };
}

fn in_owner<R>(f: impl FnOnce() -> R) -> R {
    let owner = Owner::new();
    let result = owner.with(f);
    OWNERS.with(|owners| owners.borrow_mut().push(owner));
    result
}

fn read_config(el: &Element) -> Option<WidgetConfig> {
    let kind = el.get_attribute(config::WIDGET_ATTR)?;
    let raw = el.get_attribute(config::CONFIG_ATTR);
    match config::parse_widget(&kind, raw.as_deref()) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("skipping widget: {}", e);
            None
        }
    }
}

/// Binds every declared widget not bound yet; returns how many were bound.
///
/// Cascading selects go first so that a results panel around them can
/// subscribe to their updates; forms go last.
pub fn mount_all(settings: &PageSettings) -> usize {
    let pending: Vec<(Element, WidgetConfig)> =
        dom::query_all(&format!("[{}]:not([{}])", config::WIDGET_ATTR, MOUNTED_ATTR))
            .into_iter()
            .filter_map(|el| read_config(&el).map(|config| (el, config)))
            .collect();

    let mut mounted = 0;
    for pass in [
        WidgetKind::CascadingSelect,
        WidgetKind::FilteredResults,
        WidgetKind::AjaxForm,
    ] {
        for (el, config) in pending.iter().filter(|(_, config)| config.kind() == pass) {
            if mount_one(el, config.clone(), settings) {
                let _ = el.set_attribute(MOUNTED_ATTR, "");
                mounted += 1;
            }
        }
    }
    mounted
}

fn mount_one(el: &Element, config: WidgetConfig, settings: &PageSettings) -> bool {
    let kind = config.kind();
    let bound = match config {
        WidgetConfig::Cascading(config) => {
            match in_owner(|| w101_cascading_select::bind(el, config, settings)) {
                Some(handle) => {
                    CASCADES.with(|cascades| cascades.borrow_mut().push(handle));
                    true
                }
                None => false,
            }
        }
        WidgetConfig::Results(config) => {
            let cascades = CASCADES.with(|cascades| cascades.borrow().clone());
            in_owner(|| w102_filtered_results::bind(el, config, settings, &cascades))
        }
        WidgetConfig::Form(config) => in_owner(|| w103_ajax_form::bind(el, config, settings)),
    };
    if bound {
        debug!("{} mounted on <{}>", kind.as_str(), el.tag_name().to_lowercase());
    }
    bound
}
