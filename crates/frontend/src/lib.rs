pub mod config;
pub mod shared;
pub mod widgets;

use any_spawner::Executor;
use log::{info, warn};
use wasm_bindgen::prelude::wasm_bindgen;

use crate::config::{ConfigError, PageSettings, PAGE_SETTINGS_ID};

/// Page-wide settings from `<script id="omaum-config">`, defaults when absent
fn page_settings() -> Result<PageSettings, ConfigError> {
    match shared::dom::document()
        .and_then(|doc| doc.get_element_by_id(PAGE_SETTINGS_ID))
        .and_then(|el| el.text_content())
    {
        Some(raw) => PageSettings::parse(&raw),
        None => Ok(PageSettings::default()),
    }
}

/// Binds widgets added to the page after start (e.g. by a partial reload)
#[wasm_bindgen]
pub fn mount_widgets() -> usize {
    let settings = page_settings().unwrap_or_else(|e| {
        warn!("{}", e);
        PageSettings::default()
    });
    widgets::mount_all(&settings)
}

#[wasm_bindgen(start)]
pub fn start() {
    let parsed = page_settings();
    let settings = parsed.clone().unwrap_or_default();

    // initializes logging using the `log` crate
    _ = console_log::init_with_level(settings.log_level());
    console_error_panic_hook::set_once();
    if let Err(e) = parsed {
        warn!("{}; using defaults", e);
    }
    if Executor::init_wasm_bindgen().is_err() {
        warn!("async executor was already initialized");
    }

    let mounted = widgets::mount_all(&settings);
    info!("omaum widgets mounted: {}", mounted);
}
