use contracts::academico::turmas::{OptionItem, TurmasPayload};
use contracts::shared::filter_state::FilterState;
use log::{debug, warn};

use crate::config::{CascadingConfig, ChildClearPolicy, ParentEmptyPolicy};
use crate::shared::http::{FetchAdapter, FetchError, HttpTransport};
use crate::shared::messages;
use crate::shared::options::OptionList;
use crate::shared::sequence::{RequestSequencer, RequestTicket};

/// Idle → Loading → Populated, back to Loading on every parent change.
/// There is no error state: a failed load returns to what was shown before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Idle,
    Loading,
    Populated,
}

/// Состояние зависимого списка
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeModel {
    pub state: CascadeState,
    pub options: OptionList,
    pub disabled: bool,
    /// Non-blocking notice after a failed load
    pub notice: Option<&'static str>,
    sequencer: RequestSequencer,
}

impl CascadeModel {
    pub fn new(sentinel_label: &str) -> Self {
        Self {
            state: CascadeState::Idle,
            options: OptionList::sentinel_only(sentinel_label),
            disabled: false,
            notice: None,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Adopts the options the server already rendered into the page
    pub fn with_initial(items: Vec<OptionItem>, selected: &[String], sentinel_label: &str) -> Self {
        let mut model = Self::new(sentinel_label);
        if !items.is_empty() {
            model.options = OptionList::render(items, sentinel_label, selected);
            model.state = CascadeState::Populated;
        }
        model
    }

    /// "No options" is shown only after a load that returned nothing
    pub fn show_empty_notice(&self) -> bool {
        self.state == CascadeState::Populated && self.options.is_empty()
    }

    pub fn selected_value(&self) -> String {
        self.options.selected_value()
    }

    /// The user picked a value in the child control
    pub fn select(&mut self, ids: &[String]) {
        self.options = OptionList::render(
            self.options.items().to_vec(),
            self.options.sentinel_label(),
            ids,
        );
    }

    /// Replaces the options with a set delivered by another widget
    /// (`turmas_html` of a listing). Any fetch still in flight becomes stale.
    pub fn replace(&mut self, items: Vec<OptionItem>, selected: &[String]) {
        self.sequencer.issue();
        let sentinel = self.options.sentinel_label().to_string();
        self.options = OptionList::render(items, &sentinel, selected);
        self.state = CascadeState::Populated;
        self.disabled = false;
        self.notice = None;
    }
}

/// Запрос опций, созданный сменой родителя
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    ticket: RequestTicket,
    pub filters: FilterState,
    selected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied,
    /// A newer parent change was issued meanwhile; the response was dropped
    Stale,
    Failed(FetchError),
}

impl Completion {
    /// Whether listeners of the pair hear about it. A dropped response
    /// belongs to a parent value that is no longer selected.
    pub fn settles(&self) -> bool {
        !matches!(self, Completion::Stale)
    }
}

/// Cascading controller: parent value → child options.
#[derive(Debug, Clone)]
pub struct CascadingController<T> {
    adapter: FetchAdapter<T>,
    config: CascadingConfig,
}

impl<T: HttpTransport> CascadingController<T> {
    pub fn new(adapter: FetchAdapter<T>, config: CascadingConfig) -> Self {
        Self { adapter, config }
    }

    pub fn config(&self) -> &CascadingConfig {
        &self.config
    }

    /// Handles a parent change.
    ///
    /// Applies the child-clear policy right away and returns the request to
    /// issue, or `None` when the empty-parent policy resolves it locally.
    /// `current_child` is what the child shows now; it is kept selected if
    /// the new options still contain it.
    pub fn begin(
        &self,
        model: &mut CascadeModel,
        parent_value: &str,
        current_child: &[String],
    ) -> Option<PendingFetch> {
        let parent_value = parent_value.trim();
        // issued even without a request: a response to an older parent must not land
        let ticket = model.sequencer.issue();
        model.notice = None;

        if parent_value.is_empty() && self.config.on_parent_empty == ParentEmptyPolicy::Clear {
            debug!("{}: parent cleared, child reset", self.config.child);
            model.options = OptionList::sentinel_only(&self.config.sentinel_label);
            model.state = CascadeState::Idle;
            model.disabled = false;
            return None;
        }

        match self.config.on_parent_change {
            ChildClearPolicy::Clear => {
                model.options = OptionList::sentinel_only(&self.config.sentinel_label);
            }
            ChildClearPolicy::Disable => model.disabled = true,
        }
        model.state = CascadeState::Loading;

        let mut filters = FilterState::new();
        filters.set(self.config.param.as_str(), parent_value);

        Some(PendingFetch {
            ticket,
            filters,
            selected: current_child.to_vec(),
        })
    }

    pub async fn fetch(&self, pending: &PendingFetch) -> Result<Vec<OptionItem>, FetchError> {
        self.adapter
            .get_json::<TurmasPayload>(&self.config.endpoint, &pending.filters)
            .await
            .map(TurmasPayload::into_items)
    }

    /// Applies the fetch result unless a newer parent change superseded it
    pub fn complete(
        &self,
        model: &mut CascadeModel,
        pending: PendingFetch,
        result: Result<Vec<OptionItem>, FetchError>,
    ) -> Completion {
        if !model.sequencer.is_latest(pending.ticket) {
            debug!("{}: dropping stale options response", self.config.child);
            return Completion::Stale;
        }

        model.disabled = false;
        match result {
            Ok(items) => {
                debug!("{}: {} options loaded", self.config.child, items.len());
                model.options =
                    OptionList::render(items, &self.config.sentinel_label, &pending.selected);
                model.state = CascadeState::Populated;
                Completion::Applied
            }
            Err(e) => {
                warn!("{}: failed to load options: {}", self.config.child, e);
                model.state = if model.options.is_empty() {
                    CascadeState::Idle
                } else {
                    CascadeState::Populated
                };
                model.notice = Some(if e.is_session_expired() {
                    messages::SESSION_EXPIRED
                } else {
                    messages::OPTIONS_LOAD_FAILED
                });
                Completion::Failed(e)
            }
        }
    }
}
