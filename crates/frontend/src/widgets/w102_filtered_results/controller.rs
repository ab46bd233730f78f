use contracts::academico::listing::ListingPayload;
use contracts::shared::endpoint::Endpoint;
use contracts::shared::filter_state::FilterState;
use log::{debug, warn};

use crate::shared::http::{FetchAdapter, FetchError, HttpTransport, Payload};
use crate::shared::query::params_from_href;
use crate::shared::sequence::{RequestSequencer, RequestTicket};

/// Что показывает контейнер результатов
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsContent {
    Fragment(String),
    SessionExpired(&'static str),
    Failed(&'static str),
}

impl ResultsContent {
    /// Markup for the results container. Errors replace the old rows so a
    /// failed refresh never leaves results that no longer match the filters.
    /// `rows` is set when the container is a table section.
    pub fn container_markup(&self, rows: bool) -> String {
        let (class, text) = match self {
            ResultsContent::Fragment(html) => return html.clone(),
            ResultsContent::SessionExpired(text) => ("omaum-session-expired", *text),
            ResultsContent::Failed(text) => ("omaum-results-error", *text),
        };
        if rows {
            format!(
                "<tr class=\"{}\"><td colspan=\"100\" role=\"alert\">{}</td></tr>",
                class, text
            )
        } else {
            format!("<div class=\"{}\" role=\"alert\">{}</div>", class, text)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshModel {
    pub loading: bool,
    pub content: ResultsContent,
    pub footer_html: Option<String>,
    sequencer: RequestSequencer,
}

impl RefreshModel {
    /// Starts from the markup the server rendered with the page
    pub fn new(initial_html: String, initial_footer: Option<String>) -> Self {
        Self {
            loading: false,
            content: ResultsContent::Fragment(initial_html),
            footer_html: initial_footer,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Hides the loading indicator if `ticket` is the latest cycle.
    /// Idempotent, so both the normal path and the drop guard may call it.
    pub fn finish(&mut self, ticket: RequestTicket) {
        if self.sequencer.is_latest(ticket) {
            self.loading = false;
        }
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        self.sequencer.is_latest(ticket)
    }
}

/// Один цикл обновления
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRefresh {
    ticket: RequestTicket,
    pub params: FilterState,
}

impl PendingRefresh {
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }
}

/// Sibling fragments of a successful listing, applied by the view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingUpdates {
    pub cursos_html: Option<String>,
    pub turmas_html: Option<String>,
}

/// DOM event inside the panel, reduced to what decides the refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent<'a> {
    Submit,
    Change {
        text_input: bool,
        cascade_parent: bool,
    },
    Input {
        text_input: bool,
    },
    LinkClick {
        href: Option<&'a str>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Refresh right away with these extra params; a pending debounce is dropped
    Now(FilterState),
    Debounced,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub trigger: Trigger,
    pub prevent_default: bool,
}

impl Reaction {
    pub fn to(event: PanelEvent<'_>) -> Self {
        let (trigger, prevent_default) = match event {
            PanelEvent::Submit => (Trigger::Now(FilterState::new()), true),
            // text fields go through `input`; the cascade parent refreshes
            // once the child options settle
            PanelEvent::Change {
                text_input,
                cascade_parent,
            } if text_input || cascade_parent => (Trigger::Ignore, false),
            PanelEvent::Change { .. } => (Trigger::Now(FilterState::new()), false),
            PanelEvent::Input { text_input: true } => (Trigger::Debounced, false),
            PanelEvent::Input { text_input: false } => (Trigger::Ignore, false),
            PanelEvent::LinkClick { href: Some(href) } if href.contains('?') => {
                (Trigger::Now(params_from_href(href)), true)
            }
            PanelEvent::LinkClick { .. } => (Trigger::Ignore, false),
        };
        Self {
            trigger,
            prevent_default,
        }
    }
}

/// Content refresh controller: filters → listing endpoint → results markup.
#[derive(Debug, Clone)]
pub struct RefreshController<T> {
    adapter: FetchAdapter<T>,
    endpoint: Endpoint,
}

impl<T: HttpTransport> RefreshController<T> {
    pub fn new(adapter: FetchAdapter<T>, endpoint: Endpoint) -> Self {
        Self { adapter, endpoint }
    }

    /// Opens a refresh cycle: shows loading and freezes the request
    /// parameters from the filters as they are right now.
    pub fn begin(
        &self,
        model: &mut RefreshModel,
        filters: &FilterState,
        extra: &FilterState,
    ) -> PendingRefresh {
        let ticket = model.sequencer.issue();
        model.loading = true;
        let params = filters.merged(extra, self.adapter.csrf_field());
        debug!("refresh {} with {} params", self.endpoint.url, params.len());
        PendingRefresh { ticket, params }
    }

    pub async fn fetch(&self, pending: &PendingRefresh) -> Result<ListingPayload, FetchError> {
        match self.adapter.request(&self.endpoint, &pending.params).await? {
            Payload::Json(value) => {
                serde_json::from_value(value).map_err(|e| FetchError::Malformed(e.to_string()))
            }
            Payload::Html(html) => Ok(ListingPayload::from_fragment(html)),
        }
    }

    /// Applies the result of the latest cycle; stale cycles change nothing.
    /// Loading is hidden on every path of the latest cycle.
    pub fn complete(
        &self,
        model: &mut RefreshModel,
        pending: PendingRefresh,
        result: Result<ListingPayload, FetchError>,
    ) -> Option<SiblingUpdates> {
        if !model.is_latest(pending.ticket) {
            debug!("dropping stale listing response");
            return None;
        }
        model.finish(pending.ticket);

        match result {
            Ok(payload) => {
                if let Some(footer) = payload.footer_html() {
                    model.footer_html = Some(footer.to_string());
                }
                model.content = ResultsContent::Fragment(payload.tabela_html);
                Some(SiblingUpdates {
                    cursos_html: payload.cursos_html,
                    turmas_html: payload.turmas_html,
                })
            }
            Err(e) => {
                warn!("listing {} failed: {}", self.endpoint.url, e);
                model.content = if e.is_session_expired() {
                    ResultsContent::SessionExpired(e.user_message())
                } else {
                    ResultsContent::Failed(e.user_message())
                };
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::http::testing::MockTransport;
    use crate::shared::http::{CsrfToken, HttpResponse};
    use crate::shared::messages;
    use contracts::shared::endpoint::ResponseKind;
    use futures::executor::block_on;

    fn controller(endpoint: Endpoint) -> (RefreshController<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        let adapter = FetchAdapter::new(transport.clone()).with_csrf(Some(CsrfToken::new("tok")));
        (RefreshController::new(adapter, endpoint), transport)
    }

    fn run(
        ctrl: &RefreshController<MockTransport>,
        model: &mut RefreshModel,
        filters: &FilterState,
        extra: &FilterState,
    ) -> Option<SiblingUpdates> {
        let pending = ctrl.begin(model, filters, extra);
        assert!(model.loading);
        let result = block_on(ctrl.fetch(&pending));
        ctrl.complete(model, pending, result)
    }

    #[test]
    fn test_json_listing_replaces_table_and_footer() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/filtrar/"));
        transport.push_ok(
            r#"{"tabela_html":"<tr><td>Ana</td></tr>","turmas_html":"<option value=\"1\">A</option>","paginacao_html":"<ul>2</ul>"}"#,
        );
        let mut model = RefreshModel::new("<tr></tr>".to_string(), None);
        let filters = FilterState::from_pairs([("curso", "3"), ("q", "ana")]);

        let siblings = run(&ctrl, &mut model, &filters, &FilterState::new());

        assert!(!model.loading);
        assert_eq!(
            model.content,
            ResultsContent::Fragment("<tr><td>Ana</td></tr>".to_string())
        );
        assert_eq!(model.footer_html.as_deref(), Some("<ul>2</ul>"));
        let siblings = siblings.unwrap();
        assert!(siblings.turmas_html.is_some());
        assert_eq!(siblings.cursos_html, None);
        assert_eq!(transport.requests()[0].url, "/alunos/filtrar/?curso=3&q=ana");
    }

    fn refresh_for(
        ctrl: &RefreshController<MockTransport>,
        model: &mut RefreshModel,
        filters: &FilterState,
        event: PanelEvent<'_>,
    ) -> Reaction {
        let reaction = Reaction::to(event);
        if let Trigger::Now(extra) = &reaction.trigger {
            run(ctrl, model, filters, extra);
        }
        reaction
    }

    #[test]
    fn test_submit_is_prevented_and_fetches_once() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push_ok(r#"{"tabela_html":"<tr></tr>"}"#);
        let mut model = RefreshModel::new(String::new(), None);
        let filters = FilterState::from_pairs([("curso", "3")]);

        let reaction = refresh_for(&ctrl, &mut model, &filters, PanelEvent::Submit);

        assert!(reaction.prevent_default);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].url, "/alunos/?curso=3");
    }

    #[test]
    fn test_change_events() {
        let select = Reaction::to(PanelEvent::Change {
            text_input: false,
            cascade_parent: false,
        });
        assert_eq!(select.trigger, Trigger::Now(FilterState::new()));
        assert!(!select.prevent_default);

        let parent = Reaction::to(PanelEvent::Change {
            text_input: false,
            cascade_parent: true,
        });
        assert_eq!(parent.trigger, Trigger::Ignore);

        let text = Reaction::to(PanelEvent::Change {
            text_input: true,
            cascade_parent: false,
        });
        assert_eq!(text.trigger, Trigger::Ignore);
    }

    #[test]
    fn test_typing_is_debounced() {
        assert_eq!(
            Reaction::to(PanelEvent::Input { text_input: true }).trigger,
            Trigger::Debounced
        );
        // checkboxes fire `input` too; their `change` refreshes
        assert_eq!(
            Reaction::to(PanelEvent::Input { text_input: false }).trigger,
            Trigger::Ignore
        );
    }

    #[test]
    fn test_pagination_click_merges_link_params() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push_ok(r#"{"tabela_html":"<tr></tr>"}"#);
        let mut model = RefreshModel::new(String::new(), None);
        let filters = FilterState::from_pairs([("curso", "1"), ("q", "ana")]);

        let reaction = refresh_for(
            &ctrl,
            &mut model,
            &filters,
            PanelEvent::LinkClick {
                href: Some("?page=2&curso=3"),
            },
        );

        assert!(reaction.prevent_default);
        assert_eq!(transport.requests()[0].url, "/alunos/?curso=3&page=2&q=ana");
    }

    #[test]
    fn test_plain_links_navigate() {
        for href in [Some("/alunos/12/"), None] {
            let reaction = Reaction::to(PanelEvent::LinkClick { href });
            assert_eq!(reaction.trigger, Trigger::Ignore);
            assert!(!reaction.prevent_default);
        }
    }

    #[test]
    fn test_html_endpoint() {
        let (ctrl, transport) =
            controller(Endpoint::get("/presencas/historico/").with_response(ResponseKind::Html));
        transport.push_ok("<div>historico</div>");
        let mut model = RefreshModel::new(String::new(), Some("<nav></nav>".to_string()));

        run(&ctrl, &mut model, &FilterState::new(), &FilterState::new());

        assert_eq!(
            model.content,
            ResultsContent::Fragment("<div>historico</div>".to_string())
        );
        // no footer in an HTML answer: the old one stays
        assert_eq!(model.footer_html.as_deref(), Some("<nav></nav>"));
    }

    #[test]
    fn test_pagination_params_merge_and_csrf_is_excluded() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push_ok(r#"{"tabela_html":""}"#);
        let mut model = RefreshModel::new(String::new(), None);
        let filters =
            FilterState::from_pairs([("csrfmiddlewaretoken", "tok"), ("curso", "3"), ("page", "1")]);
        let extra = FilterState::from_pairs([("page", "2")]);

        run(&ctrl, &mut model, &filters, &extra);

        assert_eq!(transport.requests()[0].url, "/alunos/?curso=3&page=2");
    }

    #[test]
    fn test_params_frozen_at_request_construction() {
        let (ctrl, _transport) = controller(Endpoint::get("/alunos/"));
        let mut model = RefreshModel::new(String::new(), None);
        let mut filters = FilterState::from_pairs([("q", "ana")]);

        let pending = ctrl.begin(&mut model, &filters, &FilterState::new());
        filters.set("q", "bruno");

        assert_eq!(pending.params.get("q"), Some("ana"));
    }

    #[test]
    fn test_unauthorized_shows_session_expired() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push(HttpResponse {
            status: 401,
            redirected: false,
            body: "{not json".to_string(),
        });
        let mut model = RefreshModel::new("<tr>old</tr>".to_string(), None);

        let siblings = run(&ctrl, &mut model, &FilterState::new(), &FilterState::new());

        assert_eq!(siblings, None);
        assert!(!model.loading);
        assert_eq!(
            model.content,
            ResultsContent::SessionExpired(messages::SESSION_EXPIRED)
        );
        let markup = model.content.container_markup(false);
        assert!(markup.contains(messages::SESSION_EXPIRED));
        assert!(!markup.contains("old"));
    }

    #[test]
    fn test_failure_replaces_rows_in_table_container() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push(HttpResponse::status(500));
        let mut model = RefreshModel::new("<tr><td>Ana</td></tr>".to_string(), None);

        run(&ctrl, &mut model, &FilterState::new(), &FilterState::new());

        let markup = model.content.container_markup(true);
        assert!(markup.starts_with("<tr"));
        assert!(markup.contains(messages::RETRY_LATER));
        assert!(!markup.contains("Ana"));
    }

    #[test]
    fn test_fragment_markup_is_passed_through() {
        let content = ResultsContent::Fragment("<tr><td>Ana</td></tr>".to_string());
        assert_eq!(content.container_markup(true), "<tr><td>Ana</td></tr>");
    }

    #[test]
    fn test_redirect_shows_session_expired() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push(HttpResponse {
            status: 0,
            redirected: true,
            body: String::new(),
        });
        let mut model = RefreshModel::new(String::new(), None);

        run(&ctrl, &mut model, &FilterState::new(), &FilterState::new());

        assert!(matches!(model.content, ResultsContent::SessionExpired(_)));
    }

    #[test]
    fn test_network_failure_hides_loading_and_shows_retry() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push_network_error("offline");
        let mut model = RefreshModel::new(String::new(), None);

        run(&ctrl, &mut model, &FilterState::new(), &FilterState::new());

        assert!(!model.loading);
        assert_eq!(model.content, ResultsContent::Failed(messages::RETRY_LATER));
    }

    #[test]
    fn test_missing_table_is_a_server_error() {
        let (ctrl, transport) = controller(Endpoint::get("/alunos/"));
        transport.push_ok(r#"{"rodape_html":"<nav></nav>"}"#);
        let mut model = RefreshModel::new("<tr>old</tr>".to_string(), None);

        run(&ctrl, &mut model, &FilterState::new(), &FilterState::new());

        assert_eq!(
            model.content,
            ResultsContent::Failed(messages::MALFORMED_RESPONSE)
        );
        assert_eq!(model.footer_html, None);
    }

    #[test]
    fn test_stale_cycle_keeps_loading_for_latest() {
        let (ctrl, _transport) = controller(Endpoint::get("/alunos/"));
        let mut model = RefreshModel::new(String::new(), None);

        let first = ctrl.begin(&mut model, &FilterState::from_pairs([("q", "a")]), &FilterState::new());
        let second = ctrl.begin(&mut model, &FilterState::from_pairs([("q", "ab")]), &FilterState::new());

        let stale = ctrl.complete(
            &mut model,
            first,
            Ok(ListingPayload::from_fragment("<tr>a</tr>")),
        );
        assert_eq!(stale, None);
        assert!(model.loading);

        ctrl.complete(
            &mut model,
            second,
            Ok(ListingPayload::from_fragment("<tr>ab</tr>")),
        );
        assert!(!model.loading);
        assert_eq!(model.content, ResultsContent::Fragment("<tr>ab</tr>".to_string()));
    }

    #[test]
    fn test_finish_is_idempotent() {
        let (ctrl, _transport) = controller(Endpoint::get("/alunos/"));
        let mut model = RefreshModel::new(String::new(), None);

        let pending = ctrl.begin(&mut model, &FilterState::new(), &FilterState::new());
        let ticket = pending.ticket();
        ctrl.complete(&mut model, pending, Err(FetchError::Status(502)));
        model.finish(ticket);

        assert!(!model.loading);
    }
}
