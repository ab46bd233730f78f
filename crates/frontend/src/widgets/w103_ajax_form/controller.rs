use contracts::academico::submission::{FormErrors, SubmitResponse};
use log::{debug, info, warn};

use crate::shared::http::{FetchAdapter, FetchError, HttpTransport};
use crate::shared::messages;

/// Результат отправки формы, как его видит пользователь
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Redirect(String),
    Saved(String),
    Invalid {
        field_errors: FormErrors,
        form_errors: Vec<String>,
    },
    SessionExpired,
    Failed(&'static str),
}

impl SubmitOutcome {
    /// Form-level text shown in the status region
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::Redirect(_) => None,
            Self::Saved(message) => Some(message.clone()),
            Self::Invalid { form_errors, .. } if !form_errors.is_empty() => {
                Some(form_errors.join(" "))
            }
            Self::Invalid { .. } => Some(messages::SUBMIT_INVALID.to_string()),
            Self::SessionExpired => Some(messages::SESSION_EXPIRED.to_string()),
            Self::Failed(text) => Some(text.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Redirect(_) | Self::Saved(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionModel {
    pub in_flight: bool,
    pub outcome: Option<SubmitOutcome>,
}

/// One POST in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmit {
    pub url: String,
    pub fields: Vec<(String, String)>,
}

/// Adds the submit button's own field ("proximo", "salvar") to the form fields
pub fn with_submitter(
    mut fields: Vec<(String, String)>,
    submitter: Option<(String, String)>,
) -> Vec<(String, String)> {
    if let Some(field) = submitter {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields
}

#[derive(Debug, Clone)]
pub struct SubmissionController<T> {
    adapter: FetchAdapter<T>,
    success_message: String,
}

impl<T: HttpTransport> SubmissionController<T> {
    pub fn new(adapter: FetchAdapter<T>, success_message: Option<String>) -> Self {
        Self {
            adapter,
            success_message: success_message.unwrap_or_else(|| messages::SUBMIT_SUCCESS.to_string()),
        }
    }

    /// Starts a submission; `None` while another one is still in flight
    pub fn begin(
        &self,
        model: &mut SubmissionModel,
        url: &str,
        fields: Vec<(String, String)>,
    ) -> Option<PendingSubmit> {
        if model.in_flight {
            debug!("submit to {} ignored: already in flight", url);
            return None;
        }
        model.in_flight = true;
        model.outcome = None;
        Some(PendingSubmit {
            url: url.to_string(),
            fields,
        })
    }

    pub async fn send(&self, pending: &PendingSubmit) -> Result<SubmitResponse, FetchError> {
        self.adapter.post_form(&pending.url, &pending.fields).await
    }

    /// Always leaves the model ready for the next submission
    pub fn complete(
        &self,
        model: &mut SubmissionModel,
        pending: PendingSubmit,
        result: Result<SubmitResponse, FetchError>,
    ) -> SubmitOutcome {
        model.in_flight = false;

        let outcome = match result {
            Ok(response) if response.success => match response.redirect_url {
                Some(url) if !url.is_empty() => {
                    debug!("submit ok, redirecting to {}", url);
                    SubmitOutcome::Redirect(url)
                }
                _ => SubmitOutcome::Saved(
                    response
                        .message
                        .unwrap_or_else(|| self.success_message.clone()),
                ),
            },
            Ok(response) => {
                info!("{} rejected the form: {} field(s)", pending.url, response.errors.len());
                let field_errors: FormErrors = response
                    .field_errors()
                    .map(|(field, messages)| (field.to_string(), messages.to_vec()))
                    .collect();
                let mut form_errors = response.non_field_errors().to_vec();
                if let Some(message) = response.message {
                    form_errors.insert(0, message);
                }
                SubmitOutcome::Invalid {
                    field_errors,
                    form_errors,
                }
            }
            Err(e) if e.is_session_expired() => {
                warn!("submit to {}: {}", pending.url, e);
                SubmitOutcome::SessionExpired
            }
            Err(e) => {
                warn!("submit to {} failed: {}", pending.url, e);
                SubmitOutcome::Failed(e.user_message())
            }
        };

        model.outcome = Some(outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::http::testing::MockTransport;
    use crate::shared::http::{CsrfToken, HttpResponse};
    use futures::executor::block_on;

    fn controller() -> (SubmissionController<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        let adapter = FetchAdapter::new(transport.clone()).with_csrf(Some(CsrfToken::new("page-tok")));
        (SubmissionController::new(adapter, None), transport)
    }

    fn fields() -> Vec<(String, String)> {
        vec![
            ("csrfmiddlewaretoken".to_string(), "form-tok".to_string()),
            ("aluno".to_string(), "7".to_string()),
            ("presente".to_string(), "on".to_string()),
        ]
    }

    fn fields_only() -> Vec<(String, String)> {
        vec![("aluno".to_string(), "7".to_string())]
    }

    fn submit(
        ctrl: &SubmissionController<MockTransport>,
        model: &mut SubmissionModel,
    ) -> SubmitOutcome {
        let pending = ctrl.begin(model, "/presencas/registrar/", fields()).unwrap();
        assert!(model.in_flight);
        let result = block_on(ctrl.send(&pending));
        ctrl.complete(model, pending, result)
    }

    #[test]
    fn test_posts_form_encoded_with_csrf() {
        let (ctrl, transport) = controller();
        transport.push_ok(r#"{"success":true}"#);
        let mut model = SubmissionModel::default();

        let outcome = submit(&ctrl, &mut model);

        assert_eq!(outcome, SubmitOutcome::Saved(messages::SUBMIT_SUCCESS.to_string()));
        assert!(!model.in_flight);
        let request = &transport.requests()[0];
        assert_eq!(request.url, "/presencas/registrar/");
        assert_eq!(request.header("X-CSRFToken"), Some("form-tok"));
        assert_eq!(request.header("X-Requested-With"), Some("XMLHttpRequest"));
        assert_eq!(
            request.body.as_deref(),
            Some("csrfmiddlewaretoken=form-tok&aluno=7&presente=on")
        );
    }

    #[test]
    fn test_submit_button_value_is_posted() {
        let (ctrl, transport) = controller();
        transport.push_ok(r#"{"success":true}"#);
        let mut model = SubmissionModel::default();
        let fields = with_submitter(fields(), Some(("acao".to_string(), "proximo".to_string())));

        let pending = ctrl
            .begin(&mut model, "/presencas/registrar/", fields)
            .unwrap();
        let result = block_on(ctrl.send(&pending));
        ctrl.complete(&mut model, pending, result);

        assert_eq!(
            transport.requests()[0].body.as_deref(),
            Some("csrfmiddlewaretoken=form-tok&aluno=7&presente=on&acao=proximo")
        );
        assert_eq!(with_submitter(fields_only(), None), fields_only());
    }

    #[test]
    fn test_success_with_redirect() {
        let (ctrl, transport) = controller();
        transport.push_ok(r#"{"success":true,"redirect_url":"/presencas/"}"#);
        let mut model = SubmissionModel::default();

        assert_eq!(
            submit(&ctrl, &mut model),
            SubmitOutcome::Redirect("/presencas/".to_string())
        );
    }

    #[test]
    fn test_server_message_replaces_default_success_text() {
        let (ctrl, transport) = controller();
        transport.push_ok(r#"{"success":true,"message":"Presença registrada."}"#);
        let mut model = SubmissionModel::default();

        let outcome = submit(&ctrl, &mut model);

        assert_eq!(outcome.summary().as_deref(), Some("Presença registrada."));
        assert!(!outcome.is_error());
    }

    #[test]
    fn test_validation_errors_split_by_field() {
        let (ctrl, transport) = controller();
        transport.push_ok(
            r#"{"success":false,"errors":{"aluno":["Obrigatório."],"__all__":"Turma encerrada."}}"#,
        );
        let mut model = SubmissionModel::default();

        let outcome = submit(&ctrl, &mut model);

        let SubmitOutcome::Invalid {
            field_errors,
            form_errors,
        } = &outcome
        else {
            panic!("expected validation errors, got {:?}", outcome);
        };
        assert_eq!(field_errors.get("aluno"), Some(&vec!["Obrigatório.".to_string()]));
        assert!(!field_errors.contains_key("__all__"));
        assert_eq!(form_errors, &vec!["Turma encerrada.".to_string()]);
        assert_eq!(model.outcome, Some(outcome.clone()));
        assert!(outcome.is_error());
    }

    #[test]
    fn test_validation_without_form_errors_uses_generic_text() {
        let (ctrl, transport) = controller();
        transport.push_ok(r#"{"success":false,"errors":{"data":["Data inválida."]}}"#);
        let mut model = SubmissionModel::default();

        let outcome = submit(&ctrl, &mut model);

        assert_eq!(outcome.summary().as_deref(), Some(messages::SUBMIT_INVALID));
    }

    #[test]
    fn test_session_expired_on_redirect() {
        let (ctrl, transport) = controller();
        transport.push(HttpResponse {
            status: 302,
            redirected: true,
            body: String::new(),
        });
        let mut model = SubmissionModel::default();

        assert_eq!(submit(&ctrl, &mut model), SubmitOutcome::SessionExpired);
        assert!(!model.in_flight);
    }

    #[test]
    fn test_server_error_and_malformed_body() {
        let (ctrl, transport) = controller();
        transport.push(HttpResponse {
            status: 500,
            redirected: false,
            body: "Traceback".to_string(),
        });
        transport.push_ok("<html>not json</html>");
        let mut model = SubmissionModel::default();

        assert_eq!(
            submit(&ctrl, &mut model),
            SubmitOutcome::Failed(messages::RETRY_LATER)
        );
        assert_eq!(
            submit(&ctrl, &mut model),
            SubmitOutcome::Failed(messages::MALFORMED_RESPONSE)
        );
    }

    #[test]
    fn test_double_submit_is_ignored() {
        let (ctrl, transport) = controller();
        let mut model = SubmissionModel::default();

        let first = ctrl.begin(&mut model, "/presencas/registrar/", fields());
        let second = ctrl.begin(&mut model, "/presencas/registrar/", fields());

        assert!(first.is_some());
        assert_eq!(second, None);
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_network_error_reenables_submit() {
        let (ctrl, transport) = controller();
        transport.push_network_error("offline");
        let mut model = SubmissionModel::default();

        submit(&ctrl, &mut model);

        assert!(!model.in_flight);
        assert!(ctrl.begin(&mut model, "/presencas/registrar/", fields()).is_some());
    }
}
