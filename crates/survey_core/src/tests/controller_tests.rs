use super::*;
use std::{collections::VecDeque, sync::Mutex as StdMutex};

use async_trait::async_trait;
use shared::protocol::{RemoteStatus, SubmissionPayload};
use tokio::sync::Notify;

use crate::session::SUBMITTING_LABEL;

#[derive(Default)]
struct RecordingNotifier {
    shown: StdMutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    fn shown(&self) -> Vec<(String, Severity)> {
        self.shown.lock().unwrap().clone()
    }
}

impl NotificationSurface for RecordingNotifier {
    fn show(&self, message: &str, severity: Severity) {
        self.shown.lock().unwrap().push((message.to_string(), severity));
    }

    fn dismiss(&self) {}
}

fn success() -> RemoteStatus {
    RemoteStatus {
        status: "success".into(),
        message: None,
    }
}

#[derive(Default)]
struct ScriptedEndpoint {
    responses: Mutex<VecDeque<Result<RemoteStatus, SurveyError>>>,
    payloads: Mutex<Vec<SubmissionPayload>>,
}

impl ScriptedEndpoint {
    fn with_responses(responses: Vec<Result<RemoteStatus, SurveyError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            payloads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SubmissionEndpoint for ScriptedEndpoint {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<RemoteStatus, SurveyError> {
        self.payloads.lock().await.push(payload.clone());
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(success()))
    }
}

#[derive(Default)]
struct GatedEndpoint {
    entered: Notify,
    release: Notify,
    calls: Mutex<u32>,
    failure: Option<SurveyError>,
}

#[async_trait]
impl SubmissionEndpoint for GatedEndpoint {
    async fn submit(&self, _payload: &SubmissionPayload) -> Result<RemoteStatus, SurveyError> {
        *self.calls.lock().await += 1;
        self.entered.notify_one();
        self.release.notified().await;
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(success()),
        }
    }
}

fn controller_with(
    endpoint: Arc<dyn SubmissionEndpoint>,
) -> (SurveyController, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = SurveyController::with_submit_label(
        FormDefinition::default_survey(),
        endpoint,
        notifier.clone(),
        "Send my answers",
    );
    (controller, notifier)
}

async fn fill_step_one(controller: &SurveyController) {
    controller.set_value("name", "Ada").await.unwrap();
    controller
        .set_value("email", "ada@example.com")
        .await
        .unwrap();
    controller.set_value("environment", "studio").await.unwrap();
}

async fn reach_final_step_as_business(controller: &SurveyController) {
    fill_step_one(controller).await;
    assert!(matches!(
        controller.advance().await,
        NavigationOutcome::Moved { from: 1, to: 2 }
    ));
    controller.select_persona(Persona::Business).await.unwrap();
    controller
        .set_value("business_type", "agency")
        .await
        .unwrap();
    controller
        .toggle_option("business_goals", "reach")
        .await
        .unwrap();
    assert!(matches!(
        controller.advance().await,
        NavigationOutcome::Moved { from: 2, to: 3 }
    ));
}

#[tokio::test]
async fn starts_on_first_step_with_empty_progress() {
    let (controller, notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    let view = controller.view().await;

    assert_eq!(view.state, FormState::Step(1));
    assert_eq!(view.progress, 0.0);
    assert!(!view.show_previous);
    assert!(view.show_next);
    assert!(!view.show_submit);
    assert_eq!(view.visible_persona_block, None);
    assert_eq!(view.selected_persona, Persona::Creator);
    assert!(notifier.shown().is_empty());
}

#[tokio::test]
async fn next_is_blocked_until_required_fields_are_filled() {
    let (controller, notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    controller.set_value("name", "Ada").await.unwrap();

    let NavigationOutcome::Invalid(report) = controller.advance().await else {
        panic!("expected validation failure");
    };
    assert_eq!(
        report.invalid,
        vec!["email".to_string(), "environment".to_string()]
    );

    let view = controller.view().await;
    assert_eq!(view.current_step, 1);
    assert_eq!(view.flagged, vec!["email".to_string(), "environment".to_string()]);
    assert_eq!(
        notifier.shown(),
        vec![(REQUIRED_FIELDS_MESSAGE.to_string(), Severity::Error)]
    );

    controller
        .set_value("email", "ada@example.com")
        .await
        .unwrap();
    controller.set_value("environment", "studio").await.unwrap();
    assert_eq!(
        controller.advance().await,
        NavigationOutcome::Moved { from: 1, to: 2 }
    );
    assert!(controller.view().await.flagged.is_empty());
}

#[tokio::test]
async fn enthusiast_walkthrough_ends_submitted() {
    let endpoint = Arc::new(ScriptedEndpoint::default());
    let (controller, notifier) = controller_with(endpoint.clone());

    fill_step_one(&controller).await;
    assert_eq!(
        controller.advance().await,
        NavigationOutcome::Moved { from: 1, to: 2 }
    );

    controller.select_persona(Persona::Enthusiast).await.unwrap();
    let view = controller.view().await;
    assert_eq!(view.visible_persona_block, Some(Persona::Enthusiast));
    assert_eq!(
        view.persona_toggles
            .iter()
            .filter(|toggle| toggle.active)
            .map(|toggle| toggle.persona)
            .collect::<Vec<_>>(),
        vec![Persona::Enthusiast]
    );

    controller
        .toggle_option("enthusiast_interest", "festivals")
        .await
        .unwrap();
    let NavigationOutcome::Invalid(report) = controller.advance().await else {
        panic!("motivation is still empty");
    };
    assert_eq!(report.invalid, vec!["enthusiast_motivation".to_string()]);
    assert_eq!(controller.view().await.current_step, 2);
    assert!(controller
        .view()
        .await
        .flagged
        .contains(&"enthusiast_motivation".to_string()));
    assert_eq!(notifier.shown().len(), 1);

    controller
        .set_value("enthusiast_motivation", "meet other fans")
        .await
        .unwrap();
    assert_eq!(
        controller.advance().await,
        NavigationOutcome::Moved { from: 2, to: 3 }
    );
    assert_eq!(controller.view().await.progress, 1.0);

    assert_eq!(controller.submit().await, SubmitOutcome::Submitted);

    let view = controller.view().await;
    assert_eq!(view.state, FormState::Submitted);
    assert!(!view.form_visible);
    assert!(!view.progress_visible);
    assert_eq!(
        view.heading,
        Some(Heading {
            title: SUBMITTED_TITLE.to_string(),
            subtitle: SUBMITTED_SUBTITLE.to_string(),
        })
    );
    assert_eq!(
        notifier.shown().last(),
        Some(&(SUBMITTED_NOTICE.to_string(), Severity::Success))
    );

    let payloads = endpoint.payloads.lock().await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].persona, Persona::Enthusiast);
    assert!(payloads[0].answers.contains_key("enthusiast_interest"));
    assert!(!payloads[0].answers.contains_key("creator_experience"));
}

#[tokio::test]
async fn switching_persona_excludes_previous_block_from_validation() {
    let (controller, _notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    fill_step_one(&controller).await;
    controller.advance().await;

    assert_eq!(
        controller.view().await.visible_persona_block,
        Some(Persona::Creator)
    );
    let NavigationOutcome::Invalid(report) = controller.advance().await else {
        panic!("creator block is empty");
    };
    assert_eq!(report.invalid, vec!["creator_experience".to_string()]);

    controller.select_persona(Persona::Business).await.unwrap();
    assert_eq!(
        controller.view().await.visible_persona_block,
        Some(Persona::Business)
    );
    controller
        .set_value("business_type", "agency")
        .await
        .unwrap();
    controller
        .toggle_option("business_goals", "reach")
        .await
        .unwrap();

    assert_eq!(
        controller.advance().await,
        NavigationOutcome::Moved { from: 2, to: 3 }
    );
}

#[tokio::test]
async fn persona_selected_before_question_step_is_shown_on_arrival() {
    let (controller, _notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    controller.select_persona(Persona::Business).await.unwrap();
    assert_eq!(controller.view().await.visible_persona_block, None);

    fill_step_one(&controller).await;
    controller.advance().await;
    assert_eq!(
        controller.view().await.visible_persona_block,
        Some(Persona::Business)
    );
}

#[tokio::test]
async fn previous_skips_validation_and_stops_at_first_step() {
    let (controller, _notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    assert_eq!(
        controller.retreat().await,
        NavigationOutcome::Rejected(Rejection::AtFirstStep)
    );

    fill_step_one(&controller).await;
    controller.advance().await;
    controller.set_value("name", "").await.unwrap();

    assert_eq!(
        controller.retreat().await,
        NavigationOutcome::Moved { from: 2, to: 1 }
    );
    let view = controller.view().await;
    assert_eq!(view.current_step, 1);
    assert_eq!(view.progress, 0.0);
}

#[tokio::test]
async fn next_is_unavailable_on_last_step_and_submit_before_it() {
    let (controller, _notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Rejected(Rejection::NotFinalStep)
    );

    reach_final_step_as_business(&controller).await;
    let view = controller.view().await;
    assert!(!view.show_next);
    assert!(view.show_submit);
    assert_eq!(
        controller.advance().await,
        NavigationOutcome::Rejected(Rejection::AtLastStep)
    );
}

#[tokio::test]
async fn failed_submission_restores_control_and_allows_retry() {
    let endpoint = Arc::new(ScriptedEndpoint::with_responses(vec![
        Err(SurveyError::http_status(500)),
        Err(SurveyError::Application("Sheet is locked".into())),
        Ok(success()),
    ]));
    let (controller, notifier) = controller_with(endpoint.clone());
    reach_final_step_as_business(&controller).await;

    for expected in ["HTTP error! status: 500", "Sheet is locked"] {
        let before = notifier.shown().len();
        let SubmitOutcome::Failed(err) = controller.submit().await else {
            panic!("expected failure");
        };
        assert_eq!(err.message(), expected);

        let shown = notifier.shown();
        assert_eq!(shown.len(), before + 1);
        assert_eq!(
            shown.last(),
            Some(&(format!("Submission failed: {expected}"), Severity::Error))
        );

        let view = controller.view().await;
        assert_eq!(view.state, FormState::Step(3));
        assert_eq!(view.submit_label, "Send my answers");
        assert!(view.submit_enabled);
        assert!(view.form_visible);
    }

    assert_eq!(controller.submit().await, SubmitOutcome::Submitted);
    let payloads = endpoint.payloads.lock().await;
    assert_eq!(payloads.len(), 3);
    assert!(payloads.iter().all(|payload| payload == &payloads[0]));
}

#[tokio::test]
async fn only_one_submission_can_be_in_flight() {
    let endpoint = Arc::new(GatedEndpoint::default());
    let (controller, _notifier) = controller_with(endpoint.clone());
    let controller = Arc::new(controller);
    reach_final_step_as_business(&controller).await;

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.submit().await }
    });
    endpoint.entered.notified().await;

    let view = controller.view().await;
    assert_eq!(view.state, FormState::Submitting(3));
    assert_eq!(view.submit_label, SUBMITTING_LABEL);
    assert!(!view.submit_enabled);

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Rejected(Rejection::SubmissionInFlight)
    );
    assert_eq!(
        controller.retreat().await,
        NavigationOutcome::Rejected(Rejection::SubmissionInFlight)
    );
    assert_eq!(
        controller.set_value("message", "late edit").await,
        Err(Rejection::SubmissionInFlight)
    );

    endpoint.release.notify_one();
    assert_eq!(first.await.expect("join"), SubmitOutcome::Submitted);
    assert_eq!(*endpoint.calls.lock().await, 1);
}

#[tokio::test]
async fn submitted_form_refuses_every_action() {
    let (controller, _notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    reach_final_step_as_business(&controller).await;
    assert_eq!(controller.submit().await, SubmitOutcome::Submitted);

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Rejected(Rejection::AlreadySubmitted)
    );
    assert_eq!(
        controller.retreat().await,
        NavigationOutcome::Rejected(Rejection::AlreadySubmitted)
    );
    assert_eq!(
        controller.select_persona(Persona::Creator).await,
        Err(Rejection::AlreadySubmitted)
    );

    let view = controller.view().await;
    assert!(!view.show_previous && !view.show_next && !view.show_submit);
    assert_eq!(view.visible_persona_block, None);
}

#[tokio::test]
async fn undeclared_fields_cannot_be_edited() {
    let (controller, _notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    assert_eq!(
        controller.set_value("favourite_colour", "teal").await,
        Err(Rejection::UnknownField("favourite_colour".into()))
    );
    assert!(controller.values().await.get("favourite_colour").is_none());
}

#[tokio::test]
async fn transitions_are_published_as_events() {
    let (controller, _notifier) = controller_with(Arc::new(ScriptedEndpoint::default()));
    let mut events = controller.subscribe_events();

    controller.advance().await;
    reach_final_step_as_business(&controller).await;
    controller.submit().await;

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(matches!(
        received.first(),
        Some(FormEvent::ValidationFailed { step: 1, .. })
    ));
    assert!(received.contains(&FormEvent::StepChanged { from: 1, to: 2 }));
    assert!(received.contains(&FormEvent::PersonaSelected(Persona::Business)));
    assert_eq!(
        &received[received.len() - 2..],
        &[FormEvent::SubmissionStarted, FormEvent::Submitted]
    );
}

#[tokio::test]
async fn concurrent_submits_reach_the_endpoint_once() {
    let endpoint = Arc::new(GatedEndpoint::default());
    let (controller, _notifier) = controller_with(endpoint.clone());
    reach_final_step_as_business(&controller).await;

    let (outcomes, ()) = tokio::join!(
        futures::future::join_all((0..4).map(|_| controller.submit())),
        async {
            endpoint.entered.notified().await;
            endpoint.release.notify_one();
        }
    );

    assert_eq!(outcomes[0], SubmitOutcome::Submitted);
    assert!(outcomes[1..]
        .iter()
        .all(|outcome| *outcome == SubmitOutcome::Rejected(Rejection::SubmissionInFlight)));
    assert_eq!(*endpoint.calls.lock().await, 1);
}

#[tokio::test]
async fn abandoned_submit_still_settles_the_form() {
    let endpoint = Arc::new(GatedEndpoint {
        failure: Some(SurveyError::http_status(503)),
        ..GatedEndpoint::default()
    });
    let (controller, notifier) = controller_with(endpoint.clone());
    reach_final_step_as_business(&controller).await;
    let mut events = controller.subscribe_events();

    let abandoned =
        tokio::time::timeout(std::time::Duration::from_millis(50), controller.submit()).await;
    assert!(abandoned.is_err());
    assert_eq!(controller.view().await.state, FormState::Submitting(3));

    endpoint.release.notify_one();
    loop {
        if let FormEvent::SubmissionFailed(err) = events.recv().await.expect("event") {
            assert_eq!(err.message(), "HTTP error! status: 503");
            break;
        }
    }

    let view = controller.view().await;
    assert_eq!(view.state, FormState::Step(3));
    assert_eq!(view.submit_label, "Send my answers");
    assert!(view.submit_enabled);
    assert_eq!(
        notifier.shown().last(),
        Some(&(
            "Submission failed: HTTP error! status: 503".to_string(),
            Severity::Error
        ))
    );

    endpoint.release.notify_one();
    assert!(matches!(controller.submit().await, SubmitOutcome::Failed(_)));
    assert_eq!(*endpoint.calls.lock().await, 2);
}
