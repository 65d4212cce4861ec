//! Survey form controller: step navigation, validation gating, persona
//! blocks and the single in-flight submission.

use std::sync::Arc;

use shared::{
    domain::{Persona, Severity},
    error::SurveyError,
    protocol::SubmissionPayload,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    form::{FormDefinition, FormValues},
    notification::NotificationSurface,
    payload::assemble_payload,
    progress::{Progress, StepMarker},
    session::{FormSession, FormState},
    validation::{validate_step, ValidationReport, REQUIRED_FIELDS_MESSAGE},
    SubmissionEndpoint,
};

pub const DEFAULT_SUBMIT_LABEL: &str = "Submit";
pub const SUBMITTED_NOTICE: &str = "Thank you! Your survey has been submitted.";
pub const SUBMITTED_TITLE: &str = "Thank You!";
pub const SUBMITTED_SUBTITLE: &str =
    "Your voice has been heard. Follow us on social media to stay connected!";

const EVENT_BUFFER: usize = 64;

/// Why an action was refused without changing any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    SubmissionInFlight,
    AlreadySubmitted,
    AtFirstStep,
    AtLastStep,
    NotFinalStep,
    UnknownField(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Moved { from: usize, to: usize },
    Invalid(ValidationReport),
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    Failed(SurveyError),
    Invalid(ValidationReport),
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    StepChanged { from: usize, to: usize },
    PersonaSelected(Persona),
    ValidationFailed { step: usize, invalid: Vec<String> },
    SubmissionStarted,
    SubmissionFailed(SurveyError),
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaToggle {
    pub persona: Persona,
    pub active: bool,
}

/// Snapshot of everything a front end needs to draw the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub state: FormState,
    pub current_step: usize,
    pub total_steps: usize,
    pub selected_persona: Persona,
    pub visible_persona_block: Option<Persona>,
    pub persona_toggles: Vec<PersonaToggle>,
    pub show_previous: bool,
    pub show_next: bool,
    pub show_submit: bool,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub progress: f64,
    pub step_markers: Vec<StepMarker>,
    pub flagged: Vec<String>,
    pub form_visible: bool,
    pub progress_visible: bool,
    /// Replaces the form title and subtitle once the survey is submitted.
    pub heading: Option<Heading>,
}

pub struct SurveyController {
    definition: FormDefinition,
    endpoint: Arc<dyn SubmissionEndpoint>,
    notifier: Arc<dyn NotificationSurface>,
    session: Arc<Mutex<FormSession>>,
    events: broadcast::Sender<FormEvent>,
}

impl SurveyController {
    pub fn new(
        definition: FormDefinition,
        endpoint: Arc<dyn SubmissionEndpoint>,
        notifier: Arc<dyn NotificationSurface>,
    ) -> Self {
        Self::with_submit_label(definition, endpoint, notifier, DEFAULT_SUBMIT_LABEL)
    }

    pub fn with_submit_label(
        definition: FormDefinition,
        endpoint: Arc<dyn SubmissionEndpoint>,
        notifier: Arc<dyn NotificationSurface>,
        submit_label: impl Into<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let session = FormSession::new(definition.total_steps(), submit_label);
        Self {
            definition,
            endpoint,
            notifier,
            session: Arc::new(Mutex::new(session)),
            events,
        }
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    pub async fn values(&self) -> FormValues {
        self.session.lock().await.values.clone()
    }

    pub async fn set_value(&self, field: &str, value: impl Into<String>) -> Result<(), Rejection> {
        let mut session = self.session.lock().await;
        self.ensure_editable(&session, field)?;
        session.values.set(field, value);
        Ok(())
    }

    pub async fn set_options(&self, field: &str, options: Vec<String>) -> Result<(), Rejection> {
        let mut session = self.session.lock().await;
        self.ensure_editable(&session, field)?;
        session.values.set_all(field, options);
        Ok(())
    }

    /// Flips one option of a checkbox group; returns whether it is now selected.
    pub async fn toggle_option(&self, field: &str, option: &str) -> Result<bool, Rejection> {
        let mut session = self.session.lock().await;
        self.ensure_editable(&session, field)?;
        Ok(session.values.toggle(field, option))
    }

    pub async fn select_persona(&self, persona: Persona) -> Result<(), Rejection> {
        let mut session = self.session.lock().await;
        ensure_open(&session)?;
        session.select_persona(persona);
        let on_persona_step = self.definition.persona_step() == Some(session.current_step());
        drop(session);

        debug!("survey: persona selected persona={persona} refiltered={on_persona_step}");
        let _ = self.events.send(FormEvent::PersonaSelected(persona));
        Ok(())
    }

    /// "Next": validates the visible step and moves forward when it passes.
    pub async fn advance(&self) -> NavigationOutcome {
        let mut session = self.session.lock().await;
        if let Err(rejection) = ensure_open(&session) {
            return NavigationOutcome::Rejected(rejection);
        }
        if session.is_last_step() {
            return NavigationOutcome::Rejected(Rejection::AtLastStep);
        }

        let report = self.check_current_step(&mut session);
        if !report.is_valid() {
            return NavigationOutcome::Invalid(report);
        }

        let from = session.current_step();
        let to = from + 1;
        session.go_to_step(to);
        drop(session);

        info!("survey: step advanced from={from} to={to}");
        let _ = self.events.send(FormEvent::StepChanged { from, to });
        NavigationOutcome::Moved { from, to }
    }

    /// "Previous": moves back one step without validating.
    pub async fn retreat(&self) -> NavigationOutcome {
        let mut session = self.session.lock().await;
        if let Err(rejection) = ensure_open(&session) {
            return NavigationOutcome::Rejected(rejection);
        }
        let from = session.current_step();
        if from == 1 {
            return NavigationOutcome::Rejected(Rejection::AtFirstStep);
        }

        let to = from - 1;
        session.go_to_step(to);
        drop(session);

        info!("survey: step retreated from={from} to={to}");
        let _ = self.events.send(FormEvent::StepChanged { from, to });
        NavigationOutcome::Moved { from, to }
    }

    /// Validates the final step and issues the remote write.
    ///
    /// The session lock is released while the request is in flight; other
    /// actions observe the submitting state and are refused until the write
    /// resolves. The write and its settlement run on their own task, so
    /// dropping this future does not leave the form stuck in the submitting
    /// state.
    pub async fn submit(&self) -> SubmitOutcome {
        let payload = {
            let mut session = self.session.lock().await;
            if let Err(rejection) = ensure_open(&session) {
                return SubmitOutcome::Rejected(rejection);
            }
            if !session.is_last_step() {
                return SubmitOutcome::Rejected(Rejection::NotFinalStep);
            }

            let report = self.check_current_step(&mut session);
            if !report.is_valid() {
                return SubmitOutcome::Invalid(report);
            }

            session.begin_submission();
            assemble_payload(&self.definition, session.selected_persona(), &session.values)
        };

        info!("survey: submission started persona={}", payload.persona);
        let _ = self.events.send(FormEvent::SubmissionStarted);

        let write = tokio::spawn(settle_submission(
            Arc::clone(&self.endpoint),
            Arc::clone(&self.session),
            Arc::clone(&self.notifier),
            self.events.clone(),
            payload,
        ));
        match write.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let err = SurveyError::Transport(format!("submission task ended: {join_err}"));
                error!("survey: submission task aborted: {join_err}");
                self.session.lock().await.finish_submission(false);
                self.notifier
                    .show(&format!("Submission failed: {err}"), Severity::Error);
                let _ = self.events.send(FormEvent::SubmissionFailed(err.clone()));
                SubmitOutcome::Failed(err)
            }
        }
    }

    pub async fn view(&self) -> FormView {
        let session = self.session.lock().await;
        let submitted = session.is_submitted();
        let step = session.current_step();
        let total = session.total_steps();
        let selected = session.selected_persona();
        let on_persona_step = self.definition.persona_step() == Some(step);
        let progress = Progress::new(step, total);

        FormView {
            state: session.state(),
            current_step: step,
            total_steps: total,
            selected_persona: selected,
            visible_persona_block: (on_persona_step && !submitted).then_some(selected),
            persona_toggles: Persona::ALL
                .into_iter()
                .map(|persona| PersonaToggle {
                    persona,
                    active: persona == selected,
                })
                .collect(),
            show_previous: !submitted && step > 1,
            show_next: !submitted && step < total,
            show_submit: !submitted && step == total,
            submit_label: session.submit_label().to_string(),
            submit_enabled: !submitted && !session.submission_in_flight(),
            progress: progress.fraction(),
            step_markers: progress.markers(),
            flagged: session.flagged().iter().cloned().collect(),
            form_visible: !submitted,
            progress_visible: !submitted,
            heading: submitted.then(|| Heading {
                title: SUBMITTED_TITLE.to_string(),
                subtitle: SUBMITTED_SUBTITLE.to_string(),
            }),
        }
    }

    fn ensure_editable(&self, session: &FormSession, field: &str) -> Result<(), Rejection> {
        ensure_open(session)?;
        if self.definition.field(field).is_none() {
            warn!("survey: edit of undeclared field name={field}");
            return Err(Rejection::UnknownField(field.to_string()));
        }
        Ok(())
    }

    /// Runs validation for the visible step, updates the error indicators and
    /// notifies once on failure.
    fn check_current_step(&self, session: &mut FormSession) -> ValidationReport {
        let step = session.current_step();
        let active_block = Some(session.selected_persona());
        let report = match validate_step(&self.definition, step, active_block, &session.values) {
            Some(report) => report,
            None => {
                warn!("survey: validation requested for undeclared step={step}");
                ValidationReport {
                    step,
                    invalid: vec![format!("form-step-{step}")],
                    ..ValidationReport::default()
                }
            }
        };

        session.apply_validation(&report);
        if !report.is_valid() {
            debug!(
                "survey: validation failed step={step} invalid={}",
                report.invalid.len()
            );
            self.notifier.show(REQUIRED_FIELDS_MESSAGE, Severity::Error);
            let _ = self.events.send(FormEvent::ValidationFailed {
                step,
                invalid: report.invalid.clone(),
            });
        }
        report
    }
}

/// Issues the remote write and settles the session with its result.
async fn settle_submission(
    endpoint: Arc<dyn SubmissionEndpoint>,
    session: Arc<Mutex<FormSession>>,
    notifier: Arc<dyn NotificationSurface>,
    events: broadcast::Sender<FormEvent>,
    payload: SubmissionPayload,
) -> SubmitOutcome {
    let result = endpoint.submit(&payload).await;

    let mut session = session.lock().await;
    match result {
        Ok(_) => {
            session.finish_submission(true);
            drop(session);

            info!("survey: submission accepted persona={}", payload.persona);
            notifier.show(SUBMITTED_NOTICE, Severity::Success);
            let _ = events.send(FormEvent::Submitted);
            SubmitOutcome::Submitted
        }
        Err(err) => {
            session.finish_submission(false);
            drop(session);

            error!("survey: submission failed kind={:?}: {err}", err.kind());
            notifier.show(&format!("Submission failed: {err}"), Severity::Error);
            let _ = events.send(FormEvent::SubmissionFailed(err.clone()));
            SubmitOutcome::Failed(err)
        }
    }
}

fn ensure_open(session: &FormSession) -> Result<(), Rejection> {
    if session.is_submitted() {
        return Err(Rejection::AlreadySubmitted);
    }
    if session.submission_in_flight() {
        return Err(Rejection::SubmissionInFlight);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
