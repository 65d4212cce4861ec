use std::collections::BTreeSet;

use shared::domain::Persona;

use crate::{form::FormValues, validation::ValidationReport};

pub const SUBMITTING_LABEL: &str = "Submitting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Step(usize),
    Submitting(usize),
    Submitted,
}

/// Mutable state of one page view of the survey.
#[derive(Debug, Clone)]
pub struct FormSession {
    current_step: usize,
    total_steps: usize,
    selected_persona: Persona,
    submission_in_flight: bool,
    submitted: bool,
    submit_label: String,
    idle_submit_label: Option<String>,
    flagged: BTreeSet<String>,
    pub values: FormValues,
}

impl FormSession {
    pub fn new(total_steps: usize, submit_label: impl Into<String>) -> Self {
        Self {
            current_step: 1,
            total_steps: total_steps.max(1),
            selected_persona: Persona::default(),
            submission_in_flight: false,
            submitted: false,
            submit_label: submit_label.into(),
            idle_submit_label: None,
            flagged: BTreeSet::new(),
            values: FormValues::new(),
        }
    }

    pub fn state(&self) -> FormState {
        if self.submitted {
            FormState::Submitted
        } else if self.submission_in_flight {
            FormState::Submitting(self.current_step)
        } else {
            FormState::Step(self.current_step)
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn selected_persona(&self) -> Persona {
        self.selected_persona
    }

    pub fn submission_in_flight(&self) -> bool {
        self.submission_in_flight
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    pub fn submit_label(&self) -> &str {
        &self.submit_label
    }

    pub fn flagged(&self) -> &BTreeSet<String> {
        &self.flagged
    }

    /// Moves to `step` if it is one of the declared steps.
    pub(crate) fn go_to_step(&mut self, step: usize) -> bool {
        if step == 0 || step > self.total_steps {
            return false;
        }
        self.current_step = step;
        true
    }

    pub(crate) fn select_persona(&mut self, persona: Persona) {
        self.selected_persona = persona;
    }

    pub(crate) fn apply_validation(&mut self, report: &ValidationReport) {
        for id in &report.passed {
            self.flagged.remove(id);
        }
        self.flagged.extend(report.invalid.iter().cloned());
    }

    pub(crate) fn begin_submission(&mut self) {
        self.submission_in_flight = true;
        let idle = std::mem::replace(&mut self.submit_label, SUBMITTING_LABEL.to_string());
        self.idle_submit_label = Some(idle);
    }

    pub(crate) fn finish_submission(&mut self, succeeded: bool) {
        self.submission_in_flight = false;
        if let Some(idle) = self.idle_submit_label.take() {
            self.submit_label = idle;
        }
        if succeeded {
            self.submitted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_step_one_with_default_persona() {
        let session = FormSession::new(3, "Submit");
        assert_eq!(session.state(), FormState::Step(1));
        assert_eq!(session.selected_persona(), Persona::Creator);
        assert!(!session.submission_in_flight());
    }

    #[test]
    fn step_stays_within_declared_bounds() {
        let mut session = FormSession::new(3, "Submit");
        assert!(!session.go_to_step(0));
        assert!(!session.go_to_step(4));
        assert!(session.go_to_step(3));
        assert!(session.is_last_step());
    }

    #[test]
    fn failed_submission_restores_the_idle_label() {
        let mut session = FormSession::new(1, "Send answers");
        session.begin_submission();
        assert_eq!(session.submit_label(), SUBMITTING_LABEL);
        assert_eq!(session.state(), FormState::Submitting(1));

        session.finish_submission(false);
        assert_eq!(session.submit_label(), "Send answers");
        assert_eq!(session.state(), FormState::Step(1));
    }

    #[test]
    fn validation_flags_and_clears_indicators() {
        let mut session = FormSession::new(1, "Submit");
        session.apply_validation(&ValidationReport {
            step: 1,
            checked: vec!["name".into(), "email".into()],
            invalid: vec!["name".into(), "email".into()],
            passed: Vec::new(),
        });
        session.apply_validation(&ValidationReport {
            step: 1,
            checked: vec!["name".into(), "email".into()],
            invalid: vec!["email".into()],
            passed: vec!["name".into()],
        });
        assert_eq!(
            session.flagged().iter().cloned().collect::<Vec<_>>(),
            vec!["email".to_string()]
        );
    }
}
