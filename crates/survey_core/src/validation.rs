use shared::domain::Persona;

use crate::form::{FieldDefinition, FormDefinition, FormValues, Requirement};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill out all required fields (*).";

/// Result of checking one step's required fields.
///
/// `invalid` and `passed` hold indicator ids: the field name for text and
/// select fields, `<group>_label` for checkbox and radio groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub step: usize,
    pub checked: Vec<String>,
    pub invalid: Vec<String>,
    pub passed: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Checks the required fields of `step`, skipping fields that live in a
/// persona block other than `active_block`.
///
/// Returns `None` when the step does not exist.
pub fn validate_step(
    definition: &FormDefinition,
    step: usize,
    active_block: Option<Persona>,
    values: &FormValues,
) -> Option<ValidationReport> {
    let step_definition = definition.step(step)?;
    let mut report = ValidationReport {
        step,
        ..ValidationReport::default()
    };

    for field in step_definition
        .fields
        .iter()
        .filter(|field| field.is_marked_required())
    {
        if field.persona.is_some() && field.persona != active_block {
            continue;
        }

        let Some(valid) = check_field(field, values) else {
            continue;
        };

        report.checked.push(field.name.clone());
        if valid {
            report.passed.push(field.indicator_id());
        } else {
            report.invalid.push(field.indicator_id());
        }
    }

    Some(report)
}

/// `None` means the field is marked but not subject to validation.
fn check_field(field: &FieldDefinition, values: &FormValues) -> Option<bool> {
    if field.kind.is_choice_group() {
        // Ungrouped choice inputs are only validated with the group marker.
        if field.requirement != Requirement::GroupRequired {
            return None;
        }
        return Some(values.has_selection(&field.name));
    }

    Some(
        values
            .get(&field.name)
            .is_some_and(|value| !value.trim().is_empty()),
    )
}
