use std::collections::BTreeMap;

use shared::{
    domain::Persona,
    protocol::{AnswerValue, SubmissionPayload},
};

use crate::form::{FormDefinition, FormValues};

/// Fields sent with every submission regardless of persona.
pub const BASE_FIELDS: [&str; 4] = ["name", "email", "environment", "message"];

/// Builds the payload from the current values: the base fields, the persona
/// tag, and only the fields the active persona declares.
pub fn assemble_payload(
    definition: &FormDefinition,
    persona: Persona,
    values: &FormValues,
) -> SubmissionPayload {
    let single = |name: &str| values.get(name).map(str::to_string);

    let mut answers = BTreeMap::new();
    if let Some(fields) = definition.persona_fields(persona) {
        for name in &fields.single {
            answers.insert(name.clone(), AnswerValue::Single(single(name)));
        }
        for name in &fields.multi {
            answers.insert(
                name.clone(),
                AnswerValue::Multi(values.get_all(name).to_vec()),
            );
        }
    }

    SubmissionPayload {
        name: single("name"),
        email: single("email"),
        environment: single("environment"),
        message: single("message"),
        persona,
        answers,
    }
}
