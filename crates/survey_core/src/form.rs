//! Declarative survey form: steps, fields, persona blocks and the values a
//! visitor has entered so far.

use std::collections::{BTreeMap, HashSet};

use shared::domain::Persona;
use thiserror::Error;

use crate::payload::BASE_FIELDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Select,
    Checkbox,
    Radio,
}

impl FieldKind {
    pub fn is_choice_group(self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }
}

/// How a field participates in step validation.
///
/// `Required` mirrors a plain `required` attribute; `GroupRequired` mirrors the
/// `data-required="true"` marker that checkbox and radio groups need before
/// they are checked at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requirement {
    #[default]
    Optional,
    Required,
    GroupRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    pub requirement: Requirement,
    pub persona: Option<Persona>,
}

impl FieldDefinition {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            requirement: Requirement::Optional,
            persona: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn select(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Select)
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Checkbox)
    }

    pub fn radio(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Radio)
    }

    pub fn required(mut self) -> Self {
        self.requirement = Requirement::Required;
        self
    }

    pub fn group_required(mut self) -> Self {
        self.requirement = Requirement::GroupRequired;
        self
    }

    pub fn for_persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    pub fn is_marked_required(&self) -> bool {
        self.requirement != Requirement::Optional
    }

    /// Id of the element that carries this field's error indicator.
    pub fn indicator_id(&self) -> String {
        if self.kind.is_choice_group() {
            format!("{}_label", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub number: usize,
    pub fields: Vec<FieldDefinition>,
}

impl StepDefinition {
    pub fn new(number: usize, fields: Vec<FieldDefinition>) -> Self {
        Self { number, fields }
    }

    pub fn hosts_persona_questions(&self) -> bool {
        self.fields.iter().any(|field| field.persona.is_some())
    }
}

/// Fields a persona contributes to the submitted payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaFields {
    pub single: Vec<String>,
    pub multi: Vec<String>,
}

impl PersonaFields {
    pub fn new<S: Into<String>>(
        single: impl IntoIterator<Item = S>,
        multi: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            single: single.into_iter().map(Into::into).collect(),
            multi: multi.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.single.iter().chain(self.multi.iter()).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormDefinitionError {
    #[error("form must declare at least one step")]
    NoSteps,
    #[error("steps must be numbered from 1 without gaps: expected {expected}, found {found}")]
    StepOutOfOrder { expected: usize, found: usize },
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
    #[error("persona {persona} declares field '{field}' owned by another persona block")]
    ForeignPersonaField { persona: Persona, field: String },
    #[error("persona {persona} declares field '{field}' which no step defines")]
    UnknownPersonaField { persona: Persona, field: String },
    #[error("persona {persona} declares field '{field}' which is already sent with every submission")]
    BaseFieldCollision { persona: Persona, field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefinition {
    steps: Vec<StepDefinition>,
    persona_fields: BTreeMap<Persona, PersonaFields>,
}

impl FormDefinition {
    pub fn new(
        steps: Vec<StepDefinition>,
        persona_fields: BTreeMap<Persona, PersonaFields>,
    ) -> Result<Self, FormDefinitionError> {
        if steps.is_empty() {
            return Err(FormDefinitionError::NoSteps);
        }

        let mut seen = HashSet::new();
        for (index, step) in steps.iter().enumerate() {
            if step.number != index + 1 {
                return Err(FormDefinitionError::StepOutOfOrder {
                    expected: index + 1,
                    found: step.number,
                });
            }
            for field in &step.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(FormDefinitionError::DuplicateField(field.name.clone()));
                }
            }
        }

        let definition = Self {
            steps,
            persona_fields,
        };

        for (persona, fields) in &definition.persona_fields {
            for name in fields.names() {
                if name == "persona" || BASE_FIELDS.contains(&name) {
                    return Err(FormDefinitionError::BaseFieldCollision {
                        persona: *persona,
                        field: name.to_string(),
                    });
                }
                let Some(field) = definition.field(name) else {
                    return Err(FormDefinitionError::UnknownPersonaField {
                        persona: *persona,
                        field: name.to_string(),
                    });
                };
                if field.persona.is_some_and(|owner| owner != *persona) {
                    return Err(FormDefinitionError::ForeignPersonaField {
                        persona: *persona,
                        field: name.to_string(),
                    });
                }
            }
        }

        Ok(definition)
    }

    /// The three-step community survey: contact details, persona questions,
    /// free-text message.
    pub fn default_survey() -> Self {
        let steps = vec![
            StepDefinition::new(
                1,
                vec![
                    FieldDefinition::text("name").required(),
                    FieldDefinition::text("email").required(),
                    FieldDefinition::select("environment").required(),
                ],
            ),
            StepDefinition::new(
                2,
                vec![
                    FieldDefinition::select("creator_experience")
                        .required()
                        .for_persona(Persona::Creator),
                    FieldDefinition::select("creator_income").for_persona(Persona::Creator),
                    FieldDefinition::checkbox("creator_challenges")
                        .required()
                        .for_persona(Persona::Creator),
                    FieldDefinition::select("business_type")
                        .required()
                        .for_persona(Persona::Business),
                    FieldDefinition::select("business_reach").for_persona(Persona::Business),
                    FieldDefinition::checkbox("business_goals")
                        .group_required()
                        .for_persona(Persona::Business),
                    FieldDefinition::checkbox("enthusiast_interest")
                        .group_required()
                        .for_persona(Persona::Enthusiast),
                    FieldDefinition::text("enthusiast_motivation")
                        .required()
                        .for_persona(Persona::Enthusiast),
                ],
            ),
            StepDefinition::new(3, vec![FieldDefinition::text("message")]),
        ];

        let persona_fields = BTreeMap::from([
            (
                Persona::Creator,
                PersonaFields::new(
                    ["creator_experience", "creator_income"],
                    ["creator_challenges"],
                ),
            ),
            (
                Persona::Business,
                PersonaFields::new(["business_type", "business_reach"], ["business_goals"]),
            ),
            (
                Persona::Enthusiast,
                PersonaFields::new(["enthusiast_motivation"], ["enthusiast_interest"]),
            ),
        ]);

        Self {
            steps,
            persona_fields,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, number: usize) -> Option<&StepDefinition> {
        number
            .checked_sub(1)
            .and_then(|index| self.steps.get(index))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.steps
            .iter()
            .flat_map(|step| step.fields.iter())
            .find(|field| field.name == name)
    }

    /// Number of the step that hosts persona-specific question blocks.
    pub fn persona_step(&self) -> Option<usize> {
        self.steps
            .iter()
            .find(|step| step.hosts_persona_questions())
            .map(|step| step.number)
    }

    pub fn persona_fields(&self, persona: Persona) -> Option<&PersonaFields> {
        self.persona_fields.get(&persona)
    }
}

/// Values entered into the form, with `FormData` semantics: a name can hold
/// several values (checkbox groups), `get` returns the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), vec![value.into()]);
    }

    pub fn set_all<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) {
        self.values
            .insert(name.into(), values.into_iter().map(Into::into).collect());
    }

    /// Flips one option of a checkbox group; returns whether it is now selected.
    pub fn toggle(&mut self, name: &str, option: &str) -> bool {
        let selected = self.values.entry(name.to_string()).or_default();
        if let Some(position) = selected.iter().position(|value| value == option) {
            selected.remove(position);
            false
        } else {
            selected.push(option.to_string());
            true
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_selection(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }
}
