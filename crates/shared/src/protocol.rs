use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::Persona, error::SurveyError};

pub const STATUS_SUCCESS: &str = "success";

const INVALID_RESPONSE: &str = "Server returned an invalid response.";
const UNKNOWN_SUBMIT_FAILURE: &str = "An unknown error occurred.";
const UNKNOWN_CONTENT_FAILURE: &str = "Failed to parse content.";

/// A single answer in the submitted survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(Option<String>),
    Multi(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub environment: Option<String>,
    pub message: Option<String>,
    pub persona: Persona,
    #[serde(flatten)]
    pub answers: BTreeMap<String, AnswerValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RemoteStatus {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContentEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    content: Option<SiteContent>,
}

/// Page copy as delivered by the content endpoint.
///
/// Display texts are kept as raw JSON values keyed by their camelCase name;
/// the three structured entries may arrive either as JSON or as a string
/// holding encoded JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    #[serde(default)]
    pub color_theme: Option<Value>,
    #[serde(default)]
    pub social_links: Option<Value>,
    #[serde(default)]
    pub partners_logos: Option<Value>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerLogo {
    pub name: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub primary_blue: Option<String>,
    pub primary_red: Option<String>,
    pub primary_orange: Option<String>,
    pub primary_yellow: Option<String>,
    pub primary_green: Option<String>,
    pub bg_dark: Option<String>,
    pub bg_dark_surface: Option<String>,
    pub text_light: Option<String>,
    pub text_light_secondary: Option<String>,
    pub bg_white: Option<String>,
    pub text_slate: Option<String>,
}

impl SiteContent {
    /// Text for a display key; missing, null, `false` and zero entries
    /// render as empty.
    pub fn text(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
            Some(Value::Number(number)) if number.as_f64() == Some(0.0) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn social_links(&self) -> Result<Vec<SocialLink>, SurveyError> {
        decode_embedded(self.social_links.as_ref())
    }

    pub fn partner_logos(&self) -> Result<Vec<PartnerLogo>, SurveyError> {
        decode_embedded(self.partners_logos.as_ref())
    }

    /// Decodes the palette key by key so one malformed entry does not
    /// discard the others.
    pub fn theme_colors(&self) -> Result<ThemeColors, SurveyError> {
        let entries: BTreeMap<String, Value> = decode_embedded(self.color_theme.as_ref())?;
        Ok(ThemeColors::from_entries(&entries))
    }
}

impl ThemeColors {
    /// Keeps every string-valued color; entries of any other type are skipped.
    pub fn from_entries(entries: &BTreeMap<String, Value>) -> Self {
        let color = |key: &str| entries.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            primary_blue: color("primaryBlue"),
            primary_red: color("primaryRed"),
            primary_orange: color("primaryOrange"),
            primary_yellow: color("primaryYellow"),
            primary_green: color("primaryGreen"),
            bg_dark: color("bgDark"),
            bg_dark_surface: color("bgDarkSurface"),
            text_light: color("textLight"),
            text_light_secondary: color("textLightSecondary"),
            bg_white: color("bgWhite"),
            text_slate: color("textSlate"),
        }
    }
}

fn decode_embedded<T>(value: Option<&Value>) -> Result<T, SurveyError>
where
    T: DeserializeOwned + Default,
{
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(T::default()),
        Some(Value::String(raw)) => Ok(serde_json::from_str(raw)?),
        Some(other) => Ok(serde_json::from_value(other.clone())?),
    }
}

fn ensure_json_body(body: &str) -> Result<&str, SurveyError> {
    let trimmed = body.trim();
    match trimmed.chars().next() {
        Some('{') | Some('[') => Ok(trimmed),
        _ => Err(SurveyError::Format(INVALID_RESPONSE.to_string())),
    }
}

/// Normalizes a write response body into a success status or a failure.
///
/// Accepts both a JSON response and a JSON document served as plain text.
pub fn decode_status_body(body: &str) -> Result<RemoteStatus, SurveyError> {
    let status: RemoteStatus = serde_json::from_str(ensure_json_body(body)?)?;
    if status.is_success() {
        Ok(status)
    } else {
        Err(SurveyError::Application(
            status
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SUBMIT_FAILURE.to_string()),
        ))
    }
}

pub fn decode_content_body(body: &str) -> Result<SiteContent, SurveyError> {
    let envelope: ContentEnvelope = serde_json::from_str(ensure_json_body(body)?)?;
    if envelope.status != STATUS_SUCCESS {
        return Err(SurveyError::Application(
            envelope
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_CONTENT_FAILURE.to_string()),
        ));
    }
    envelope
        .content
        .ok_or_else(|| SurveyError::Format("content response is missing content".to_string()))
}
