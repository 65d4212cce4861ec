use async_trait::async_trait;
use shared::{
    error::SurveyError,
    protocol::{RemoteStatus, SiteContent, SubmissionPayload},
};

pub mod controller;
pub mod endpoint;
pub mod form;
pub mod notification;
pub mod page;
pub mod payload;
pub mod progress;
pub mod session;
pub mod settings;
pub mod validation;

pub use controller::{
    FormEvent, FormView, Heading, NavigationOutcome, PersonaToggle, Rejection, SubmitOutcome,
    SurveyController,
};
pub use endpoint::HttpSurveyEndpoint;
pub use form::{FieldDefinition, FormDefinition, FormValues, PersonaFields, StepDefinition};
pub use notification::{NotificationBanner, NotificationSurface};
pub use page::{load_page, PageSurface};
pub use settings::{load_settings, Settings};

/// Read side of the remote endpoint.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_content(&self) -> Result<SiteContent, SurveyError>;
}

/// Write side of the remote endpoint. Anything other than a well-formed
/// `success` status comes back as an error.
#[async_trait]
pub trait SubmissionEndpoint: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<RemoteStatus, SurveyError>;
}

/// Stands in for the remote endpoint when no URL is configured.
pub struct MissingEndpoint;

#[async_trait]
impl ContentSource for MissingEndpoint {
    async fn fetch_content(&self) -> Result<SiteContent, SurveyError> {
        Err(SurveyError::Configuration("App URL is missing.".to_string()))
    }
}

#[async_trait]
impl SubmissionEndpoint for MissingEndpoint {
    async fn submit(&self, _payload: &SubmissionPayload) -> Result<RemoteStatus, SurveyError> {
        Err(SurveyError::Configuration("App URL is missing.".to_string()))
    }
}
