use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::Parser;
use survey_core::{
    endpoint::HttpSurveyEndpoint, load_page, load_settings, ContentSource, FormDefinition,
    MissingEndpoint, NavigationOutcome, NotificationBanner, NotificationSurface, Rejection,
    Settings, SubmissionEndpoint, SubmitOutcome, SurveyController,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod commands;
mod terminal;

use commands::{parse_command, Command, HELP};
use terminal::{render_form, TerminalNotifier, TerminalPage};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./survey.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured endpoint URL.
    #[arg(long)]
    endpoint: Option<String>,
}

fn build_endpoints(settings: &Settings) -> (Arc<dyn ContentSource>, Arc<dyn SubmissionEndpoint>) {
    match HttpSurveyEndpoint::from_settings(settings) {
        Ok(endpoint) => {
            info!("survey: endpoint configured url={}", endpoint.endpoint());
            let endpoint = Arc::new(endpoint);
            let content: Arc<dyn ContentSource> = endpoint.clone();
            let submission: Arc<dyn SubmissionEndpoint> = endpoint;
            (content, submission)
        }
        Err(err) => {
            warn!("survey: endpoint unavailable: {err}");
            let content: Arc<dyn ContentSource> = Arc::new(MissingEndpoint);
            let submission: Arc<dyn SubmissionEndpoint> = Arc::new(MissingEndpoint);
            (content, submission)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint_url = Some(endpoint);
    }

    let (content_source, submission_endpoint) = build_endpoints(&settings);

    let mut page = TerminalPage::default();
    if load_page(content_source.as_ref(), &mut page).await.is_err() {
        let message = page.load_error().unwrap_or("failed to load site content");
        return Err(anyhow!(message.to_string()));
    }

    let notifier: Arc<dyn NotificationSurface> = Arc::new(TerminalNotifier::new(
        NotificationBanner::new(settings.notification_ttl()),
    ));
    let controller = SurveyController::new(
        FormDefinition::default_survey(),
        submission_endpoint,
        Arc::clone(&notifier),
    );

    println!("{HELP}");
    render(&controller, &page).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            Command::Show => {}
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => break,
            Command::Dismiss => notifier.dismiss(),
            Command::Set { field, value } => {
                report_rejection(controller.set_value(&field, value).await.err());
            }
            Command::Toggle { field, option } => {
                report_rejection(controller.toggle_option(&field, &option).await.err());
            }
            Command::Persona(persona) => {
                report_rejection(controller.select_persona(persona).await.err());
            }
            Command::Next => {
                if let NavigationOutcome::Rejected(rejection) = controller.advance().await {
                    report_rejection(Some(rejection));
                }
            }
            Command::Previous => {
                if let NavigationOutcome::Rejected(rejection) = controller.retreat().await {
                    report_rejection(Some(rejection));
                }
            }
            Command::Submit => match controller.submit().await {
                SubmitOutcome::Submitted => {
                    render(&controller, &page).await;
                    break;
                }
                SubmitOutcome::Rejected(rejection) => report_rejection(Some(rejection)),
                SubmitOutcome::Failed(_) | SubmitOutcome::Invalid(_) => {}
            },
        }

        render(&controller, &page).await;
    }

    Ok(())
}

async fn render(controller: &SurveyController, page: &TerminalPage) {
    let view = controller.view().await;
    let values = controller.values().await;
    render_form(&view, controller.definition(), &values, page);
}

fn report_rejection(rejection: Option<Rejection>) {
    let Some(rejection) = rejection else {
        return;
    };
    let message = match rejection {
        Rejection::SubmissionInFlight => "a submission is already in progress".to_string(),
        Rejection::AlreadySubmitted => "the survey has already been submitted".to_string(),
        Rejection::AtFirstStep => "already on the first step".to_string(),
        Rejection::AtLastStep => "this is the last step; use submit".to_string(),
        Rejection::NotFinalStep => "finish the remaining steps before submitting".to_string(),
        Rejection::UnknownField(field) => format!("no field named '{field}'"),
    };
    eprintln!("{message}");
}
