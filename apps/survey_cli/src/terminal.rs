//! Terminal renderings of the page, the banner and the form.

use std::collections::BTreeMap;

use shared::{
    domain::Severity,
    protocol::{PartnerLogo, SocialLink},
};
use survey_core::{
    form::FieldKind, progress::StepMarker, FormDefinition, FormValues, FormView,
    NotificationBanner, NotificationSurface, PageSurface,
};
use tracing::debug;

#[derive(Default)]
pub struct TerminalPage {
    texts: BTreeMap<String, String>,
    social: Vec<SocialLink>,
    load_error: Option<String>,
}

impl TerminalPage {
    pub fn text(&self, element_id: &str) -> &str {
        self.texts.get(element_id).map(String::as_str).unwrap_or_default()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }
}

impl PageSurface for TerminalPage {
    fn set_text(&mut self, element_id: &str, text: &str) {
        self.texts.insert(element_id.to_string(), text.to_string());
    }

    fn set_link(&mut self, element_id: &str, href: &str) {
        debug!("page: link element={element_id} href={href}");
    }

    fn set_social_links(&mut self, links: &[SocialLink]) {
        self.social = links.to_vec();
    }

    fn set_partner_logos(&mut self, logos: &[PartnerLogo]) {
        debug!("page: partner logos count={}", logos.len());
    }

    fn apply_theme(&mut self, variables: &BTreeMap<String, String>) {
        debug!("page: theme variables count={}", variables.len());
    }

    fn reveal(&mut self) {
        println!();
        println!("== {} ==", self.text("hero-title"));
        println!("{}", self.text("hero-subtitle"));
        for link in &self.social {
            println!("  {}: {}", link.name, link.url);
        }
        println!();
    }

    fn start_animation(&mut self) {}

    fn show_load_error(&mut self, message: &str) {
        eprintln!("{message}");
        self.load_error = Some(message.to_string());
    }
}

/// Prints each notice as it is shown and keeps the banner's expiry rules.
pub struct TerminalNotifier {
    banner: NotificationBanner,
}

impl TerminalNotifier {
    pub fn new(banner: NotificationBanner) -> Self {
        Self { banner }
    }
}

impl NotificationSurface for TerminalNotifier {
    fn show(&self, message: &str, severity: Severity) {
        eprintln!("[{}] {message}", severity.as_str());
        self.banner.show(message, severity);
    }

    fn dismiss(&self) {
        self.banner.dismiss();
    }
}

pub fn render_form(view: &FormView, definition: &FormDefinition, values: &FormValues, page: &TerminalPage) {
    if let Some(heading) = &view.heading {
        println!("{}", heading.title);
        println!("{}", heading.subtitle);
        return;
    }

    println!("{}", page.text("form-title"));
    let markers: String = view
        .step_markers
        .iter()
        .map(|marker| match marker {
            StepMarker::Complete => '#',
            StepMarker::Active => '>',
            StepMarker::Pending => '.',
        })
        .collect();
    println!(
        "step {}/{} [{markers}] {:.0}%",
        view.current_step,
        view.total_steps,
        view.progress * 100.0
    );

    if let Some(step) = definition.step(view.current_step) {
        for field in &step.fields {
            if field.persona.is_some() && field.persona != view.visible_persona_block {
                continue;
            }
            let marker = if field.is_marked_required() { "*" } else { " " };
            let flagged = if view.flagged.contains(&field.indicator_id()) {
                " <- required"
            } else {
                ""
            };
            let shown = match field.kind {
                FieldKind::Checkbox | FieldKind::Radio => values.get_all(&field.name).join(", "),
                FieldKind::Text | FieldKind::Select => {
                    values.get(&field.name).unwrap_or_default().to_string()
                }
            };
            println!("  {marker}{}: {shown}{flagged}", field.name);
        }
    }

    if view.visible_persona_block.is_some() {
        let toggles: Vec<String> = view
            .persona_toggles
            .iter()
            .map(|toggle| {
                if toggle.active {
                    format!("[{}]", toggle.persona)
                } else {
                    toggle.persona.to_string()
                }
            })
            .collect();
        println!("  persona: {}", toggles.join(" "));
    }

    let mut actions = Vec::new();
    if view.show_previous {
        actions.push("prev".to_string());
    }
    if view.show_next {
        actions.push("next".to_string());
    }
    if view.show_submit {
        let suffix = if view.submit_enabled { "" } else { " (busy)" };
        actions.push(format!("submit \"{}\"{suffix}", view.submit_label));
    }
    println!("  actions: {}", actions.join(" | "));
}
