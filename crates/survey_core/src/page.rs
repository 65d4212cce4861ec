//! Content load flow: fetch page copy, render it, then reveal the page.

use std::collections::BTreeMap;

use shared::{
    error::SurveyError,
    protocol::{PartnerLogo, SiteContent, SocialLink, ThemeColors},
};
use tracing::{error, info, warn};

use crate::ContentSource;

pub const MISSING_ENDPOINT_MESSAGE: &str = "Configuration Error: App URL is missing.";
pub const FINAL_CTA_ELEMENT: &str = "final-cta-btn";

/// Element id paired with the content key that fills it.
pub const DISPLAY_FIELDS: &[(&str, &str)] = &[
    ("hero-title", "heroTitle"),
    ("hero-subtitle", "heroSubtitle"),
    ("hero-cta", "heroCtaText"),
    ("pain-points-title", "painPointsTitle"),
    ("pain-point1-title", "painPoint1Title"),
    ("pain-point1-text", "painPoint1Text"),
    ("pain-point2-title", "painPoint2Title"),
    ("pain-point2-text", "painPoint2Text"),
    ("pain-point3-title", "painPoint3Title"),
    ("pain-point3-text", "painPoint3Text"),
    ("how-it-works-title", "howItWorksTitle"),
    ("how-it-works-step1-title", "howItWorksStep1Title"),
    ("how-it-works-step1-text", "howItWorksStep1Text"),
    ("how-it-works-step2-title", "howItWorksStep2Title"),
    ("how-it-works-step2-text", "howItWorksStep2Text"),
    ("how-it-works-step3-title", "howItWorksStep3Title"),
    ("how-it-works-step3-text", "howItWorksStep3Text"),
    ("who-is-it-for-title", "whoIsItForTitle"),
    ("persona-creator-title", "personaCreatorTitle"),
    ("persona-creator-text", "personaCreatorText"),
    ("persona-business-title", "personaBusinessTitle"),
    ("persona-business-text", "personaBusinessText"),
    ("persona-enthusiast-title", "personaEnthusiastTitle"),
    ("persona-enthusiast-text", "personaEnthusiastText"),
    ("why-join-title", "whyJoinTitle"),
    ("why-join-benefit1-title", "whyJoinBenefit1Title"),
    ("why-join-benefit1-text", "whyJoinBenefit1Text"),
    ("why-join-benefit2-title", "whyJoinBenefit2Title"),
    ("why-join-benefit2-text", "whyJoinBenefit2Text"),
    ("why-join-benefit3-title", "whyJoinBenefit3Title"),
    ("why-join-benefit3-text", "whyJoinBenefit3Text"),
    ("partners-title", "partnersTitle"),
    ("about-title", "aboutTitle"),
    ("about-text", "aboutText"),
    ("about-cta", "aboutCtaText"),
    ("form-title", "formTitle"),
    ("form-subtitle", "formSubtitle"),
    ("final-cta-title", "finalCtaTitle"),
    ("final-cta-subtitle", "finalCtaSubtitle"),
    ("final-cta-btn", "finalCtaButtonText"),
    ("footer-text", "footerText"),
];

/// Output target of the content renderer.
pub trait PageSurface {
    fn set_text(&mut self, element_id: &str, text: &str);
    fn set_link(&mut self, element_id: &str, href: &str);
    fn set_social_links(&mut self, links: &[SocialLink]);
    fn set_partner_logos(&mut self, logos: &[PartnerLogo]);
    fn apply_theme(&mut self, variables: &BTreeMap<String, String>);
    /// Hides the loading indicator and shows the page.
    fn reveal(&mut self);
    fn start_animation(&mut self);
    /// Replaces the loading indicator text with an error.
    fn show_load_error(&mut self, message: &str);
}

/// Loads content from `source` and renders it onto `surface`.
///
/// The page is revealed, and the animation started, only after everything
/// has been rendered. On failure the loading indicator shows the error and
/// nothing else is touched.
pub async fn load_page<S, P>(source: &S, surface: &mut P) -> Result<(), SurveyError>
where
    S: ContentSource + ?Sized,
    P: PageSurface + ?Sized,
{
    let content = match source.fetch_content().await {
        Ok(content) => content,
        Err(err @ SurveyError::Configuration(_)) => {
            error!("page: endpoint not configured: {err}");
            surface.show_load_error(MISSING_ENDPOINT_MESSAGE);
            return Err(err);
        }
        Err(err) => {
            error!("page: failed to load site content: {err}");
            surface.show_load_error(&format!("Failed to load site content. Error: {err}"));
            return Err(err);
        }
    };

    render_content(&content, surface);
    surface.reveal();
    surface.start_animation();
    info!("page: content rendered fields={}", DISPLAY_FIELDS.len());
    Ok(())
}

pub fn render_content<P: PageSurface + ?Sized>(content: &SiteContent, surface: &mut P) {
    let colors = content.theme_colors().unwrap_or_else(|err| {
        warn!("page: could not parse colorTheme, using defaults: {err}");
        ThemeColors::default()
    });
    surface.apply_theme(&theme_variables(&colors));

    for (element_id, key) in DISPLAY_FIELDS {
        surface.set_text(element_id, &content.text(key));
    }

    if content.social_links.is_some() {
        let links = content.social_links().unwrap_or_else(|err| {
            warn!("page: could not parse socialLinks: {err}");
            Vec::new()
        });
        surface.set_social_links(&links);
        if let Some(instagram) = links
            .iter()
            .find(|link| link.name.eq_ignore_ascii_case("instagram"))
        {
            surface.set_link(FINAL_CTA_ELEMENT, &instagram.url);
        }
    }

    if content.partners_logos.is_some() {
        let logos = content.partner_logos().unwrap_or_else(|err| {
            warn!("page: could not parse partnersLogos: {err}");
            Vec::new()
        });
        surface.set_partner_logos(&logos);
    }
}

/// CSS custom properties for a theme: one per provided color, plus the
/// derived semantic variables which always get a value.
pub fn theme_variables(colors: &ThemeColors) -> BTreeMap<String, String> {
    let palette = [
        ("colorPrimaryBlue", &colors.primary_blue),
        ("colorPrimaryRed", &colors.primary_red),
        ("colorPrimaryOrange", &colors.primary_orange),
        ("colorPrimaryYellow", &colors.primary_yellow),
        ("colorPrimaryGreen", &colors.primary_green),
        ("colorBgDark", &colors.bg_dark),
        ("colorBgDarkSurface", &colors.bg_dark_surface),
        ("colorTextLight", &colors.text_light),
        ("colorTextLightSecondary", &colors.text_light_secondary),
        ("colorBgWhite", &colors.bg_white),
        ("colorTextSlate", &colors.text_slate),
    ];

    let mut variables = BTreeMap::new();
    for (key, value) in palette {
        if let Some(value) = non_empty(value) {
            variables.insert(css_variable_name(key), value.to_string());
        }
    }

    let derived = [
        ("--color-background", &colors.bg_dark, "#1a1a2e"),
        ("--color-surface", &colors.bg_dark_surface, "#2a2a4c"),
        ("--color-text-primary", &colors.text_light, "#F0F0F0"),
        ("--color-text-secondary", &colors.text_light_secondary, "#b0b0d0"),
        ("--color-accent", &colors.primary_yellow, "#FDB813"),
        ("--color-border", &colors.bg_dark_surface, "#2a2a4c"),
    ];
    for (name, value, fallback) in derived {
        variables.insert(
            name.to_string(),
            non_empty(value).unwrap_or(fallback).to_string(),
        );
    }

    variables
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// `colorPrimaryBlue` -> `--color-primary-blue`.
pub fn css_variable_name(key: &str) -> String {
    let mut name = String::from("--");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
