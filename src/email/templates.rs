use askama::Template;

use crate::mapping::FormVariant;

pub fn success_subject(variant: FormVariant) -> String {
    format!("{} Submission Successful", variant.label())
}

pub fn ineligible_subject(variant: FormVariant) -> String {
    format!("{} Submission Update", variant.label())
}

#[derive(Template)]
#[template(path = "email/submission_success.html")]
struct SuccessTemplate<'a> {
    label: &'a str,
    noun: String,
    name: &'a str,
    organization: &'a str,
}

#[derive(Template)]
#[template(path = "email/submission_ineligible.html")]
struct IneligibleTemplate<'a> {
    label: &'a str,
    name: &'a str,
    reason: &'a str,
    organization: &'a str,
}

pub fn render_success(
    name: &str,
    variant: FormVariant,
    organization: &str,
) -> Result<String, String> {
    SuccessTemplate {
        label: variant.label(),
        noun: variant.label().to_lowercase(),
        name,
        organization,
    }
    .render()
    .map_err(|e| format!("Failed to render success email: {e}"))
}

pub fn render_ineligible(
    name: &str,
    variant: FormVariant,
    reason: &str,
    organization: &str,
) -> Result<String, String> {
    IneligibleTemplate {
        label: variant.label(),
        name,
        reason,
        organization,
    }
    .render()
    .map_err(|e| format!("Failed to render ineligibility email: {e}"))
}
