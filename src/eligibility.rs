use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::submission::payload::Payload;

/// Organization types that may not receive grants.
pub const DISALLOWED_ORGANIZATION_TYPES: &[&str] = &["Government Body", "Statutory Body"];

pub const REASON_ORGANIZATION_TYPE: &str =
    "Organization type (Government Body/Statutory Body) is not eligible.";
pub const REASON_TOO_YOUNG: &str =
    "Organization must be incorporated for at least one year to be eligible.";
pub const REASON_ELIGIBLE: &str = "Eligibility criteria met.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityOutcome {
    pub eligible: bool,
    pub reason: String,
}

impl EligibilityOutcome {
    fn eligible() -> Self {
        Self {
            eligible: true,
            reason: REASON_ELIGIBLE.to_string(),
        }
    }

    fn ineligible(reason: &str) -> Self {
        Self {
            eligible: false,
            reason: reason.to_string(),
        }
    }
}

/// Decide whether an organization may apply, as of `today`.
///
/// Organization type is checked first. A missing or unparsable incorporation
/// date counts as younger than a year.
pub fn evaluate(
    incorporation_date: Option<NaiveDate>,
    organization_type: Option<&str>,
    today: NaiveDate,
) -> EligibilityOutcome {
    if organization_type.is_some_and(|t| DISALLOWED_ORGANIZATION_TYPES.contains(&t.trim())) {
        return EligibilityOutcome::ineligible(REASON_ORGANIZATION_TYPE);
    }

    match incorporation_date {
        Some(date) if at_least_one_year(date, today) => EligibilityOutcome::eligible(),
        _ => EligibilityOutcome::ineligible(REASON_TOO_YOUNG),
    }
}

/// Evaluate straight from a submission's `dateOfIncorporation` and `organizationType`.
pub fn evaluate_payload(payload: &Payload, today: NaiveDate) -> EligibilityOutcome {
    let organization_type = payload.text("organizationType");
    evaluate(
        payload.date("dateOfIncorporation"),
        organization_type.as_deref(),
        today,
    )
}

fn at_least_one_year(incorporated: NaiveDate, today: NaiveDate) -> bool {
    let years = today.year() - incorporated.year();
    let months = today.month() as i32 - incorporated.month() as i32;
    let days = today.day() as i32 - incorporated.day() as i32;

    years > 1 || (years == 1 && (months > 0 || (months == 0 && days >= 0)))
}
