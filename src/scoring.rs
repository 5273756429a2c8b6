use chrono::NaiveDate;
use serde::Serialize;

use crate::submission::payload::Payload;

/// Preliminary ranking heuristic stored alongside each application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoScore {
    pub organization_age: i32,
    pub organization_type: i32,
    pub operational_status: i32,
    pub total: i32,
}

pub fn score(payload: &Payload, today: NaiveDate) -> AutoScore {
    let organization_age = age_score(organization_age_years(payload, today));
    let organization_type = payload
        .text("organizationType")
        .map(|t| type_score(&t))
        .unwrap_or(0);
    let operational_status = payload
        .text("operationalStatus")
        .map(|s| status_score(&s))
        .unwrap_or(0);

    AutoScore {
        organization_age,
        organization_type,
        operational_status,
        total: organization_age + organization_type + operational_status,
    }
}

/// `organizationAge` when given, otherwise whole years since incorporation.
fn organization_age_years(payload: &Payload, today: NaiveDate) -> Option<f64> {
    if let Some(age) = payload.number("organizationAge") {
        return Some(age);
    }
    let incorporated = payload.date("dateOfIncorporation")?;
    today.years_since(incorporated).map(f64::from)
}

fn age_score(years: Option<f64>) -> i32 {
    match years {
        Some(y) if y >= 5.0 => 30,
        Some(y) if y >= 3.0 => 20,
        Some(y) if y >= 1.0 => 10,
        _ => 0,
    }
}

fn type_score(organization_type: &str) -> i32 {
    match organization_type {
        "NGO" => 25,
        "CBO" => 20,
        "Cooperative" => 15,
        "Private" => 10,
        "Government" => 5,
        _ => 0,
    }
}

fn status_score(status: &str) -> i32 {
    match status {
        "Fully Operational" => 25,
        "Partially Operational" => 15,
        "Starting Operations" => 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn full_marks() {
        let payload = Payload::from_value(json!({
            "organizationAge": 7,
            "organizationType": "NGO",
            "operationalStatus": "Fully Operational",
        }));
        let s = score(&payload, today());
        assert_eq!(s.organization_age, 30);
        assert_eq!(s.organization_type, 25);
        assert_eq!(s.operational_status, 25);
        assert_eq!(s.total, 80);
    }

    #[test]
    fn age_falls_back_to_incorporation_date() {
        let payload = Payload::from_value(json!({ "dateOfIncorporation": "2021-06-01" }));
        assert_eq!(score(&payload, today()).organization_age, 20);

        let payload = Payload::from_value(json!({ "dateOfIncorporation": "2025-01-01" }));
        assert_eq!(score(&payload, today()).organization_age, 0);
    }

    #[test]
    fn unknown_values_score_zero() {
        let payload = Payload::from_value(json!({
            "organizationAge": "abc",
            "organizationType": "Club",
            "operationalStatus": "Dormant",
        }));
        assert_eq!(score(&payload, today()).total, 0);
        assert_eq!(score(&Payload::default(), today()).total, 0);
    }

    #[test]
    fn string_ages_are_numeric() {
        let payload = Payload::from_value(json!({
            "organizationAge": "3",
            "organizationType": "Cooperative",
            "operationalStatus": "Starting Operations",
        }));
        assert_eq!(score(&payload, today()).total, 20 + 15 + 10);
    }
}
