use std::sync::LazyLock;

use regex::Regex;

use super::payload::Payload;
use crate::error::FieldError;
use crate::mapping::FormVariant;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy)]
enum Check {
    Required,
    Email,
    Numeric,
}

struct Rule {
    field: &'static str,
    check: Check,
    message: &'static str,
}

const fn required(field: &'static str, message: &'static str) -> Rule {
    Rule {
        field,
        check: Check::Required,
        message,
    }
}

const fn email(field: &'static str, message: &'static str) -> Rule {
    Rule {
        field,
        check: Check::Email,
        message,
    }
}

const fn numeric(field: &'static str, message: &'static str) -> Rule {
    Rule {
        field,
        check: Check::Numeric,
        message,
    }
}

const CONCEPT_RULES: &[Rule] = &[
    required("projectTitle", "Project Title is required"),
    required("contactName", "Contact Name is required"),
    email("contactEmail", "Valid Contact Email is required"),
    required("organizationName", "Organization Name is required"),
    required("organizationAddress", "Organization Address is required"),
    required("district", "District is required"),
    required("organizationType", "Organization Type is required"),
    required("dateOfIncorporation", "Date of Incorporation is required"),
    required("contactPosition", "Contact Position is required"),
    required("contactTelephone", "Contact Telephone is required"),
    required("proposedStartDate", "Proposed Start Date is required"),
    numeric("durationMonths", "Duration (Months) is required and must be a number"),
    required("thematicArea", "Thematic Area is required"),
    required("awardCategory", "Award Category is required"),
    required("projectSummary", "Project Summary is required"),
    required("projectGoalObjectives", "Project Goal and Objectives are required"),
    required("projectOutputsActivities", "Project Outputs and Activities are required"),
    numeric("totalBudgetRequested", "Total Budget Requested is required and must be a number"),
    required("legalRepresentativeName", "Legal Representative Name is required"),
    required("declarationDate", "Declaration Date is required"),
];

const PROPOSAL_RULES: &[Rule] = &[
    required("projectTitle", "Project Title is required"),
    required("contactName", "Contact Name is required"),
    email("contactEmail", "Valid Contact Email is required"),
    required("organizationName", "Organization Name is required"),
    required("organizationAddress", "Organization Address is required"),
    required("dateOfIncorporation", "Date of Incorporation is required"),
    required("organizationType", "Organization Type is required"),
    required("proposedStartDate", "Proposed Start Date is required"),
    required("expectedEndDate", "Expected End Date is required"),
    numeric("projectDurationMonths", "Project Duration (Months) is required and must be a number"),
    required("primaryLocation", "Primary Location is required"),
    required("primaryThematicArea", "Primary Thematic Area is required"),
    required("projectGoalObjectives", "Project Goal and Objectives are required"),
    required("projectSummary", "Project Summary is required"),
    required("projectOutputsActivities", "Project Outputs and Activities are required"),
    numeric("amountRequested", "Amount Requested is required and must be a number"),
    numeric("totalCoFinancing", "Total Co-Financing is required and must be a number"),
    required("legalRepresentativeName", "Legal Representative Name is required"),
    required("declarationDate", "Declaration Date is required"),
    required("organizationalBackground", "Organizational Background and Capacity is required"),
    required("projectManagerName", "Project Manager Name is required"),
    required("projectManagerQualifications", "Project Manager Qualifications are required"),
];

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Check a submission against its form's required fields.
///
/// Every failing field is reported, in rule order.
pub fn validate(payload: &Payload, variant: FormVariant) -> Result<(), Vec<FieldError>> {
    let rules = match variant {
        FormVariant::Concept => CONCEPT_RULES,
        FormVariant::Proposal => PROPOSAL_RULES,
        FormVariant::CommunityProposal => &[],
    };

    let errors: Vec<FieldError> = rules
        .iter()
        .filter(|rule| !passes(payload, rule))
        .map(|rule| FieldError::new(rule.field, rule.message))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn passes(payload: &Payload, rule: &Rule) -> bool {
    match rule.check {
        Check::Required => payload
            .text(rule.field)
            .is_some_and(|v| !v.trim().is_empty()),
        Check::Email => payload.text(rule.field).is_some_and(|v| is_email(&v)),
        Check::Numeric => payload.number(rule.field).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn valid_concept() -> Value {
        json!({
            "projectTitle": "Reef Restoration",
            "contactName": "Ana Cho",
            "contactEmail": "ana@example.org",
            "organizationName": "Reef Trust",
            "organizationAddress": "1 Coast Rd",
            "district": "Belize",
            "organizationType": "NGO",
            "dateOfIncorporation": "2015-01-01",
            "contactPosition": "Director",
            "contactTelephone": "501-555-0100",
            "proposedStartDate": "2025-01-01",
            "durationMonths": "12",
            "thematicArea": "Marine",
            "awardCategory": "Small",
            "projectSummary": "Summary",
            "projectGoalObjectives": "Goals",
            "projectOutputsActivities": "Outputs",
            "totalBudgetRequested": 5000,
            "legalRepresentativeName": "Ana Cho",
            "declarationDate": "2024-12-01",
        })
    }

    #[test]
    fn complete_concept_passes() {
        assert!(validate(&Payload::from_value(valid_concept()), FormVariant::Concept).is_ok());
    }

    #[test]
    fn reports_every_failing_field() {
        let mut body = valid_concept();
        body["contactEmail"] = json!("not-an-email");
        body["durationMonths"] = json!("twelve");
        body["district"] = json!("   ");

        let errors = validate(&Payload::from_value(body), FormVariant::Concept).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["contactEmail", "district", "durationMonths"]);
        assert_eq!(errors[0].message, "Valid Contact Email is required");
    }

    #[test]
    fn empty_proposal_lists_all_rules() {
        let errors = validate(&Payload::default(), FormVariant::Proposal).unwrap_err();
        assert_eq!(errors.len(), PROPOSAL_RULES.len());
    }

    #[test]
    fn community_proposal_has_no_required_fields() {
        assert!(validate(&Payload::default(), FormVariant::CommunityProposal).is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a.b+c@example.co.bz"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@example.org"));
        assert!(!is_email("a b@example.org"));
    }
}
