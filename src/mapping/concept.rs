use serde_json::{Value, json};

use super::format::fixed2;
use super::{ExternalRecord, FieldRule, apply_rules};
use crate::submission::payload::Payload;

const RULES: &[FieldRule] = &[
    FieldRule::copy("projectTitle", &["Project_Title"]),
    FieldRule::copy("organizationName", &["Organization_Name"]),
    FieldRule::copy("organizationAddress", &["Organization_Address"]),
    FieldRule::copy("organizationType", &["Type_of_Organization"]),
    FieldRule::date("dateOfIncorporation", &["Date_of_Incorporation_of_Organization"]),
    FieldRule::copy("contactName", &["Contact_Name"]),
    FieldRule::copy("contactPosition", &["Position"]),
    FieldRule::copy("contactEmail", &["Email"]),
    FieldRule::copy("contactTelephone", &["Telephone"]),
    FieldRule::date("proposedStartDate", &["Proposed_Start_Date"]),
    FieldRule::copy("durationMonths", &["Duration_Months"]),
    FieldRule::copy("awardCategory", &["Award_Category1"]),
    FieldRule::copy("thematicArea", &["Project_Theme"]),
    FieldRule::copy("projectSummary", &["Project_Summary"]),
    FieldRule::copy("projectGoalObjectives", &["Project_Goal_and_Objectives"]),
    FieldRule::copy("projectOutputsActivities", &["Project_Outputs_and_Activities"]),
    FieldRule::copy("legalRepresentativeName", &["Legal_Representative_Name"]),
    FieldRule::date("declarationDate", &["Declaration_Date"]),
];

/// (source key, Creator category name) for the budget breakdown subform.
const BUDGET_CATEGORIES: &[(&str, &str)] = &[
    ("salaryBudget", "Salary"),
    ("travelBudget", "Travel/accommodation"),
    ("equipmentBudget", "Equipment/supplies"),
    ("contractedServicesBudget", "Contracted Services"),
    ("operationalBudget", "Operational Costs"),
    ("educationBudget", "Education/outreach"),
    ("trainingBudget", "Training"),
    ("administrativeBudget", "Administrative"),
];

pub fn map(payload: &Payload) -> ExternalRecord {
    let mut record = ExternalRecord::new();
    apply_rules(payload, RULES, &mut record);

    let requested: f64 = BUDGET_CATEGORIES
        .iter()
        .map(|(key, _)| payload.number_or_zero(key))
        .sum();
    let co_financing = payload.number_or_zero("totalCoFinancing");
    let total_cost = requested + co_financing;

    if co_financing > 0.0 {
        record.insert_text("Total_Co_Financing", fixed2(co_financing));
    }
    if total_cost > 0.0 {
        record.insert_text("Total_Project_Estimated_Cost", fixed2(total_cost));
        record.insert_text("Total_Project_Estimated_Cost_Percentage", "100.00");
        record.insert_text(
            "Total_Co_Financing_Percentage",
            fixed2(co_financing / total_cost * 100.0),
        );
    }
    if requested > 0.0 {
        record.insert_text("Total2", fixed2(requested));
    }

    record.insert_rows("Project_Budget_Summary", budget_rows(payload, requested));

    if co_financing > 0.0 {
        record.insert_text(
            "Co_Financing_Details",
            format!("Total Co-financing: ${}", fixed2(co_financing)),
        );
    }

    record
}

/// One row per category with a positive amount; each carries its share of `total`.
fn budget_rows(payload: &Payload, total: f64) -> Vec<Value> {
    BUDGET_CATEGORIES
        .iter()
        .filter_map(|(key, category)| {
            let amount = payload.number_or_zero(key);
            if amount <= 0.0 {
                return None;
            }
            let percentage = if total > 0.0 {
                fixed2(amount / total * 100.0)
            } else {
                "0.00".to_string()
            };
            Some(json!({
                "Categories": category,
                "Total_Contribution_BZD": fixed2(amount),
                "Percentage": percentage,
            }))
        })
        .collect()
}
