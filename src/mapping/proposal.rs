use serde_json::{Value, json};

use super::format;
use super::{ExternalRecord, FieldRule, apply_rules};
use crate::submission::payload::Payload;

const RULES: &[FieldRule] = &[
    FieldRule::copy("projectTitle", &["Project_Title", "Project_title1"]),
    // Dates
    FieldRule::date("proposedStartDate", &["Proposed_Start_Date"]),
    FieldRule::date("registrationDate", &["Registration_Date"]),
    FieldRule::date("dateOfIncorporation", &["Date_of_incorporation_of_Organization"]),
    FieldRule::date("expectedEndDate", &["Expected_End_Date"]),
    FieldRule::date("declarationDate", &["Declaration_Date"]),
    // Organization
    FieldRule::copy("organizationName", &["Organization", "Recipient_Organization"]),
    FieldRule::copy("organizationAddress", &["Organization_Address"]),
    FieldRule::copy("organizationVision", &["Organization_Vision"]),
    FieldRule::copy("organizationMission", &["Organization_Mission"]),
    FieldRule::copy(
        "organizationalBackground",
        &["Organizational_Background_and_Capacity"],
    ),
    FieldRule::copy("previousRelevantProjects", &["Relevant_Previous_Projects"]),
    FieldRule::copy("partnerOrganizations", &["Partner_Organizations_if_applicable"]),
    // Contacts
    FieldRule::copy("contactName", &["Contact_Name"]),
    FieldRule::copy("contactPosition", &["Position"]),
    FieldRule::copy("contactEmail", &["Email"]),
    FieldRule::copy("contactTelephone", &["Telephone"]),
    FieldRule::copy("projectManagerName", &["Project_Manager_Name"]),
    FieldRule::copy(
        "projectManagerQualifications",
        &["Project_Manager_Qualifications"],
    ),
    FieldRule::copy("legalRepresentativeName", &["Legal_Representative_Name"]),
    FieldRule::copy("legalRepresentativeTitle", &["Legal_Representative_Title"]),
    // Project
    FieldRule::copy("projectSummary", &["Project_Summary"]),
    FieldRule::copy("projectEnvironment", &["Project_Environment"]),
    FieldRule::copy("primaryLocation", &["Project_Location"]),
    FieldRule::copy("latitude", &["Latitude"]),
    FieldRule::copy("longitude", &["Longitude"]),
    FieldRule::copy("logicalFrameworkGoal", &["Goal"]),
    FieldRule::copy("stakeholderEngagementPlan", &["Stakeholder_Engagement_Plan_SEP"]),
    // Both feed the same destination; the later rule wins when both are set.
    FieldRule::copy("sustainabilityPlan", &["SUSTAINABILITY_REPLICATION1"]),
    FieldRule::copy("replicationPotential", &["SUSTAINABILITY_REPLICATION1"]),
    FieldRule::copy("projectDurationMonths", &["Duration_Months"]),
    FieldRule::copy("projectGoalObjectives", &["Project_Goal"]),
    // Logical framework
    FieldRule::copy("outcome1", &["Outcome1"]),
    FieldRule::copy("outcome2", &["Outcome2"]),
    FieldRule::copy("outcome3", &["Outcome3"]),
    FieldRule::copy("output1_1", &["Output1_1"]),
    FieldRule::copy("output1_2", &["Output1_2"]),
    FieldRule::copy("output2_1", &["Output2_1"]),
    FieldRule::copy("output2_2", &["Output2_2"]),
    FieldRule::copy("output3_1", &["Output3_1"]),
    FieldRule::copy("output3_2", &["Output3_2"]),
    FieldRule::copy("assumptions1", &["Assumptions1"]),
    FieldRule::copy("assumptions2", &["Assumptions2"]),
    FieldRule::copy("assumptions3", &["Assumptions3"]),
    FieldRule::copy("responsibleParty", &["Responsible_Party"]),
    FieldRule::copy("verification1", &["Verification1"]),
    FieldRule::copy("verification2", &["Verification2"]),
    FieldRule::copy("verification3", &["Verification3"]),
    // Narrative sections
    FieldRule::copy("additionalRisks", &["Additional_Risks"]),
    FieldRule::copy("alignmentJustification", &["Alignment_Justification"]),
    FieldRule::copy("capacityBuilding", &["Capacity_Building"]),
    FieldRule::copy("disseminationPlans", &["Dissemination_Plans"]),
    FieldRule::copy("environmentalSustainability", &["Environmental_Sustainability"]),
    FieldRule::copy("equipmentJustification", &["Equipment_Justification"]),
    FieldRule::copy("implementationDuration", &["Implementation_Duration"]),
    FieldRule::copy("implementationTimeline", &["Implementation_Timeline"]),
    FieldRule::copy("knowledgeTransfer", &["Knowledge_Transfer"]),
    FieldRule::copy("communityStewardship", &["Community_Stewardship"]),
    FieldRule::copy("ecosystemServices", &["Ecosystem_Services"]),
    FieldRule::copy("revenueGeneration", &["Revenue_Generation"]),
    FieldRule::copy("postProjectFunding", &["Post_Project_Funding"]),
    FieldRule::copy("scalingStrategy", &["Scaling_Strategy"]),
    FieldRule::copy("personnelJustification", &["Personnel_Justification"]),
    FieldRule::copy("operationalJustification", &["Operational_Justification"]),
    FieldRule::copy(
        "environmentalSocialRiskSummary",
        &["Environmental_Social_Risk_Summary"],
    ),
    // Document checklist (statuses and notes only, files go through upload)
    FieldRule::copy("generalDoc0Status", &["General_Document_0_Status"]),
    FieldRule::copy("generalDoc0Notes", &["General_Document_0_Notes"]),
    FieldRule::copy("generalDoc1Status", &["General_Document_1_Status"]),
    FieldRule::copy("generalDoc1Notes", &["General_Document_1_Notes"]),
    FieldRule::copy("generalDoc2Status", &["General_Document_2_Status"]),
    FieldRule::copy("generalDoc2Notes", &["General_Document_2_Notes"]),
    FieldRule::copy("generalDoc3Status", &["General_Document_3_Status"]),
    FieldRule::copy("generalDoc3Notes", &["General_Document_3_Notes"]),
    FieldRule::copy("generalDoc4Status", &["General_Document_4_Status"]),
    FieldRule::copy("generalDoc4Notes", &["General_Document_4_Notes"]),
    FieldRule::copy("generalDoc5Status", &["General_Document_5_Status"]),
    FieldRule::copy("generalDoc5Notes", &["General_Document_5_Notes"]),
    FieldRule::copy("generalDoc6Status", &["General_Document_6_Status"]),
    FieldRule::copy("generalDoc6Notes", &["General_Document_6_Notes"]),
    FieldRule::copy("generalDoc7Status", &["General_Document_7_Status"]),
    FieldRule::copy("generalDoc7Notes", &["General_Document_7_Notes"]),
    FieldRule::copy(
        "environmentalClearanceRequired",
        &["Environmental_Clearance_Required"],
    ),
    FieldRule::copy("environmentalClearanceNotes", &["Environmental_Clearance_Notes"]),
    FieldRule::copy("esrstStatus", &["ESRST_Status"]),
    FieldRule::copy("esrstRiskLevel", &["ESRST_Risk_Level"]),
    FieldRule::copy("esrmpStatus", &["ESRMP_Status"]),
    FieldRule::copy("gapStatus", &["GAP_Status"]),
    FieldRule::copy("excelBudgetStatus", &["Excel_Budget_Status"]),
];

const OBJECTIVES: &[&str] = &["objective1", "objective2", "objective3"];

/// (source key, label) pairs appended to the BUDGET text block.
const BUDGET_LINES: &[(&str, &str)] = &[
    ("fieldStaffSalary", "Field Staff Salary"),
    ("projectManagerSalary", "Project Manager Salary"),
    ("otherPersonnelCosts", "Other Personnel Costs"),
    ("travelCosts", "Travel Costs"),
    ("equipmentPurchase", "Equipment Purchase"),
    ("equipmentRental", "Equipment Rental"),
    ("materialsCosts", "Materials Costs"),
    ("consultantFees", "Consultant Fees"),
    ("trainingCosts", "Training Costs"),
    ("communicationCosts", "Communication Costs"),
    ("utilitiesCosts", "Utilities Costs"),
    ("maintenanceCosts", "Maintenance Costs"),
    ("vehiclesCosts", "Vehicles Costs"),
    ("insuranceCosts", "Insurance Costs"),
    ("auditCosts", "Audit Costs"),
    ("administrativeCosts", "Administrative Costs"),
    ("evaluationBudget", "Evaluation Budget"),
];

/// Single-field entries of the monitoring & evaluation subform.
const ME_PLAN_LINES: &[(&str, &str)] = &[
    ("meProjectGoal", "Project Goal"),
    ("meProjectObjectives", "Project Objectives"),
    ("monitoringEvaluationPlan", "M&E Plan"),
    ("monitoringIntegration", "Monitoring Integration"),
    ("midTermEvaluationPlan", "Mid-Term Evaluation"),
    ("endProjectEvaluationPlan", "End Project Evaluation"),
    ("lessonLearning", "Lesson Learning"),
];

const RISK_GROUPS: usize = 3;
const INDICATOR_GROUPS: usize = 3;

pub fn map(payload: &Payload) -> ExternalRecord {
    let mut record = ExternalRecord::new();
    apply_rules(payload, RULES, &mut record);

    if let Some(days) = duration_days(payload) {
        record.insert_text("Project_Duration1", format!("{days} days"));
    }

    record.insert_text("Project_Objective_s", objectives(payload));
    record.insert_rows(
        "ENVIRONMENTAL_AND_SOCIAL_RISK_SCREENING_AND_MITIGATION",
        risk_rows(payload),
    );

    if let Some(sources) = payload.scalar("coFinancingSources") {
        record.insert_rows(
            "Project_Budget_Summary",
            vec![json!({ "Contributing_Organizations": sources })],
        );
    }
    record.insert_text("BUDGET", budget_text(payload));
    record.insert_rows("Project_Monitoring_Evaluation_Plan", me_plan_rows(payload));

    record
}

fn duration_days(payload: &Payload) -> Option<i64> {
    let start = payload.datetime("proposedStartDate")?;
    let end = payload.datetime("expectedEndDate")?;
    Some(format::duration_days(start, end))
}

fn objectives(payload: &Payload) -> String {
    OBJECTIVES
        .iter()
        .filter_map(|key| payload.filled(key))
        .collect::<Vec<_>>()
        .join("\n")
}

fn risk_rows(payload: &Payload) -> Vec<Value> {
    (1..=RISK_GROUPS)
        .filter_map(|n| {
            let keys = [
                format!("risk{n}Category"),
                format!("risk{n}Description"),
                format!("risk{n}Impact"),
                format!("risk{n}Mitigation"),
            ];
            if !keys.iter().any(|k| payload.filled(k).is_some()) {
                return None;
            }
            let [category, description, impact, mitigation] =
                keys.map(|k| payload.filled_or_empty(&k));
            Some(json!({
                "Risk_Factors": format!(
                    "Category: {category}, Description: {description}, Impact: {impact}, Mitigation: {mitigation}"
                )
            }))
        })
        .collect()
}

fn budget_text(payload: &Payload) -> String {
    let amount = |key: &str| payload.text(key).unwrap_or_else(|| "0".to_string());

    let mut text = format!(
        "Total Budget Requested: BZ${}. Total Co-financing: BZ${}. Total Project Cost: BZ${}.\n",
        amount("totalBudgetRequested"),
        amount("totalCoFinancing"),
        amount("totalProjectCost"),
    );
    for (key, label) in BUDGET_LINES {
        if let Some(value) = payload.filled(key) {
            text.push_str(&format!("{label}: BZ${value}. "));
        }
    }
    text.trim().to_string()
}

fn me_plan_rows(payload: &Payload) -> Vec<Value> {
    let mut rows: Vec<Value> = ME_PLAN_LINES
        .iter()
        .filter_map(|(key, label)| {
            payload
                .filled(key)
                .map(|v| json!({ "Outcome_Outputs": format!("{label}: {v}") }))
        })
        .collect();

    for n in 1..=INDICATOR_GROUPS {
        let field = |part: &str| format!("indicator{n}{part}");
        let parts = [
            "Description",
            "Baseline",
            "Frequency",
            "Outcome",
            "Responsible",
            "Target",
            "Verification",
        ];
        if !parts.iter().any(|p| payload.filled(&field(p)).is_some()) {
            continue;
        }
        let [description, baseline, frequency, outcome, responsible, target, verification] =
            parts.map(|p| payload.filled_or_empty(&field(p)));
        rows.push(json!({
            "Outcome_Outputs": format!(
                "Indicator {n}: {description}. Baseline: {baseline}. Frequency: {frequency}. \
                 Outcome: {outcome}. Responsible: {responsible}. Target: {target}. \
                 Verification: {verification}."
            )
        }));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map_json(v: Value) -> ExternalRecord {
        map(&Payload::from_value(v))
    }

    #[test]
    fn aliases_receive_identical_values() {
        let record = map_json(json!({
            "projectTitle": "Mangrove Restoration",
            "organizationName": "Reef Trust",
        }));
        assert_eq!(record.get_str("Project_Title"), Some("Mangrove Restoration"));
        assert_eq!(record.get_str("Project_title1"), Some("Mangrove Restoration"));
        assert_eq!(record.get_str("Organization"), Some("Reef Trust"));
        assert_eq!(record.get_str("Recipient_Organization"), Some("Reef Trust"));
    }

    #[test]
    fn duration_in_days() {
        let record = map_json(json!({
            "proposedStartDate": "2024-01-01",
            "expectedEndDate": "2024-01-11",
        }));
        assert_eq!(record.get_str("Project_Duration1"), Some("10 days"));
        assert_eq!(record.get_str("Proposed_Start_Date"), Some("01-Jan-2024"));
        assert_eq!(record.get_str("Expected_End_Date"), Some("11-Jan-2024"));
    }

    #[test]
    fn duration_needs_both_valid_dates() {
        let record = map_json(json!({
            "proposedStartDate": "2024-01-01",
            "expectedEndDate": "someday",
        }));
        assert!(!record.contains_key("Project_Duration1"));
        assert!(!record.contains_key("Expected_End_Date"));
    }

    #[test]
    fn objectives_join_present_members_in_order() {
        let record = map_json(json!({
            "objective1": "Plant",
            "objective2": "",
            "objective3": "Monitor",
        }));
        assert_eq!(record.get_str("Project_Objective_s"), Some("Plant\nMonitor"));

        let record = map_json(json!({ "objective2": "" }));
        assert!(!record.contains_key("Project_Objective_s"));
    }

    #[test]
    fn risk_groups_fold_into_rows() {
        let record = map_json(json!({
            "risk1Category": "Flooding",
            "risk1Mitigation": "Raised beds",
            "risk3Description": "Drought",
        }));
        let rows = record
            .get("ENVIRONMENTAL_AND_SOCIAL_RISK_SCREENING_AND_MITIGATION")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0]["Risk_Factors"],
            "Category: Flooding, Description: , Impact: , Mitigation: Raised beds"
        );
        assert_eq!(
            rows[1]["Risk_Factors"],
            "Category: , Description: Drought, Impact: , Mitigation: "
        );
    }

    #[test]
    fn empty_subforms_are_omitted() {
        let record = map_json(json!({ "risk1Category": "", "indicator2Target": null }));
        assert!(!record.contains_key("ENVIRONMENTAL_AND_SOCIAL_RISK_SCREENING_AND_MITIGATION"));
        assert!(!record.contains_key("Project_Monitoring_Evaluation_Plan"));
        assert!(!record.contains_key("Project_Budget_Summary"));
    }

    #[test]
    fn me_plan_lines_then_indicators() {
        let record = map_json(json!({
            "meProjectGoal": "Healthy reef",
            "lessonLearning": "Workshops",
            "indicator2Description": "Coral cover",
            "indicator2Target": "30%",
        }));
        let rows = record
            .get("Project_Monitoring_Evaluation_Plan")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["Outcome_Outputs"], "Project Goal: Healthy reef");
        assert_eq!(rows[1]["Outcome_Outputs"], "Lesson Learning: Workshops");
        let indicator = rows[2]["Outcome_Outputs"].as_str().unwrap();
        assert!(indicator.starts_with("Indicator 2: Coral cover. Baseline: . "));
        assert!(indicator.contains("Target: 30%."));
    }

    #[test]
    fn budget_text_defaults_totals_and_lists_lines() {
        let record = map_json(json!({
            "totalBudgetRequested": 5000,
            "travelCosts": "1200",
            "auditCosts": "",
        }));
        assert_eq!(
            record.get_str("BUDGET"),
            Some(
                "Total Budget Requested: BZ$5000. Total Co-financing: BZ$0. Total Project Cost: BZ$0.\n\
                 Travel Costs: BZ$1200."
            )
        );
    }

    #[test]
    fn zero_and_false_answers_are_left_out_of_composed_text() {
        let record = map_json(json!({
            "objective1": 0,
            "objective2": "Monitor",
            "travelCosts": 0,
            "risk1Impact": false,
            "indicator1Target": 0,
            "indicator2Baseline": 0,
            "indicator2Description": "Coral cover",
        }));
        assert_eq!(record.get_str("Project_Objective_s"), Some("Monitor"));
        assert!(!record.get_str("BUDGET").unwrap().contains("Travel Costs"));
        assert!(!record.contains_key("ENVIRONMENTAL_AND_SOCIAL_RISK_SCREENING_AND_MITIGATION"));

        let rows = record
            .get("Project_Monitoring_Evaluation_Plan")
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(
            rows[0]["Outcome_Outputs"]
                .as_str()
                .unwrap()
                .starts_with("Indicator 2: Coral cover. Baseline: . ")
        );
    }

    #[test]
    fn co_financing_sources_become_budget_summary_row() {
        let record = map_json(json!({ "coFinancingSources": "Ministry grant" }));
        assert_eq!(
            record.get("Project_Budget_Summary"),
            Some(&json!([{ "Contributing_Organizations": "Ministry grant" }]))
        );
    }

    #[test]
    fn replication_potential_overrides_sustainability_plan() {
        let record = map_json(json!({
            "sustainabilityPlan": "Plan",
            "replicationPotential": "Replicate",
        }));
        assert_eq!(record.get_str("SUSTAINABILITY_REPLICATION1"), Some("Replicate"));
    }

    #[test]
    fn never_emits_empty_values() {
        let record = map_json(json!({
            "projectTitle": "",
            "organizationName": null,
            "contactEmail": {},
            "declarationDate": "",
            "outcome1": "Cleaner water",
        }));
        for key in ["Project_Title", "Organization", "Email", "Declaration_Date"] {
            assert!(!record.contains_key(key), "{key}");
        }
        for value in record.as_map().values() {
            assert!(!value.is_null());
            assert_ne!(value, &json!(""));
        }
        assert_eq!(record.get_str("Outcome1"), Some("Cleaner water"));
    }

    #[test]
    fn concept_vocabulary_is_not_used() {
        let record = map_json(json!({
            "organizationName": "Reef Trust",
            "dateOfIncorporation": "2015-06-01",
            "salaryBudget": "1000",
        }));
        assert!(!record.contains_key("Organization_Name"));
        assert!(!record.contains_key("Date_of_Incorporation_of_Organization"));
        assert_eq!(
            record.get_str("Date_of_incorporation_of_Organization"),
            Some("01-Jun-2015")
        );
        assert!(!record.contains_key("Total2"));
    }
}
