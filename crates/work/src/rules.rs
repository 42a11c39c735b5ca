//! Field rules for task payloads.
//!
//! Create requests and completion reports are flattened into
//! [`FieldValues`] and checked with the same rules the operator forms use.

use hotelops_core::{
    CompletionReport, CreateTaskRequest, FieldErrors, OpsError, Result, TaskFamily,
};
use hotelops_validation::{
    patterns, FieldConfig, FieldRules, FieldValue, FieldValues, FormConfig, FormValidation,
    RuleSet, ValidationMessages,
};

/// Rules a create request of `family` must satisfy.
pub fn create_rules(family: TaskFamily) -> RuleSet {
    let rules = RuleSet::new()
        .field("title", FieldRules::new().required().min_length(3).max_length(100))
        .field("description", FieldRules::new().max_length(500))
        .field_with_messages(
            "taskType",
            FieldRules::new().required(),
            ValidationMessages {
                required: Some("Task type is required".to_string()),
                ..Default::default()
            },
        )
        .field("priority", FieldRules::new().required())
        .field_with_messages(
            "dueDate",
            FieldRules::new().required(),
            ValidationMessages {
                required: Some("Due date is required".to_string()),
                ..Default::default()
            },
        )
        .field("estimatedDuration", FieldRules::new().min(1.0).max(1440.0))
        .field_with_messages(
            "roomNumber",
            FieldRules::new().pattern(patterns::room_number().clone()),
            ValidationMessages {
                pattern: Some("Room number may only contain letters, digits and dashes".to_string()),
                ..Default::default()
            },
        )
        .field("floorNumber", FieldRules::new().min(0.0).max(200.0));

    match family {
        TaskFamily::Servicing => rules,
        TaskFamily::Repair => rules
            .field("estimatedCost", FieldRules::new().min(0.0))
            .field("equipmentType", FieldRules::new().max_length(100)),
    }
}

/// Rules a completion report must satisfy.
pub fn completion_rules() -> RuleSet {
    RuleSet::new()
        .field_with_messages(
            "rating",
            FieldRules::new().min(1.0).max(5.0),
            ValidationMessages {
                min: Some("Rating must be between 1 and 5".to_string()),
                max: Some("Rating must be between 1 and 5".to_string()),
                ..Default::default()
            },
        )
        .field("actualDuration", FieldRules::new().min(0.0).max(1440.0))
        .field("actualCost", FieldRules::new().min(0.0))
        .field("notes", FieldRules::new().max_length(500))
}

/// Flatten a create request into form values.
pub fn request_values(request: &CreateTaskRequest) -> FieldValues {
    let mut values = FieldValues::new();
    values.insert("title".to_string(), request.title.trim().into());
    values.insert("description".to_string(), request.description.clone().into());
    values.insert("taskType".to_string(), request.kind.map(|k| k.label().to_string()).into());
    values.insert("priority".to_string(), request.priority.map(|p| p.label().to_string()).into());
    values.insert("dueDate".to_string(), request.due_date.map(|d| d.to_rfc3339()).into());
    values.insert("estimatedDuration".to_string(), request.estimated_duration.into());
    values.insert("roomNumber".to_string(), request.room_number.as_deref().map(str::trim).into());
    values.insert("floorNumber".to_string(), request.floor_number.into());
    values.insert("estimatedCost".to_string(), request.estimated_cost.into());
    values.insert("equipmentType".to_string(), request.equipment_type.clone().into());
    values
}

/// Flatten a completion report into form values.
pub fn report_values(report: &CompletionReport) -> FieldValues {
    let mut values = FieldValues::new();
    values.insert("rating".to_string(), report.rating.into());
    values.insert("actualDuration".to_string(), report.actual_duration.into());
    values.insert("actualCost".to_string(), report.actual_cost.into());
    values.insert("notes".to_string(), report.notes.clone().into());
    values
}

/// Check a create request. Every failing field is reported at once.
pub fn validate_create(request: &CreateTaskRequest) -> Result<()> {
    let mut errors: FieldErrors = create_rules(request.family).validate(&request_values(request));
    if let Some(kind) = request.kind {
        if kind.family() != request.family {
            errors
                .entry("taskType".to_string())
                .or_insert_with(|| format!("{} is not a {} task type", kind.label(), request.family));
        }
    }
    into_result(errors)
}

/// Check a completion report for a task of `family`.
pub fn validate_completion(family: TaskFamily, report: &CompletionReport) -> Result<()> {
    let mut errors: FieldErrors = completion_rules().validate(&report_values(report));
    if family == TaskFamily::Servicing {
        if report.actual_cost.is_some() {
            errors.insert("actualCost".to_string(), "Only maintenance tasks record costs".to_string());
        }
        if report.parts_used.as_deref().is_some_and(|p| !p.trim().is_empty()) {
            errors.insert("partsUsed".to_string(), "Only maintenance tasks record parts".to_string());
        }
    }
    into_result(errors)
}

/// Operator form for creating a task of `family`, pre-filled with defaults.
pub fn create_form(family: TaskFamily) -> FormValidation {
    let defaults = request_values(&CreateTaskRequest::new(family, ""));
    let config: FormConfig = create_rules(family)
        .entries()
        .map(|(name, rules, messages)| {
            let initial = defaults.get(name).cloned().unwrap_or(FieldValue::Null);
            let initial = if initial.is_empty() { FieldValue::Text(String::new()) } else { initial };
            (
                name.to_string(),
                FieldConfig::new(rules.clone()).with_messages(messages.clone()).with_initial(initial),
            )
        })
        .collect();
    FormValidation::new(config)
}

fn into_result(errors: FieldErrors) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(OpsError::Validation(errors))
    }
}
