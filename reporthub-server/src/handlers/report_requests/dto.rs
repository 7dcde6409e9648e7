use serde::Deserialize;
use serde_json::{Map, Value};

use reporthub_service::{NewReportRequest, ReportType, UpdatePatch};

use crate::validation::ValidationIssue;

const TYPE_VALUES: &str = "SALES_SUMMARY, USER_EXPORT, INVENTORY_SNAPSHOT";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequestDto {
    pub title: String,
    #[serde(rename = "type")]
    pub report_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    pub created_by: String,
}

impl CreateReportRequestDto {
    pub fn try_into_new(self) -> Result<NewReportRequest, Vec<ValidationIssue>> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        if self.title.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "title",
                "empty",
                "title must not be empty",
            ));
        }
        let report_type = match self.report_type.parse::<ReportType>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                issues.push(ValidationIssue::new(
                    "type",
                    "invalid_enum",
                    format!("type must be one of {TYPE_VALUES}"),
                ));
                None
            }
        };
        if self.created_by.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "createdBy",
                "empty",
                "createdBy must not be empty",
            ));
        }

        match (issues.is_empty(), report_type) {
            (true, Some(report_type)) => Ok(NewReportRequest {
                title: self.title,
                report_type,
                parameters: Value::Object(self.parameters),
                created_by: self.created_by,
            }),
            _ => Err(issues),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequestDto {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub parameters: Option<Map<String, Value>>,
    pub created_by: Option<String>,
}

impl UpdateReportRequestDto {
    pub fn try_into_patch(self) -> Result<UpdatePatch, Vec<ValidationIssue>> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    "title",
                    "empty",
                    "title must not be empty",
                ));
            }
        }
        let report_type = match &self.report_type {
            Some(raw) => match raw.parse::<ReportType>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    issues.push(ValidationIssue::new(
                        "type",
                        "invalid_enum",
                        format!("type must be one of {TYPE_VALUES}"),
                    ));
                    None
                }
            },
            None => None,
        };
        if let Some(created_by) = &self.created_by {
            if created_by.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    "createdBy",
                    "empty",
                    "createdBy must not be empty",
                ));
            }
        }

        if issues.is_empty() {
            Ok(UpdatePatch {
                title: self.title,
                report_type,
                parameters: self.parameters.map(Value::Object),
                created_by: self.created_by,
            })
        } else {
            Err(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_dto_accepts_a_valid_payload() {
        let dto: CreateReportRequestDto = serde_json::from_value(json!({
            "title": "Monthly sales",
            "type": "SALES_SUMMARY",
            "parameters": {"month": "2025-12"},
            "createdBy": "u1"
        }))
        .expect("deserialize");
        let input = dto.try_into_new().expect("valid");
        assert_eq!(input.title, "Monthly sales");
        assert_eq!(input.report_type, ReportType::SalesSummary);
        assert_eq!(input.parameters["month"], "2025-12");
    }

    #[test]
    fn create_dto_defaults_parameters_to_empty_object() {
        let dto: CreateReportRequestDto = serde_json::from_value(json!({
            "title": "Export",
            "type": "USER_EXPORT",
            "createdBy": "u1"
        }))
        .expect("deserialize");
        let input = dto.try_into_new().expect("valid");
        assert_eq!(input.parameters, json!({}));
    }

    #[test]
    fn create_dto_collects_field_issues() {
        let dto: CreateReportRequestDto = serde_json::from_value(json!({
            "title": "  ",
            "type": "PDF",
            "createdBy": ""
        }))
        .expect("deserialize");
        let issues = dto.try_into_new().expect_err("invalid");
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "type", "createdBy"]);
    }

    #[test]
    fn update_dto_rejects_unknown_type() {
        let dto: UpdateReportRequestDto =
            serde_json::from_value(json!({"type": "WRONG"})).expect("deserialize");
        let issues = dto.try_into_patch().expect_err("invalid");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "type");
    }

    #[test]
    fn update_dto_allows_empty_patch() {
        let patch = UpdateReportRequestDto::default()
            .try_into_patch()
            .expect("empty patch is valid");
        assert!(patch.title.is_none());
        assert!(patch.report_type.is_none());
    }
}
