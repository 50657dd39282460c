use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError};

/// Payload for a new annotation on one problem of a submission.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAnnotation {
    #[serde(alias = "submissionId")]
    #[validate(range(min = 1, message = "submission_id is required"))]
    pub submission_id: i64,
    #[serde(alias = "problemId")]
    #[validate(range(min = 1, message = "problem_id is required"))]
    pub problem_id: i64,
    #[validate(custom(function = "not_blank", message = "filename must not be empty"))]
    pub filename: String,
    #[validate(custom(function = "not_blank", message = "comment must not be empty"))]
    pub comment: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub line: Option<i32>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(alias = "submittedBy")]
    #[validate(email(message = "submitted_by must be an email address"))]
    pub submitted_by: String,
    #[serde(default)]
    #[serde(alias = "sharedComment")]
    pub shared_comment: bool,
    #[serde(default)]
    #[serde(alias = "globalComment")]
    pub global_comment: bool,
}

/// Partial edit of an annotation. Absent fields stay untouched; an explicit
/// `"value": null` clears the adjustment.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AnnotationUpdate {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "comment must not be empty"))]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub value: Option<Option<f64>>,
    #[serde(default)]
    pub line: Option<i32>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    #[serde(alias = "sharedComment")]
    pub shared_comment: Option<bool>,
    #[serde(default)]
    #[serde(alias = "globalComment")]
    pub global_comment: Option<bool>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid() -> NewAnnotation {
        serde_json::from_value(json!({
            "submission_id": 7,
            "problem_id": 3,
            "filename": "hello.c",
            "comment": "Missing free()",
            "value": -2.0,
            "line": 14,
            "submitted_by": "ta@example.edu"
        }))
        .expect("valid payload")
    }

    #[test]
    fn accepts_complete_payload() {
        let payload = valid();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.value, Some(-2.0));
        assert!(!payload.shared_comment);
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let payload: NewAnnotation = serde_json::from_value(json!({
            "submissionId": 7,
            "problemId": 3,
            "filename": "hello.c",
            "comment": "ok",
            "submittedBy": "ta@example.edu",
            "globalComment": true
        }))
        .expect("camel case payload");
        assert_eq!(payload.submission_id, 7);
        assert!(payload.global_comment);
        assert_eq!(payload.value, None);
    }

    #[test]
    fn rejects_blank_comment_and_filename() {
        let mut payload = valid();
        payload.comment = "   ".to_string();
        payload.filename = String::new();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("comment"));
        assert!(fields.contains_key("filename"));
    }

    #[test]
    fn rejects_missing_owner_ids() {
        let mut payload = valid();
        payload.submission_id = 0;
        payload.problem_id = 0;

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("submission_id"));
        assert!(fields.contains_key("problem_id"));
    }

    #[test]
    fn rejects_non_email_author() {
        let mut payload = valid();
        payload.submitted_by = "not-an-email".to_string();
        assert!(payload.validate().unwrap_err().field_errors().contains_key("submitted_by"));
    }

    #[test]
    fn update_distinguishes_null_from_absent_value() {
        let absent: AnnotationUpdate = serde_json::from_value(json!({ "comment": "x" })).unwrap();
        assert_eq!(absent.value, None);

        let cleared: AnnotationUpdate = serde_json::from_value(json!({ "value": null })).unwrap();
        assert_eq!(cleared.value, Some(None));

        let set: AnnotationUpdate = serde_json::from_value(json!({ "value": 1.5 })).unwrap();
        assert_eq!(set.value, Some(Some(1.5)));
    }

    #[test]
    fn update_rejects_blank_comment() {
        let update = AnnotationUpdate { comment: Some(" ".to_string()), ..Default::default() };
        assert!(update.validate().is_err());
    }
}
