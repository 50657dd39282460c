use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::ScoreGrader;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

/// A user's enrollment in one course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseUserDatum {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub instructor: bool,
    pub course_assistant: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Problem {
    pub id: i64,
    pub assessment_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub max_score: Option<f64>,
    pub optional: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i64,
    pub assessment_id: i64,
    pub course_user_datum_id: i64,
    pub version: i32,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Score {
    pub id: i64,
    pub submission_id: i64,
    pub problem_id: i64,
    pub score: Option<f64>,
    pub grader_id: Option<i64>,
    pub feedback: Option<String>,
    pub released: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

impl Score {
    pub fn grader(&self) -> ScoreGrader {
        ScoreGrader::from_grader_id(self.grader_id)
    }
}

/// Grader comment on one file of a submission, scoped to a single problem.
///
/// `value` is an optional adjustment added on top of the problem's maximum
/// score when the owning [`Score`] is recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Annotation {
    pub id: i64,
    pub submission_id: i64,
    pub problem_id: i64,
    pub filename: String,
    pub comment: String,
    pub value: Option<f64>,
    pub line: Option<i32>,
    pub position: Option<i32>,
    pub submitted_by: String,
    pub shared_comment: bool,
    pub global_comment: bool,
    pub group_key: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

impl Annotation {
    /// Renders the comment with its value and problem name, whichever exist.
    pub fn as_text(&self, problem: Option<&Problem>) -> String {
        match (self.value, problem) {
            (Some(value), Some(problem)) => {
                format!("{} ({}, {})", self.comment, value, problem.name)
            }
            (Some(value), None) => format!("{} ({})", self.comment, value),
            (None, Some(problem)) => format!("{} ({})", self.comment, problem.name),
            (None, None) => self.comment.clone(),
        }
    }

    /// Shared key of a group submission iteration. Empty keys count as absent.
    pub fn group_key(&self) -> Option<&str> {
        self.group_key.as_deref().filter(|key| !key.is_empty())
    }
}
