/// `scores.grader_id` value reserved for the autograder.
pub const AUTOGRADER_ID: i64 = 0;

/// Who owns a score, decoded from the nullable `grader_id` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreGrader {
    Autograder,
    Unassigned,
    CourseUser(i64),
}

impl ScoreGrader {
    pub fn from_grader_id(grader_id: Option<i64>) -> Self {
        match grader_id {
            Some(AUTOGRADER_ID) => ScoreGrader::Autograder,
            Some(id) => ScoreGrader::CourseUser(id),
            None => ScoreGrader::Unassigned,
        }
    }

    pub fn is_autograder(self) -> bool {
        matches!(self, ScoreGrader::Autograder)
    }
}
