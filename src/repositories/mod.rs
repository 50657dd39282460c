pub(crate) mod annotations;
pub(crate) mod course_user_data;
pub(crate) mod problems;
pub(crate) mod scores;
pub(crate) mod submissions;
pub(crate) mod users;
