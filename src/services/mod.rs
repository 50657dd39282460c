pub mod annotations;
pub mod errors;
pub mod scoring;
