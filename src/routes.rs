pub mod search;
pub mod students;
