pub mod incident;
pub mod schedule;
