pub mod raw;
pub mod report;
