pub mod expand;
pub mod list;
pub mod report;
pub mod run;
