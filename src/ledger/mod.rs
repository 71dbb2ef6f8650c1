pub mod admission;
pub mod approver;
pub mod assemble;
pub mod audit;
pub mod codes;
pub mod config;
pub mod duplicates;
pub mod field;
pub mod grid;
pub mod organize;
pub mod paths;
pub mod progress;
pub mod run;
pub mod store;
pub mod timesheet;
pub mod util;
pub mod warn;
pub mod weeks;
