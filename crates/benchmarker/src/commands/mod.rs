pub mod run;
pub mod types;
pub mod validate;
