pub mod blog;
pub mod config;
pub mod db;
pub mod indexing;
pub mod model;
pub mod report;
pub mod run;
