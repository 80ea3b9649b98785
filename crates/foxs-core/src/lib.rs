pub mod commands;
pub mod domain;
pub mod job;
pub mod multimodel;
pub mod plots;
pub mod report;
pub mod results;
pub mod runner;
