pub mod config;
pub mod run;
pub mod serve;
pub mod steps;
