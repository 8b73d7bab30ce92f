pub mod health;
pub mod sessions;
pub mod steps;
pub mod ws;
