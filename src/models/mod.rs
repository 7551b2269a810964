pub mod actor;
pub mod application;
pub mod history;
pub mod job;
pub mod message;
pub mod user;
