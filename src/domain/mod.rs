pub mod error;
pub mod repository;
pub mod task;
pub mod user;
