pub mod database;

pub use database::{Database, Manager, ModelInstance};
