pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use errors::DomainError;
