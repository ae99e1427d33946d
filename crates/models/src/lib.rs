pub mod client;
pub mod date_format;
pub mod envelope;
pub mod expense;
pub mod finance;
pub mod income;
pub mod project;
pub mod resource;
pub mod user;
