pub mod services;

pub use services::app::{DashboardServices, StartupError};
