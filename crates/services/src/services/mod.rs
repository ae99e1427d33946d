pub mod api_client;
pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod confirmation;
pub mod finances;
pub mod forms;
pub mod modal;
pub mod navigation;
pub mod resource;
pub mod session;
pub mod storage;
pub mod validation;
