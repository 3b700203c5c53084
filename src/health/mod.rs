mod api;

pub use crate::health::api::HealthApi;
