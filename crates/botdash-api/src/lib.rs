pub mod client;
pub mod source;

pub use client::DashboardClient;
pub use source::StatusSource;
