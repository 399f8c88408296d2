pub mod error;
pub mod session_config;
pub mod session_logger;
pub mod tracking_session;
