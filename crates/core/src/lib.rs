pub mod capture;
pub mod detection;
pub mod rendering;
pub mod reporting;
pub mod session;
pub mod shared;
pub mod tracking;
