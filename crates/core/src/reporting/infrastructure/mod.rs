pub mod log_report_sink;
pub mod writer_report_sink;
