pub mod backend;
pub mod client;
pub mod core;
pub mod env;
pub mod error;
pub mod fields;
pub mod init;
pub mod layer;
pub mod level;
pub mod merge;
pub mod noop_sink;
pub mod record;
pub mod sink;
pub mod translate;

#[cfg(feature = "console")]
pub mod console_sink;

pub use crate::backend::ReportBackend;
pub use crate::client::{ClientConfig, ReportClient};
pub use crate::core::{Admission, ReportConfig, ReportCore};
pub use crate::error::FlushError;
pub use crate::layer::ReportLayer;
pub use crate::level::Severity;
