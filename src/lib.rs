pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod web;

#[cfg(feature = "cli")]
pub use config::cli::ServerArgs;

pub use adapters::LocalStorage;
pub use config::AppConfig;
pub use crate::core::{aggregate::aggregate, etl::ReportEngine, pipeline::SheetPipeline};
pub use domain::model::{Record, Report, ReportOutcome, ReportSet};
pub use utils::error::{Result, TallyError};
pub use web::{build_router, AppState, TallyServer};
