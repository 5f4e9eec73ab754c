use crate::adapters::{reader, writer};
use crate::core::aggregate::aggregate;
use crate::core::{ConfigProvider, Pipeline, Record, ReportSet, Storage};
use crate::utils::error::Result;
use std::path::PathBuf;

/// Pipeline over one input spreadsheet: read it, tally it, write the report workbook.
pub struct SheetPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    input: PathBuf,
}

impl<S: Storage, C: ConfigProvider> SheetPipeline<S, C> {
    pub fn new(storage: S, config: C, input: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            config,
            input: input.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SheetPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading input spreadsheet {}", self.input.display());
        let input = self.input.clone();
        tokio::task::spawn_blocking(move || reader::read_records(&input)).await?
    }

    async fn transform(&self, records: &[Record]) -> Result<ReportSet> {
        Ok(aggregate(records))
    }

    async fn load(&self, reports: &ReportSet) -> Result<String> {
        let reports = reports.clone();
        let workbook =
            tokio::task::spawn_blocking(move || writer::write_workbook(&reports)).await??;

        tracing::debug!(
            "Writing report workbook ({} bytes) to {}",
            workbook.len(),
            self.config.output_filename()
        );
        self.storage
            .write_file(self.config.output_filename(), &workbook)
            .await?;

        Ok(self.config.public_output_path())
    }
}
