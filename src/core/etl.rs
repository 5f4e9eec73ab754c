use crate::core::{Pipeline, ReportOutcome};
use crate::utils::error::Result;
use std::time::Instant;

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<ReportOutcome> {
        let started = Instant::now();
        tracing::info!("Starting report run");

        // Extract
        let records = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", records.len());

        // Transform
        let reports = self.pipeline.transform(&records).await?;
        tracing::info!(
            "Built reports: {} recruiter codes, {} application codes, {} dates",
            reports.recruiter_codes.rows.len(),
            reports.application_codes.entries().len(),
            reports.received_by_date.rows.len()
        );

        // Load
        let output_path = self.pipeline.load(&reports).await?;
        tracing::info!("📁 Report saved to {} in {:?}", output_path, started.elapsed());

        Ok(ReportOutcome {
            reports,
            output_path,
            records_read: records.len(),
        })
    }
}
