use crate::domain::model::{Record, ReportSet};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// File name of the generated workbook, relative to the storage root.
    fn output_filename(&self) -> &str;

    /// URL path under which the generated workbook is published.
    fn public_output_path(&self) -> String {
        format!("/{}", self.output_filename())
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProvider for Arc<T> {
    fn output_filename(&self) -> &str {
        (**self).output_filename()
    }

    fn public_output_path(&self) -> String {
        (**self).public_output_path()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, records: &[Record]) -> Result<ReportSet>;
    async fn load(&self, reports: &ReportSet) -> Result<String>;
}
