use crate::core::report::summary_lines;
use crate::core::Pipeline;
use crate::domain::model::RunReport;
use crate::utils::error::Result;
use std::time::Instant;

pub struct CheckEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> CheckEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        tracing::info!("🚀 Starting checksum run");

        // Extract
        let pids = self.pipeline.extract().await?;
        tracing::info!("📋 {} object(s) to process", pids.len());

        // Transform
        let outcome = self.pipeline.transform(pids).await?;
        for line in summary_lines(&outcome) {
            tracing::info!("{}", line);
        }

        // Load
        let report_path = self.pipeline.load(&outcome).await?;
        if let Some(path) = &report_path {
            tracing::info!("📁 Report saved to: {}", path);
        }

        tracing::info!("✅ Finished in {:?}", started.elapsed());
        Ok(RunReport {
            outcome,
            report_path,
        })
    }
}
