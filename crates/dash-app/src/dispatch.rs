//! Background analysis
//!
//! Requests run on the tokio runtime; results come back over an unbounded
//! channel that the UI drains once per frame.

use dash_core::{
    AnalysisConfig, AnalysisError, AnalysisResult, AnalysisService, DataRow, ReanalysisSink,
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// A finished analysis request
pub struct AnalysisDone {
    pub file_name: String,
    pub rows: Vec<DataRow>,
    pub result: Result<AnalysisResult, AnalysisError>,
}

#[derive(Clone)]
pub struct AnalysisDispatcher {
    handle: Handle,
    service: Arc<dyn AnalysisService>,
    config: AnalysisConfig,
    tx: UnboundedSender<AnalysisDone>,
    ctx: egui::Context,
}

impl AnalysisDispatcher {
    pub fn new(
        handle: Handle,
        service: Arc<dyn AnalysisService>,
        ctx: egui::Context,
    ) -> (Self, UnboundedReceiver<AnalysisDone>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let dispatcher = Self {
            handle,
            service,
            config: AnalysisConfig::default(),
            tx,
            ctx,
        };
        (dispatcher, rx)
    }

    /// Start analysing `rows` in the background
    pub fn analyze(&self, rows: Vec<DataRow>, file_name: &str) {
        let service = self.service.clone();
        let config = self.config;
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        let file_name = file_name.to_string();

        debug!("Dispatching analysis of {} ({} rows)", file_name, rows.len());
        self.handle.spawn(async move {
            let result = service.analyze(rows.clone(), &file_name, &config).await;
            if tx.send(AnalysisDone { file_name, rows, result }).is_err() {
                warn!("Analysis finished after the app closed");
            }
            ctx.request_repaint();
        });
    }
}

impl ReanalysisSink for AnalysisDispatcher {
    fn request_reanalysis(&self, rows: Vec<DataRow>, file_name: &str) {
        self.analyze(rows, file_name);
    }
}
