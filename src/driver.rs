//! Event loop tying exporters, the record store and the error sink together.
//!
//! Events are processed one at a time. For each event every exporter runs in
//! configuration order against the same [`RecordStore`]; once all of them are
//! done, [`EventLoop::finish_event`] snapshots the store and clears its items
//! so the next event starts with the schema but no rows.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ExportError;
use crate::event::{EventSetup, EventSource};
use crate::exporter::{EventOutcome, ExporterConfig, RecHitExporter};
use crate::output::to_ig_json;
use crate::sink::ErrorSink;
use crate::store::RecordStore;

/// Run configuration: the exporters to schedule, in order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub exporters: Vec<ExporterConfig>,
}

impl ExportConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse export configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&json)
    }
}

pub struct EventLoop<S: ErrorSink> {
    store: RecordStore,
    sink: S,
    exporters: Vec<RecHitExporter>,
    events_processed: u64,
}

impl<S: ErrorSink> EventLoop<S> {
    pub fn new(store: RecordStore, sink: S) -> Self {
        Self {
            store,
            sink,
            exporters: Vec::new(),
            events_processed: 0,
        }
    }

    /// Build every configured exporter. Any configuration error aborts.
    pub fn from_config(config: &ExportConfig, sink: S) -> Result<Self, ExportError> {
        let mut event_loop = Self::new(RecordStore::new(), sink);
        for exporter in &config.exporters {
            event_loop.add_exporter(RecHitExporter::new(exporter)?);
        }
        Ok(event_loop)
    }

    pub fn add_exporter(&mut self, exporter: RecHitExporter) {
        tracing::info!(
            "Scheduling {} from {}",
            exporter.collection_name(),
            exporter.input_tag()
        );
        self.exporters.push(exporter);
    }

    pub fn exporters(&self) -> &[RecHitExporter] {
        &self.exporters
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Run every exporter on one event.
    ///
    /// Skipped exporters have already reported to the sink. Errors returned
    /// here are fatal for the run.
    pub fn process(
        &mut self,
        event: &dyn EventSource,
        setup: &dyn EventSetup,
    ) -> Result<Vec<EventOutcome>> {
        let mut outcomes = Vec::with_capacity(self.exporters.len());
        for exporter in &mut self.exporters {
            let outcome = exporter
                .analyze(event, setup, &mut self.store, &mut self.sink)
                .with_context(|| format!("Fatal error exporting {}", event.id()))?;
            outcomes.push(outcome);
        }
        self.events_processed += 1;
        Ok(outcomes)
    }

    /// Snapshot the finished event as an ig document and clear the items.
    pub fn finish_event(&mut self) -> Value {
        let document = to_ig_json(&self.store);
        self.store.clear_items();
        document
    }

    /// Log per-exporter totals.
    pub fn log_summary(&self) {
        tracing::info!(
            "Processed {} events, {} errors reported",
            self.events_processed,
            self.sink.count()
        );
        for exporter in &self.exporters {
            tracing::info!(
                "{}: {} events exported, {} skipped, {} hits",
                exporter.collection_name(),
                exporter.events_exported(),
                exporter.events_skipped(),
                exporter.hits_exported()
            );
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
