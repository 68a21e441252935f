// src/pipeline/publish.rs

//! Publishing analyzed posts to a sink.

use crate::error::Result;
use crate::models::AnalyzedPost;
use crate::storage::{Sink, SinkRecord, to_sink_record};

/// Payloads printed before publishing.
pub const PREVIEW_LIMIT: usize = 3;

/// Map analyzed posts to sink records, keeping order.
pub fn build_records(analyzed: &[AnalyzedPost]) -> Vec<SinkRecord> {
    analyzed.iter().map(to_sink_record).collect()
}

/// Send every record and return the acknowledged count.
pub async fn run_publish(sink: &dyn Sink, records: &[SinkRecord]) -> Result<usize> {
    let sent = sink.send_many(records).await?;
    log::info!("Produced messages: {}", sent);
    Ok(sent)
}
