use std::sync::Arc;

use domain::flow::entity::FlowRecord;
use ports::secondary::metrics_port::FlowMetrics;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Read newline-delimited JSON flow records from `reader` and forward
/// them to `tx` until EOF, cancellation, or a closed receiver.
///
/// Lines that are not valid JSON objects, or that are missing any of
/// the required record fields, are skipped silently (debug-logged and
/// counted), matching the contract that incomplete records are dropped
/// before classification.
pub async fn read_flow_records<R>(
    reader: R,
    tx: mpsc::Sender<FlowRecord>,
    metrics: Arc<dyn FlowMetrics>,
    cancel: CancellationToken,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => break,
            next = lines.next_line() => next,
        };

        match next {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<FlowRecord>(line) {
                    Ok(record) => {
                        if tx.send(record).await.is_err() {
                            break; // receiver gone, nothing left to feed
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping malformed flow record");
                        metrics.record_flow_skipped("malformed");
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "flow input read failed");
                break;
            }
        }
    }
    tracing::debug!("flow record reader stopped");
}

/// Read flow records from stdin.
pub async fn read_stdin_flow_records(
    tx: mpsc::Sender<FlowRecord>,
    metrics: Arc<dyn FlowMetrics>,
    cancel: CancellationToken,
) {
    read_flow_records(BufReader::new(tokio::io::stdin()), tx, metrics, cancel).await;
}
