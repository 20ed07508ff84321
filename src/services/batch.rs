//! Bounded concurrent dispatch of independent requests.
//!
//! Requests run concurrently and complete in any order; results are put back
//! in the order the requests were given, keyed by the caller's identifier.

use crate::errors::SwiftResult;
use crate::services::status::StatusTable;
use crate::transport::{Request, Response, Transport};
use futures::{StreamExt, stream};
use std::fmt::Display;
use tracing::error;

/// Send every request with at most `concurrency` in flight and return the
/// results in request order.
pub async fn dispatch<K>(
    transport: &dyn Transport,
    requests: Vec<(K, Request)>,
    concurrency: usize,
) -> Vec<(K, SwiftResult<Response>)>
where
    K: Send,
{
    let mut slots: Vec<Option<(K, SwiftResult<Response>)>> =
        std::iter::repeat_with(|| None).take(requests.len()).collect();

    let mut in_flight = stream::iter(requests.into_iter().enumerate())
        .map(|(idx, (key, request))| async move { (idx, key, transport.send(request).await) })
        .buffer_unordered(concurrency.max(1));

    while let Some((idx, key, result)) = in_flight.next().await {
        slots[idx] = Some((key, result));
    }

    slots.into_iter().flatten().collect()
}

/// Dispatch results checked against a status table.
#[derive(Debug)]
pub struct BatchReport<K, T> {
    /// Entries whose status the table accepts, in request order.
    pub resolved: Vec<(K, T, Response)>,
    /// One message per failed entry, in request order.
    pub failures: Vec<String>,
}

impl<K, T> BatchReport<K, T> {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Split dispatch results into accepted outcomes and failure messages.
pub fn resolve<K, T>(
    results: Vec<(K, SwiftResult<Response>)>,
    table: &StatusTable<T>,
) -> BatchReport<K, T>
where
    K: Display,
    T: Copy + 'static,
{
    let mut report = BatchReport {
        resolved: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };

    for (key, result) in results {
        match result.and_then(|response| {
            table
                .resolve(response.status)
                .map(|outcome| (outcome, response))
        }) {
            Ok((outcome, response)) => report.resolved.push((key, outcome, response)),
            Err(err) => {
                error!("{}: {}", key, err);
                report.failures.push(format!("{}: {}", key, err));
            }
        }
    }

    report
}
