use std::time::Instant;

use tracing::{info, info_span, warn, Instrument};

use crate::chain::Next;
use crate::handler::Handler;
use crate::request::Request;

/// Wraps every request in an `info` span carrying method and path, then
/// logs the status and latency once the rest of the chain is done.
pub fn trace() -> impl Handler {
    |req: Request, next: Next| {
        let span = info_span!("request", method = %req.method(), path = req.path());
        async move {
            let started = Instant::now();
            let outcome = next.run(req).await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            match &outcome {
                Ok(reply) => info!(status = reply.status().as_u16(), elapsed_ms, "request finished"),
                Err(err) => warn!(error = %err, elapsed_ms, "request failed"),
            }
            outcome
        }
        .instrument(span)
    }
}
