use std::future;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};
use tracing::{error, warn};

use crate::dispatcher::Outcome;
use crate::report::Report;

/// Drain up to `expected` outcomes from `results`, stopping early when
/// `deadline` passes. A `None` deadline waits for every outcome, however
/// long it takes.
///
/// Outcomes arrive in completion order; nothing here depends on the order
/// the probes were issued in. An error outcome is logged and never counted
/// as a response.
pub async fn collect(
    mut results: UnboundedReceiver<Outcome>,
    deadline: Option<Instant>,
    expected: usize,
) -> Report {
    let expired = async move {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => future::pending().await,
        }
    };
    tokio::pin!(expired);

    let mut responses = 0;
    for _ in 0..expected {
        tokio::select! {
            outcome = results.recv() => match outcome {
                Some(Outcome { target, rtt, reply: Ok(reply) }) => {
                    responses += 1;
                    println!("{:<65} {:?}", format!("{} ({}):", reply.sender_id(), target), rtt);
                }
                Some(Outcome { target, reply: Err(e), .. }) => {
                    error!("probe to {target} failed: {e}");
                }
                None => break,
            },
            _ = &mut expired => {
                warn!("timed out ({responses}/{expected} outcomes received)");
                break;
            }
        }
    }

    Report::new(responses, expected)
}
