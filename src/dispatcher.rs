use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::prober::{ProbeError, ProbeReply, ProbingService};
use crate::util;

/// Gap between consecutive probe issues. Keeps a long target list from
/// bursting the local network stack.
pub const SEND_GAP: Duration = Duration::from_millis(1);

/// The result of one probe, delivered in completion order.
#[derive(Debug)]
pub struct Outcome {
    pub target: String,
    pub rtt: Duration,
    pub reply: Result<ProbeReply, ProbeError>,
}

/// Issue one probe per target, in input order. Each probe's callback stamps
/// the round-trip time and forwards an [`Outcome`] to `results`.
///
/// Unresolvable targets and synchronous send failures abort the whole run;
/// they mean bad input or an unusable local socket, not an unreachable peer.
pub async fn dispatch(
    targets: &[String],
    service: &impl ProbingService,
    results: UnboundedSender<Outcome>,
) -> anyhow::Result<()> {
    for (i, target) in targets.iter().enumerate() {
        let addr = util::resolve_peer_addr(target)
            .await
            .with_context(|| format!("resolving target {target}"))?;

        if i != 0 {
            tokio::time::sleep(SEND_GAP).await;
        }

        let results = results.clone();
        let outcome_target = target.clone();
        let issued_at = Instant::now();
        service
            .ping(
                addr,
                Box::new(move |reply| {
                    // the collector may be gone already; late outcomes are dropped
                    let _ = results.send(Outcome {
                        target: outcome_target,
                        rtt: issued_at.elapsed(),
                        reply,
                    });
                }),
            )
            .await
            .with_context(|| format!("sending probe to {target}"))?;
    }
    Ok(())
}
