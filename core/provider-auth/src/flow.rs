//! One in-flight OAuth authorization flow, spawned per `provider_auth_authorize`
//! and replaced (never stacked) by a later call for the same provider
//! (§4.5: "Only one authorization flow per provider is in flight").

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::loopback::LoopbackListener;

/// Total time a flow waits for a callback before giving up and releasing
/// the loopback listener.
const FLOW_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_SLICE: Duration = Duration::from_millis(250);

/// A handle the registry holds onto a running flow; `cancel` tears it
/// down early on replacement (a second `authorize` for the same provider).
pub struct OauthFlowHandle {
    cancel: CancellationToken,
}

impl OauthFlowHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[derive(Debug)]
pub enum FlowOutcome {
    Completed { code: String },
    Cancelled,
    TimedOut,
}

/// Bind the loopback listener and start racing it against cancellation
/// and an explicit out-of-band `provider_auth_callback`. Returns the
/// handle, the URL to show the user, the sender the registry feeds an
/// explicit callback code into, and the receiver for the final outcome.
pub fn spawn(
    preferred_port: Option<u16>,
) -> Result<
    (
        OauthFlowHandle,
        String,
        oneshot::Sender<String>,
        oneshot::Receiver<FlowOutcome>,
    ),
    String,
> {
    let listener = Arc::new(LoopbackListener::bind(preferred_port)?);
    let url = listener.url();
    let cancel = CancellationToken::new();
    let (explicit_tx, explicit_rx) = oneshot::channel::<String>();
    let (outcome_tx, outcome_rx) = oneshot::channel();

    let task_cancel = cancel.clone();
    tokio::spawn(async move {
        let outcome = run_flow(listener, task_cancel, explicit_rx).await;
        let _ = outcome_tx.send(outcome);
    });

    Ok((OauthFlowHandle { cancel }, url, explicit_tx, outcome_rx))
}

async fn run_flow(
    listener: Arc<LoopbackListener>,
    cancel: CancellationToken,
    explicit_rx: oneshot::Receiver<String>,
) -> FlowOutcome {
    let blocking_cancel = cancel.clone();
    let blocking = tokio::task::spawn_blocking(move || {
        let deadline = Instant::now() + FLOW_TIMEOUT;
        loop {
            if blocking_cancel.is_cancelled() {
                return FlowOutcome::Cancelled;
            }
            if Instant::now() >= deadline {
                return FlowOutcome::TimedOut;
            }
            if let Some(callback) = listener.await_callback(POLL_SLICE) {
                return FlowOutcome::Completed {
                    code: extract_code(&callback.path_and_query).unwrap_or_default(),
                };
            }
        }
    });

    tokio::select! {
        _ = cancel.cancelled() => FlowOutcome::Cancelled,
        code = explicit_rx => {
            cancel.cancel();
            match code {
                Ok(code) => FlowOutcome::Completed { code },
                Err(_) => FlowOutcome::Cancelled,
            }
        }
        result = blocking => result.unwrap_or(FlowOutcome::Cancelled),
    }
}

fn extract_code(path_and_query: &str) -> Option<String> {
    let query = path_and_query.split_once('?').map(|(_, q)| q)?;
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == "code" {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_code_reads_query_param() {
        assert_eq!(extract_code("/?code=abc123"), Some("abc123".to_string()));
        assert_eq!(extract_code("/?foo=bar"), None);
        assert_eq!(extract_code("/"), None);
    }
}
