//! The tool mediator (§4.3): risk classification plus ask/approval
//! request-response correlation.
//!
//! At most one prompt is "active" (emitted to the client) per session at
//! a time; additional prompts queue FIFO and are emitted as earlier ones
//! resolve, matching the concurrency note in §4.3.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;

use agentsrv_protocol::ApprovalRiskCode;
use agentsrv_protocol::RequestId;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::debug;

pub use agentsrv_policy::ToolInvocation;

/// The sentinel answer a client sends to unblock a prompt it is abandoning.
pub const SKIPPED: &str = "[skipped]";

#[derive(Debug, Clone)]
pub enum PromptRequest {
    Ask {
        request_id: RequestId,
        question: String,
        options: Option<Vec<String>>,
    },
    Approval {
        request_id: RequestId,
        command: String,
        dangerous: bool,
        reason_code: ApprovalRiskCode,
    },
}

impl PromptRequest {
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::Ask { request_id, .. } | Self::Approval { request_id, .. } => request_id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PromptResponse {
    Answer(String),
    Approved(bool),
}

struct QueuedPrompt {
    request: PromptRequest,
    reply: oneshot::Sender<PromptResponse>,
}

/// Outcome of routing a tool call through the mediator: either it was
/// auto-approved (yolo or a safe classification), or a prompt was raised
/// and the caller must await its resolution.
pub enum MediatorOutcome {
    AutoApproved,
    Prompted(oneshot::Receiver<PromptResponse>),
}

pub struct ToolMediator {
    workspace_root: PathBuf,
    emit_tx: mpsc::UnboundedSender<PromptRequest>,
    active: Mutex<Option<RequestId>>,
    queue: Mutex<VecDeque<QueuedPrompt>>,
    waiters: Mutex<HashMap<RequestId, QueuedPrompt>>,
}

impl ToolMediator {
    pub fn new(workspace_root: PathBuf, emit_tx: mpsc::UnboundedSender<PromptRequest>) -> Self {
        Self {
            workspace_root,
            emit_tx,
            active: Mutex::new(None),
            queue: Mutex::new(VecDeque::new()),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    pub fn classify(&self, invocation: &ToolInvocation<'_>) -> ApprovalRiskCode {
        agentsrv_policy::classify(invocation, &self.workspace_root)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Route one tool invocation's approval decision. `yolo` bypasses
    /// interactive approval unless the classification is
    /// `OutsideAllowedScope`, which is never bypassed (§4.3).
    pub async fn request_approval(
        &self,
        command: String,
        reason_code: ApprovalRiskCode,
        yolo: bool,
    ) -> MediatorOutcome {
        if yolo && reason_code.yolo_bypasses() {
            return MediatorOutcome::AutoApproved;
        }
        let request_id = RequestId::new();
        let dangerous = reason_code.is_dangerous();
        let request = PromptRequest::Approval {
            request_id: request_id.clone(),
            command,
            dangerous,
            reason_code,
        };
        MediatorOutcome::Prompted(self.submit(request_id, request).await)
    }

    /// Route a free-form `ask` prompt. There is no yolo bypass for asks:
    /// they are not tool approvals, they are questions the turn itself
    /// needs answered.
    pub async fn request_ask(
        &self,
        question: String,
        options: Option<Vec<String>>,
    ) -> oneshot::Receiver<PromptResponse> {
        let request_id = RequestId::new();
        let request = PromptRequest::Ask {
            request_id: request_id.clone(),
            question,
            options,
        };
        self.submit(request_id, request).await
    }

    async fn submit(
        &self,
        request_id: RequestId,
        request: PromptRequest,
    ) -> oneshot::Receiver<PromptResponse> {
        let (tx, rx) = oneshot::channel();
        let mut active = self.active.lock().await;
        if active.is_some() {
            self.queue.lock().await.push_back(QueuedPrompt {
                request,
                reply: tx,
            });
            return rx;
        }
        *active = Some(request_id.clone());
        drop(active);
        self.waiters.lock().await.insert(
            request_id,
            QueuedPrompt {
                request: request.clone(),
                reply: tx,
            },
        );
        let _ = self.emit_tx.send(request);
        rx
    }

    /// Resolve an outstanding request by id. Unknown ids are a caller
    /// protocol error, per §4.3 ("dropped and an error of source protocol
    /// is emitted") — the session layer is responsible for emitting that
    /// error when this returns `false`.
    pub async fn resolve(&self, request_id: &RequestId, response: PromptResponse) -> bool {
        let waiter = self.waiters.lock().await.remove(request_id);
        let Some(waiter) = waiter else {
            debug!(request_id = %request_id, "resolve for unknown or already-resolved request");
            return false;
        };
        let _ = waiter.reply.send(response);
        {
            let mut active = self.active.lock().await;
            if active.as_ref() == Some(request_id) {
                *active = None;
            }
        }
        self.advance().await;
        true
    }

    /// Pop and emit the next queued prompt, if any and none is active.
    async fn advance(&self) {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return;
        }
        let Some(next) = self.queue.lock().await.pop_front() else {
            return;
        };
        let request_id = next.request.request_id().clone();
        *active = Some(request_id.clone());
        drop(active);
        let request = next.request.clone();
        self.waiters.lock().await.insert(request_id, next);
        let _ = self.emit_tx.send(request);
    }

    /// Answer every outstanding and queued prompt with the synthetic skip
    /// response so a cancelled turn's tools never leak (§4.2 cancellation) —
    /// an approval skips to `Approved(false)`, an ask to the `SKIPPED` text,
    /// matching `skip_response`'s handling of queued prompts.
    pub async fn cancel_all(&self) {
        let waiters: Vec<_> = self.waiters.lock().await.drain().collect();
        for (_, waiter) in waiters {
            let _ = waiter.reply.send(skip_response(&waiter.request));
        }
        *self.active.lock().await = None;
        let queued: Vec<_> = self.queue.lock().await.drain(..).collect();
        for queued in queued {
            let _ = queued.reply.send(skip_response(&queued.request));
        }
    }
}

fn skip_response(request: &PromptRequest) -> PromptResponse {
    match request {
        PromptRequest::Ask { .. } => PromptResponse::Answer(SKIPPED.to_string()),
        PromptRequest::Approval { .. } => PromptResponse::Approved(false),
    }
}
