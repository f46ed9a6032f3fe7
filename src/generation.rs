//! Two-stage report generation
//!
//! Outline first, report second, with the user free to edit the outline in
//! between. Each stage is a single POST to the generation backend; at most
//! one request per stage may be in flight, enforced here with an RAII
//! guard so the gate always reopens no matter how a request ends. The
//! report stage never fires automatically; the caller decides when, and
//! passes in the outline content as it stands at that moment.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{
    endpoint_url, OutlineRequest, OutlineResponse, ReportRequest, ReportResponse, OUTLINE_PATH,
    REPORT_PATH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Outline,
    Report,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Outline => "outline",
            RequestKind::Report => "report",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Succeeded,
    Failed,
}

/// One generation attempt, tracked for the lifetime of the workflow
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub kind: RequestKind,
    pub status: RequestStatus,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    /// There is nothing to generate from
    #[error("the transcript is empty")]
    EmptyInput,
    /// A request of this kind is already in flight
    #[error("{0} generation is already in progress")]
    AlreadyPending(RequestKind),
    /// The endpoint failed or could not be reached
    #[error("generation failed: {0}")]
    Failed(String),
}

#[derive(Default)]
struct WorkflowState {
    outline_pending: bool,
    report_pending: bool,
    requests: Vec<GenerationRequest>,
}

/// Client for the two generation endpoints
pub struct GenerationWorkflow {
    client: reqwest::Client,
    server: String,
    secure: bool,
    state: Mutex<WorkflowState>,
}

impl GenerationWorkflow {
    pub fn new(server: impl Into<String>, secure: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            server: server.into(),
            secure,
            state: Mutex::new(WorkflowState::default()),
        }
    }

    /// Generate an outline from the transcript.
    ///
    /// Rejects a blank transcript before anything else happens, network
    /// included. Returns the outline markdown on success.
    pub async fn generate_outline(
        &self,
        transcript: &str,
        style: &str,
    ) -> Result<String, GenerationError> {
        if transcript.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }
        let guard = self.begin(RequestKind::Outline)?;

        let url = endpoint_url(&self.server, self.secure, OUTLINE_PATH);
        let body = OutlineRequest::new(transcript, style);
        let response: OutlineResponse = self.post(&url, &body).await?;

        guard.succeed();
        Ok(response.outline)
    }

    /// Generate a report from the transcript and the outline as the user
    /// has edited it.
    ///
    /// `outline` must be read from the editable document at call time;
    /// passing a stale copy would silently drop the user's edits.
    pub async fn generate_report(
        &self,
        transcript: &str,
        outline: &str,
        style: &str,
    ) -> Result<String, GenerationError> {
        if transcript.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }
        let guard = self.begin(RequestKind::Report)?;

        let url = endpoint_url(&self.server, self.secure, REPORT_PATH);
        let body = ReportRequest::new(transcript, outline, style);
        let response: ReportResponse = self.post(&url, &body).await?;

        guard.succeed();
        Ok(response.report)
    }

    /// Every request issued through this workflow, oldest first
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.state().requests.clone()
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, GenerationError>
    where
        B: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;

        // Every non-2xx is the same failure to the caller; the body is
        // not inspected.
        if !response.status().is_success() {
            return Err(GenerationError::Failed(format!(
                "server returned {}",
                response.status()
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))
    }

    fn begin(&self, kind: RequestKind) -> Result<PendingGuard<'_>, GenerationError> {
        let mut state = self.state();
        let pending = match kind {
            RequestKind::Outline => &mut state.outline_pending,
            RequestKind::Report => &mut state.report_pending,
        };
        if *pending {
            return Err(GenerationError::AlreadyPending(kind));
        }
        *pending = true;

        let id = Uuid::new_v4();
        state.requests.push(GenerationRequest {
            id,
            kind,
            status: RequestStatus::Pending,
        });

        Ok(PendingGuard {
            workflow: self,
            kind,
            id,
        })
    }

    fn state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds a stage's in-flight slot; dropping it reopens the gate and marks
/// the request failed unless it was explicitly completed first
struct PendingGuard<'a> {
    workflow: &'a GenerationWorkflow,
    kind: RequestKind,
    id: Uuid,
}

impl PendingGuard<'_> {
    fn succeed(self) {
        let mut state = self.workflow.state();
        if let Some(request) = state.requests.iter_mut().find(|r| r.id == self.id) {
            request.status = RequestStatus::Succeeded;
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.workflow.state();
        match self.kind {
            RequestKind::Outline => state.outline_pending = false,
            RequestKind::Report => state.report_pending = false,
        }
        if let Some(request) = state.requests.iter_mut().find(|r| r.id == self.id) {
            if request.status == RequestStatus::Pending {
                request.status = RequestStatus::Failed;
            }
        }
    }
}
