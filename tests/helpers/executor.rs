//! Scripted in-memory executor.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use steward::domain::ports::{
    DelegationReply, DelegationRequest, ExecutorError, ResponseReport, TaskExecutor,
};

/// `TaskExecutor` fed from reply queues. An empty queue yields the
/// benign default: successful delegation, silent status report.
#[derive(Default)]
pub struct MockExecutor {
    delegate_replies: Mutex<VecDeque<Result<DelegationReply, ExecutorError>>>,
    check_replies: Mutex<VecDeque<Result<ResponseReport, ExecutorError>>>,
    pub delegate_calls: Mutex<Vec<String>>,
    pub check_calls: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_delegate(&self, reply: Result<DelegationReply, ExecutorError>) {
        self.delegate_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_check(&self, reply: Result<ResponseReport, ExecutorError>) {
        self.check_replies.lock().unwrap().push_back(reply);
    }

    pub fn delegate_call_count(&self) -> usize {
        self.delegate_calls.lock().unwrap().len()
    }

    pub fn check_call_count(&self) -> usize {
        self.check_calls.lock().unwrap().len()
    }

    pub fn accepted() -> ResponseReport {
        ResponseReport {
            accepted: true,
            raw_output: "accepted".to_string(),
            ..ResponseReport::default()
        }
    }

    pub fn in_progress() -> ResponseReport {
        ResponseReport {
            in_progress: true,
            raw_output: "working".to_string(),
            ..ResponseReport::default()
        }
    }

    pub fn completed() -> ResponseReport {
        ResponseReport {
            completed: true,
            raw_output: "done".to_string(),
            ..ResponseReport::default()
        }
    }

    pub fn declined(detail: &str) -> DelegationReply {
        DelegationReply {
            success: false,
            detail: detail.to_string(),
        }
    }
}

#[async_trait]
impl TaskExecutor for MockExecutor {
    async fn delegate(
        &self,
        request: DelegationRequest<'_>,
    ) -> Result<DelegationReply, ExecutorError> {
        self.delegate_calls
            .lock()
            .unwrap()
            .push(request.task_id.to_string());
        self.delegate_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(DelegationReply {
                    success: true,
                    detail: "queued".to_string(),
                })
            })
    }

    async fn check_response(&self, task_id: &str) -> Result<ResponseReport, ExecutorError> {
        self.check_calls.lock().unwrap().push(task_id.to_string());
        self.check_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ResponseReport::default()))
    }
}
