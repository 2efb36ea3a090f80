// ==========================================
// Mock 提议器 - 用于集成测试
// ==========================================

use assembly_rebalance_aps::engine::{FactSummary, ProposalError, StrategyProposer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 延迟返回的提议器（超时测试）
pub struct SlowProposer {
    pub delay: Duration,
    pub text: String,
}

#[async_trait]
impl StrategyProposer for SlowProposer {
    fn name(&self) -> &str {
        "slow"
    }

    async fn propose(&self, _facts: &FactSummary) -> Result<String, ProposalError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.clone())
    }
}

/// 记录收到的事实摘要的提议器
#[derive(Default)]
pub struct RecordingProposer {
    pub calls: AtomicUsize,
    pub last_brief: std::sync::Mutex<Option<String>>,
    pub text: String,
}

impl RecordingProposer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StrategyProposer for RecordingProposer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn propose(&self, facts: &FactSummary) -> Result<String, ProposalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_brief.lock() {
            *guard = Some(facts.render_brief());
        }
        Ok(self.text.clone())
    }
}
