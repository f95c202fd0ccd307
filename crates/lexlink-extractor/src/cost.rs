//! Token usage and cost tracking
//!
//! One tracker is shared by every concurrent model call of a run. Spending is
//! accumulated in nano-dollars so that it can live in an atomic. The budget
//! is checked before each call, so the final spend may overshoot the ceiling
//! by at most the cost of the calls already in flight.

use crate::config::Pricing;
use crate::error::ExtractorError;
use lexlink_domain::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const NANOS_PER_DOLLAR: f64 = 1_000_000_000.0;

/// Accumulates token usage and estimated spend across a run
#[derive(Debug)]
pub struct CostTracker {
    pricing: Pricing,
    budget_usd: Option<f64>,
    spent_nanos: AtomicU64,
    calls: AtomicU64,
    failed_calls: AtomicU64,
    refused_calls: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    exhausted: AtomicBool,
}

impl CostTracker {
    /// Create a tracker; `budget_usd = None` means unlimited
    pub fn new(pricing: Pricing, budget_usd: Option<f64>) -> Self {
        Self {
            pricing,
            budget_usd,
            spent_nanos: AtomicU64::new(0),
            calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
            refused_calls: AtomicU64::new(0),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Unlimited tracker with default pricing
    pub fn unlimited() -> Self {
        Self::new(Pricing::default(), None)
    }

    /// Dollars spent so far
    pub fn spent_usd(&self) -> f64 {
        self.spent_nanos.load(Ordering::Relaxed) as f64 / NANOS_PER_DOLLAR
    }

    /// Whether the ceiling has been reached
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }

    /// Check the budget before a call
    ///
    /// Once refused, every later check is refused too.
    pub fn check_budget(&self) -> Result<(), ExtractorError> {
        let Some(budget) = self.budget_usd else {
            return Ok(());
        };
        let spent = self.spent_usd();
        if self.is_exhausted() || spent >= budget {
            self.exhausted.store(true, Ordering::Relaxed);
            self.refused_calls.fetch_add(1, Ordering::Relaxed);
            return Err(ExtractorError::BudgetExhausted { spent, budget });
        }
        Ok(())
    }

    /// Record a completed call
    pub fn record(&self, usage: TokenUsage) {
        let cost = self.pricing.cost(usage.prompt_tokens, usage.completion_tokens);
        let nanos = (cost * NANOS_PER_DOLLAR).ceil() as u64;
        self.spent_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.prompt_tokens.fetch_add(usage.prompt_tokens, Ordering::Relaxed);
        self.completion_tokens.fetch_add(usage.completion_tokens, Ordering::Relaxed);
    }

    /// Record a call that failed before reporting usage
    pub fn record_failure(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.failed_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the counters
    pub fn summary(&self) -> CostSummary {
        let prompt_tokens = self.prompt_tokens.load(Ordering::Relaxed);
        let completion_tokens = self.completion_tokens.load(Ordering::Relaxed);
        CostSummary {
            calls: self.calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            refused_calls: self.refused_calls.load(Ordering::Relaxed),
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            estimated_cost_usd: self.spent_usd(),
            budget_usd: self.budget_usd,
            budget_exhausted: self.is_exhausted(),
        }
    }
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Point-in-time view of model usage for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// Model calls made, failed ones included
    pub calls: u64,
    /// Calls that errored or timed out
    pub failed_calls: u64,
    /// Calls not made because the budget was exhausted
    pub refused_calls: u64,
    /// Prompt tokens consumed
    pub prompt_tokens: u64,
    /// Completion tokens consumed
    pub completion_tokens: u64,
    /// Prompt plus completion tokens
    pub total_tokens: u64,
    /// Estimated spend in dollars
    pub estimated_cost_usd: f64,
    /// Configured ceiling, if any
    pub budget_usd: Option<f64>,
    /// Whether the ceiling was hit
    pub budget_exhausted: bool,
}

impl fmt::Display for CostSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Calls: {} ({} failed, {} refused) | Total tokens: {} | Total cost: ${:.4}",
            self.calls,
            self.failed_calls,
            self.refused_calls,
            self.total_tokens,
            self.estimated_cost_usd
        )?;
        if let Some(budget) = self.budget_usd {
            write!(f, " of ${:.4}", budget)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn usage(prompt: u64, completion: u64) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
        }
    }

    #[test]
    fn test_records_usage_and_cost() {
        let tracker = CostTracker::unlimited();
        tracker.record(usage(1_000_000, 0));
        tracker.record(usage(0, 1_000_000));
        let summary = tracker.summary();
        assert_eq!(summary.calls, 2);
        assert_eq!(summary.total_tokens, 2_000_000);
        assert!((summary.estimated_cost_usd - 0.75).abs() < 1e-6);
        assert!(!summary.budget_exhausted);
    }

    #[test]
    fn test_unlimited_never_refuses() {
        let tracker = CostTracker::unlimited();
        tracker.record(usage(100_000_000, 100_000_000));
        assert!(tracker.check_budget().is_ok());
    }

    #[test]
    fn test_budget_refusal_is_sticky() {
        let tracker = CostTracker::new(Pricing::default(), Some(0.15));
        assert!(tracker.check_budget().is_ok());
        tracker.record(usage(1_000_000, 0));

        let err = tracker.check_budget().unwrap_err();
        assert!(matches!(err, ExtractorError::BudgetExhausted { .. }));
        assert!(!err.is_retryable());
        assert!(tracker.check_budget().is_err());

        let summary = tracker.summary();
        assert_eq!(summary.refused_calls, 2);
        assert!(summary.budget_exhausted);
    }

    #[test]
    fn test_zero_budget_refuses_first_call() {
        let tracker = CostTracker::new(Pricing::default(), Some(0.0));
        assert!(tracker.check_budget().is_err());
        assert_eq!(tracker.summary().calls, 0);
    }

    #[test]
    fn test_failures_counted() {
        let tracker = CostTracker::unlimited();
        tracker.record_failure();
        let summary = tracker.summary();
        assert_eq!(summary.calls, 1);
        assert_eq!(summary.failed_calls, 1);
        assert_eq!(summary.estimated_cost_usd, 0.0);
    }

    #[test]
    fn test_concurrent_recording() {
        let tracker = Arc::new(CostTracker::unlimited());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.record(usage(10, 5));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let summary = tracker.summary();
        assert_eq!(summary.calls, 800);
        assert_eq!(summary.prompt_tokens, 8_000);
        assert_eq!(summary.completion_tokens, 4_000);
    }

    #[test]
    fn test_summary_display() {
        let tracker = CostTracker::new(Pricing::default(), Some(1.0));
        tracker.record(usage(1000, 100));
        let text = tracker.summary().to_string();
        assert!(text.contains("Total tokens: 1100"));
        assert!(text.contains("of $1.0000"));
    }
}
