//! Per-domain attempt history for diagnostics.
//!
//! Nothing here affects which price is returned.

use crate::extract::models::{DomainStats, ExtractionAttempt};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Append-only, bounded log of strategy attempts.
pub trait AttemptLog: Send + Sync {
    fn record(&self, attempt: ExtractionAttempt);

    /// Attempts for a domain, oldest first.
    fn history(&self, domain: &str) -> Vec<ExtractionAttempt>;

    /// Domains with at least one recorded attempt.
    fn domains(&self) -> Vec<String>;

    fn stats(&self, domain: &str) -> DomainStats {
        let history = self.history(domain);
        let last_win = history.iter().rev().find(|attempt| attempt.success);

        DomainStats {
            domain: domain.to_string(),
            attempts: history.len(),
            successes: history.iter().filter(|attempt| attempt.success).count(),
            last_success: last_win.map(|attempt| attempt.strategy),
            last_price: last_win.and_then(|attempt| attempt.price),
        }
    }
}

/// In-process [`AttemptLog`] keeping the last `capacity` attempts per domain.
pub struct MemoryAttemptLog {
    entries: Mutex<HashMap<String, VecDeque<ExtractionAttempt>>>,
    capacity: usize,
}

impl MemoryAttemptLog {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), capacity: capacity.max(1) }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<ExtractionAttempt>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AttemptLog for MemoryAttemptLog {
    fn record(&self, attempt: ExtractionAttempt) {
        let mut entries = self.lock();
        let history = entries.entry(attempt.domain.as_str().to_string()).or_default();

        history.push_back(attempt);
        while history.len() > self.capacity {
            history.pop_front();
        }
    }

    fn history(&self, domain: &str) -> Vec<ExtractionAttempt> {
        self.lock().get(domain).map(|h| h.iter().cloned().collect()).unwrap_or_default()
    }

    fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.lock().keys().cloned().collect();
        domains.sort();
        domains
    }
}
