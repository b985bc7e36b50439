//! Process-wide admission control for external model calls.
//!
//! One gate is built by the orchestration layer and cloned into every client that
//! issues requests. Clones share the same permit pool.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::ModelError;

#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

/// Held for the duration of one external call; released on drop
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub async fn acquire(&self) -> Result<AdmissionPermit, ModelError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ModelError::GateClosed)?;
        Ok(AdmissionPermit { _permit: permit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_permits() {
        let gate = AdmissionGate::new(2);
        let other = gate.clone();
        let first = gate.acquire().await.unwrap();
        let _second = other.acquire().await.unwrap();
        assert_eq!(gate.available(), 0);
        drop(first);
        assert_eq!(other.available(), 1);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        assert_eq!(AdmissionGate::new(0).limit(), 1);
    }
}
