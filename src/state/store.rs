//! State store trait definition.
//!
//! This module defines the common interface for state storage backends.

use async_trait::async_trait;

use super::types::ApplyState;
use crate::error::Result;

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the applied state.
    ///
    /// Returns `None` if nothing was applied yet.
    async fn load(&self) -> Result<Option<ApplyState>>;

    /// Saves the applied state.
    async fn save(&self, state: &ApplyState) -> Result<()>;
}

#[async_trait]
impl StateStore for Box<dyn StateStore> {
    async fn load(&self) -> Result<Option<ApplyState>> {
        (**self).load().await
    }

    async fn save(&self, state: &ApplyState) -> Result<()> {
        (**self).save(state).await
    }
}
