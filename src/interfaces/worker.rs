use async_trait::async_trait;

use crate::error::Result;

/// A unit of recurring work with self-reported running state.
///
/// The dispatcher reads `is_running` before invoking `run` and never
/// touches the flag itself; implementations must clear it on both the
/// success and failure paths of `run`, or they will be skipped on every
/// later cycle.
#[async_trait]
pub trait Worker: Send + Sync {
    fn key(&self) -> &str;
    fn is_running(&self) -> bool;
    async fn run(&self) -> Result<()>;
}
