/// An async job started once its guarded wait fires.
///
/// See [`GuardedScheduler::spawn_after`](crate::GuardedScheduler::spawn_after).
#[async_trait::async_trait]
pub trait TaskRunner: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn run(&self) -> anyhow::Result<Self::Output>;
}
