use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Single-shot timer. Arming replaces whatever was armed before; cancelling an
/// already fired or cancelled timer does nothing.
#[derive(Debug, Default)]
pub struct Timer {
    cancel_token: Option<Arc<Notify>>,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&mut self, duration: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let cancel_token = Arc::new(Notify::new());
        let task_token = Arc::clone(&cancel_token);
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => on_fire.await,
                _ = task_token.notified() => {}
            }
        });

        self.cancel_token = Some(cancel_token);
        self.task = Some(task);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.notify_one();
        }
        self.task = None;
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
