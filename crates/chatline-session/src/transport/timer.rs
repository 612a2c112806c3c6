use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{RetryTimer, TimerToken};

/// Retry timer backed by a sleeping tokio task.
pub struct TokioRetryTimer {
    fired_tx: mpsc::Sender<TimerToken>,
    pending: Option<JoinHandle<()>>,
}

impl TokioRetryTimer {
    pub fn new(fired_tx: mpsc::Sender<TimerToken>) -> Self {
        Self {
            fired_tx,
            pending: None,
        }
    }
}

impl RetryTimer for TokioRetryTimer {
    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        self.cancel();
        let fired_tx = self.fired_tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired_tx.send(token).await;
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioRetryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fires_token_after_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TokioRetryTimer::new(tx);

        timer.schedule(Duration::from_millis(10), TimerToken(7));

        let token = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(token, Some(TimerToken(7)));
    }

    #[tokio::test]
    async fn cancel_prevents_firing() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TokioRetryTimer::new(tx);

        timer.schedule(Duration::from_millis(20), TimerToken(1));
        timer.cancel();
        timer.cancel();

        let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(result.is_err(), "cancelled timer must not fire");
    }

    #[tokio::test]
    async fn rescheduling_replaces_previous_timer() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TokioRetryTimer::new(tx);

        timer.schedule(Duration::from_millis(20), TimerToken(1));
        timer.schedule(Duration::from_millis(20), TimerToken(2));

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(TimerToken(2)));
        let second = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(second.is_err());
    }
}
