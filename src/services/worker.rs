use crate::services::jobs::JobTracker;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Periodically forgets finished batch jobs
pub struct BackgroundWorker {
    jobs: Arc<JobTracker>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(jobs: Arc<JobTracker>, interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            jobs,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Background worker started");

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.perform_cleanup();
                }
            }
        }
    }

    fn perform_cleanup(&self) {
        let pruned = self.jobs.prune(Utc::now());
        if pruned > 0 {
            tracing::info!("🧹 Pruned {} finished batch jobs", pruned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::dropbox::DropboxClient;

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let config = AppConfig::development();
        let api = Arc::new(DropboxClient::new(&config).unwrap());
        let jobs = Arc::new(JobTracker::new(api, &config));
        let (tx, rx) = watch::channel(false);

        let worker = BackgroundWorker::new(jobs, Duration::from_secs(3600), rx);
        let handle = tokio::spawn(worker.run());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker did not stop")
            .unwrap();
    }
}
