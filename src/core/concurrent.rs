use crate::domain::model::{CheckOutcome, DatastreamCheck, ObjectFailure};
use crate::utils::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

/// Called once per finished object with its pid.
pub type ProgressHook = Arc<dyn Fn(&str) + Send + Sync>;

type Joined = std::result::Result<(String, Result<Vec<DatastreamCheck>>), JoinError>;

/// Run `check` for every pid with at most `concurrency` in flight.
///
/// Pids are pulled from the iterator only when a slot is free.
/// A failing object is recorded in `failures` and does not stop the run.
/// Results are sorted by pid, datastream and version.
pub async fn check_objects<I, F, Fut>(
    pids: I,
    concurrency: usize,
    progress: Option<ProgressHook>,
    check: F,
) -> CheckOutcome
where
    I: IntoIterator<Item = String>,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<DatastreamCheck>>> + Send + 'static,
{
    let limit = concurrency.max(1);
    let check = Arc::new(check);
    let mut tasks = JoinSet::new();
    let mut outcome = CheckOutcome::default();

    for pid in pids {
        while tasks.len() >= limit {
            match tasks.join_next().await {
                Some(joined) => record(&mut outcome, joined, progress.as_ref()),
                None => break,
            }
        }
        let check = check.clone();
        tasks.spawn(async move {
            let result = check(pid.clone()).await;
            (pid, result)
        });
    }
    while let Some(joined) = tasks.join_next().await {
        record(&mut outcome, joined, progress.as_ref());
    }

    outcome.checks.sort_by(|a, b| {
        (&a.pid, &a.dsid, a.version).cmp(&(&b.pid, &b.dsid, b.version))
    });
    outcome.failures.sort_by(|a, b| a.pid.cmp(&b.pid));
    outcome
}

fn record(outcome: &mut CheckOutcome, joined: Joined, progress: Option<&ProgressHook>) {
    match joined {
        Ok((pid, Ok(checks))) => {
            tracing::debug!("Checked {} ({} datastream version(s))", pid, checks.len());
            outcome.objects += 1;
            outcome.checks.extend(checks);
            if let Some(hook) = progress {
                hook(&pid);
            }
        }
        Ok((pid, Err(e))) => {
            tracing::warn!("⚠️ Failed to process {}: {}", pid, e);
            if let Some(hook) = progress {
                hook(&pid);
            }
            outcome.failures.push(ObjectFailure {
                pid,
                message: e.to_string(),
            });
        }
        Err(e) => {
            tracing::error!("❌ Worker task aborted: {}", e);
            outcome.failures.push(ObjectFailure {
                pid: String::new(),
                message: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumType;
    use crate::domain::model::ChecksumStatus;
    use crate::utils::error::FedoraError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn check(pid: &str, dsid: &str) -> DatastreamCheck {
        DatastreamCheck {
            pid: pid.to_string(),
            dsid: dsid.to_string(),
            version: None,
            status: ChecksumStatus::Valid,
            checksum_type: ChecksumType::Md5,
            checksum: None,
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let pids = vec!["demo:2".to_string(), "demo:bad".to_string(), "demo:1".to_string()];
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let hook: ProgressHook = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = check_objects(pids, 2, Some(hook), |pid| async move {
            if pid == "demo:bad" {
                Err(FedoraError::NotFound { what: pid })
            } else {
                Ok(vec![check(&pid, "DC"), check(&pid, "AUDIT")])
            }
        })
        .await;

        assert_eq!(outcome.objects, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].pid, "demo:bad");
        assert_eq!(outcome.checks.len(), 4);
        assert_eq!(outcome.checks[0].pid, "demo:1");
        assert_eq!(outcome.checks[0].dsid, "AUDIT");
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let pids: Vec<String> = (0..12).map(|i| format!("demo:{}", i)).collect();

        let (a, p) = (active.clone(), peak.clone());
        check_objects(pids, 3, None, move |_pid| {
            let (a, p) = (a.clone(), p.clone());
            async move {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                Ok(vec![])
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
    #[tokio::test]
    async fn test_pids_are_pulled_as_slots_free_up() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));
        let widest = Arc::new(AtomicUsize::new(0));

        let (p, d, w) = (pulled.clone(), done.clone(), widest.clone());
        let pids = (0..20).map(move |i| {
            let now = p.fetch_add(1, Ordering::SeqCst) + 1;
            w.fetch_max(now.saturating_sub(d.load(Ordering::SeqCst)), Ordering::SeqCst);
            format!("demo:{}", i)
        });

        let finished = done.clone();
        let outcome = check_objects(pids, 4, None, move |_pid| {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(vec![])
            }
        })
        .await;

        assert_eq!(outcome.objects, 20);
        assert_eq!(pulled.load(Ordering::SeqCst), 20);
        assert!(widest.load(Ordering::SeqCst) <= 4);
    }
}
