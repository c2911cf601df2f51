//! Bounded concurrent enrichment of a table batch.

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::future::Future;

use crate::error::{Result, SchemaError};
use crate::types::Table;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Run `enrich` for every table with at most `limit` calls in flight.
///
/// Each call owns its table exclusively, so the slice keeps its listing
/// order no matter in which order calls finish. A failure does not cancel
/// the other calls: every call runs to completion and the first error
/// observed is returned. Tables whose call succeeded stay enriched.
pub async fn enrich_concurrently<'a, F, Fut>(
    tables: &'a mut [Table],
    limit: usize,
    mut enrich: F,
) -> Result<()>
where
    F: FnMut(&'a mut Table) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'a,
{
    // Futures are lazy: building them all up front starts no work.
    let tasks: Vec<BoxFuture<'a, (String, Result<()>)>> = tables
        .iter_mut()
        .map(|table| {
            let name = table.name.clone();
            let task = enrich(table);
            async move { (name, task.await) }.boxed()
        })
        .collect();
    let mut pending = stream::iter(tasks).buffer_unordered(limit.max(1));

    let mut first_error: Option<SchemaError> = None;
    while let Some((_name, result)) = pending.next().await {
        let Err(err) = result else {
            continue;
        };
        if first_error.is_none() {
            #[cfg(feature = "tracing")]
            warn!(table = %_name, error = %err, "table enrichment failed");
            first_error = Some(err);
        } else {
            #[cfg(feature = "tracing")]
            debug!(table = %_name, error = %err, "discarding additional enrichment error");
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn tables(count: usize) -> Vec<Table> {
        (0..count)
            .map(|i| Table::new("app", format!("t{i}")))
            .collect()
    }

    #[tokio::test]
    async fn enriches_every_table_in_place() {
        let mut batch = tables(20);
        enrich_concurrently(&mut batch, 4, |table| async move {
            table.definition = format!("CREATE TABLE {}", table.name);
            Ok(())
        })
        .await
        .unwrap();

        for (i, table) in batch.iter().enumerate() {
            assert_eq!(table.name, format!("t{i}"));
            assert_eq!(table.definition, format!("CREATE TABLE t{i}"));
        }
    }

    #[tokio::test]
    async fn one_failure_still_completes_the_rest() {
        let mut batch = tables(10);
        let finished = AtomicUsize::new(0);

        let err = enrich_concurrently(&mut batch, 8, |table| {
            let finished = &finished;
            async move {
                // Let the failing task finish first.
                if table.name != "t3" {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                finished.fetch_add(1, Ordering::SeqCst);
                if table.name == "t3" {
                    return Err(SchemaError::Config("boom".into()));
                }
                table.comment = "enriched".into();
                Ok(())
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "configuration error: boom");
        assert_eq!(finished.load(Ordering::SeqCst), 10);
        let enriched = batch.iter().filter(|t| t.comment == "enriched").count();
        assert_eq!(enriched, 9);
        assert!(batch.iter().find(|t| t.name == "t3").unwrap().comment.is_empty());
    }

    #[tokio::test]
    async fn only_the_first_error_is_returned() {
        let mut batch = tables(3);
        let err = enrich_concurrently(&mut batch, 1, |table| async move {
            Err(SchemaError::Config(table.name.clone()))
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "configuration error: t0");
    }

    #[tokio::test]
    async fn respects_the_concurrency_limit() {
        let mut batch = tables(12);
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        enrich_concurrently(&mut batch, 3, |_table| {
            let (running, peak) = (&running, &peak);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    struct Enricher;

    impl Enricher {
        async fn enrich(&self, table: &mut Table) -> Result<()> {
            tokio::task::yield_now().await;
            table.comment = format!("{} enriched", table.name);
            Ok(())
        }
    }

    #[async_trait::async_trait]
    trait EnrichAll: Send + Sync {
        async fn enrich_all(&self, tables: &mut [Table]) -> Result<()>;
    }

    #[async_trait::async_trait]
    impl EnrichAll for Enricher {
        async fn enrich_all(&self, tables: &mut [Table]) -> Result<()> {
            enrich_concurrently(tables, 2, |table| self.enrich(table)).await
        }
    }

    #[tokio::test]
    async fn runs_inside_async_trait_methods() {
        let mut batch = tables(5);
        let enricher: Box<dyn EnrichAll> = Box::new(Enricher);
        enricher.enrich_all(&mut batch).await.unwrap();
        assert_eq!(batch[4].comment, "t4 enriched");
    }

    #[tokio::test]
    async fn empty_batch_is_ok() {
        let mut batch: Vec<Table> = Vec::new();
        enrich_concurrently(&mut batch, 8, |_table| async { Ok(()) })
            .await
            .unwrap();
    }
}
