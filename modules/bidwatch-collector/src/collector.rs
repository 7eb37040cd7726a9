//! The collection pass: plan → fetch pages → filter → dedupe → one batched append.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use bidwatch_common::{BidNotice, BidwatchError, Config, SheetRow};
use nara_client::{BidItem, NaraError, Pagination};

use crate::dedup::{DedupVerdict, Deduplicator};
use crate::filter::{FilterVerdict, NoticeFilter};
use crate::query::{plan_queries, QueryBuilder, QueryPlan};
use crate::stats::CollectStats;
use crate::traits::{NoticeSink, NoticeSource};

pub struct Collector<'a> {
    config: &'a Config,
    source: &'a dyn NoticeSource,
    sink: &'a dyn NoticeSink,
    dry_run: bool,
}

/// Mutable state of one run. Dropped when the run ends.
struct RunState {
    filter: NoticeFilter,
    dedup: Deduplicator,
    rows: Vec<SheetRow>,
    stats: CollectStats,
    collected_at: DateTime<Local>,
}

impl<'a> Collector<'a> {
    pub fn new(config: &'a Config, source: &'a dyn NoticeSource, sink: &'a dyn NoticeSink) -> Self {
        Self {
            config,
            source,
            sink,
            dry_run: false,
        }
    }

    /// Run everything except the header and row writes.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one full pass. `now` fixes both the inquiry window and the
    /// `collected_at` column.
    ///
    /// A query that fails with a client error, a malformed page or a
    /// non-success result code is abandoned and the run moves on; rows it
    /// queued from earlier pages are kept. An exhausted retry budget or a
    /// destination store failure ends the run.
    pub async fn run(&self, now: DateTime<Local>) -> Result<CollectStats, BidwatchError> {
        let builder = QueryBuilder::new(self.config, now);
        let plans = plan_queries(self.config);

        info!(
            begin = %builder.window().begin,
            end = %builder.window().end,
            queries = plans.len(),
            sink = self.sink.name(),
            dry_run = self.dry_run,
            "Starting bid notice collection"
        );

        if !self.dry_run {
            self.sink.ensure_header().await.map_err(sink_error)?;
        }

        let existing = if self.config.read_existing_pk {
            self.sink
                .existing_keys(self.config.existing_pk_lookback)
                .await
                .map_err(sink_error)?
        } else {
            HashSet::new()
        };
        info!(keys = existing.len(), "Loaded existing keys");

        let mut state = RunState {
            filter: NoticeFilter::from_config(self.config),
            stats: CollectStats {
                existing_keys: existing.len() as u32,
                ..CollectStats::default()
            },
            dedup: Deduplicator::new(existing),
            rows: Vec::new(),
            collected_at: now,
        };

        for plan in &plans {
            state.stats.plans_run += 1;
            match self.collect_plan(plan, &builder, &mut state).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    error!(query = %plan.label, error = %e, "Upstream unavailable, aborting run");
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(query = %plan.label, error = %e, "Abandoning query");
                    state.stats.plans_abandoned += 1;
                }
            }
            info!(query = %plan.label, queued = state.rows.len(), "Query complete");
        }

        let RunState { rows, mut stats, .. } = state;

        if rows.is_empty() {
            info!("No new bid notices");
            return Ok(stats);
        }

        if self.dry_run {
            for row in &rows {
                debug!(pk = %row.pk, title = %row.title, "Would append");
            }
            info!(rows = rows.len(), "Dry run, skipping append");
            return Ok(stats);
        }

        self.sink.append_rows(&rows).await.map_err(sink_error)?;
        stats.rows_written = rows.len() as u32;
        info!(rows = rows.len(), sink = self.sink.name(), "Appended new bid notices");

        Ok(stats)
    }

    async fn collect_plan(
        &self,
        plan: &QueryPlan,
        builder: &QueryBuilder,
        state: &mut RunState,
    ) -> Result<(), NaraError> {
        let mut cursor = Pagination::new(builder.page_size());
        loop {
            let params = builder.params(plan, cursor.page());
            let page = self.source.fetch_page(&params).await?;
            state.stats.pages_fetched += 1;
            debug!(
                query = %plan.label,
                page_no = params.page_no,
                items = page.items.len(),
                total_count = ?page.total_count,
                "Fetched page"
            );

            for item in &page.items {
                self.process_item(item, state);
            }

            if !cursor.advance(&page) {
                return Ok(());
            }
        }
    }

    fn process_item(&self, item: &BidItem, state: &mut RunState) {
        state.stats.items_seen += 1;
        let notice = BidNotice::from_item(item, &self.config.fields);

        let verdict = state.filter.check(&notice);
        state.stats.record_filter(&verdict);
        let FilterVerdict::Accept { matched } = verdict else {
            return;
        };

        let pk = notice.primary_key();
        let verdict = state.dedup.admit(&pk);
        state.stats.record_dedup(verdict);
        if verdict == DedupVerdict::New {
            state
                .rows
                .push(SheetRow::new(&notice, matched, state.collected_at));
        }
    }
}

fn sink_error(err: anyhow::Error) -> BidwatchError {
    BidwatchError::Sink(format!("{err:#}"))
}
