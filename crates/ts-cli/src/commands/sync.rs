//! Sync command: reconcile Harvest time records into Tempo work logs.

use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use clap::Args;

use ts_core::{
    BoxError, CreateWorkLog, FetchTimeRecords, FetchWorkLogs, Reconciler, WorkLogEntry,
};
use ts_tempo::{TempoReader, TempoWriter};

use crate::Config;

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Report what would be created without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Totals across one full run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub records: usize,
    pub created: usize,
    pub skipped: usize,
}

pub fn run(args: &SyncArgs, config: &Config) -> Result<SyncReport> {
    ensure!(
        !config.harvest_project_id.trim().is_empty(),
        "harvest_project_id is not configured (set TIMESYNC_HARVEST_PROJECT_ID or config.toml)"
    );
    let fallback = config
        .fallback_ref()
        .context("invalid fallback_issue in configuration")?;

    let harvest = ts_harvest::Client::new(&config.harvest_account_id, &config.harvest_token)
        .context("failed to create Harvest client")?;
    let jira = ts_jira::Client::new(&config.jira_base_url, &config.jira_user, &config.jira_token)
        .context("failed to create Jira client")?;
    let tempo = ts_tempo::Client::new(&config.tempo_token, &config.tempo_author_account_id)
        .context("failed to create Tempo client")?;

    let reader = TempoReader::new(tempo.clone(), fallback.clone(), jira.clone());
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    if args.dry_run {
        let reconciler = Reconciler::new(fallback, reader, DryRunWriter);
        runtime.block_on(sync_all(&harvest, &reconciler, &config.harvest_project_id))
    } else {
        let writer = TempoWriter::new(tempo, jira);
        let reconciler = Reconciler::new(fallback, reader, writer);
        runtime.block_on(sync_all(&harvest, &reconciler, &config.harvest_project_id))
    }
}

/// Fetches every record for the project and reconciles them in order.
///
/// The first failing record aborts the run; re-running resumes safely
/// because reconciliation is idempotent.
async fn sync_all<S, F, C>(
    source: &S,
    reconciler: &Reconciler<F, C>,
    project_id: &str,
) -> Result<SyncReport>
where
    S: FetchTimeRecords,
    F: FetchWorkLogs,
    C: CreateWorkLog,
{
    let records = source
        .fetch_time_records(project_id)
        .await
        .map_err(|err| anyhow::anyhow!("failed to fetch time records: {err}"))?;

    let mut report = SyncReport::default();
    for record in &records {
        tracing::info!(
            id = %record.id(),
            day = %record.day(),
            notes = record.notes(),
            "reconciling record"
        );
        let outcome = reconciler
            .reconcile(record)
            .await
            .with_context(|| format!("failed to reconcile record {}", record.id()))?;
        report.records += 1;
        report.created += outcome.created;
        report.skipped += outcome.skipped;
    }

    Ok(report)
}

/// Create collaborator that only reports what it would have written.
struct DryRunWriter;

#[async_trait]
impl CreateWorkLog for DryRunWriter {
    async fn create_work_log(&self, entry: &WorkLogEntry) -> Result<(), BoxError> {
        tracing::info!(
            issue = %entry.issue,
            seconds = entry.seconds,
            day = %entry.day,
            description = entry.description.as_str(),
            "dry run: would create work log"
        );
        Ok(())
    }
}
