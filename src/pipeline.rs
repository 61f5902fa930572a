//! Snapshot pipeline
//!
//! Shared by the binary and the tests:
//! token → dataset entry → SQL job → result pages → (fields, records).
//! Rendering is left to the caller.

use crate::config::{Settings, SettingsStore};
use crate::dremio::models::Record;
use crate::dremio::{
    collect_results, ensure_valid_token, resolve_dataset, DatasetPath, DremioClient, DremioError,
    PollPolicy, QueryExecutor, Result, Sleeper, Transport,
};

/// Catalog path of the dataset this tool snapshots
pub const SNAPSHOT_DATASET_PATH: [&str; 4] = [
    "BR_16-512",
    "staging",
    "radiology",
    "scan_annotation_table_deid",
];

/// The default target as a `DatasetPath`
pub fn snapshot_dataset() -> Result<DatasetPath> {
    DatasetPath::new(SNAPSHOT_DATASET_PATH)
}

/// Column names (catalog order) and every row of the dataset
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub fields: Vec<String>,
    pub records: Vec<Record>,
}

/// Run the whole snapshot against `target`
///
/// `settings` may come back with a new access token; `store` has already
/// persisted it in that case.
pub async fn take_snapshot<T, St, Sl>(
    client: &DremioClient<T>,
    settings: &mut Settings,
    store: &St,
    sleeper: Sl,
    policy: PollPolicy,
    target: &DatasetPath,
) -> Result<Snapshot>
where
    T: Transport,
    St: SettingsStore + ?Sized,
    Sl: Sleeper,
{
    tracing::info!("[1/4] Checking access token...");
    let token_status = ensure_valid_token(client, settings, store).await?;
    tracing::info!("  Token: {:?}", token_status);

    tracing::info!("[2/4] Resolving dataset {}...", target);
    let dataset = resolve_dataset(client, settings, target).await?;
    let fields = dataset.field_names().ok_or_else(|| {
        DremioError::Protocol(format!(
            "catalog entry for {} did not include fields",
            target
        ))
    })?;
    tracing::info!("  Dataset {} with {} field(s)", dataset.id, fields.len());

    // The catalog's own `sql` may reference files not visible to every user;
    // querying the dataset path works for anyone who can see the dataset.
    let sql = target.select_all_sql();
    tracing::info!("[3/4] Running query...");
    let executor = QueryExecutor::new(client)
        .with_sleeper(sleeper)
        .with_policy(policy);
    let job_id = executor.run_and_wait(settings, &sql).await?;

    tracing::info!("[4/4] Collecting results...");
    let records = collect_results(client, settings, &job_id).await?;

    Ok(Snapshot { fields, records })
}
