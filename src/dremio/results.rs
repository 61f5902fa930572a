//! Paginated result collection for a completed job

use super::client::DremioClient;
use super::error::{DremioError, Result};
use super::models::Record;
use super::transport::Transport;
use crate::config::Settings;

/// Largest page the results endpoint hands out
pub const PAGE_LIMIT: u64 = 256;

/// Offset/limit pairs covering `row_count` rows, in order and without overlap
///
/// Lazy, so a bogus `rowCount` costs nothing until pages are requested.
pub fn page_bounds(
    row_count: u64,
    page_limit: u64,
) -> impl DoubleEndedIterator<Item = (u64, u64)> {
    let page_limit = page_limit.max(1);
    (0..row_count.div_ceil(page_limit)).map(move |page| {
        let offset = page * page_limit;
        (offset, page_limit.min(row_count - offset))
    })
}

/// Fetch every row of a completed job
///
/// The job's `rowCount` drives pagination, and the collected total must
/// match it exactly.
pub async fn collect_results<T: Transport>(
    client: &DremioClient<T>,
    settings: &Settings,
    job_id: &str,
) -> Result<Vec<Record>> {
    let job = client.get_job(settings, job_id).await?;
    let row_count = job.row_count.ok_or_else(|| {
        DremioError::Protocol(format!(
            "response for completed job {} did not include rowCount field as required",
            job_id
        ))
    })?;

    // rowCount is server-supplied; grow with the pages actually delivered
    let mut records = Vec::new();
    for (offset, limit) in page_bounds(row_count, PAGE_LIMIT) {
        let page = client
            .get_results_page(settings, job_id, offset, limit)
            .await?;
        records.extend(page.rows);
    }

    let collected = u64::try_from(records.len()).unwrap_or(u64::MAX);
    if collected != row_count {
        return Err(DremioError::RowCountMismatch {
            job_id: job_id.to_string(),
            expected: row_count,
            actual: collected,
        });
    }

    tracing::info!("Collected {} rows from job {}", collected, job_id);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dremio::client::endpoints;
    use crate::dremio::transport::mock::MockTransport;
    use crate::dremio::transport::Method;
    use serde_json::{json, Value};

    const BASE: &str = "https://dremio.test";

    fn settings() -> Settings {
        Settings::new(BASE, "alice", "secret", true).with_token("tok")
    }

    fn rows(start: u64, count: u64) -> Value {
        let rows: Vec<Value> = (start..start + count).map(|i| json!({"n": i})).collect();
        json!({ "rows": rows })
    }

    fn job_with_rows(mock: &MockTransport, job_id: &str, row_count: u64) {
        mock.on_get(
            &endpoints::job(BASE, job_id),
            json!({"jobState": "COMPLETED", "errorMessage": "", "rowCount": row_count}),
        );
    }

    #[test]
    fn test_page_bounds() {
        let bounds = |rows, limit| page_bounds(rows, limit).collect::<Vec<_>>();
        assert_eq!(bounds(600, 256), vec![(0, 256), (256, 256), (512, 88)]);
        assert_eq!(bounds(256, 256), vec![(0, 256)]);
        assert_eq!(bounds(0, 256), Vec::<(u64, u64)>::new());
        assert_eq!(bounds(3, 1), vec![(0, 1), (1, 1), (2, 1)]);
        assert_eq!(
            page_bounds(u64::MAX, 256).next_back(),
            Some((u64::MAX - u64::MAX % 256, u64::MAX % 256))
        );
    }

    #[tokio::test]
    async fn test_collects_600_rows_in_three_pages() {
        let mock = MockTransport::new();
        job_with_rows(&mock, "j1", 600);
        mock.on_get(&endpoints::job_results(BASE, "j1", 0, 256), rows(0, 256));
        mock.on_get(&endpoints::job_results(BASE, "j1", 256, 256), rows(256, 256));
        mock.on_get(&endpoints::job_results(BASE, "j1", 512, 88), rows(512, 88));
        let client = DremioClient::new(mock);

        let records = collect_results(&client, &settings(), "j1").await.unwrap();

        assert_eq!(records.len(), 600);
        assert_eq!(records[0]["n"], json!(0));
        assert_eq!(records[599]["n"], json!(599));

        let page_urls: Vec<String> = client
            .transport()
            .requests()
            .into_iter()
            .map(|r| r.url)
            .filter(|url| url.contains("/results"))
            .collect();
        assert_eq!(
            page_urls,
            vec![
                endpoints::job_results(BASE, "j1", 0, 256),
                endpoints::job_results(BASE, "j1", 256, 256),
                endpoints::job_results(BASE, "j1", 512, 88),
            ]
        );
    }

    #[tokio::test]
    async fn test_short_delivery_is_row_count_mismatch() {
        let mock = MockTransport::new();
        job_with_rows(&mock, "j2", 600);
        mock.on_get(&endpoints::job_results(BASE, "j2", 0, 256), rows(0, 256));
        mock.on_get(&endpoints::job_results(BASE, "j2", 256, 256), rows(256, 256));
        mock.on_get(&endpoints::job_results(BASE, "j2", 512, 88), rows(512, 87));
        let client = DremioClient::new(mock);

        match collect_results(&client, &settings(), "j2").await {
            Err(DremioError::RowCountMismatch { expected, actual, .. }) => {
                assert_eq!(expected, 600);
                assert_eq!(actual, 599);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_rows_requests_no_pages() {
        let mock = MockTransport::new();
        job_with_rows(&mock, "j3", 0);
        let client = DremioClient::new(mock);

        let records = collect_results(&client, &settings(), "j3").await.unwrap();

        assert!(records.is_empty());
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_huge_row_count_fails_on_first_page_without_allocating() {
        let mock = MockTransport::new();
        job_with_rows(&mock, "j6", u64::MAX);
        let client = DremioClient::new(mock);

        assert!(matches!(
            collect_results(&client, &settings(), "j6").await,
            Err(DremioError::Status { status: 404, .. })
        ));
        assert_eq!(
            client
                .transport()
                .count(Method::Get, &endpoints::job_results(BASE, "j6", 0, PAGE_LIMIT)),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_row_count_is_protocol_violation() {
        let mock = MockTransport::new();
        mock.on_get(
            &endpoints::job(BASE, "j4"),
            json!({"jobState": "COMPLETED", "errorMessage": ""}),
        );
        let client = DremioClient::new(mock);

        assert!(matches!(
            collect_results(&client, &settings(), "j4").await,
            Err(DremioError::Protocol(_))
        ));
        assert_eq!(client.transport().count(Method::Get, &endpoints::job(BASE, "j4")), 1);
    }

    #[tokio::test]
    async fn test_failed_page_request_is_status_error() {
        let mock = MockTransport::new();
        job_with_rows(&mock, "j5", 10);
        let client = DremioClient::new(mock);

        assert!(matches!(
            collect_results(&client, &settings(), "j5").await,
            Err(DremioError::Status { status: 404, .. })
        ));
    }
}
