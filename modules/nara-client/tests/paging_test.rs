//! Drives the client and cursor together the way the collector does.

use std::sync::Arc;

use nara_client::testing::ScriptedTransport;
use nara_client::{NaraClient, Pagination, RetryPolicy, SearchParams};
use serde_json::{json, Value};

fn page_body(total: u64, count: usize, offset: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| json!({"bidNtceNo": format!("R24BK{:05}", offset + i), "bidNtceOrd": "000"}))
        .collect();
    json!({"response": {
        "header": {"resultCode": "00", "resultMsg": "NORMAL SERVICE."},
        "body": {"totalCount": total, "numOfRows": 100, "items": items}
    }})
}

fn params(page_no: u32) -> SearchParams {
    SearchParams {
        num_of_rows: 100,
        page_no,
        inqry_div: "1".to_string(),
        inqry_bgn_dt: "202410160000".to_string(),
        inqry_end_dt: "202410182359".to_string(),
        bid_ntce_nm: Some("컨설팅".to_string()),
        region_code: None,
        industry_code: None,
    }
}

#[tokio::test]
async fn total_of_250_requests_exactly_three_pages() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond_json(page_body(250, 100, 0))
            .respond_json(page_body(250, 100, 100))
            .respond_json(page_body(250, 50, 200))
            .respond_json(page_body(250, 50, 250)),
    );
    let client = NaraClient::with_transport(
        "key",
        "https://x.test/search",
        RetryPolicy::default(),
        transport.clone(),
    );

    let mut cursor = Pagination::new(100);
    let mut collected = 0;
    loop {
        let page = client.fetch_page(&params(cursor.page())).await.unwrap();
        collected += page.items.len();
        if !cursor.advance(&page) {
            break;
        }
    }

    assert_eq!(transport.request_count(), 3);
    assert_eq!(collected, 250);

    let page_numbers: Vec<String> = transport
        .requests()
        .iter()
        .filter_map(|(_, q)| q.iter().find(|(k, _)| k == "pageNo").map(|(_, v)| v.clone()))
        .collect();
    assert_eq!(page_numbers, vec!["1", "2", "3"]);
}
