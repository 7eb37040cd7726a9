// Test mocks for the collection pass.
//
// - MockSource (NoticeSource): per-query scripted pages, records every request
// - MockSink (NoticeSink): in-memory store with preloaded keys
//
// Plus helpers for building configs and raw API items.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;

use bidwatch_common::{Config, PrimaryKey, SheetRow};
use nara_client::{BidItem, NaraError, Page, SearchParams};

use crate::traits::{NoticeSink, NoticeSource};

// ---------------------------------------------------------------------------
// Config and item helpers
// ---------------------------------------------------------------------------

/// Config with a dummy credential and a CSV sink, plus `overrides`.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("SERVICE_KEY", "test-key"),
        ("SINK", "csv"),
        ("CSV_PATH", "unused.csv"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config should load")
}

/// A raw API item with the given notice number and title.
pub fn bid_item(number: &str, title: &str) -> BidItem {
    bid_item_with(number, title, &[])
}

/// A raw API item with extra fields, e.g. `[("prtcptLmtRgnCd", "26")]`.
pub fn bid_item_with(number: &str, title: &str, extra: &[(&str, &str)]) -> BidItem {
    let mut value = json!({
        "bidNtceNo": number,
        "bidNtceOrd": "000",
        "bidNtceNm": title,
        "ntceInstNm": "조달청",
        "presmptPrce": "50000000",
        "bidNtceDt": "2024-10-17 09:00:00",
        "bidNtceDtlUrl": format!("https://www.g2b.go.kr/notice/{number}"),
    });
    if let Some(map) = value.as_object_mut() {
        for (k, v) in extra {
            map.insert(k.to_string(), json!(v));
        }
    }
    BidItem::from_value(value).expect("object")
}

pub fn page(total_count: Option<u64>, items: Vec<BidItem>) -> Page {
    Page { total_count, items }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Scripted outcome for one page request.
pub enum MockPage {
    Ok(Page),
    /// Body that did not parse.
    Malformed,
    /// Envelope with a non-success result code.
    Rejected,
    /// Client error status.
    ClientError(u16),
    /// Retry budget spent on server errors.
    Exhausted,
}

impl MockPage {
    fn resolve(&self, label: &str) -> nara_client::Result<Page> {
        match self {
            MockPage::Ok(page) => Ok(page.clone()),
            MockPage::Malformed => Err(NaraError::Parse("expected value at line 1 column 1".into())),
            MockPage::Rejected => Err(NaraError::Upstream {
                code: "22".into(),
                message: "LIMITED NUMBER OF SERVICE REQUESTS EXCEEDS ERROR.".into(),
            }),
            MockPage::ClientError(status) => Err(NaraError::Api {
                status: *status,
                message: "Forbidden".into(),
            }),
            MockPage::Exhausted => Err(NaraError::RetriesExhausted {
                label: label.to_string(),
                attempts: 3,
                status: Some(503),
                body: Some("Service Unavailable".into()),
                last_error: None,
            }),
        }
    }
}

/// Pages keyed by query (keyword, or region/industry codes). Unscripted
/// queries and pages past the script return an empty page.
pub struct MockSource {
    scripts: HashMap<String, Vec<MockPage>>,
    requests: Mutex<Vec<SearchParams>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on_keyword(mut self, keyword: &str, pages: Vec<MockPage>) -> Self {
        self.scripts.insert(format!("kw={keyword}"), pages);
        self
    }

    pub fn on_codes(mut self, region: Option<&str>, industry: Option<&str>, pages: Vec<MockPage>) -> Self {
        let key = format!("rgn={} ind={}", region.unwrap_or("*"), industry.unwrap_or("*"));
        self.scripts.insert(key, pages);
        self
    }

    pub fn requests(&self) -> Vec<SearchParams> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests made for one keyword query.
    pub fn requests_for(&self, keyword: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.bid_ntce_nm.as_deref() == Some(keyword))
            .count()
    }

    fn key(params: &SearchParams) -> String {
        match &params.bid_ntce_nm {
            Some(kw) => format!("kw={kw}"),
            None => format!(
                "rgn={} ind={}",
                params.region_code.as_deref().unwrap_or("*"),
                params.industry_code.as_deref().unwrap_or("*")
            ),
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoticeSource for MockSource {
    async fn fetch_page(&self, params: &SearchParams) -> nara_client::Result<Page> {
        self.requests.lock().unwrap().push(params.clone());
        let key = Self::key(params);
        match self
            .scripts
            .get(&key)
            .and_then(|pages| pages.get(params.page_no as usize - 1))
        {
            Some(scripted) => scripted.resolve(&key),
            None => Ok(Page::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// In-memory destination. Appended rows are kept in order.
pub struct MockSink {
    existing: HashSet<PrimaryKey>,
    rows: Mutex<Vec<SheetRow>>,
    header_writes: Mutex<u32>,
    lookbacks: Mutex<Vec<usize>>,
    fail_append: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            existing: HashSet::new(),
            rows: Mutex::new(Vec::new()),
            header_writes: Mutex::new(0),
            lookbacks: Mutex::new(Vec::new()),
            fail_append: false,
        }
    }

    pub fn with_existing(mut self, keys: &[&str]) -> Self {
        self.existing = keys.iter().map(|k| PrimaryKey::from(*k)).collect();
        self
    }

    pub fn failing_append(mut self) -> Self {
        self.fail_append = true;
        self
    }

    pub fn rows(&self) -> Vec<SheetRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.rows().iter().map(|r| r.pk.to_string()).collect()
    }

    pub fn header_writes(&self) -> u32 {
        *self.header_writes.lock().unwrap()
    }

    pub fn lookbacks(&self) -> Vec<usize> {
        self.lookbacks.lock().unwrap().clone()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoticeSink for MockSink {
    async fn ensure_header(&self) -> Result<()> {
        *self.header_writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn existing_keys(&self, lookback: usize) -> Result<HashSet<PrimaryKey>> {
        self.lookbacks.lock().unwrap().push(lookback);
        Ok(self.existing.clone())
    }

    async fn append_rows(&self, rows: &[SheetRow]) -> Result<()> {
        if self.fail_append {
            bail!("MockSink: append refused");
        }
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
