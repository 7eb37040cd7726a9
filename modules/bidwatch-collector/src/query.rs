//! Query planning: which searches to run and the parameters for each page.

use bidwatch_common::{Config, QueryMode};
use chrono::{DateTime, Duration, Local};
use nara_client::SearchParams;

/// Inquiry window in the API's `YYYYMMDDHHMM` format, from the start of the
/// day `days_back` days ago through the end of today.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    pub begin: String,
    pub end: String,
}

impl TimeWindow {
    pub fn ending_at(now: DateTime<Local>, days_back: u32) -> Self {
        let start = now - Duration::days(i64::from(days_back));
        Self {
            begin: start.format("%Y%m%d0000").to_string(),
            end: now.format("%Y%m%d2359").to_string(),
        }
    }
}

/// One search across all of its pages.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub label: String,
    pub keyword: Option<String>,
    pub region_code: Option<String>,
    pub industry_code: Option<String>,
}

impl QueryPlan {
    fn keyword(keyword: &str) -> Self {
        Self {
            label: format!("kw={keyword}"),
            keyword: Some(keyword.to_string()),
            region_code: None,
            industry_code: None,
        }
    }

    fn codes(region: Option<&String>, industry: Option<&String>) -> Self {
        let label = format!(
            "rgn={} ind={}",
            region.map(String::as_str).unwrap_or("*"),
            industry.map(String::as_str).unwrap_or("*")
        );
        Self {
            label,
            keyword: None,
            region_code: region.cloned(),
            industry_code: industry.cloned(),
        }
    }
}

/// Plans in the order their rows will be written: the include keywords in
/// configured order, or regions × industries with region as the outer loop.
/// An empty axis contributes a single unfiltered entry.
pub fn plan_queries(config: &Config) -> Vec<QueryPlan> {
    match config.query_mode {
        QueryMode::Keyword => config
            .include_keywords
            .iter()
            .map(|kw| QueryPlan::keyword(kw))
            .collect(),
        QueryMode::RegionIndustry => {
            let regions = axis(&config.region_codes);
            let industries = axis(&config.industry_codes);
            regions
                .iter()
                .flat_map(|r| industries.iter().map(move |i| QueryPlan::codes(*r, *i)))
                .collect()
        }
    }
}

fn axis(codes: &[String]) -> Vec<Option<&String>> {
    if codes.is_empty() {
        vec![None]
    } else {
        codes.iter().map(Some).collect()
    }
}

/// Turns plans into per-page request parameters for a fixed window.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    window: TimeWindow,
    page_size: u32,
    inqry_div: String,
}

impl QueryBuilder {
    pub fn new(config: &Config, now: DateTime<Local>) -> Self {
        Self {
            window: TimeWindow::ending_at(now, config.days_back),
            page_size: config.num_of_rows,
            inqry_div: config.inqry_div.clone(),
        }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn params(&self, plan: &QueryPlan, page_no: u32) -> SearchParams {
        SearchParams {
            num_of_rows: self.page_size,
            page_no,
            inqry_div: self.inqry_div.clone(),
            inqry_bgn_dt: self.window.begin.clone(),
            inqry_end_dt: self.window.end.clone(),
            bid_ntce_nm: plan.keyword.clone(),
            region_code: plan.region_code.clone(),
            industry_code: plan.industry_code.clone(),
        }
    }
}
