use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::BidwatchError;

const DEFAULT_INCLUDE_KEYWORDS: &str = "브랜딩,마케팅,컨설팅,스타트업,소상공인,브랜드,리브랜딩,BI,CI,네이밍";
const DEFAULT_EXCLUDE_KEYWORDS: &str = "실행,대행,운영,제작";
const DEFAULT_INDUSTRY_CODES: &str = "1169,4440,9999";
const DEFAULT_REGION_CODES: &str = "11,00";
const DEFAULT_REGION_FIELDS: &str = "prtcptLmtRgnCd,rgstRt";
const DEFAULT_INDUSTRY_FIELDS: &str = "indstrytyCd,indstryTyCd,indstryTy";

/// How queries are fanned out across the configured dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// One query per include keyword, filtered server-side by notice name.
    Keyword,
    /// One query per (region, industry) pair, filtered server-side by code.
    RegionIndustry,
}

impl FromStr for QueryMode {
    type Err = BidwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(QueryMode::Keyword),
            "region-industry" | "region_industry" => Ok(QueryMode::RegionIndustry),
            other => Err(BidwatchError::Config(format!(
                "QUERY_MODE must be `keyword` or `region-industry`, got `{other}`"
            ))),
        }
    }
}

/// Response field names to try, in order, for codes whose key has drifted
/// between API revisions.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    pub region: Vec<String>,
    pub industry: Vec<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            region: split_list(DEFAULT_REGION_FIELDS),
            industry: split_list(DEFAULT_INDUSTRY_FIELDS),
        }
    }
}

/// Where collected rows go.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkConfig {
    Sheets {
        spreadsheet_id: String,
        access_token: String,
        worksheet_index: usize,
    },
    Csv {
        path: PathBuf,
    },
}

/// Collector configuration, built once at startup and passed down by reference.
#[derive(Debug, Clone)]
pub struct Config {
    // Upstream
    pub service_key: String,
    pub api_url: String,
    pub inqry_div: String,
    pub days_back: u32,
    pub num_of_rows: u32,
    pub timeout_secs: u64,
    pub max_retry: u32,

    // Matching
    pub query_mode: QueryMode,
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub industry_codes: Vec<String>,
    pub region_codes: Vec<String>,
    pub fields: FieldMap,

    // Destination
    pub sink: SinkConfig,
    pub read_existing_pk: bool,
    pub existing_pk_lookback: usize,
}

impl Config {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, BidwatchError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset keys take their defaults;
    /// a key set to an empty string means an empty list.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BidwatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let service_key = vars.required("SERVICE_KEY")?;

        let include_keywords = vars.list("INCLUDE_KEYWORDS", DEFAULT_INCLUDE_KEYWORDS);
        if include_keywords.is_empty() {
            return Err(BidwatchError::Config(
                "INCLUDE_KEYWORDS must list at least one keyword".to_string(),
            ));
        }

        let sink = match vars.string("SINK", "sheets").to_ascii_lowercase().as_str() {
            "sheets" => SinkConfig::Sheets {
                spreadsheet_id: vars.required("SPREADSHEET_ID")?,
                access_token: vars.required("GOOGLE_ACCESS_TOKEN")?,
                worksheet_index: vars.parsed("WORKSHEET_INDEX", 0)?,
            },
            "csv" => SinkConfig::Csv {
                path: PathBuf::from(vars.string("CSV_PATH", "bid_notices.csv")),
            },
            other => {
                return Err(BidwatchError::Config(format!(
                    "SINK must be `sheets` or `csv`, got `{other}`"
                )))
            }
        };

        Ok(Self {
            service_key,
            api_url: vars.string("BID_API_URL", nara_client::DEFAULT_BASE_URL),
            inqry_div: vars.string("INQRY_DIV", "1"),
            days_back: vars.parsed("DAYS_BACK", 2)?,
            num_of_rows: vars.parsed("NUM_OF_ROWS", 100)?,
            timeout_secs: vars.parsed("TIMEOUT_SEC", 20)?,
            max_retry: vars.parsed("MAX_RETRY", 3)?,
            query_mode: vars.string("QUERY_MODE", "keyword").parse()?,
            include_keywords,
            exclude_keywords: vars.list("EXCLUDE_KEYWORDS", DEFAULT_EXCLUDE_KEYWORDS),
            industry_codes: vars.list("INDUSTRY_CODES", DEFAULT_INDUSTRY_CODES),
            region_codes: vars.list("REGION_CODES", DEFAULT_REGION_CODES),
            fields: FieldMap {
                region: vars.list("REGION_FIELDS", DEFAULT_REGION_FIELDS),
                industry: vars.list("INDUSTRY_FIELDS", DEFAULT_INDUSTRY_FIELDS),
            },
            sink,
            read_existing_pk: vars.flag("READ_EXISTING_PK", true)?,
            existing_pk_lookback: vars.parsed("EXISTING_PK_LOOKBACK", 5000)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Log the effective configuration with secrets shortened to a preview.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{}...({} chars)", head, val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SERVICE_KEY: {}", preview(&self.service_key));
        tracing::info!("  BID_API_URL: {}", self.api_url);
        tracing::info!(
            "  window: {} days, {} rows/page, {} attempts, {}s timeout",
            self.days_back,
            self.num_of_rows,
            self.max_retry,
            self.timeout_secs
        );
        tracing::info!("  QUERY_MODE: {:?}", self.query_mode);
        tracing::info!("  INCLUDE_KEYWORDS: {}", self.include_keywords.join(","));
        tracing::info!("  EXCLUDE_KEYWORDS: {}", self.exclude_keywords.join(","));
        tracing::info!("  INDUSTRY_CODES: {}", self.industry_codes.join(","));
        tracing::info!("  REGION_CODES: {}", self.region_codes.join(","));
        match &self.sink {
            SinkConfig::Sheets {
                spreadsheet_id,
                access_token,
                worksheet_index,
            } => {
                tracing::info!("  SINK: sheets {spreadsheet_id} (worksheet {worksheet_index})");
                tracing::info!("  GOOGLE_ACCESS_TOKEN: {}", preview(access_token));
            }
            SinkConfig::Csv { path } => tracing::info!("  SINK: csv {}", path.display()),
        }
        if self.read_existing_pk {
            tracing::info!("  existing keys: last {} rows", self.existing_pk_lookback);
        } else {
            tracing::info!("  existing keys: not read");
        }
    }
}

struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string())
    }

    fn required(&self, key: &str) -> Result<String, BidwatchError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| BidwatchError::Config(format!("{key} environment variable is required")))
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn list(&self, key: &str, default: &str) -> Vec<String> {
        split_list(&self.get(key).unwrap_or_else(|| default.to_string()))
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T, BidwatchError> {
        match self.get(key).filter(|v| !v.is_empty()) {
            None => Ok(default),
            Some(v) => v
                .parse()
                .map_err(|_| BidwatchError::Config(format!("{key} must be a number, got `{v}`"))),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, BidwatchError> {
        match self.get(key).filter(|v| !v.is_empty()) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(BidwatchError::Config(format!("{key} must be 1 or 0, got `{v}`"))),
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
