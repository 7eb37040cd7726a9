use std::fmt;

use chrono::{DateTime, Local};
use nara_client::BidItem;

use crate::config::FieldMap;

/// Column order of the destination sheet. Never reorder: existing sheets
/// are read back by position.
pub const SHEET_HEADER: [&str; 10] = [
    "pk",
    "title",
    "agency",
    "price",
    "region_cd",
    "industry_cd",
    "matched_kws",
    "notice_dt",
    "detail_url",
    "collected_at",
];

const PRICE_FIELDS: [&str; 3] = ["presmptPrce", "bdgtAmt", "assignAmt"];

// --- PrimaryKey ---

/// Dedupe key for a notice, stable across repeated fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey(String);

impl PrimaryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrimaryKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// --- BidNotice ---

/// A bid notice as read from the search API, with region and industry
/// resolved through the configured field candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct BidNotice {
    pub notice_number: String,
    pub notice_order: String,
    pub title: String,
    pub agency: String,
    /// Already formatted for display, see [`format_price`].
    pub price: String,
    pub region_code: String,
    pub industry_code: String,
    pub notice_date: String,
    pub detail_url: String,
}

impl BidNotice {
    pub fn from_item(item: &BidItem, fields: &FieldMap) -> Self {
        let candidates = |keys: &[String]| {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            item.pick(&keys)
        };

        Self {
            notice_number: item.field("bidNtceNo"),
            notice_order: item.field("bidNtceOrd"),
            title: item.field("bidNtceNm"),
            agency: item.field("ntceInstNm"),
            price: format_price(&item.pick(&PRICE_FIELDS)),
            region_code: candidates(&fields.region),
            industry_code: candidates(&fields.industry),
            notice_date: item.field("bidNtceDt"),
            detail_url: item.field("bidNtceDtlUrl"),
        }
    }

    /// `{number}-{order}` when both are present, otherwise
    /// `{title}|{agency}|{notice date}`.
    pub fn primary_key(&self) -> PrimaryKey {
        if !self.notice_number.is_empty() && !self.notice_order.is_empty() {
            PrimaryKey(format!("{}-{}", self.notice_number, self.notice_order))
        } else {
            PrimaryKey(format!("{}|{}|{}", self.title, self.agency, self.notice_date))
        }
    }
}

/// Render an amount with thousands separators (`150000000` → `150,000,000`).
/// Fractions are truncated. Values that do not parse are returned unchanged.
pub fn format_price(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match raw.replace(',', "").parse::<f64>() {
        Ok(value) if value.is_finite() => group_thousands(value.trunc() as i64),
        _ => raw.to_string(),
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// --- SheetRow ---

/// One row of the destination store, in [`SHEET_HEADER`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub pk: PrimaryKey,
    pub title: String,
    pub agency: String,
    pub price: String,
    pub region_code: String,
    pub industry_code: String,
    pub matched_keywords: Vec<String>,
    pub notice_date: String,
    pub detail_url: String,
    pub collected_at: String,
}

impl SheetRow {
    pub fn new(notice: &BidNotice, matched_keywords: Vec<String>, collected_at: DateTime<Local>) -> Self {
        Self {
            pk: notice.primary_key(),
            title: notice.title.clone(),
            agency: notice.agency.clone(),
            price: notice.price.clone(),
            region_code: notice.region_code.clone(),
            industry_code: notice.industry_code.clone(),
            matched_keywords,
            notice_date: notice.notice_date.clone(),
            detail_url: notice.detail_url.clone(),
            collected_at: collected_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn matched_kws(&self) -> String {
        self.matched_keywords.join(",")
    }

    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.pk.to_string(),
            self.title.clone(),
            self.agency.clone(),
            self.price.clone(),
            self.region_code.clone(),
            self.industry_code.clone(),
            self.matched_kws(),
            self.notice_date.clone(),
            self.detail_url.clone(),
            self.collected_at.clone(),
        ]
    }
}

pub fn header_cells() -> Vec<String> {
    SHEET_HEADER.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn item(value: serde_json::Value) -> BidItem {
        BidItem::from_value(value).unwrap()
    }

    #[test]
    fn key_from_number_and_order() {
        let notice = BidNotice::from_item(
            &item(json!({"bidNtceNo": "R24BK00123456", "bidNtceOrd": "000", "bidNtceNm": "t"})),
            &FieldMap::default(),
        );
        assert_eq!(notice.primary_key().as_str(), "R24BK00123456-000");
    }

    #[test]
    fn key_falls_back_to_composite_without_order() {
        let notice = BidNotice::from_item(
            &item(json!({
                "bidNtceNo": "R24BK00123456",
                "bidNtceNm": "브랜드 컨설팅",
                "ntceInstNm": "서울특별시",
                "bidNtceDt": "2024-10-17 10:00:00"
            })),
            &FieldMap::default(),
        );
        assert_eq!(
            notice.primary_key().as_str(),
            "브랜드 컨설팅|서울특별시|2024-10-17 10:00:00"
        );
    }

    #[test]
    fn region_and_industry_follow_field_candidates() {
        let raw = item(json!({"rgstRt": "11", "indstryTy": "4440", "prtcptLmtRgnCd": ""}));
        let notice = BidNotice::from_item(&raw, &FieldMap::default());
        assert_eq!(notice.region_code, "11");
        assert_eq!(notice.industry_code, "4440");

        let only_rgst = FieldMap {
            region: vec!["prtcptLmtRgnCd".to_string()],
            industry: vec!["indstrytyCd".to_string()],
        };
        let notice = BidNotice::from_item(&raw, &only_rgst);
        assert_eq!(notice.region_code, "");
        assert_eq!(notice.industry_code, "");
    }

    #[test]
    fn price_prefers_estimate_then_budget() {
        let notice = BidNotice::from_item(
            &item(json!({"presmptPrce": "", "bdgtAmt": "33000000", "assignAmt": "1"})),
            &FieldMap::default(),
        );
        assert_eq!(notice.price, "33,000,000");
    }

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(""), "");
        assert_eq!(format_price("999"), "999");
        assert_eq!(format_price("1000"), "1,000");
        assert_eq!(format_price("1,234,567.89"), "1,234,567");
        assert_eq!(format_price("-1500"), "-1,500");
        assert_eq!(format_price("미정"), "미정");
    }

    #[test]
    fn row_cells_follow_header_order() {
        let notice = BidNotice::from_item(
            &item(json!({
                "bidNtceNo": "R24BK001",
                "bidNtceOrd": "001",
                "bidNtceNm": "2024년 브랜딩 전략 수립 용역",
                "ntceInstNm": "중소벤처기업부",
                "presmptPrce": 50000000,
                "prtcptLmtRgnCd": "11",
                "indstrytyCd": "1169",
                "bidNtceDt": "2024-10-17 09:00:00",
                "bidNtceDtlUrl": "https://www.g2b.go.kr/detail"
            })),
            &FieldMap::default(),
        );
        let at = Local.with_ymd_and_hms(2024, 10, 18, 9, 30, 0).unwrap();
        let row = SheetRow::new(&notice, vec!["브랜딩".to_string()], at);

        let cells = row.to_cells();
        assert_eq!(cells.len(), SHEET_HEADER.len());
        assert_eq!(
            cells,
            vec![
                "R24BK001-001",
                "2024년 브랜딩 전략 수립 용역",
                "중소벤처기업부",
                "50,000,000",
                "11",
                "1169",
                "브랜딩",
                "2024-10-17 09:00:00",
                "https://www.g2b.go.kr/detail",
                "2024-10-18 09:30:00",
            ]
        );
    }
}
