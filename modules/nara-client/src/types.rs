use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{NaraError, Result};

// --- Request parameters ---

/// Query parameters for one page of `getBidPblancListInfoServcPPSSrch`.
/// The credential and response format are attached by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub num_of_rows: u32,
    pub page_no: u32,
    pub inqry_div: String,
    /// `YYYYMMDDHHMM`
    pub inqry_bgn_dt: String,
    /// `YYYYMMDDHHMM`
    pub inqry_end_dt: String,
    pub bid_ntce_nm: Option<String>,
    pub region_code: Option<String>,
    pub industry_code: Option<String>,
}

impl SearchParams {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("numOfRows".to_string(), self.num_of_rows.to_string()),
            ("pageNo".to_string(), self.page_no.to_string()),
            ("inqryDiv".to_string(), self.inqry_div.clone()),
            ("inqryBgnDt".to_string(), self.inqry_bgn_dt.clone()),
            ("inqryEndDt".to_string(), self.inqry_end_dt.clone()),
        ];
        if let Some(ref name) = self.bid_ntce_nm {
            query.push(("bidNtceNm".to_string(), name.clone()));
        }
        if let Some(ref code) = self.region_code {
            query.push(("prtcptLmtRgnCd".to_string(), code.clone()));
        }
        if let Some(ref code) = self.industry_code {
            query.push(("indstrytyCd".to_string(), code.clone()));
        }
        query
    }
}

// --- Response envelope ---

/// `{"response": {"header": {...}, "body": {...}}}`
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub response: ResponseBlock,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBlock {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub body: Option<Body>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Header {
    #[serde(rename = "resultCode", default, deserialize_with = "string_or_number")]
    pub result_code: String,
    #[serde(rename = "resultMsg", default)]
    pub result_msg: String,
}

impl Header {
    pub fn is_success(&self) -> bool {
        matches!(self.result_code.trim(), "00" | "0" | "SUCCESS")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Body {
    #[serde(rename = "totalCount", default, deserialize_with = "lenient_count")]
    pub total_count: Option<u64>,
    #[serde(default, deserialize_with = "item_list")]
    pub items: Vec<BidItem>,
}

impl Envelope {
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Check the header and flatten the body into a page.
    pub fn into_page(self) -> Result<Page> {
        let ResponseBlock { header, body } = self.response;
        if !header.is_success() {
            return Err(NaraError::Upstream {
                code: header.result_code,
                message: header.result_msg,
            });
        }
        let body = body.unwrap_or_default();
        Ok(Page {
            total_count: body.total_count,
            items: body.items,
        })
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub total_count: Option<u64>,
    pub items: Vec<BidItem>,
}

/// A raw bid notice item. Field names drift between API revisions, so the
/// item stays an open map and callers pick from candidate keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct BidItem(Map<String, Value>);

impl BidItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build from a JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// First non-empty value among `candidates`, trimmed. Numbers are
    /// rendered as their JSON text; null and empty strings are skipped.
    pub fn pick(&self, candidates: &[&str]) -> String {
        candidates
            .iter()
            .filter_map(|key| self.0.get(*key).and_then(scalar_text))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    pub fn field(&self, key: &str) -> String {
        self.pick(&[key])
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// --- Lenient field decoders ---

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).unwrap_or_default())
}

/// `totalCount` arrives as a number or a numeric string; anything else is
/// treated as no hint.
fn lenient_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `items` is a list, a lone object when there is exactly one result, an
/// `{"item": ...}` wrapper, or an empty string when there are none.
fn item_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<BidItem>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    normalize_items(value).map_err(de::Error::custom)
}

fn normalize_items(value: Value) -> std::result::Result<Vec<BidItem>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::Array(values) => values
            .into_iter()
            .map(|v| BidItem::from_value(v).ok_or_else(|| "items entry is not an object".to_string()))
            .collect(),
        Value::Object(mut map) => match map.remove("item") {
            Some(inner) if map.is_empty() => normalize_items(inner),
            Some(inner) => {
                map.insert("item".to_string(), inner);
                Ok(vec![BidItem(map)])
            }
            None => Ok(vec![BidItem(map)]),
        },
        other => Err(format!("unexpected items shape: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_of(value: Value) -> Result<Page> {
        Envelope::parse(&value.to_string())?.into_page()
    }

    #[test]
    fn list_items_parse_in_order() {
        let page = page_of(json!({"response": {
            "header": {"resultCode": "00", "resultMsg": "NORMAL SERVICE."},
            "body": {"totalCount": 2, "items": [
                {"bidNtceNo": "R24BK001", "bidNtceNm": "first"},
                {"bidNtceNo": "R24BK002", "bidNtceNm": "second"}
            ]}
        }}))
        .unwrap();

        assert_eq!(page.total_count, Some(2));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].field("bidNtceNm"), "second");
    }

    #[test]
    fn single_object_items_become_one_item() {
        let page = page_of(json!({"response": {
            "header": {"resultCode": "00"},
            "body": {"totalCount": "1", "items": {"bidNtceNo": "R24BK001", "bidNtceNm": "only"}}
        }}))
        .unwrap();

        assert_eq!(page.total_count, Some(1));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].field("bidNtceNm"), "only");
    }

    #[test]
    fn wrapped_items_are_unwrapped() {
        let page = page_of(json!({"response": {
            "header": {"resultCode": "00"},
            "body": {"totalCount": 1, "items": {"item": [{"bidNtceNm": "wrapped"}]}}
        }}))
        .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].field("bidNtceNm"), "wrapped");
    }

    #[test]
    fn empty_string_items_mean_no_results() {
        let page = page_of(json!({"response": {
            "header": {"resultCode": "00"},
            "body": {"totalCount": 0, "items": ""}
        }}))
        .unwrap();

        assert_eq!(page.total_count, Some(0));
        assert!(page.items.is_empty());
    }

    #[test]
    fn garbage_total_count_is_no_hint() {
        let page = page_of(json!({"response": {
            "header": {"resultCode": "00"},
            "body": {"totalCount": "many", "items": []}
        }}))
        .unwrap();

        assert_eq!(page.total_count, None);
    }

    #[test]
    fn success_codes() {
        for code in ["00", "0", "SUCCESS", " 00 "] {
            let header = Header {
                result_code: code.to_string(),
                result_msg: String::new(),
            };
            assert!(header.is_success(), "{code}");
        }
        let header = Header {
            result_code: "30".to_string(),
            result_msg: "SERVICE KEY IS NOT REGISTERED ERROR.".to_string(),
        };
        assert!(!header.is_success());
    }

    #[test]
    fn non_success_header_is_upstream_error() {
        let err = page_of(json!({"response": {
            "header": {"resultCode": "22", "resultMsg": "LIMITED NUMBER OF SERVICE REQUESTS EXCEEDS ERROR."}
        }}))
        .unwrap_err();

        match err {
            NaraError::Upstream { code, message } => {
                assert_eq!(code, "22");
                assert!(message.starts_with("LIMITED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn numeric_result_code_is_accepted() {
        let page = page_of(json!({"response": {"header": {"resultCode": 0}, "body": {"items": []}}}));
        assert!(page.is_ok());
    }

    #[test]
    fn non_json_body_is_parse_error() {
        let err = Envelope::parse("<OpenAPI_ServiceResponse>").unwrap_err();
        assert!(matches!(err, NaraError::Parse(_)));
    }

    #[test]
    fn pick_skips_empty_and_null_candidates() {
        let item = BidItem::from_value(json!({
            "indstrytyCd": "",
            "indstryTyCd": null,
            "indstryTy": " 1169 ",
            "presmptPrce": 150000000
        }))
        .unwrap();

        assert_eq!(item.pick(&["indstrytyCd", "indstryTyCd", "indstryTy"]), "1169");
        assert_eq!(item.field("presmptPrce"), "150000000");
        assert_eq!(item.field("missing"), "");
    }

    #[test]
    fn query_includes_only_set_filters() {
        let params = SearchParams {
            num_of_rows: 100,
            page_no: 2,
            inqry_div: "1".to_string(),
            inqry_bgn_dt: "202410160000".to_string(),
            inqry_end_dt: "202410182359".to_string(),
            bid_ntce_nm: Some("브랜딩".to_string()),
            region_code: None,
            industry_code: None,
        };
        let query = params.to_query();

        assert!(query.contains(&("pageNo".to_string(), "2".to_string())));
        assert!(query.contains(&("bidNtceNm".to_string(), "브랜딩".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "prtcptLmtRgnCd" || k == "indstrytyCd"));
    }
}
