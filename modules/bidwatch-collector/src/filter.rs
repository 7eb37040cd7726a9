//! Per-notice acceptance rules.
//!
//! A notice passes when its title contains at least one include keyword and
//! no exclude keyword, and its region and industry codes (when present) are
//! on the configured allow-lists. Matching is case-sensitive substring
//! containment. The first failing rule decides the verdict.

use bidwatch_common::{BidNotice, Config};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterVerdict {
    Accept { matched: Vec<String> },
    EmptyTitle,
    NoKeyword,
    Excluded { keyword: String },
    RegionNotAllowed { code: String },
    IndustryNotAllowed { code: String },
}

#[derive(Debug, Clone)]
pub struct TitleRules {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl TitleRules {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Include keywords present in `title`, in configured order.
    pub fn matched(&self, title: &str) -> Vec<String> {
        self.include
            .iter()
            .filter(|kw| title.contains(kw.as_str()))
            .cloned()
            .collect()
    }

    /// First exclude keyword present in `title`.
    pub fn excluded_by(&self, title: &str) -> Option<&str> {
        self.exclude
            .iter()
            .map(String::as_str)
            .find(|kw| title.contains(kw))
    }
}

/// Code allow-list. Empty list allows everything; an empty code always passes.
#[derive(Debug, Clone, Default)]
pub struct AllowList(Vec<String>);

impl AllowList {
    pub fn new(codes: Vec<String>) -> Self {
        Self(codes)
    }

    pub fn permits(&self, code: &str) -> bool {
        code.is_empty() || self.0.is_empty() || self.0.iter().any(|c| c == code)
    }
}

#[derive(Debug, Clone)]
pub struct NoticeFilter {
    title: TitleRules,
    regions: AllowList,
    industries: AllowList,
}

impl NoticeFilter {
    pub fn new(title: TitleRules, regions: AllowList, industries: AllowList) -> Self {
        Self {
            title,
            regions,
            industries,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TitleRules::new(
                config.include_keywords.clone(),
                config.exclude_keywords.clone(),
            ),
            AllowList::new(config.region_codes.clone()),
            AllowList::new(config.industry_codes.clone()),
        )
    }

    pub fn check(&self, notice: &BidNotice) -> FilterVerdict {
        let title = notice.title.trim();
        if title.is_empty() {
            return FilterVerdict::EmptyTitle;
        }

        let matched = self.title.matched(title);
        if matched.is_empty() {
            return FilterVerdict::NoKeyword;
        }
        if let Some(keyword) = self.title.excluded_by(title) {
            return FilterVerdict::Excluded {
                keyword: keyword.to_string(),
            };
        }

        if !self.regions.permits(&notice.region_code) {
            return FilterVerdict::RegionNotAllowed {
                code: notice.region_code.clone(),
            };
        }
        if !self.industries.permits(&notice.industry_code) {
            return FilterVerdict::IndustryNotAllowed {
                code: notice.industry_code.clone(),
            };
        }

        FilterVerdict::Accept { matched }
    }
}
