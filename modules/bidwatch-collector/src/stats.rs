use crate::dedup::DedupVerdict;
use crate::filter::FilterVerdict;

/// Stats from a collection run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectStats {
    pub plans_run: u32,
    pub plans_abandoned: u32,
    pub pages_fetched: u32,
    pub items_seen: u32,
    pub rejected_empty_title: u32,
    pub rejected_no_keyword: u32,
    pub rejected_excluded: u32,
    pub rejected_region: u32,
    pub rejected_industry: u32,
    pub duplicates_in_run: u32,
    pub duplicates_stored: u32,
    pub existing_keys: u32,
    pub rows_queued: u32,
    pub rows_written: u32,
}

impl CollectStats {
    pub(crate) fn record_filter(&mut self, verdict: &FilterVerdict) {
        match verdict {
            FilterVerdict::Accept { .. } => {}
            FilterVerdict::EmptyTitle => self.rejected_empty_title += 1,
            FilterVerdict::NoKeyword => self.rejected_no_keyword += 1,
            FilterVerdict::Excluded { .. } => self.rejected_excluded += 1,
            FilterVerdict::RegionNotAllowed { .. } => self.rejected_region += 1,
            FilterVerdict::IndustryNotAllowed { .. } => self.rejected_industry += 1,
        }
    }

    pub(crate) fn record_dedup(&mut self, verdict: DedupVerdict) {
        match verdict {
            DedupVerdict::New => self.rows_queued += 1,
            DedupVerdict::SeenThisRun => self.duplicates_in_run += 1,
            DedupVerdict::AlreadyStored => self.duplicates_stored += 1,
        }
    }

    pub fn rejected(&self) -> u32 {
        self.rejected_empty_title
            + self.rejected_no_keyword
            + self.rejected_excluded
            + self.rejected_region
            + self.rejected_industry
    }
}

impl std::fmt::Display for CollectStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Bid Collection Complete ===")?;
        writeln!(f, "Queries run:        {}", self.plans_run)?;
        writeln!(f, "Queries abandoned:  {}", self.plans_abandoned)?;
        writeln!(f, "Pages fetched:      {}", self.pages_fetched)?;
        writeln!(f, "Notices seen:       {}", self.items_seen)?;
        writeln!(f, "\nRejected:           {}", self.rejected())?;
        writeln!(f, "  Empty title:      {}", self.rejected_empty_title)?;
        writeln!(f, "  No keyword:       {}", self.rejected_no_keyword)?;
        writeln!(f, "  Excluded:         {}", self.rejected_excluded)?;
        writeln!(f, "  Region:           {}", self.rejected_region)?;
        writeln!(f, "  Industry:         {}", self.rejected_industry)?;
        writeln!(f, "\nDuplicates:")?;
        writeln!(f, "  Within run:       {}", self.duplicates_in_run)?;
        writeln!(
            f,
            "  Already stored:   {} (of {} keys loaded)",
            self.duplicates_stored, self.existing_keys
        )?;
        writeln!(f, "\nRows queued:        {}", self.rows_queued)?;
        writeln!(f, "Rows written:       {}", self.rows_written)?;
        Ok(())
    }
}
