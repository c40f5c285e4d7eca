use crate::analyze::baseline::Baseline;
use crate::config::FilterRule;
use crate::probe::ProbeOutcome;

/// Where a single probe ends up. Every attempt lands in exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Failed,
    BaselineMatch,
    FilteredSize,
    FilteredKeyword,
    /// Counted in the status tally; `visible` decides whether it is reported.
    Counted { visible: bool },
}

impl Verdict {
    pub fn is_visible(&self) -> bool {
        matches!(self, Verdict::Counted { visible: true })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Failed => "failed",
            Verdict::BaselineMatch => "baseline",
            Verdict::FilteredSize => "filtered-size",
            Verdict::FilteredKeyword => "filtered-keyword",
            Verdict::Counted { visible: true } => "shown",
            Verdict::Counted { visible: false } => "hidden",
        }
    }
}

pub struct ResponseClassifier {
    baseline: Baseline,
    filters: FilterRule,
}

impl ResponseClassifier {
    pub fn new(baseline: Baseline, filters: FilterRule) -> Self {
        Self { baseline, filters }
    }

    /// Checks run in a fixed order: transport failure, baseline, size, keyword, status codes.
    pub fn classify(&self, outcome: &ProbeOutcome) -> Verdict {
        if outcome.is_failure() {
            return Verdict::Failed;
        }
        if self.baseline.matches(outcome) {
            return Verdict::BaselineMatch;
        }
        if self.filters.size_matches(outcome.size()) {
            return Verdict::FilteredSize;
        }
        if self.filters.keyword_matches(&outcome.body) {
            return Verdict::FilteredKeyword;
        }
        Verdict::Counted {
            visible: self.filters.is_visible(outcome.status),
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }
}
