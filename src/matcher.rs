use crate::models::NamedQuery;

const NAME_HIT: i32 = 10;
const DESCRIPTION_HIT: i32 = 3;

/// Keyword scoring over existing named queries.
#[derive(Debug, Clone, Copy)]
pub struct ReportMatcher {
    threshold: i32,
}

impl ReportMatcher {
    pub fn new(threshold: i32) -> Self {
        Self { threshold }
    }

    pub fn score<S: AsRef<str>>(report: &NamedQuery, keywords: &[S]) -> i32 {
        let name = report.name.to_lowercase();
        let description = report.description.to_lowercase();
        normalized(keywords)
            .map(|keyword| {
                let mut score = 0;
                if name.contains(&keyword) {
                    score += NAME_HIT;
                }
                if description.contains(&keyword) {
                    score += DESCRIPTION_HIT;
                }
                score
            })
            .sum()
    }

    /// Highest-scoring non-reserved report at or above the threshold.
    /// Ties keep the report listed first.
    pub fn best_match<'a, S: AsRef<str>>(&self, reports: &'a [NamedQuery], keywords: &[S]) -> Option<&'a NamedQuery> {
        if normalized(keywords).next().is_none() {
            return None;
        }

        let mut best: Option<(&NamedQuery, i32)> = None;
        for report in reports.iter().filter(|report| !report.is_reserved()) {
            let score = Self::score(report, keywords);
            if score < self.threshold {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((report, score));
            }
        }
        best.map(|(report, _)| report)
    }
}

fn normalized<S: AsRef<str>>(keywords: &[S]) -> impl Iterator<Item = String> + '_ {
    keywords
        .iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
}
