use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::atlas::{Snapshot, is_printable_name, normalize_name};

use super::super::{FindCache, FindMatch, ViewModel};

const FIND_LIMIT: usize = 12;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Best fuzzy matches for the "find map" box, recomputed only when the query changes.
    pub(in crate::app) fn find_matches(&mut self) -> &[FindMatch] {
        let query = self.find_query.trim();
        if query.is_empty() {
            self.find_cache = None;
            return &[];
        }

        let stale = self
            .find_cache
            .as_ref()
            .is_none_or(|cache| cache.query != query);
        if stale {
            let matches = rank_matches(&self.snapshot, query);
            self.find_cache = Some(FindCache {
                query: query.to_owned(),
                matches,
            });
        }

        self.find_cache
            .as_ref()
            .map(|cache| cache.matches.as_slice())
            .unwrap_or_default()
    }

    pub(in crate::app) fn invalidate_find_cache(&mut self) {
        self.find_cache = None;
    }
}

fn rank_matches(snapshot: &Snapshot, query: &str) -> Vec<FindMatch> {
    let matcher = SkimMatcherV2::default();
    let mut matches = snapshot
        .nodes
        .iter()
        .filter(|record| record.is_valid())
        .filter_map(|record| {
            let name = normalize_name(record.name.as_deref()?);
            if !is_printable_name(&name) {
                return None;
            }
            let score = fuzzy_match_score(&matcher, &name, query)?;
            Some(FindMatch {
                key: record.key,
                name,
                score,
            })
        })
        .collect::<Vec<_>>();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.key.cmp(&b.key))
    });
    matches.dedup_by_key(|entry| entry.key);
    matches.truncate(FIND_LIMIT);
    matches
}
