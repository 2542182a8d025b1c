//! Cross-engine merging: URL normalisation, deduplication and ranking.
//!
//! Results from every engine are grouped by [`normalize_url`]. A URL surfaced
//! by more engines ranks higher; among equals, the best per-engine position
//! wins. The first engine to surface a URL supplies its title and snippet.

use std::collections::{BTreeSet, HashMap};

use url::Url;

use crate::types::{AggregatedResult, AggregationStats, SearchResult};

/// Tracking query parameters removed during normalisation (besides `utm_*`).
const TRACKING_PARAMS: &[&str] = &[
    "ref", "source", "campaign", "fbclid", "gclid", "msclkid", "mc_cid", "mc_eid", "dclid",
    "srsltid", "si",
];

/// Canonical form of a URL, used as the cross-engine deduplication key.
///
/// Applies the following transformations:
///
/// 1. Lowercase scheme and host; drop default ports.
/// 2. Strip leading `www.` labels from the host.
/// 3. Strip trailing slashes from the path.
/// 4. Drop the fragment.
/// 5. Remove tracking parameters, then sort the rest by key and value.
///
/// Unparseable input is returned unchanged. The function is idempotent.
///
/// # Examples
///
/// ```
/// use fcrawl_search::aggregator::normalize_url;
///
/// let a = normalize_url("https://www.site.com/a/?utm_source=x&b=1");
/// let b = normalize_url("https://site.com/a?b=1");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    parsed.set_fragment(None);

    if let Some(host) = parsed.host_str() {
        let mut trimmed = host;
        while let Some(rest) = trimmed.strip_prefix("www.") {
            if !rest.contains('.') {
                break;
            }
            trimmed = rest;
        }
        if trimmed.len() != host.len() {
            let trimmed = trimmed.to_string();
            let _ = parsed.set_host(Some(&trimmed));
        }
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();
    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = parsed.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        parsed.set_path(&trimmed);
    }

    parsed.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Merge every engine's results into one ranked, deduplicated list.
///
/// `results` must be in engine-processing order: the first result seen for
/// a normalised URL becomes that entry's primary source. Output is sorted by
/// descending score, then ascending best position; ties keep first-seen
/// order. With `Some(limit)` at most `limit` entries are returned.
pub fn aggregate<'a, I>(results: I, limit: Option<usize>) -> Vec<AggregatedResult>
where
    I: IntoIterator<Item = &'a SearchResult>,
{
    let mut groups: Vec<AggregatedResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for result in results {
        let key = normalize_url(&result.url);
        match index.get(&key) {
            Some(&i) => {
                let group = &mut groups[i];
                group.engines.insert(result.engine.clone());
                group.score = group.engines.len();
                group.best_position = group.best_position.min(result.position);
            }
            None => {
                index.insert(key, groups.len());
                groups.push(AggregatedResult {
                    url: result.url.clone(),
                    title: result.title.clone(),
                    description: result.description.clone(),
                    primary_engine: result.engine.clone(),
                    engines: BTreeSet::from([result.engine.clone()]),
                    score: 1,
                    best_position: result.position,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among ties.
    groups.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.best_position.cmp(&b.best_position))
    });

    if let Some(limit) = limit {
        groups.truncate(limit);
    }

    tracing::debug!(unique = groups.len(), "results aggregated");
    groups
}

/// Summary histograms of an aggregated list.
pub fn stats(results: &[AggregatedResult]) -> AggregationStats {
    let mut stats = AggregationStats {
        total: results.len(),
        ..Default::default()
    };
    for result in results {
        *stats.by_engine_count.entry(result.score).or_default() += 1;
        *stats
            .by_primary_engine
            .entry(result.primary_engine.clone())
            .or_default() += 1;
    }
    stats
}
