//! Near-duplicate headline filter
//!
//! Different sources routinely carry the same story under slightly different
//! titles. This module collapses such near-duplicates into one entry using a
//! case-folded character-level similarity ratio, keeping the first-seen item.

use brief_core::NewsItem;
use tracing::debug;

/// Ratio above which two titles are considered the same story
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.82;

/// Jaro-Winkler similarity between two titles, case-folded
///
/// Returns a value between 0.0 (unrelated) and 1.0 (identical). An empty
/// title never matches anything, including another empty title.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let jaro = jaro(&a, &b);

    // Winkler prefix boost: shared prefixes (up to 4 chars) weigh extra,
    // which suits headlines where the lead words carry the story.
    let prefix = a
        .iter()
        .zip(&b)
        .take(4)
        .take_while(|(x, y)| x == y)
        .count();
    jaro + prefix as f64 * 0.1 * (1.0 - jaro)
}

/// Plain Jaro similarity over char slices
fn jaro(s1: &[char], s2: &[char]) -> f64 {
    let l1 = s1.len();
    let l2 = s2.len();
    if l1 == 0 || l2 == 0 {
        return 0.0;
    }
    if s1 == s2 {
        return 1.0;
    }

    let match_distance = (l1.max(l2) / 2).saturating_sub(1);
    let mut matched1 = vec![false; l1];
    let mut matched2 = vec![false; l2];
    let mut matches = 0usize;

    for i in 0..l1 {
        let start = i.saturating_sub(match_distance);
        let end = (i + match_distance + 1).min(l2);
        for j in start..end {
            if !matched2[j] && s2[j] == s1[i] {
                matched1[i] = true;
                matched2[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut k = 0usize;
    for i in 0..l1 {
        if matched1[i] {
            while !matched2[k] {
                k += 1;
            }
            if s1[i] != s2[k] {
                transpositions += 1;
            }
            k += 1;
        }
    }

    let m = matches as f64;
    (m / l1 as f64 + m / l2 as f64 + (m - (transpositions / 2) as f64) / m) / 3.0
}

/// Remove near-duplicate items, preserving first-seen order
///
/// O(n^2) in batch size; batches are tens of items by construction. Filtering
/// an already-filtered sequence yields the same sequence.
pub fn dedup_titles(items: Vec<NewsItem>, threshold: f64) -> Vec<NewsItem> {
    let before = items.len();
    let mut accepted_titles: Vec<String> = Vec::new();
    let mut unique = Vec::new();

    for item in items {
        let is_dupe = accepted_titles
            .iter()
            .any(|seen| similarity(&item.title, seen) > threshold);
        if !is_dupe {
            accepted_titles.push(item.title.clone());
            unique.push(item);
        }
    }

    if unique.len() < before {
        debug!("Collapsed {} near-duplicate headlines", before - unique.len());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::FeedCategory;

    fn item(title: &str) -> NewsItem {
        NewsItem::new(title, format!("https://example.com/{}", title.len()), None, FeedCategory::Market)
    }

    fn titles(items: &[NewsItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn identical_titles_have_similarity_one() {
        assert_eq!(similarity("Fed raises rates", "Fed raises rates"), 1.0);
        assert_eq!(similarity("Fed raises rates", "FED RAISES RATES"), 1.0);
    }

    #[test]
    fn empty_title_matches_nothing() {
        assert_eq!(similarity("", "Fed raises rates"), 0.0);
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn same_story_different_wording_collapses() {
        let a = "Fed raises rates by 25bps";
        let b = "Fed raises rates 25 basis points";
        assert!(similarity(a, b) > DEFAULT_SIMILARITY_THRESHOLD);

        let out = dedup_titles(vec![item(a), item(b)], DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(titles(&out), vec![a]);
    }

    #[test]
    fn different_stories_both_survive() {
        let a = "Fed raises rates";
        let b = "ECB cuts rates";
        assert!(similarity(a, b) <= DEFAULT_SIMILARITY_THRESHOLD);

        let out = dedup_titles(vec![item(a), item(b)], DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(titles(&out), vec![a, b]);
    }

    #[test]
    fn first_seen_wins() {
        let out = dedup_titles(
            vec![
                item("Bitcoin surges past $100k milestone"),
                item("Bitcoin surges past $100k milestone!"),
                item("Oil prices slide on supply news"),
            ],
            DEFAULT_SIMILARITY_THRESHOLD,
        );
        assert_eq!(
            titles(&out),
            vec![
                "Bitcoin surges past $100k milestone",
                "Oil prices slide on supply news"
            ]
        );
    }

    #[test]
    fn filter_is_idempotent() {
        let input = vec![
            item("Fed raises rates by 25bps"),
            item("Fed raises rates 25 basis points"),
            item("ECB cuts rates"),
            item(""),
        ];
        let once = dedup_titles(input, DEFAULT_SIMILARITY_THRESHOLD);
        let twice = dedup_titles(once.clone(), DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(titles(&once), titles(&twice));
    }

    #[test]
    fn empty_titles_are_kept() {
        let out = dedup_titles(vec![item(""), item("")], DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(out.len(), 2);
    }
}
