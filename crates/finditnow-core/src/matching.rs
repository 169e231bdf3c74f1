//! Lost/found matching engine.
//!
//! Given a newly reported item, finds items of the opposite kind that
//! plausibly describe the same physical object. The engine operates on a
//! read-only snapshot of the catalogue and has no side effects; the calling
//! application loads the snapshot (directly or through [`ItemStore`]) and
//! serializes the results.
//!
//! # Scoring Algorithm
//!
//! 1. Resolve the target; fail with [`MatchError::ItemNotFound`] if absent.
//! 2. Recovered targets short-circuit to an empty result.
//! 3. Keep candidates with a different id, the opposite kind, and the same
//!    category (exact, case-sensitive).
//! 4. Score each candidate as a fixed weighted sum:
//!
//! | Signal | Weight | Contribution |
//! |--------|--------|--------------|
//! | category | 0.30 | binary |
//! | location | 0.20 | binary, both sides present and equal |
//! | date | 0.15 | linear decay over 0..=5 days |
//! | title | 0.20 | [`text_similarity`] |
//! | description | 0.15 | [`text_similarity`] |
//!
//! 5. Drop scores `<= 0.4`.
//! 6. Stable sort by score (desc), so ties keep catalogue order.
//! 7. Truncate to 5.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::MatchError;
use crate::models::Item;
use crate::store::ItemStore;

pub const CATEGORY_WEIGHT: f64 = 0.30;
pub const LOCATION_WEIGHT: f64 = 0.20;
pub const DATE_WEIGHT: f64 = 0.15;
pub const TITLE_WEIGHT: f64 = 0.20;
pub const DESCRIPTION_WEIGHT: f64 = 0.15;

/// Divisor of the composite score. Every weight is counted whether or not
/// its signal had data, so this is the full weight sum.
pub const WEIGHT_TOTAL: f64 = 1.0;

/// Scores must be strictly greater than this to be returned.
pub const MATCH_THRESHOLD: f64 = 0.4;

pub const MAX_MATCHES: usize = 5;

/// Date gap (in days) at which the date signal reaches zero.
pub const DATE_WINDOW_DAYS: i64 = 5;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-signal contributions for one target/candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub category: f64,
    pub location: f64,
    pub date: f64,
    pub title: f64,
    pub description: f64,
    pub weight_total: f64,
    /// Composite score in `[0.0, 1.0]`.
    pub total: f64,
}

/// A ranked candidate borrowed from the input snapshot.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    pub item: &'a Item,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Owned form of [`Match`], returned by [`find_matches_in`] and serialized
/// by the CLI and HTTP layers.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub item: Item,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl From<Match<'_>> for MatchResult {
    fn from(m: Match<'_>) -> Self {
        MatchResult {
            item: m.item.clone(),
            score: m.score,
            breakdown: m.breakdown,
        }
    }
}

/// Find and rank candidate matches for `target_id` within `items`.
///
/// Returns at most [`MAX_MATCHES`] entries, sorted by score descending with
/// ties in input order.
pub fn find_matches<'a>(target_id: &str, items: &'a [Item]) -> Result<Vec<Match<'a>>, MatchError> {
    let target = items
        .iter()
        .find(|i| i.id == target_id)
        .ok_or_else(|| MatchError::ItemNotFound(target_id.to_string()))?;

    if target.kind.opposite().is_none() {
        debug!(item = %target.id, kind = %target.kind, "item is not a match source");
        return Ok(Vec::new());
    }

    let mut eligible = 0usize;
    let mut matches: Vec<Match<'a>> = items
        .iter()
        .filter(|candidate| is_eligible(target, candidate))
        .filter_map(|candidate| {
            eligible += 1;
            let breakdown = score_candidate(target, candidate);
            debug!(
                item = %target.id,
                candidate = %candidate.id,
                score = breakdown.total,
                "scored candidate"
            );
            passes_threshold(breakdown.total).then_some(Match {
                item: candidate,
                score: breakdown.total,
                breakdown,
            })
        })
        .collect();

    // `sort_by` is stable: equal scores keep catalogue order.
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    matches.truncate(MAX_MATCHES);

    debug!(
        item = %target.id,
        scanned = items.len(),
        eligible,
        returned = matches.len(),
        "match query complete"
    );

    Ok(matches)
}

/// Load the catalogue from `store` and run [`find_matches`] over it.
pub async fn find_matches_in<S: ItemStore + ?Sized>(
    store: &S,
    target_id: &str,
) -> Result<Vec<MatchResult>, MatchError> {
    let items = store.list_items().await?;
    let matches = find_matches(target_id, &items)?;
    Ok(matches.into_iter().map(MatchResult::from).collect())
}

/// Hard preconditions a candidate must meet before it is scored.
pub fn is_eligible(target: &Item, candidate: &Item) -> bool {
    candidate.id != target.id
        && target.kind.opposite() == Some(candidate.kind)
        && candidate.category == target.category
}

/// Compute the composite score of `candidate` against `target`.
///
/// Absent title or description text is scored as the empty string.
pub fn score_candidate(target: &Item, candidate: &Item) -> ScoreBreakdown {
    let category = if target.category == candidate.category {
        CATEGORY_WEIGHT
    } else {
        0.0
    };

    let location = match (present(&target.location), present(&candidate.location)) {
        (Some(a), Some(b)) if a == b => LOCATION_WEIGHT,
        _ => 0.0,
    };

    let date = DATE_WEIGHT * date_proximity(target.date.as_deref(), candidate.date.as_deref());

    let title = TITLE_WEIGHT
        * text_similarity(
            target.title.as_deref().unwrap_or(""),
            candidate.title.as_deref().unwrap_or(""),
        );

    let description = DESCRIPTION_WEIGHT
        * text_similarity(
            target.description.as_deref().unwrap_or(""),
            candidate.description.as_deref().unwrap_or(""),
        );

    let total = (category + location + date + title + description) / WEIGHT_TOTAL;

    ScoreBreakdown {
        category,
        location,
        date,
        title,
        description,
        weight_total: WEIGHT_TOTAL,
        total,
    }
}

/// Whether a composite score survives the threshold.
///
/// Strictly greater than [`MATCH_THRESHOLD`]; a sum that lands on the
/// threshold with float rounding error is still excluded.
pub fn passes_threshold(score: f64) -> bool {
    score - MATCH_THRESHOLD > f64::EPSILON
}

/// Token overlap of `a` against `b`, in `[0.0, 1.0]`.
///
/// Each word of `a` longer than 3 characters counts once if some word of
/// `b` equals it or contains/is contained in it (the contained side must be
/// longer than 4 characters). The count is divided by the number of words
/// in `a`, so the measure is asymmetric.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let a_words: Vec<&str> = a_lower.split_whitespace().collect();
    let b_words: Vec<&str> = b_lower.split_whitespace().collect();

    let matches = a_words
        .iter()
        .filter(|&&word| {
            word.chars().count() > 3 && b_words.iter().any(|&other| tokens_match(word, other))
        })
        .count();

    matches as f64 / a_words.len().max(1) as f64
}

fn tokens_match(a: &str, b: &str) -> bool {
    a == b || (a.chars().count() > 4 && b.contains(a)) || (b.chars().count() > 4 && a.contains(b))
}

/// Parse an item date. Only the exact `YYYY-MM-DD` shape is accepted.
pub fn parse_item_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Linear date-closeness factor in `[0.0, 1.0]`: 1 on the same day, 0 at
/// [`DATE_WINDOW_DAYS`] or more, and 0 when either date is missing or
/// malformed.
pub fn date_proximity(a: Option<&str>, b: Option<&str>) -> f64 {
    let (Some(a), Some(b)) = (a.and_then(parse_item_date), b.and_then(parse_item_date)) else {
        return 0.0;
    };
    let days = (a - b).num_days().abs();
    if days > DATE_WINDOW_DAYS {
        0.0
    } else {
        1.0 - days as f64 / DATE_WINDOW_DAYS as f64
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;

    fn item(id: &str, kind: Classification, category: &str) -> Item {
        Item {
            id: id.to_string(),
            title: None,
            description: None,
            image_url: None,
            category: category.to_string(),
            date: None,
            location: None,
            kind,
            user_id: None,
            secret_question: None,
            secret_answer: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn with_title(mut it: Item, title: &str) -> Item {
        it.title = Some(title.to_string());
        it
    }

    fn with_location(mut it: Item, location: &str) -> Item {
        it.location = Some(location.to_string());
        it
    }

    fn ids<'a>(matches: &[Match<'a>]) -> Vec<&'a str> {
        matches.iter().map(|m| m.item.id.as_str()).collect()
    }

    #[test]
    fn test_weights_sum_to_total() {
        let sum = CATEGORY_WEIGHT + LOCATION_WEIGHT + DATE_WEIGHT + TITLE_WEIGHT + DESCRIPTION_WEIGHT;
        assert!((sum - WEIGHT_TOTAL).abs() < 1e-12);
    }

    #[test]
    fn test_text_similarity_identical() {
        let s = "red backpack with zipper";
        assert!((text_similarity(s, s) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_text_similarity_disjoint() {
        assert_eq!(text_similarity("blue wallet", "green umbrella"), 0.0);
    }

    #[test]
    fn test_text_similarity_case_insensitive() {
        assert!((text_similarity("Black WALLET", "black wallet") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_text_similarity_short_tokens_never_match_but_count() {
        // "a" and "red" are too short to count; 1 of 3 words matches.
        let sim = text_similarity("a red umbrella", "a red umbrella");
        assert!((sim - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_text_similarity_substring_rules() {
        // "phone" (5 chars) is contained in "smartphone".
        assert!((text_similarity("phone", "smartphone") - 1.0).abs() < 1e-12);
        // "smartphone" contains the b-token "phone".
        assert!((text_similarity("smartphone", "phone") - 1.0).abs() < 1e-12);
        // "case" (4 chars) is too short to match as a substring.
        assert_eq!(text_similarity("case", "briefcase"), 0.0);
        // "bags" contains "bag", but "bag" is too short on the b side.
        assert_eq!(text_similarity("bags", "bag"), 0.0);
    }

    #[test]
    fn test_text_similarity_asymmetric() {
        let ab = text_similarity("wallet", "brown leather wallet");
        let ba = text_similarity("brown leather wallet", "wallet");
        assert!((ab - 1.0).abs() < 1e-12);
        assert!((ba - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_text_similarity_empty() {
        assert_eq!(text_similarity("", "anything here"), 0.0);
        assert_eq!(text_similarity("something", ""), 0.0);
        assert_eq!(text_similarity("   ", "   "), 0.0);
    }

    #[test]
    fn test_parse_item_date() {
        assert!(parse_item_date("2024-01-10").is_some());
        assert!(parse_item_date("2024-1-10").is_none());
        assert!(parse_item_date("10/01/2024").is_none());
        assert!(parse_item_date("2024-02-30").is_none());
        assert!(parse_item_date("").is_none());
    }

    #[test]
    fn test_date_proximity() {
        assert!((date_proximity(Some("2024-01-10"), Some("2024-01-10")) - 1.0).abs() < 1e-12);
        assert!((date_proximity(Some("2024-01-10"), Some("2024-01-12")) - 0.6).abs() < 1e-12);
        assert!((date_proximity(Some("2024-01-12"), Some("2024-01-10")) - 0.6).abs() < 1e-12);
        assert_eq!(date_proximity(Some("2024-01-10"), Some("2024-01-15")), 0.0);
        assert_eq!(date_proximity(Some("2024-01-10"), Some("2024-01-16")), 0.0);
        assert_eq!(date_proximity(Some("2024-01-10"), None), 0.0);
        assert_eq!(date_proximity(Some("yesterday"), Some("2024-01-10")), 0.0);
    }

    #[test]
    fn test_date_contribution() {
        let mut target = item("t", Classification::Lost, "keys");
        target.date = Some("2024-01-10".to_string());
        let mut two_days = item("c1", Classification::Found, "keys");
        two_days.date = Some("2024-01-12".to_string());
        let mut six_days = item("c2", Classification::Found, "keys");
        six_days.date = Some("2024-01-16".to_string());

        assert!((score_candidate(&target, &two_days).date - 0.09).abs() < 1e-12);
        assert_eq!(score_candidate(&target, &six_days).date, 0.0);
    }

    #[test]
    fn test_location_requires_both_sides() {
        let target = with_location(item("t", Classification::Lost, "keys"), "library");
        let same = with_location(item("c1", Classification::Found, "keys"), "library");
        let other = with_location(item("c2", Classification::Found, "keys"), "canteen");
        let absent = item("c3", Classification::Found, "keys");
        let empty = with_location(item("c4", Classification::Found, "keys"), "");

        assert_eq!(score_candidate(&target, &same).location, LOCATION_WEIGHT);
        assert_eq!(score_candidate(&target, &other).location, 0.0);
        assert_eq!(score_candidate(&target, &absent).location, 0.0);
        assert_eq!(score_candidate(&target, &empty).location, 0.0);
        assert_eq!(score_candidate(&absent, &absent).location, 0.0);
    }

    #[test]
    fn test_absent_text_scores_as_empty() {
        let target = item("t", Classification::Lost, "keys");
        let candidate = with_title(item("c", Classification::Found, "keys"), "house keys");
        let b = score_candidate(&target, &candidate);
        assert_eq!(b.title, 0.0);
        assert_eq!(b.description, 0.0);
        assert!((b.total - CATEGORY_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn test_score_in_unit_interval() {
        let mut target = with_location(
            with_title(item("t", Classification::Lost, "bags"), "blue backpack"),
            "gym",
        );
        target.description = Some("large backpack with zipper".to_string());
        target.date = Some("2024-05-05".to_string());
        let perfect = Item {
            id: "c".to_string(),
            kind: Classification::Found,
            ..target.clone()
        };
        let b = score_candidate(&target, &perfect);
        assert!((b.total - 1.0).abs() < 1e-12);
        assert!(b.total >= 0.0 && b.total <= 1.0 + 1e-12);
        assert_eq!(b.weight_total, 1.0);
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!passes_threshold(0.4));
        assert!(passes_threshold(0.4000001));
        assert!(!passes_threshold(0.3));
    }

    #[test]
    fn test_candidate_at_threshold_excluded() {
        // category 0.30 + title 0.20 * 1/2 = 0.40 exactly.
        let target = with_title(item("t", Classification::Lost, "keys"), "silver keychain");
        let candidate = with_title(item("c", Classification::Found, "keys"), "silver ring");
        let b = score_candidate(&target, &candidate);
        assert!((b.total - 0.4).abs() < 1e-12);

        let items = vec![target, candidate];
        assert!(find_matches("t", &items).unwrap().is_empty());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let target = Item {
            location: Some("library".to_string()),
            date: Some("2024-03-01".to_string()),
            title: Some("black phone".to_string()),
            description: Some("black android phone with case".to_string()),
            ..item("t", Classification::Lost, "electronics")
        };
        let candidate = Item {
            location: Some("library".to_string()),
            date: Some("2024-03-02".to_string()),
            title: Some("black smartphone".to_string()),
            description: Some("black android phone found near entrance".to_string()),
            ..item("c", Classification::Found, "electronics")
        };

        let b = score_candidate(&target, &candidate);
        assert!((b.category - 0.30).abs() < 1e-12);
        assert!((b.location - 0.20).abs() < 1e-12);
        assert!((b.date - 0.12).abs() < 1e-12);
        assert!((b.title - 0.20).abs() < 1e-12);
        // 3 of 5 description words overlap.
        assert!((b.description - 0.09).abs() < 1e-12);
        assert!((b.total - 0.91).abs() < 1e-12);

        let items = vec![target, candidate];
        let matches = find_matches("t", &items).unwrap();
        assert_eq!(ids(&matches), vec!["c"]);
        assert!(matches[0].score > MATCH_THRESHOLD);
    }

    #[test]
    fn test_not_found() {
        let items = vec![item("a", Classification::Lost, "keys")];
        let err = find_matches("missing", &items).unwrap_err();
        assert!(matches!(err, MatchError::ItemNotFound(ref id) if id == "missing"));

        let err = find_matches("missing", &[]).unwrap_err();
        assert!(matches!(err, MatchError::ItemNotFound(_)));
    }

    #[test]
    fn test_recovered_target_returns_empty() {
        let mut items = vec![with_location(
            with_title(item("t", Classification::Recovered, "keys"), "house keys"),
            "gym",
        )];
        for kind in [Classification::Lost, Classification::Found] {
            items.push(Item {
                id: format!("c-{}", kind),
                kind,
                ..items[0].clone()
            });
        }
        assert!(find_matches("t", &items).unwrap().is_empty());
    }

    #[test]
    fn test_same_kind_never_returned() {
        let target = with_location(
            with_title(item("t", Classification::Lost, "keys"), "house keys"),
            "gym",
        );
        let twin = Item {
            id: "twin".to_string(),
            ..target.clone()
        };
        let recovered = Item {
            id: "rec".to_string(),
            kind: Classification::Recovered,
            ..target.clone()
        };
        let items = vec![target, twin, recovered];
        assert!(find_matches("t", &items).unwrap().is_empty());
    }

    #[test]
    fn test_other_category_never_returned() {
        let target = with_location(
            with_title(item("t", Classification::Found, "keys"), "house keys"),
            "gym",
        );
        let candidate = Item {
            id: "c".to_string(),
            kind: Classification::Lost,
            category: "Keys".to_string(),
            ..target.clone()
        };
        let items = vec![target, candidate];
        assert!(find_matches("t", &items).unwrap().is_empty());
    }

    #[test]
    fn test_ranking_truncation_and_ties() {
        let target = with_location(
            with_title(item("t", Classification::Lost, "bags"), "blue backpack"),
            "gym",
        );
        let mut items = vec![target];
        // Same location: 0.30 + 0.20 + 0.20 = 0.70 each, in catalogue order.
        for i in 0..6 {
            items.push(with_location(
                with_title(item(&format!("tie{}", i), Classification::Found, "bags"), "blue backpack"),
                "gym",
            ));
        }
        // Best candidate appears last in the catalogue.
        let mut best = with_location(
            with_title(item("best", Classification::Found, "bags"), "blue backpack"),
            "gym",
        );
        best.description = Some("anything".to_string());
        items[0].description = Some("anything".to_string());
        items.push(best);

        let matches = find_matches("t", &items).unwrap();
        assert_eq!(matches.len(), MAX_MATCHES);
        assert_eq!(ids(&matches), vec!["best", "tie0", "tie1", "tie2", "tie3"]);
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let target = with_title(item("t", Classification::Lost, "bags"), "blue backpack");
        let candidate = with_title(item("c", Classification::Found, "bags"), "blue backpack");
        let items = vec![target, candidate];
        let before = items.clone();
        let _ = find_matches("t", &items).unwrap();
        assert_eq!(items, before);
    }

    #[tokio::test]
    async fn test_find_matches_in_store() {
        use crate::store::memory::InMemoryStore;

        let store = InMemoryStore::new();
        store
            .insert_item(&with_title(item("t", Classification::Found, "bags"), "blue backpack"))
            .await
            .unwrap();
        store
            .insert_item(&with_title(item("c", Classification::Lost, "bags"), "blue backpack"))
            .await
            .unwrap();

        let results = find_matches_in(&store, "t").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.id, "c");
        assert!((results[0].score - 0.5).abs() < 1e-12);

        let err = find_matches_in(&store, "nope").await.unwrap_err();
        assert!(matches!(err, MatchError::ItemNotFound(_)));
    }
}
