use chrono::DateTime;
use std::{cmp::Ordering, collections::HashMap};

use crate::models::{CreatorSummary, ProfileImages, RatingRecord, RatingSummary};

pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const MAX_TOP_LIMIT: usize = 100;
pub const DEFAULT_MIN_RATINGS: u64 = 1;
pub const DEFAULT_RECENT_COUNT: usize = 3;
pub const MAX_RECENT_COUNT: usize = 100;

// Mean of `sum / count` rounded to one decimal, half away from zero.
// Computed on integers so values like 4.45 never fall to float error.
pub fn round_to_tenth(sum: i64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let count = count as i128;
    let scaled = sum as i128 * 10;
    let tenths = (scaled.abs() * 2 + count) / (2 * count);
    let tenths = if scaled < 0 { -tenths } else { tenths };
    tenths as f64 / 10.0
}

pub fn rating_summary(records: &[RatingRecord]) -> Option<RatingSummary> {
    if records.is_empty() {
        return None;
    }
    let sum: i64 = records.iter().map(|r| r.score).sum();
    let count = records.len() as u64;
    Some(RatingSummary {
        average_score: round_to_tenth(sum, count),
        rating_count: count,
    })
}

struct Accumulator {
    summary: CreatorSummary,
    sum: i64,
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>, present: impl Fn(&T) -> bool) {
    if slot.is_none() {
        if let Some(v) = value.as_ref().filter(|v| present(v)) {
            *slot = Some(v.clone());
        }
    }
}

fn non_blank(s: &String) -> bool {
    !s.trim().is_empty()
}

fn has_images(images: &ProfileImages) -> bool {
    !images.is_empty()
}

pub fn summarize(records: &[RatingRecord]) -> Vec<CreatorSummary> {
    let mut order: Vec<Accumulator> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.creator_id.as_str()).or_insert_with(|| {
            order.push(Accumulator {
                summary: CreatorSummary::unrated(record.creator_id.clone()),
                sum: 0,
            });
            order.len() - 1
        });

        let acc = &mut order[slot];
        acc.sum += record.score;
        acc.summary.rating_count += 1;

        let summary = &mut acc.summary;
        fill(&mut summary.display_name, &record.creator_display_name, non_blank);
        fill(&mut summary.thumbnail_url, &record.thumbnail_url, non_blank);
        fill(&mut summary.description, &record.description, non_blank);
        fill(&mut summary.profile_images, &record.profile_images, has_images);
    }

    order
        .into_iter()
        .map(|acc| {
            let mut summary = acc.summary;
            summary.average_score = round_to_tenth(acc.sum, summary.rating_count);
            summary
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopCreators {
    pub creators: Vec<CreatorSummary>,
    pub total: usize,
}

// Ranking is exact only within the records given; callers that pass one
// scan page get a per-page ranking.
pub fn top_creators(records: &[RatingRecord], min_ratings: u64, limit: usize) -> TopCreators {
    let mut creators: Vec<CreatorSummary> = summarize(records)
        .into_iter()
        .filter(|c| c.rating_count >= min_ratings)
        .collect();

    // Stable: ties keep grouping order.
    creators.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
    });

    let total = creators.len();
    creators.truncate(limit);

    TopCreators { creators, total }
}

fn newest_first(a: &RatingRecord, b: &RatingRecord) -> Ordering {
    match (
        DateTime::parse_from_rfc3339(&a.submitted_at),
        DateTime::parse_from_rfc3339(&b.submitted_at),
    ) {
        (Ok(a_at), Ok(b_at)) => b_at.cmp(&a_at),
        _ => b.submitted_at.cmp(&a.submitted_at),
    }
}

pub fn recent_ratings(mut records: Vec<RatingRecord>, count: usize) -> Vec<RatingRecord> {
    records.sort_by(newest_first);
    records.truncate(count);
    records
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
}

pub fn top_limit(raw: Option<&str>) -> usize {
    parse_int(raw)
        .map(|n| n.clamp(1, MAX_TOP_LIMIT as i64) as usize)
        .unwrap_or(DEFAULT_TOP_LIMIT)
}

pub fn min_ratings(raw: Option<&str>) -> u64 {
    parse_int(raw)
        .map(|n| n.max(0) as u64)
        .unwrap_or(DEFAULT_MIN_RATINGS)
}

pub fn recent_count(raw: Option<&str>) -> usize {
    parse_int(raw)
        .filter(|n| (1..=MAX_RECENT_COUNT as i64).contains(n))
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_RECENT_COUNT)
}
