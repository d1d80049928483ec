//! crates/reading_tracker_core/src/allocator.rs
//!
//! Day-bucket allocation: splits a reading session's minutes and pages across the
//! UTC calendar days it overlaps.
//!
//! Everything here is a pure function of its inputs. All proportional shares are
//! computed with exact integer arithmetic so results are reproducible.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::calendar::{next_day_start, DayKey};
use crate::domain::{DayAllocation, ReadingSession};

/// The whole minutes of a session that fall on one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySegment {
    pub day: DayKey,
    pub minutes: u32,
}

/// `[started_at, ended_at)`, or `[started_at, started_at + duration)` for an open session.
pub fn effective_interval(session: &ReadingSession) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = session.ended_at.unwrap_or_else(|| {
        session.started_at + Duration::minutes(i64::from(session.duration_minutes))
    });
    (session.started_at, end)
}

/// Clips the session to `[window_start, window_end)` and walks UTC day boundaries,
/// yielding one segment per day with at least one whole minute of overlap.
///
/// An empty or inverted clipped interval yields no segments. A non-empty interval
/// shorter than a minute yields a single zero-minute segment on its start day, so
/// page distribution still has somewhere to put the pages.
pub fn compute_day_segments(
    session: &ReadingSession,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<DaySegment> {
    let (session_start, session_end) = effective_interval(session);
    let start = session_start.max(window_start);
    let end = session_end.min(window_end);
    if end <= start {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let segment_end = next_day_start(cursor).min(end);
        let minutes = (segment_end - cursor).num_minutes();
        if minutes > 0 {
            segments.push(DaySegment {
                day: DayKey::of(cursor),
                minutes: minutes as u32,
            });
        }
        cursor = segment_end;
    }

    if segments.is_empty() {
        segments.push(DaySegment {
            day: DayKey::of(start),
            minutes: 0,
        });
    }
    segments
}

/// Splits `total_pages` across `segments` proportionally to their minutes, keyed by day.
///
/// When there are at least as many pages as segments, every segment gets one page
/// first and the leftover after flooring is handed out one page at a time in order
/// of descending weight, earliest first on ties. Otherwise the whole flooring
/// leftover goes to the single heaviest segment (earliest on ties).
pub fn distribute_pages(segments: &[DaySegment], total_pages: u32) -> BTreeMap<DayKey, u32> {
    let weights: Vec<u32> = segments.iter().map(|s| s.minutes).collect();
    let mut pages = BTreeMap::new();
    for (segment, share) in segments.iter().zip(split_pages(&weights, total_pages)) {
        *pages.entry(segment.day).or_insert(0) += share;
    }
    pages
}

/// Index-aligned page shares for `weights`. The shares always sum to `total_pages`.
pub(crate) fn split_pages(weights: &[u32], total_pages: u32) -> Vec<u32> {
    if weights.is_empty() {
        return Vec::new();
    }
    let count = weights.len() as u64;
    let total = u64::from(total_pages);
    let weight_total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
    let (base, distributable) = if total >= count {
        (1, total - count)
    } else {
        (0, total)
    };

    let mut shares: Vec<u64> = weights
        .iter()
        .map(|&w| {
            if weight_total == 0 {
                0
            } else {
                u64::from(w) * distributable / weight_total
            }
        })
        .collect();
    let remainder = distributable - shares.iter().sum::<u64>();

    if base == 1 {
        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|&a, &b| weights[b].cmp(&weights[a]).then(a.cmp(&b)));
        // Only all-zero weights can leave more than one page per segment here.
        for &idx in order.iter().cycle().take(remainder as usize) {
            shares[idx] += 1;
        }
    } else if let Some(heaviest) = heaviest_index(weights) {
        shares[heaviest] += remainder;
    }

    shares.into_iter().map(|s| (s + base) as u32).collect()
}

/// Largest weight, earliest index on ties.
fn heaviest_index(weights: &[u32]) -> Option<usize> {
    weights
        .iter()
        .enumerate()
        .max_by(|(a_idx, a), (b_idx, b)| a.cmp(b).then(b_idx.cmp(a_idx)))
        .map(|(idx, _)| idx)
}

/// Fits the recorded reading time into the elapsed wall-clock segments.
///
/// If `available_minutes` covers every segment they are returned unchanged. Otherwise
/// the first day is filled first, then the last day, and the interior days share
/// what is left in proportion to their elapsed minutes (rounded, with the final
/// interior day taking the rounding residue).
pub fn allocate_minutes_within_budget(segments: &[DaySegment], available_minutes: u32) -> Vec<DaySegment> {
    let total_actual: u64 = segments.iter().map(|s| u64::from(s.minutes)).sum();
    if u64::from(available_minutes) >= total_actual {
        return segments.to_vec();
    }

    match segments {
        [] => Vec::new(),
        [only] => vec![DaySegment {
            minutes: only.minutes.min(available_minutes),
            ..*only
        }],
        [first, middle @ .., last] => {
            let first_minutes = first.minutes.min(available_minutes);
            let mut remaining = available_minutes - first_minutes;
            let last_minutes = last.minutes.min(remaining);
            remaining -= last_minutes;

            let mut allocations = Vec::with_capacity(segments.len());
            allocations.push(DaySegment {
                minutes: first_minutes,
                ..*first
            });

            let middle_total: u64 = middle.iter().map(|s| u64::from(s.minutes)).sum();
            let mut distributed = 0u32;
            for (idx, segment) in middle.iter().enumerate() {
                let budget_left = remaining - distributed;
                let minutes = if middle_total == 0 {
                    0
                } else if idx == middle.len() - 1 {
                    budget_left
                } else {
                    let numerator = 2 * u64::from(segment.minutes) * u64::from(remaining) + middle_total;
                    let rounded = numerator / (2 * middle_total);
                    (rounded as u32).min(budget_left)
                };
                distributed += minutes;
                allocations.push(DaySegment {
                    minutes,
                    ..*segment
                });
            }

            allocations.push(DaySegment {
                minutes: last_minutes,
                ..*last
            });
            allocations
        }
    }
}

/// Per-day minutes and pages for one session, restricted to days inside
/// `[window_start, window_end)`.
///
/// The split is always computed over the session's full span, so a session that
/// crosses a month boundary reports the same figures for a day regardless of which
/// month is being queried.
///
/// Reported minutes sum to `min(duration_minutes, whole elapsed minutes)`. Per-day
/// flooring can lose up to a minute per boundary when the timestamps carry seconds;
/// that residue goes to the heaviest day, earliest on ties.
pub fn attribute_session(
    session: &ReadingSession,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<DayAllocation> {
    let (start, end) = effective_interval(session);
    let segments = compute_day_segments(session, start, end);
    if segments.is_empty() {
        return Vec::new();
    }

    let weights: Vec<u32> = segments.iter().map(|s| s.minutes).collect();
    let mut minutes = allocate_minutes_within_budget(&segments, session.duration_minutes);
    let elapsed = u32::try_from((end - start).num_minutes()).unwrap_or(u32::MAX);
    let target = session.duration_minutes.min(elapsed);
    let allocated: u32 = minutes.iter().map(|s| s.minutes).sum();
    if let Some(heaviest) = heaviest_index(&weights) {
        minutes[heaviest].minutes += target.saturating_sub(allocated);
    }
    let pages = split_pages(&weights, session.pages_read);
    let first_day = DayKey::of(window_start);

    minutes
        .into_iter()
        .zip(pages)
        .filter(|(segment, _)| segment.day >= first_day && segment.day.start() < window_end)
        .map(|(segment, pages)| DayAllocation {
            day: segment.day,
            minutes: segment.minutes,
            pages,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::month_window;
    use crate::domain::SessionType;
    use uuid::Uuid;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn session(start: &str, end: Option<&str>, duration: u32, pages: u32) -> ReadingSession {
        ReadingSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_type: SessionType::Free,
            started_at: at(start),
            ended_at: end.map(at),
            duration_minutes: duration,
            pages_read: pages,
            created_at: at(start),
        }
    }

    fn seg(day: &str, minutes: u32) -> DaySegment {
        DaySegment {
            day: DayKey::of(at(&format!("{}T00:00:00Z", day))),
            minutes,
        }
    }

    fn summarize(allocations: &[DayAllocation]) -> Vec<(String, u32, u32)> {
        allocations
            .iter()
            .map(|a| (a.day.to_string(), a.minutes, a.pages))
            .collect()
    }

    #[test]
    fn month_boundary_session_splits_evenly() {
        let s = session("2023-10-31T23:30:00Z", Some("2023-11-01T00:30:00Z"), 60, 60);

        let (oct_start, oct_end) = month_window(2023, 10).unwrap();
        let (nov_start, nov_end) = month_window(2023, 11).unwrap();

        assert_eq!(
            summarize(&attribute_session(&s, oct_start, oct_end)),
            vec![("2023-10-31".to_string(), 30, 30)]
        );
        assert_eq!(
            summarize(&attribute_session(&s, nov_start, nov_end)),
            vec![("2023-11-01".to_string(), 30, 30)]
        );
    }

    #[test]
    fn seconds_offsets_still_conserve_minutes() {
        let s = session("2023-10-31T23:30:30Z", Some("2023-11-01T00:30:30Z"), 60, 60);
        let days = attribute_session(&s, at("2023-10-01T00:00:00Z"), at("2023-12-01T00:00:00Z"));

        assert_eq!(days.iter().map(|d| d.minutes).sum::<u32>(), 60);
        assert_eq!(days.iter().map(|d| d.pages).sum::<u32>(), 60);
        assert_eq!(
            summarize(&days),
            vec![("2023-10-31".to_string(), 29, 29), ("2023-11-01".to_string(), 31, 31)]
        );

        let open = session("2023-10-31T23:30:30Z", None, 60, 60);
        let days = attribute_session(&open, at("2023-10-01T00:00:00Z"), at("2023-12-01T00:00:00Z"));
        assert_eq!(days.iter().map(|d| d.minutes).sum::<u32>(), 60);
    }

    #[test]
    fn seconds_offsets_never_exceed_the_duration() {
        let s = session("2023-11-10T23:50:30Z", Some("2023-11-12T00:10:30Z"), 120, 13);
        let days = attribute_session(&s, at("2023-11-01T00:00:00Z"), at("2023-12-01T00:00:00Z"));
        assert_eq!(days.iter().map(|d| d.minutes).sum::<u32>(), 120);

        // Less than the elapsed time was read, and the elapsed time is not whole minutes.
        let s = session("2023-11-10T10:00:45Z", Some("2023-11-10T10:30:15Z"), 45, 3);
        let days = attribute_session(&s, at("2023-11-01T00:00:00Z"), at("2023-12-01T00:00:00Z"));
        assert_eq!(summarize(&days), vec![("2023-11-10".to_string(), 29, 3)]);
    }

    #[test]
    fn three_day_session_favours_heaviest_day() {
        let s = session("2023-11-10T23:50:00Z", Some("2023-11-12T00:10:00Z"), 120, 13);
        let (start, end) = month_window(2023, 11).unwrap();

        let days = attribute_session(&s, start, end);
        let minutes: Vec<u32> = days.iter().map(|d| d.minutes).collect();
        let pages: Vec<u32> = days.iter().map(|d| d.pages).collect();

        assert_eq!(minutes, vec![10, 100, 10]);
        assert_eq!(pages.iter().sum::<u32>(), 13);
        assert!(pages[1] >= 11);
        assert!(pages[0] >= 1 && pages[2] >= 1);
    }

    #[test]
    fn open_session_uses_duration_as_its_span() {
        let s = session("2023-10-31T23:30:00Z", None, 60, 20);
        let (oct_start, oct_end) = month_window(2023, 10).unwrap();
        let (nov_start, nov_end) = month_window(2023, 11).unwrap();

        assert_eq!(
            summarize(&attribute_session(&s, oct_start, oct_end)),
            vec![("2023-10-31".to_string(), 30, 10)]
        );
        assert_eq!(
            summarize(&attribute_session(&s, nov_start, nov_end)),
            vec![("2023-11-01".to_string(), 30, 10)]
        );
    }

    #[test]
    fn segments_are_clipped_to_the_window() {
        let s = session("2023-11-10T23:50:00Z", Some("2023-11-12T00:10:00Z"), 120, 13);

        let segments = compute_day_segments(&s, at("2023-11-11T12:00:00Z"), at("2023-12-01T00:00:00Z"));
        assert_eq!(segments, vec![seg("2023-11-11", 720), seg("2023-11-12", 10)]);
    }

    #[test]
    fn inverted_or_empty_window_has_no_segments() {
        let inverted = session("2023-11-10T10:00:00Z", Some("2023-11-10T09:00:00Z"), 60, 5);
        assert!(compute_day_segments(&inverted, at("2023-11-01T00:00:00Z"), at("2023-12-01T00:00:00Z")).is_empty());
        assert!(attribute_session(&inverted, at("2023-11-01T00:00:00Z"), at("2023-12-01T00:00:00Z")).is_empty());

        let s = session("2023-11-10T10:00:00Z", Some("2023-11-10T11:00:00Z"), 60, 5);
        assert!(compute_day_segments(&s, at("2023-12-01T00:00:00Z"), at("2024-01-01T00:00:00Z")).is_empty());
    }

    #[test]
    fn sub_minute_session_keeps_pages_on_start_day() {
        let s = session("2023-11-10T23:59:40Z", Some("2023-11-11T00:00:10Z"), 0, 4);
        let (start, end) = month_window(2023, 11).unwrap();

        let segments = compute_day_segments(&s, start, end);
        assert_eq!(segments, vec![seg("2023-11-10", 0)]);
        assert_eq!(
            summarize(&attribute_session(&s, start, end)),
            vec![("2023-11-10".to_string(), 0, 4)]
        );
    }

    #[test]
    fn sparse_pages_go_to_heaviest_segment() {
        let segments = [seg("2023-11-10", 10), seg("2023-11-11", 100), seg("2023-11-12", 10)];
        let pages = distribute_pages(&segments, 2);

        assert_eq!(pages.values().copied().collect::<Vec<_>>(), vec![0, 2, 0]);
    }

    #[test]
    fn sparse_pages_tie_goes_to_earliest() {
        let segments = [seg("2023-11-10", 30), seg("2023-11-11", 30), seg("2023-11-12", 30)];
        let pages = distribute_pages(&segments, 2);

        assert_eq!(pages.values().copied().collect::<Vec<_>>(), vec![2, 0, 0]);
    }

    #[test]
    fn remainder_follows_weight_then_index_order() {
        assert_eq!(split_pages(&[60, 60], 3), vec![2, 1]);
        assert_eq!(split_pages(&[10, 50, 50], 6), vec![1, 3, 2]);
    }

    #[test]
    fn zero_weights_still_conserve_pages() {
        assert_eq!(split_pages(&[0, 0], 5), vec![3, 2]);
        assert_eq!(split_pages(&[0, 0], 1), vec![1, 0]);
        assert_eq!(split_pages(&[0, 0], 0), vec![0, 0]);
        assert!(split_pages(&[], 7).is_empty());
    }

    #[test]
    fn page_split_conserves_total_and_respects_weight_order() {
        let weight_sets: [&[u32]; 6] = [
            &[10, 100, 10],
            &[1, 2, 3, 4],
            &[1440, 7, 1440, 0],
            &[30, 30],
            &[5],
            &[0, 59, 60, 61, 1],
        ];
        for weights in weight_sets {
            for total in 0..=60u32 {
                let shares = split_pages(weights, total);
                assert_eq!(shares.iter().sum::<u32>(), total, "weights {:?} total {}", weights, total);
                for a in 0..weights.len() {
                    for b in 0..weights.len() {
                        if weights[a] > weights[b] {
                            assert!(
                                shares[a] >= shares[b],
                                "weights {:?} total {} shares {:?}",
                                weights,
                                total,
                                shares
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn minutes_within_budget_are_unchanged() {
        let segments = [seg("2023-11-10", 10), seg("2023-11-11", 100), seg("2023-11-12", 10)];
        assert_eq!(allocate_minutes_within_budget(&segments, 120), segments.to_vec());
        assert_eq!(allocate_minutes_within_budget(&segments, 500), segments.to_vec());
        assert!(allocate_minutes_within_budget(&[], 10).is_empty());
    }

    #[test]
    fn compressed_minutes_fill_boundary_days_first() {
        let segments = [seg("2023-11-10", 10), seg("2023-11-11", 100), seg("2023-11-12", 10)];
        let minutes: Vec<u32> = allocate_minutes_within_budget(&segments, 60)
            .iter()
            .map(|s| s.minutes)
            .collect();
        assert_eq!(minutes, vec![10, 40, 10]);

        let minutes: Vec<u32> = allocate_minutes_within_budget(&segments, 15)
            .iter()
            .map(|s| s.minutes)
            .collect();
        assert_eq!(minutes, vec![10, 0, 5]);

        let single = [seg("2023-11-10", 90)];
        assert_eq!(allocate_minutes_within_budget(&single, 45), vec![seg("2023-11-10", 45)]);

        let pair = [seg("2023-11-10", 30), seg("2023-11-11", 30)];
        let minutes: Vec<u32> = allocate_minutes_within_budget(&pair, 40).iter().map(|s| s.minutes).collect();
        assert_eq!(minutes, vec![30, 10]);
    }

    #[test]
    fn interior_days_share_the_remaining_budget() {
        let segments = [
            seg("2023-11-10", 30),
            seg("2023-11-11", 1440),
            seg("2023-11-12", 1440),
            seg("2023-11-13", 30),
        ];
        let minutes: Vec<u32> = allocate_minutes_within_budget(&segments, 1000)
            .iter()
            .map(|s| s.minutes)
            .collect();
        assert_eq!(minutes, vec![30, 470, 470, 30]);
    }

    #[test]
    fn attributed_minutes_are_capped_by_duration() {
        // Two full days and change elapsed, but only 90 minutes were actually read.
        let s = session("2023-11-10T23:00:00Z", Some("2023-11-13T01:00:00Z"), 90, 9);
        let days = attribute_session(&s, at("2023-11-01T00:00:00Z"), at("2023-12-01T00:00:00Z"));

        let total_minutes: u32 = days.iter().map(|d| d.minutes).sum();
        let total_pages: u32 = days.iter().map(|d| d.pages).sum();
        assert_eq!(total_minutes, 90);
        assert_eq!(total_pages, 9);
        assert_eq!(days.first().map(|d| d.minutes), Some(60));
        assert_eq!(days.last().map(|d| d.minutes), Some(30));
    }
}
