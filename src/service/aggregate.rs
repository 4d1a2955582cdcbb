//! Pure aggregation arithmetic.
//!
//! Everything here works on values already fetched from the stores, so it
//! can be tested without any backend. Percentages are whole numbers rounded
//! half up; a rate over an empty denominator is `None`.

use std::collections::BTreeMap;

use crate::domain::{
    Confirmation, ConfirmationMetrics, ConfirmationType, DeviceBreakdown, DeviceType, Event,
    EventPayload, FeedbackBreakdown, FeedbackTally, InterestSignals, LinkClickCount,
    SectionEngagement,
};

/// `round(part / whole * 100)`, or `None` when `whole` is zero.
#[must_use]
pub fn rounded_percent(part: u64, whole: u64) -> Option<u64> {
    if whole == 0 {
        return None;
    }
    let scaled = (u128::from(part) * 200 + u128::from(whole)) / (u128::from(whole) * 2);
    Some(u64::try_from(scaled).unwrap_or(u64::MAX))
}

/// Engagement rate used by both owner summaries; 0 without views.
#[must_use]
pub fn engagement_rate(engagements: u64, views: u64) -> u64 {
    rounded_percent(engagements, views).unwrap_or(0)
}

/// Sum and floored mean of known durations; `(0, 0)` when empty.
#[must_use]
pub fn duration_totals(durations: &[i64]) -> (i64, i64) {
    let total: i64 = durations.iter().sum();
    let len = i64::try_from(durations.len()).unwrap_or(i64::MAX);
    if len == 0 {
        return (0, 0);
    }
    (total, total.div_euclid(len))
}

/// Mean of known durations rounded half up; 0 when empty.
#[must_use]
pub fn rounded_mean(durations: &[i64]) -> i64 {
    let total: i64 = durations.iter().sum();
    let len = i64::try_from(durations.len()).unwrap_or(i64::MAX);
    if len == 0 {
        return 0;
    }
    (2 * total + len).div_euclid(2 * len)
}

/// Folds grouped device counts into the fixed three-bucket shape.
#[must_use]
pub fn device_breakdown(counts: &BTreeMap<DeviceType, u64>) -> DeviceBreakdown {
    let get = |device| counts.get(&device).copied().unwrap_or(0);
    DeviceBreakdown {
        mobile: get(DeviceType::Mobile),
        tablet: get(DeviceType::Tablet),
        desktop: get(DeviceType::Desktop),
    }
}

/// Accumulates dwell time per section from `SECTION_TIME` events.
///
/// Events without a section key are skipped; a missing time counts as 0.
/// Sections appear in the order they were first seen.
#[must_use]
pub fn section_engagement(events: &[Event]) -> Vec<SectionEngagement> {
    let mut sections: Vec<SectionEngagement> = Vec::new();
    for event in events {
        let EventPayload::SectionTime {
            section: Some(name),
            time_spent_ms,
        } = event.payload()
        else {
            continue;
        };
        let spent = time_spent_ms.unwrap_or(0);
        match sections.iter_mut().find(|s| s.section_name == name) {
            Some(entry) => {
                entry.total_time_spent = entry.total_time_spent.saturating_add(spent);
                entry.view_count += 1;
            }
            None => sections.push(SectionEngagement {
                section_name: name,
                total_time_spent: spent,
                view_count: 1,
            }),
        }
    }
    sections
}

/// Counts clicks per URL from `LINK_CLICK` events, most clicked first.
///
/// Events without a URL are skipped. Ties keep first-seen order.
#[must_use]
pub fn link_click_counts(events: &[Event]) -> Vec<LinkClickCount> {
    let mut links: Vec<LinkClickCount> = Vec::new();
    for event in events {
        let EventPayload::LinkClick { url: Some(url), .. } = event.payload() else {
            continue;
        };
        match links.iter_mut().find(|l| l.url == url) {
            Some(entry) => entry.count += 1,
            None => links.push(LinkClickCount { url, count: 1 }),
        }
    }
    links.sort_by(|a, b| b.count.cmp(&a.count));
    links
}

fn tally(counts: &BTreeMap<ConfirmationType, u64>, kind: ConfirmationType) -> u64 {
    counts.get(&kind).copied().unwrap_or(0)
}

/// Recap and value-proposition tallies.
#[must_use]
pub fn feedback_breakdown(counts: &BTreeMap<ConfirmationType, u64>) -> FeedbackBreakdown {
    FeedbackBreakdown {
        recap: FeedbackTally::new(
            tally(counts, ConfirmationType::RecapAccurate),
            tally(counts, ConfirmationType::RecapInaccurate),
        ),
        value_proposition: FeedbackTally::new(
            tally(counts, ConfirmationType::ValuePropClear),
            tally(counts, ConfirmationType::ValuePropUnclear),
        ),
    }
}

/// Interested and schedule-call counts.
#[must_use]
pub fn interest_signals(counts: &BTreeMap<ConfirmationType, u64>) -> InterestSignals {
    let interested_count = tally(counts, ConfirmationType::Interested);
    let schedule_call_count = tally(counts, ConfirmationType::ScheduleCall);
    InterestSignals {
        interested_count,
        schedule_call_count,
        total_interest: interested_count + schedule_call_count,
    }
}

/// Confirmation rates over grouped counts.
#[must_use]
pub fn confirmation_metrics(
    counts: &BTreeMap<ConfirmationType, u64>,
    recent_confirmations: Vec<Confirmation>,
) -> ConfirmationMetrics {
    let by_type: BTreeMap<ConfirmationType, u64> = ConfirmationType::ALL
        .into_iter()
        .map(|kind| (kind, tally(counts, kind)))
        .collect();
    let total = by_type.values().sum();

    let feedback = feedback_breakdown(counts);
    let interest = interest_signals(counts);

    ConfirmationMetrics {
        total,
        recap_accuracy_rate: rounded_percent(feedback.recap.positive, feedback.recap.total),
        value_prop_resonance_rate: rounded_percent(
            feedback.value_proposition.positive,
            feedback.value_proposition.total,
        ),
        interest_rate: rounded_percent(interest.total_interest, total),
        by_type,
        recent_confirmations,
    }
}
