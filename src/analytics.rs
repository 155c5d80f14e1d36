//! Call analytics for the dashboard: totals plus counts grouped by month,
//! sentiment, outcome and carrier.

use crate::consts::{MAX_CARRIER_GROUPS, MAX_MONTH_GROUPS};
use crate::db_types::{CallOutcome, CallerSentiment, InboundCall};

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use time::{Month, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallAnalytics {
    pub summary: AnalyticsSummary,
    pub by_month: Vec<MonthlyCalls>,
    pub by_sentiment: Vec<SentimentShare>,
    pub by_outcome: Vec<OutcomeShare>,
    pub by_carrier: Vec<CarrierCalls>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_calls: u64,
    pub period: &'static str,
    /// When the summary was computed, not when the data last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCalls {
    pub month: String,
    pub year: i32,
    pub calls: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentShare {
    pub sentiment: CallerSentiment,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeShare {
    pub outcome: CallOutcome,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarrierCalls {
    pub carrier_name: String,
    pub calls: u64,
}

/// Share of `count` in `total`, rounded to one decimal place. Zero when
/// there is nothing to divide by.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Counts per key, largest first; equal counts keep key order.
fn ranked<K: Ord + Copy>(keys: impl Iterator<Item = K>) -> Vec<(K, u64)> {
    let mut counts: BTreeMap<K, u64> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

fn by_month(calls: &[InboundCall]) -> Vec<MonthlyCalls> {
    let mut counts: BTreeMap<(i32, u8), (Month, u64)> = BTreeMap::new();
    for call in calls {
        let at = call.created_at.to_offset(UtcOffset::UTC);
        counts
            .entry((at.year(), u8::from(at.month())))
            .or_insert((at.month(), 0))
            .1 += 1;
    }
    counts
        .into_iter()
        .rev()
        .take(MAX_MONTH_GROUPS)
        .map(|((year, _), (month, calls))| MonthlyCalls {
            month: month.to_string(),
            year,
            calls,
        })
        .collect()
}

fn by_carrier(calls: &[InboundCall]) -> Vec<CarrierCalls> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for name in calls.iter().filter_map(|c| c.carrier_name.as_deref()) {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        *counts.entry(name.to_lowercase()).or_default() += 1;
    }
    let mut carriers: Vec<CarrierCalls> = counts
        .into_iter()
        .map(|(carrier_name, calls)| CarrierCalls { carrier_name, calls })
        .collect();
    carriers.sort_by(|a, b| {
        b.calls
            .cmp(&a.calls)
            .then_with(|| a.carrier_name.cmp(&b.carrier_name))
    });
    carriers.truncate(MAX_CARRIER_GROUPS);
    carriers
}

pub fn summarize(calls: &[InboundCall], now: OffsetDateTime) -> CallAnalytics {
    let total = calls.len() as u64;

    let by_sentiment = ranked(calls.iter().map(|c| c.caller_sentiment))
        .into_iter()
        .map(|(sentiment, count)| SentimentShare {
            sentiment,
            count,
            percentage: percentage(count, total),
        })
        .collect();
    let by_outcome = ranked(calls.iter().map(|c| c.outcome))
        .into_iter()
        .map(|(outcome, count)| OutcomeShare {
            outcome,
            count,
            percentage: percentage(count, total),
        })
        .collect();

    CallAnalytics {
        summary: AnalyticsSummary {
            total_calls: total,
            period: "all_time",
            last_updated: now,
        },
        by_month: by_month(calls),
        by_sentiment,
        by_outcome,
        by_carrier: by_carrier(calls),
    }
}
