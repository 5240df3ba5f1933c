//! Windowed liquidation aggregator
//!
//! Reduces a cache snapshot into per-symbol totals over a trailing window,
//! keeping only events whose notional clears the symbol's significance
//! threshold. Sub-threshold events are excluded entirely: they contribute to
//! neither the per-symbol groups nor the grand totals.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Serialize;

use brief_core::{CanonicalEvent, Side, ThresholdTable};

/// Per-symbol liquidation totals inside the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolGroup {
    pub symbol: String,
    pub total_notional: f64,
    pub long_notional: f64,
    pub long_count: usize,
    pub short_notional: f64,
    pub short_count: usize,
}

impl SymbolGroup {
    fn new(symbol: String) -> Self {
        Self {
            symbol,
            total_notional: 0.0,
            long_notional: 0.0,
            long_count: 0,
            short_notional: 0.0,
            short_count: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.long_count + self.short_count
    }
}

/// Result of one aggregation pass
///
/// `Quiet` is the explicit no-qualifying-events outcome; it is a normal
/// result, not an error. In a `Summary` the grand totals cover every
/// qualifying event even though `groups` is truncated to the display top-K.
#[derive(Debug, Clone, Serialize)]
pub enum LiquidationDigest {
    Quiet {
        window_hours: i64,
    },
    Summary {
        window_hours: i64,
        /// Top-K groups, ranked by total notional descending
        groups: Vec<SymbolGroup>,
        /// Sum of notional over all qualifying events, not just the top-K
        total_notional: f64,
        /// Count of all qualifying events, not just the top-K
        total_events: usize,
        /// Number of distinct qualifying symbols, not just the top-K
        symbol_count: usize,
    },
}

/// Aggregate a snapshot of liquidation events over a trailing window
///
/// Events outside the window or below their symbol's threshold are dropped.
/// Groups are ranked by total notional descending with a stable
/// symbol-ascending tie-break, then truncated to `top_k` for display.
pub fn aggregate(
    events: &[CanonicalEvent],
    window: Duration,
    thresholds: &ThresholdTable,
    top_k: usize,
) -> LiquidationDigest {
    let cutoff = Utc::now() - window;
    let window_hours = window.num_hours();

    let mut by_symbol: HashMap<String, SymbolGroup> = HashMap::new();
    let mut total_notional = 0.0;
    let mut total_events = 0usize;

    for event in events {
        if event.observed_at < cutoff {
            continue;
        }
        let notional = event.notional();
        if notional <= thresholds.threshold_for(&event.symbol) {
            continue;
        }

        let group = by_symbol
            .entry(event.symbol.clone())
            .or_insert_with(|| SymbolGroup::new(event.symbol.clone()));
        group.total_notional += notional;
        match event.side {
            Side::Long => {
                group.long_notional += notional;
                group.long_count += 1;
            }
            Side::Short => {
                group.short_notional += notional;
                group.short_count += 1;
            }
        }
        total_notional += notional;
        total_events += 1;
    }

    if by_symbol.is_empty() {
        return LiquidationDigest::Quiet { window_hours };
    }

    let symbol_count = by_symbol.len();
    let mut groups: Vec<SymbolGroup> = by_symbol.into_values().collect();
    groups.sort_by(|a, b| {
        b.total_notional
            .partial_cmp(&a.total_notional)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    groups.truncate(top_k);

    LiquidationDigest::Summary {
        window_hours,
        groups,
        total_notional,
        total_events,
        symbol_count,
    }
}

/// Compact USD formatting: $1.23m / $45.00k / $900
pub fn fmt_usd(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("${:.2}m", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("${:.2}k", n / 1_000.0)
    } else {
        format!("${:.0}", n)
    }
}

impl std::fmt::Display for LiquidationDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiquidationDigest::Quiet { window_hours } => write!(
                f,
                "Quiet -- no significant liquidations in last {window_hours}h"
            ),
            LiquidationDigest::Summary {
                window_hours,
                groups,
                total_notional,
                total_events,
                symbol_count,
            } => {
                writeln!(
                    f,
                    "*{}h Liquidation Summary* -- Total: {}",
                    window_hours,
                    fmt_usd(*total_notional)
                )?;
                writeln!(f)?;
                for group in groups {
                    let mut parts = Vec::new();
                    if group.long_notional > 0.0 {
                        parts.push(format!(
                            "\u{1f534} Longs: {} ({})",
                            fmt_usd(group.long_notional),
                            group.long_count
                        ));
                    }
                    if group.short_notional > 0.0 {
                        parts.push(format!(
                            "\u{1f7e2} Shorts: {} ({})",
                            fmt_usd(group.short_notional),
                            group.short_count
                        ));
                    }
                    writeln!(f, "*#{}* -- {}", group.symbol, parts.join("  |  "))?;
                }
                writeln!(f)?;
                write!(
                    f,
                    "_{total_events} total liquidation events across {symbol_count} symbols_"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(symbol: &str, notional: f64, side: Side) -> CanonicalEvent {
        // price = notional, size = 1 keeps the math obvious
        CanonicalEvent::new("test", symbol, notional, 1.0, side, format!("{symbol}-{notional}"))
    }

    fn thresholds() -> ThresholdTable {
        ThresholdTable::new(
            std::collections::HashMap::from([
                ("BTC".to_string(), 200_000.0),
                ("ETH".to_string(), 200_000.0),
                ("SOL".to_string(), 100_000.0),
            ]),
            50_000.0,
            150_000.0,
        )
        .unwrap()
    }

    #[test]
    fn empty_snapshot_is_quiet() {
        let digest = aggregate(&[], Duration::hours(12), &thresholds(), 8);
        assert!(matches!(digest, LiquidationDigest::Quiet { window_hours: 12 }));
    }

    #[test]
    fn all_below_threshold_is_quiet_not_empty_summary() {
        let events = vec![
            event("BTC", 120_000.0, Side::Long),
            event("SOL", 40_000.0, Side::Short),
        ];
        let digest = aggregate(&events, Duration::hours(12), &thresholds(), 8);
        assert!(matches!(digest, LiquidationDigest::Quiet { .. }));
    }

    #[test]
    fn threshold_filtering_matches_worked_example() {
        // BTC 120k and 90k are below the 200k bar, SOL 40k below 100k;
        // only ETH 300k and BTC 250k qualify.
        let events = vec![
            event("BTC", 120_000.0, Side::Long),
            event("BTC", 90_000.0, Side::Short),
            event("ETH", 300_000.0, Side::Long),
            event("SOL", 40_000.0, Side::Long),
            event("BTC", 250_000.0, Side::Long),
        ];
        let digest = aggregate(&events, Duration::hours(24), &thresholds(), 8);

        let LiquidationDigest::Summary {
            groups,
            total_notional,
            total_events,
            symbol_count,
            ..
        } = digest
        else {
            panic!("expected a summary");
        };

        assert_eq!(symbol_count, 2);
        assert_eq!(total_events, 2);
        assert_eq!(total_notional, 550_000.0);

        assert_eq!(groups[0].symbol, "ETH");
        assert_eq!(groups[0].total_notional, 300_000.0);
        assert_eq!(groups[0].count(), 1);
        assert_eq!(groups[1].symbol, "BTC");
        assert_eq!(groups[1].total_notional, 250_000.0);
        assert_eq!(groups[1].count(), 1);
    }

    #[test]
    fn grand_totals_cover_more_than_top_k() {
        let events = vec![
            event("AAA", 500_000.0, Side::Long),
            event("BBB", 400_000.0, Side::Short),
            event("CCC", 300_000.0, Side::Long),
            event("DDD", 200_000.0, Side::Short),
            event("EEE", 100_000.0, Side::Long),
        ];
        let digest = aggregate(&events, Duration::hours(12), &thresholds(), 2);

        let LiquidationDigest::Summary {
            groups,
            total_notional,
            total_events,
            symbol_count,
            ..
        } = digest
        else {
            panic!("expected a summary");
        };

        assert_eq!(groups.len(), 2);
        assert_eq!(symbol_count, 5);
        assert_eq!(total_events, 5);
        assert_eq!(total_notional, 1_500_000.0);
    }

    #[test]
    fn ranking_is_descending_with_symbol_tiebreak() {
        let events = vec![
            event("ZZZ", 300_000.0, Side::Long),
            event("AAA", 300_000.0, Side::Short),
            event("MMM", 400_000.0, Side::Long),
        ];
        let digest = aggregate(&events, Duration::hours(12), &thresholds(), 8);

        let LiquidationDigest::Summary { groups, .. } = digest else {
            panic!("expected a summary");
        };
        let symbols: Vec<&str> = groups.iter().map(|g| g.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MMM", "AAA", "ZZZ"]);
    }

    #[test]
    fn window_excludes_stale_events() {
        let mut stale = event("BTC", 500_000.0, Side::Long);
        stale.observed_at = Utc::now() - Duration::hours(13);
        let fresh = event("ETH", 300_000.0, Side::Short);

        let digest = aggregate(&[stale, fresh], Duration::hours(12), &thresholds(), 8);
        let LiquidationDigest::Summary { groups, total_notional, .. } = digest else {
            panic!("expected a summary");
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].symbol, "ETH");
        assert_eq!(total_notional, 300_000.0);
    }

    #[test]
    fn sides_are_split_within_a_group() {
        let events = vec![
            event("BTC", 250_000.0, Side::Long),
            event("BTC", 300_000.0, Side::Short),
        ];
        let digest = aggregate(&events, Duration::hours(12), &thresholds(), 8);
        let LiquidationDigest::Summary { groups, .. } = digest else {
            panic!("expected a summary");
        };
        assert_eq!(groups[0].long_notional, 250_000.0);
        assert_eq!(groups[0].long_count, 1);
        assert_eq!(groups[0].short_notional, 300_000.0);
        assert_eq!(groups[0].short_count, 1);
        assert_eq!(groups[0].total_notional, 550_000.0);
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(fmt_usd(1_230_000.0), "$1.23m");
        assert_eq!(fmt_usd(45_000.0), "$45.00k");
        assert_eq!(fmt_usd(900.0), "$900");
    }

    #[test]
    fn quiet_display_names_the_window() {
        let digest = aggregate(&[], Duration::hours(12), &thresholds(), 8);
        assert_eq!(
            digest.to_string(),
            "Quiet -- no significant liquidations in last 12h"
        );
    }
}
