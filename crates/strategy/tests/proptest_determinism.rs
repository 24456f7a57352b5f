use common::IndicatorRow;
use proptest::prelude::*;
use strategy::{SignalCode, StrategyRegistry};

fn sma() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("0".to_string()),
        (1u32..100_000u32).prop_map(|v| format!("{}.{:02}", v / 100, v % 100)),
    ]
}

fn rows() -> impl Strategy<Value = Vec<IndicatorRow>> {
    prop::collection::vec((sma(), sma(), sma(), sma(), sma(), sma()), 0..64).prop_map(|fields| {
        fields
            .into_iter()
            .enumerate()
            .map(|(i, (a, b, c, d, e, f))| IndicatorRow {
                datetime: 1_700_000_000 + i as i64 * 86_400,
                sma0005: a,
                sma0010: b,
                sma0020: c,
                sma0060: d,
                sma0120: e,
                sma0240: f,
            })
            .collect()
    })
}

proptest! {
    /// The same series always yields the same codes.
    #[test]
    fn evaluation_is_deterministic(series in rows()) {
        let registry = StrategyRegistry::default();
        let first = registry.evaluate(&series).unwrap();
        let second = registry.evaluate(&series).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Every strategy produces exactly one code per row.
    #[test]
    fn codes_align_with_rows(series in rows()) {
        for eval in StrategyRegistry::default().evaluate(&series).unwrap() {
            prop_assert_eq!(eval.codes.len(), series.len());
        }
    }

    /// Codes for a prefix do not change when more bars are appended, so
    /// reprocessing a longer series rewrites historical rows with the same value.
    #[test]
    fn appending_bars_keeps_earlier_codes(series in rows(), cut in 0usize..64) {
        let cut = cut.min(series.len());
        let registry = StrategyRegistry::default();
        let full = registry.evaluate(&series).unwrap();
        let prefix = registry.evaluate(&series[..cut]).unwrap();
        for (f, p) in full.iter().zip(prefix.iter()) {
            prop_assert_eq!(&f.codes[..cut], &p.codes[..]);
        }
    }

    /// The first bar never carries an actionable code.
    #[test]
    fn first_bar_is_nil(series in rows()) {
        for eval in StrategyRegistry::default().evaluate(&series).unwrap() {
            if let Some(first) = eval.codes.first() {
                prop_assert_eq!(*first, SignalCode::Nil);
            }
        }
    }
}
