//! SMA alignment crossover.
//!
//! Each bar carries three moving averages of increasing window length. A bar
//! is *bullish* when `short > medium > long` and *bearish* when
//! `short < medium < long`. A `BUY` is emitted on the first bullish bar after
//! a non-bullish one, a `SELL` on the first bearish bar after a non-bearish
//! one. Everything else is `NIL`.

use crate::SignalCode;

/// The three averages one strategy looks at for a single bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverInput {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

impl CrossoverInput {
    pub fn new(short: f64, medium: f64, long: f64) -> Self {
        Self { short, medium, long }
    }

    /// Upstream stores `0` while a window is still filling.
    fn is_ready(&self) -> bool {
        [self.short, self.medium, self.long]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    fn alignment(&self) -> Alignment {
        if self.short > self.medium && self.medium > self.long {
            Alignment::Bullish
        } else if self.short < self.medium && self.medium < self.long {
            Alignment::Bearish
        } else {
            Alignment::Mixed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Bullish,
    Bearish,
    Mixed,
}

/// Map an ordered input series to one code per bar.
///
/// Pure: the output depends only on `inputs`, and `out.len() == inputs.len()`.
pub fn calculate(inputs: &[CrossoverInput]) -> Vec<SignalCode> {
    let mut codes = Vec::with_capacity(inputs.len());
    if inputs.is_empty() {
        return codes;
    }

    // No predecessor for the first bar
    codes.push(SignalCode::Nil);

    for pair in inputs.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if !prev.is_ready() || !curr.is_ready() {
            codes.push(SignalCode::Nil);
            continue;
        }

        let code = match (prev.alignment(), curr.alignment()) {
            (p, Alignment::Bullish) if p != Alignment::Bullish => SignalCode::Buy,
            (p, Alignment::Bearish) if p != Alignment::Bearish => SignalCode::Sell,
            _ => SignalCode::Nil,
        };
        codes.push(code);
    }

    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(short: f64, medium: f64, long: f64) -> CrossoverInput {
        CrossoverInput::new(short, medium, long)
    }

    #[test]
    fn empty_series_yields_no_codes() {
        assert!(calculate(&[]).is_empty());
    }

    #[test]
    fn first_bar_is_always_nil() {
        let codes = calculate(&[input(3.0, 2.0, 1.0)]);
        assert_eq!(codes, vec![SignalCode::Nil]);
    }

    #[test]
    fn bullish_transition_emits_buy_once() {
        let codes = calculate(&[
            input(1.0, 2.0, 3.0), // bearish
            input(2.5, 2.0, 3.0), // mixed
            input(3.5, 3.0, 2.9), // bullish
            input(4.0, 3.5, 3.0), // still bullish
        ]);
        assert_eq!(
            codes,
            vec![SignalCode::Nil, SignalCode::Nil, SignalCode::Buy, SignalCode::Nil]
        );
    }

    #[test]
    fn bearish_transition_emits_sell() {
        let codes = calculate(&[input(3.0, 2.0, 1.0), input(1.0, 2.0, 3.0)]);
        assert_eq!(codes, vec![SignalCode::Nil, SignalCode::Sell]);
    }

    #[test]
    fn unfilled_windows_produce_nil() {
        // The long window is still filling on the first two bars
        let codes = calculate(&[
            input(1.0, 2.0, 0.0),
            input(3.0, 2.0, 0.0),
            input(3.0, 2.0, 1.0),
            input(1.0, 2.0, 3.0),
        ]);
        assert_eq!(
            codes,
            vec![SignalCode::Nil, SignalCode::Nil, SignalCode::Nil, SignalCode::Sell]
        );
    }

    #[test]
    fn output_length_matches_input_length() {
        let inputs: Vec<CrossoverInput> = (0..50)
            .map(|i| input(10.0 + (i as f64).sin(), 10.0, 10.0 - (i as f64).cos()))
            .collect();
        assert_eq!(calculate(&inputs).len(), inputs.len());
    }
}
