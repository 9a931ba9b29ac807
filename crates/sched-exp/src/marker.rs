use serde::{Deserialize, Serialize};

/// Numeric shape expected after a cost marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostKind {
    /// Decimal floating point, optionally signed or in exponent form.
    Float,
    /// Unsigned run of decimal digits.
    Integer,
}

/// Line marker announcing the solver's reported cost.
///
/// The solver's stdout is free-form text. A line counts as a cost report when
/// it contains `text` followed (after optional `:` and whitespace) by a number
/// of the expected [`CostKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostMarker {
    /// Literal text preceding the value.
    pub text: String,
    /// Shape of the value.
    pub kind: CostKind,
}

impl CostMarker {
    /// Creates a marker from its literal text.
    pub fn new(text: impl Into<String>, kind: CostKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Final cost line printed by the annealing solver.
    pub fn final_cost() -> Self {
        Self::new("Best solution found with cost:", CostKind::Float)
    }

    /// Progress line printed by the multi-processor solver.
    pub fn current_best() -> Self {
        Self::new("Current best solution cost:", CostKind::Integer)
    }

    /// Returns the value of the first line carrying this marker and a well formed number.
    pub fn scan(&self, output: &str) -> Option<f64> {
        output.lines().find_map(|line| self.scan_line(line))
    }

    fn scan_line(&self, line: &str) -> Option<f64> {
        let start = line.find(self.text.as_str())? + self.text.len();
        let rest = line[start..].trim_start();
        let rest = rest.strip_prefix(':').unwrap_or(rest).trim_start();
        match self.kind {
            CostKind::Float => {
                let end = float_prefix_len(rest.as_bytes());
                rest[..end].parse::<f64>().ok().filter(|value| value.is_finite())
            }
            CostKind::Integer => {
                let end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                rest[..end].parse::<u64>().ok().map(|value| value as f64)
            }
        }
    }
}

/// Length of the longest `[+-]digits[.digits][(e|E)[+-]digits]` prefix.
///
/// An exponent marker is only consumed when digits follow it, so trailing
/// words such as `5elapsed` still yield `5`.
fn float_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |mut at: usize| {
        while bytes.get(at).is_some_and(u8::is_ascii_digit) {
            at += 1;
        }
        at
    };
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 || mantissa {
            mantissa |= frac_end > end + 1;
            end = frac_end;
        }
    }
    if !mantissa {
        return 0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_marker_extracts_exact_value() {
        let output = "Iteration 1\nBest solution found with cost: 42.5\nDone\n";
        assert_eq!(CostMarker::final_cost().scan(output), Some(42.5));
    }

    #[test]
    fn missing_marker_is_absent() {
        let output = "Iteration 1\nIteration 2\n";
        assert_eq!(CostMarker::final_cost().scan(output), None);
        assert_eq!(CostMarker::final_cost().scan(""), None);
    }

    #[test]
    fn malformed_value_falls_through_to_later_lines() {
        let output = "Best solution found with cost: n/a\nBest solution found with cost: 17\n";
        assert_eq!(CostMarker::final_cost().scan(output), Some(17.0));
    }

    #[test]
    fn float_marker_accepts_exponents_and_trailing_text() {
        let output = "[t=3s] Best solution found with cost: 1.5e3 (after 900 moves)";
        assert_eq!(CostMarker::final_cost().scan(output), Some(1500.0));
    }

    #[test]
    fn trailing_exponent_letters_are_not_part_of_the_value() {
        let marker = CostMarker::final_cost();
        assert_eq!(marker.scan("Best solution found with cost: 5elapsed"), Some(5.0));
        assert_eq!(marker.scan("Best solution found with cost: 42.5e"), Some(42.5));
        assert_eq!(marker.scan("Best solution found with cost: 7.E+"), Some(7.0));
        assert_eq!(marker.scan("Best solution found with cost: 2e-1s"), Some(0.2));
        assert_eq!(marker.scan("Best solution found with cost: .5"), Some(0.5));
        assert_eq!(marker.scan("Best solution found with cost: -."), None);
        assert_eq!(marker.scan("Best solution found with cost: 1e400"), None);
    }

    #[test]
    fn integer_marker_matches_digits_only() {
        let marker = CostMarker::current_best();
        assert_eq!(marker.scan("Current best solution cost: 314\n"), Some(314.0));
        assert_eq!(marker.scan("Current best solution cost: abc\n"), None);
        assert_eq!(marker.scan("Current best solution cost: 27.9\n"), Some(27.0));
    }

    #[test]
    fn custom_marker_without_colon() {
        let marker = CostMarker::new("cost=", CostKind::Float);
        assert_eq!(marker.scan("final cost=-3.25"), Some(-3.25));
    }
}
