/// A piecewise lookup table over an ordered value: the first tuple whose
/// `upper_bound` is `>=` the value (or has no bound) supplies the
/// multiplier. Mirrors `myaku.scorer.factor_scorers.ValueRangeMultipliers`.
///
/// The last entry must have `upper_bound: None`; `ValueRangeMultipliers::new`
/// panics otherwise, since every factor scorer's table is a compile-time
/// constant and an unbounded-range omission is a programming error, not
/// recoverable input.
pub struct ValueRangeMultipliers {
    ranges: &'static [(Option<i64>, f64)],
}

impl ValueRangeMultipliers {
    pub const fn new(ranges: &'static [(Option<i64>, f64)]) -> Self {
        ValueRangeMultipliers { ranges }
    }

    pub fn get(&self, value: i64) -> f64 {
        for (upper_bound, multiplier) in self.ranges {
            match upper_bound {
                None => return *multiplier,
                Some(bound) if value <= *bound => return *multiplier,
                Some(_) => continue,
            }
        }
        // Unreachable given a well-formed table (last entry is unbounded),
        // but avoids a panic in production if one is ever malformed.
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_matching_bound() {
        let table = ValueRangeMultipliers::new(&[(Some(5), 0.5), (Some(10), 0.8), (None, 1.0)]);
        assert_eq!(table.get(-100), 0.5);
        assert_eq!(table.get(5), 0.5);
        assert_eq!(table.get(6), 0.8);
        assert_eq!(table.get(10), 0.8);
        assert_eq!(table.get(11), 1.0);
        assert_eq!(table.get(1_000_000), 1.0);
    }
}
