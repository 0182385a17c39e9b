use serde::{Serialize, Serializer};

/// One growth step: the calendar year and the percentage increment applied
/// during it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct YearIncrement {
    pub year: i32,
    pub percent: f64,
}

/// Full input to one projection run.
///
/// Increments must already be in ascending year order with no gaps or
/// duplicates; the engine applies them as given and performs no sorting,
/// deduplication, or range checks. Upholding that shape is the collector's
/// contract.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub initial_value: f64,
    pub increments: Vec<YearIncrement>,
}

/// One year of the computed series.
///
/// `opening_value` and `closing_value` hold the exact recurrence values.
/// Rounding to 2 decimals happens only on the way out: the serde serializers
/// here and the `{:.2}` table formatting. The carry between years is never
/// rounded.
#[derive(Copy, Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: i32,
    #[serde(serialize_with = "two_decimals")]
    pub opening_value: f64,
    pub increment_percent: f64,
    #[serde(serialize_with = "two_decimals")]
    pub closing_value: f64,
}

impl YearRecord {
    pub fn opening_display(&self) -> f64 {
        round_to_display(self.opening_value)
    }

    pub fn closing_display(&self) -> f64 {
        round_to_display(self.closing_value)
    }
}

/// The full computed series, one record per input increment.
#[derive(Debug, Clone)]
pub struct Projection {
    pub records: Vec<YearRecord>,
}

impl Projection {
    pub fn final_record(&self) -> Option<&YearRecord> {
        self.records.last()
    }

    /// Final value relative to the opening value of the first year, as a
    /// ratio. `None` when the series is empty or starts from zero.
    pub fn total_growth_ratio(&self) -> Option<f64> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        if first.opening_value > 0.0 {
            Some(last.closing_value / first.opening_value)
        } else {
            None
        }
    }
}

/// Rounds a value to 2 decimal places for display. Presentation-only: feeding
/// this back into the recurrence would drift from the reference behavior.
pub fn round_to_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn two_decimals<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_to_display(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_display_keeps_two_decimals() {
        assert_eq!(round_to_display(9.180000000000001), 9.18);
        assert_eq!(round_to_display(11.000000000000002), 11.0);
        assert_eq!(round_to_display(10.004), 10.0);
        assert_eq!(round_to_display(10.006), 10.01);
        assert_eq!(round_to_display(0.0), 0.0);
    }

    #[test]
    fn year_record_serializes_rounded_camel_case_values() {
        let record = YearRecord {
            year: 2015,
            opening_value: 11.000000000000002,
            increment_percent: 20.0,
            closing_value: 13.200000000000003,
        };

        let json = serde_json::to_value(record).expect("record should serialize");
        assert_eq!(json["year"], 2015);
        assert_eq!(json["openingValue"].as_f64(), Some(11.0));
        assert_eq!(json["incrementPercent"].as_f64(), Some(20.0));
        assert_eq!(json["closingValue"].as_f64(), Some(13.2));
    }

    #[test]
    fn total_growth_ratio_is_none_for_zero_start() {
        let projection = Projection {
            records: vec![YearRecord {
                year: 2014,
                opening_value: 0.0,
                increment_percent: 8.0,
                closing_value: 0.0,
            }],
        };
        assert!(projection.total_growth_ratio().is_none());

        let empty = Projection { records: vec![] };
        assert!(empty.total_growth_ratio().is_none());
        assert!(empty.final_record().is_none());
    }
}
