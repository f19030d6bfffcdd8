//! Named customer segments derived from combined R/F/M scores

use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer segment labels, in rule-chain order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "Champions")]
    Champions,
    #[serde(rename = "Loyal Customers")]
    LoyalCustomers,
    #[serde(rename = "New Customers")]
    NewCustomers,
    #[serde(rename = "Potential Loyalists")]
    PotentialLoyalists,
    #[serde(rename = "Customers Needing Attention")]
    NeedingAttention,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Big Spenders at Risk")]
    BigSpendersAtRisk,
    #[serde(rename = "Lost Customers")]
    Lost,
    #[serde(rename = "High Value")]
    HighValue,
    #[serde(rename = "Medium Value")]
    MediumValue,
    #[serde(rename = "Low Value")]
    LowValue,
}

impl Segment {
    pub const ALL: [Segment; 11] = [
        Segment::Champions,
        Segment::LoyalCustomers,
        Segment::NewCustomers,
        Segment::PotentialLoyalists,
        Segment::NeedingAttention,
        Segment::AtRisk,
        Segment::BigSpendersAtRisk,
        Segment::Lost,
        Segment::HighValue,
        Segment::MediumValue,
        Segment::LowValue,
    ];

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Segment::Champions => "Champions",
            Segment::LoyalCustomers => "Loyal Customers",
            Segment::NewCustomers => "New Customers",
            Segment::PotentialLoyalists => "Potential Loyalists",
            Segment::NeedingAttention => "Customers Needing Attention",
            Segment::AtRisk => "At Risk",
            Segment::BigSpendersAtRisk => "Big Spenders at Risk",
            Segment::Lost => "Lost Customers",
            Segment::HighValue => "High Value",
            Segment::MediumValue => "Medium Value",
            Segment::LowValue => "Low Value",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

type SegmentRule = (fn(u8, u8, u8) -> bool, Segment);

/// Ordered (predicate, segment) pairs over (R, F, M). The rules overlap;
/// the first match wins.
fn segment_rules() -> [SegmentRule; 8] {
    [
        (|r, f, m| r >= 4 && f >= 4 && m >= 4, Segment::Champions),
        (|r, f, m| r >= 3 && f >= 3 && m >= 3, Segment::LoyalCustomers),
        (|r, f, _| r >= 4 && f <= 2, Segment::NewCustomers),
        (|r, f, m| r >= 3 && f >= 1 && m >= 2, Segment::PotentialLoyalists),
        (
            |r, f, m| (2..=3).contains(&r) && f >= 2 && m >= 2,
            Segment::NeedingAttention,
        ),
        (|r, f, _| r <= 2 && f >= 3, Segment::AtRisk),
        (|r, f, m| r <= 2 && f <= 2 && m >= 3, Segment::BigSpendersAtRisk),
        (|r, f, _| r <= 1 && f <= 2, Segment::Lost),
    ]
}

/// Assign a segment from recency, frequency and monetary scores
pub fn classify(recency: u8, frequency: u8, monetary: u8) -> Segment {
    if let Some((_, segment)) = segment_rules()
        .iter()
        .find(|(matches, _)| matches(recency, frequency, monetary))
    {
        return *segment;
    }

    match u16::from(recency) + u16::from(frequency) + u16::from(monetary) {
        s if s >= 9 => Segment::HighValue,
        s if s >= 6 => Segment::MediumValue,
        _ => Segment::LowValue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_scores_are_champions() {
        assert_eq!(classify(4, 4, 4), Segment::Champions);
    }

    #[test]
    fn test_lowest_scores_are_lost() {
        // R<=1 and F<=2 hits the Lost rule before the sum buckets
        assert_eq!(classify(1, 1, 1), Segment::Lost);
    }

    #[test]
    fn test_first_match_wins() {
        // Satisfies both Loyal Customers and Potential Loyalists
        assert_eq!(classify(3, 3, 3), Segment::LoyalCustomers);
        // Satisfies both New Customers and Potential Loyalists
        assert_eq!(classify(4, 2, 4), Segment::NewCustomers);
        // Satisfies both Needing Attention and At Risk
        assert_eq!(classify(2, 3, 2), Segment::NeedingAttention);
    }

    #[test]
    fn test_rule_chain() {
        assert_eq!(classify(3, 1, 2), Segment::PotentialLoyalists);
        assert_eq!(classify(3, 1, 1), Segment::LowValue);
        assert_eq!(classify(2, 4, 1), Segment::AtRisk);
        assert_eq!(classify(2, 1, 4), Segment::BigSpendersAtRisk);
        assert_eq!(classify(1, 2, 2), Segment::Lost);
    }

    #[test]
    fn test_sum_buckets() {
        // M=1 blocks every rule for these
        assert_eq!(classify(4, 4, 1), Segment::HighValue);
        assert_eq!(classify(3, 4, 1), Segment::MediumValue);
        assert_eq!(classify(2, 2, 1), Segment::LowValue);
        assert_eq!(classify(2, 1, 2), Segment::LowValue);
        assert_eq!(classify(3, 2, 1), Segment::MediumValue);
    }

    #[test]
    fn test_every_score_combination_is_classified() {
        for r in 1..=4 {
            for f in 1..=4 {
                for m in 1..=4 {
                    assert!(Segment::ALL.contains(&classify(r, f, m)));
                }
            }
        }
    }

    #[test]
    fn test_serialized_label_matches_display() {
        let json = serde_json::to_string(&Segment::BigSpendersAtRisk).unwrap();
        assert_eq!(json, "\"Big Spenders at Risk\"");
        assert_eq!(Segment::NeedingAttention.to_string(), "Customers Needing Attention");
    }
}
