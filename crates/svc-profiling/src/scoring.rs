//! # Profile Scoring
//!
//! Placeholder scoring: the risk score, segment and recommendations are
//! drawn at random. The RNG is injected so results are reproducible in tests.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use shared_types::{Profile, Segment};

/// Exclusive upper bound of the risk score.
pub const RISK_SCORE_CEILING: u8 = 100;

/// Segments assigned at onboarding.
pub const ONBOARDING_SEGMENTS: [Segment; 3] = [Segment::Basic, Segment::Premium, Segment::Vip];

/// Candidate recommendations, offered in this order.
pub const RECOMMENDATIONS: [&str; 4] = [
    "Consider investment products",
    "Review life insurance options",
    "Review credit options",
    "Explore premium services",
];

/// Maximum recommendations per profile.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Initial profile for a freshly onboarded customer.
pub fn onboarding_profile<R: Rng + ?Sized>(
    customer_id: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Profile {
    let count = rng.gen_range(1..=MAX_RECOMMENDATIONS);
    Profile {
        customer_id: customer_id.to_string(),
        risk_score: rng.gen_range(0..RISK_SCORE_CEILING),
        segment: *ONBOARDING_SEGMENTS.choose(rng).unwrap_or(&Segment::Basic),
        recommendations: RECOMMENDATIONS[..count].iter().map(|r| r.to_string()).collect(),
        created_at: Some(now),
        last_updated: None,
    }
}

/// Refreshed profile after activation.
pub fn activation_profile<R: Rng + ?Sized>(
    customer_id: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Profile {
    Profile {
        customer_id: customer_id.to_string(),
        risk_score: rng.gen_range(0..RISK_SCORE_CEILING),
        segment: Segment::Active,
        recommendations: Vec::new(),
        created_at: None,
        last_updated: Some(now),
    }
}
