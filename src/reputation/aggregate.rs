//! Bayesian rating aggregation
//!
//! Shrinks a user's own average toward the population mean. The weight of
//! the population mean is `min_votes`, so a single 5-star rating cannot
//! produce a perfect classification.

use thiserror::Error;

/// Confidence threshold used when rating users
pub const DEFAULT_MIN_VOTES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AggregateError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("min_votes must be greater than zero")]
    ZeroMinVotes,
}

/// `(votes * user_average + min_votes * global_average) / (votes + min_votes)`
pub fn aggregate(
    user_average: f64,
    user_votes: u32,
    global_average: f64,
    min_votes: u32,
) -> Result<f64, AggregateError> {
    if !user_average.is_finite() {
        return Err(AggregateError::NonFinite {
            field: "user_average",
        });
    }
    if !global_average.is_finite() {
        return Err(AggregateError::NonFinite {
            field: "global_average",
        });
    }
    if min_votes == 0 {
        return Err(AggregateError::ZeroMinVotes);
    }

    let votes = user_votes as f64;
    let weight = min_votes as f64;

    Ok((votes * user_average + weight * global_average) / (votes + weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_five_star_is_pulled_toward_mean() {
        let result = aggregate(5.0, 1, 3.0, DEFAULT_MIN_VOTES).unwrap();
        assert!((result - 11.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_votes_yields_global_average() {
        assert_eq!(aggregate(4.8, 0, 3.2, DEFAULT_MIN_VOTES).unwrap(), 3.2);
    }

    #[test]
    fn test_rejects_structurally_invalid_input() {
        assert_eq!(
            aggregate(f64::NAN, 1, 3.0, 2),
            Err(AggregateError::NonFinite {
                field: "user_average"
            })
        );
        assert_eq!(
            aggregate(4.0, 1, f64::INFINITY, 2),
            Err(AggregateError::NonFinite {
                field: "global_average"
            })
        );
        assert_eq!(aggregate(4.0, 1, 3.0, 0), Err(AggregateError::ZeroMinVotes));
    }
}
