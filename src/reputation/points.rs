//! Points awarded to the rated user, tiered on the raw score

/// Tier table: 4-5 stars earn 3, 3 stars earn 2, 1-2 stars earn 1, 0 earns nothing.
/// Fractional scores fall into the tier of their whole-star floor.
pub fn points_for_score(score: f64) -> u32 {
    match score.floor() as i64 {
        4 | 5 => 3,
        3 => 2,
        1 | 2 => 1,
        _ => 0,
    }
}
