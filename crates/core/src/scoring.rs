//! Points, accuracy and XP conversion for a quiz session.

/// Points awarded for a correct answer given after `response_secs`.
///
/// Each tier's upper bound is inclusive: exactly 5.0s still earns 100.
#[must_use]
pub fn points_for_response(response_secs: f64) -> u32 {
    if response_secs <= 5.0 {
        100
    } else if response_secs <= 10.0 {
        80
    } else if response_secs <= 15.0 {
        60
    } else if response_secs <= 20.0 {
        40
    } else {
        20
    }
}

/// `round(100 * correct / answered)`, or 0 when nothing was answered.
#[must_use]
pub fn accuracy_percent(correct: u32, answered: u32) -> u32 {
    if answered == 0 {
        return 0;
    }
    // Integer half-up rounding of 100*correct/answered.
    let correct = u64::from(correct);
    let answered = u64::from(answered);
    let rounded = (200 * correct + answered) / (2 * answered);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// XP earned from a finished session: a tenth of its score, rounded.
#[must_use]
pub fn xp_for_score(total_score: u32) -> u64 {
    (u64::from(total_score) + 5) / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_by_response_time() {
        let expected = [(5.0, 100), (10.0, 80), (15.0, 60), (20.0, 40), (25.0, 20)];
        for (secs, points) in expected {
            assert_eq!(points_for_response(secs), points, "at {secs}s");
        }
    }

    #[test]
    fn tier_bounds_are_inclusive() {
        assert_eq!(points_for_response(0.0), 100);
        assert_eq!(points_for_response(5.001), 80);
        assert_eq!(points_for_response(20.0), 40);
        assert_eq!(points_for_response(20.01), 20);
    }

    #[test]
    fn accuracy_rounds_half_up() {
        assert_eq!(accuracy_percent(0, 0), 0);
        assert_eq!(accuracy_percent(3, 3), 100);
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(1, 8), 13);
    }

    #[test]
    fn xp_is_a_tenth_of_score() {
        assert_eq!(xp_for_score(0), 0);
        assert_eq!(xp_for_score(300), 30);
        assert_eq!(xp_for_score(45), 5);
        assert_eq!(xp_for_score(44), 4);
    }
}
