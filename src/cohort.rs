use crate::athlete::AthleteRecord;
use crate::positions::PositionCode;

/// Peers sharing `position` with at least `min_minutes` played, in input order.
pub fn cohort<'a>(
    athletes: &'a [AthleteRecord],
    position: &PositionCode,
    min_minutes: f64,
) -> Vec<&'a AthleteRecord> {
    athletes
        .iter()
        .filter(|a| a.position_code.as_ref() == Some(position))
        .filter(|a| a.minutes_played >= min_minutes)
        .collect()
}

/// Same filter over several positions at once, still preserving input order.
pub fn cohort_for_positions<'a>(
    athletes: &'a [AthleteRecord],
    positions: &[PositionCode],
    min_minutes: f64,
) -> Vec<&'a AthleteRecord> {
    athletes
        .iter()
        .filter(|a| {
            a.position_code
                .as_ref()
                .is_some_and(|code| positions.contains(code))
        })
        .filter(|a| a.minutes_played >= min_minutes)
        .collect()
}

/// Cohort an athlete is rated against; empty when the athlete has no position code.
pub fn peers_of<'a>(
    athlete: &AthleteRecord,
    athletes: &'a [AthleteRecord],
    min_minutes: f64,
) -> Vec<&'a AthleteRecord> {
    match &athlete.position_code {
        Some(code) => cohort(athletes, code, min_minutes),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn athlete(id: &str, code: &str, minutes: f64) -> AthleteRecord {
        AthleteRecord::new(id, code, minutes, HashMap::new()).with_position_code(PositionCode::new(code))
    }

    #[test]
    fn filters_by_position_and_minutes_preserving_order() {
        let all = vec![
            athlete("a", "MEIA", 900.0),
            athlete("b", "ZAGUEIRO", 900.0),
            athlete("c", "MEIA", 100.0),
            athlete("d", "MEIA", 450.0),
            athlete("e", "MEIA", 450.0),
        ];
        let ids: Vec<&str> = cohort(&all, &PositionCode::new("MEIA"), 450.0)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "d", "e"]);
    }

    #[test]
    fn unresolved_positions_never_match() {
        let all = vec![AthleteRecord::new("x", "???", 900.0, HashMap::new())];
        assert!(cohort(&all, &PositionCode::new("???"), 0.0).is_empty());
        assert!(peers_of(&all[0], &all, 0.0).is_empty());
    }

    #[test]
    fn multi_position_cohort_keeps_input_order() {
        let all = vec![
            athlete("a", "ATACANTE", 900.0),
            athlete("b", "MEIA", 900.0),
            athlete("c", "SEGUNDO ATACANTE", 900.0),
        ];
        let ids: Vec<&str> = cohort_for_positions(
            &all,
            &[PositionCode::new("SEGUNDO ATACANTE"), PositionCode::new("ATACANTE")],
            0.0,
        )
        .iter()
        .map(|a| a.id.as_str())
        .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
