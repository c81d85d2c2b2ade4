use mimic::session::RoundOutcome;

/// Points for the results chart, split into matched rounds and timeouts.
/// Timeouts are plotted at the full round duration.
pub fn round_points(rounds: &[RoundOutcome]) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let (hit, miss): (Vec<&RoundOutcome>, Vec<&RoundOutcome>) =
        rounds.iter().partition(|r| r.completed);
    let point = |r: &RoundOutcome| (r.round_number as f64, r.time_taken_secs as f64);
    (
        hit.into_iter().map(point).collect(),
        miss.into_iter().map(point).collect(),
    )
}

/// Compute X (round) and Y (seconds) bounds for the results chart
pub fn compute_chart_params(rounds: &[RoundOutcome], round_duration_secs: u32) -> (f64, f64) {
    let last_round = rounds.iter().map(|r| r.round_number).max().unwrap_or(1);
    let slowest = rounds.iter().map(|r| r.time_taken_secs).max().unwrap_or(0);

    let x = (last_round as f64).max(2.0);
    let y = f64::from(slowest.max(round_duration_secs)).max(1.0);
    (x, y)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
