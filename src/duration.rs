use serde_json::{Map, Value};

use crate::dataset::as_f64_any;

/// The field BGStats writes today.
pub const CANONICAL_FIELD: &str = "durationMin";

/// Minute-valued names seen across export variants, in probe order.
pub const MINUTE_FIELDS: &[&str] = &[
    "durationMinutes",
    "playTimeMinutes",
    "playTime",
    "length",
    "duration",
    "time",
];

/// Second-valued names seen across export variants, in probe order.
pub const SECOND_FIELDS: &[&str] = &[
    "durationSec",
    "durationSeconds",
    "playTimeSeconds",
    "lengthSeconds",
];

/// Above this, a value under an ambiguous minute-named field is read as
/// seconds under the magnitude policy.
const MAGNITUDE_SECONDS_CUTOFF: f64 = 600.0;

/// How to interpret values found under the ambiguous minute-named fields.
/// Some exporters wrote seconds into those fields; the two readings are
/// never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationPolicy {
    /// The field name decides the unit.
    #[default]
    TrustFieldKind,
    /// A minute-named value above the cutoff is treated as seconds.
    MagnitudeHeuristic,
}

impl DurationPolicy {
    pub fn from_env_str(raw: &str) -> Option<DurationPolicy> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trust" | "field" => Some(DurationPolicy::TrustFieldKind),
            "magnitude" => Some(DurationPolicy::MagnitudeHeuristic),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationPolicy::TrustFieldKind => "field-kind",
            DurationPolicy::MagnitudeHeuristic => "magnitude",
        }
    }
}

/// Resolve a play's duration in whole minutes, or `None` when no probed
/// field yields a usable number. Unknown is distinct from zero throughout
/// the engine.
pub fn resolve_minutes(obj: &Map<String, Value>, policy: DurationPolicy) -> Option<u32> {
    if let Some(v) = probe_number(obj, CANONICAL_FIELD) {
        return round_minutes(v);
    }
    for field in MINUTE_FIELDS {
        let Some(v) = probe_number(obj, field) else {
            continue;
        };
        let minutes = match policy {
            DurationPolicy::TrustFieldKind => v,
            DurationPolicy::MagnitudeHeuristic if v > MAGNITUDE_SECONDS_CUTOFF => v / 60.0,
            DurationPolicy::MagnitudeHeuristic => v,
        };
        return round_minutes(minutes);
    }
    for field in SECOND_FIELDS {
        if let Some(v) = probe_number(obj, field) {
            return round_minutes(v / 60.0);
        }
    }
    None
}

fn probe_number(obj: &Map<String, Value>, field: &str) -> Option<f64> {
    let v = obj.get(field)?;
    if v.is_null() {
        return None;
    }
    if let Some(s) = v.as_str()
        && s.trim().is_empty()
    {
        return None;
    }
    as_f64_any(v)
}

/// Half-up rounding; negative durations are treated as unparseable.
fn round_minutes(v: f64) -> Option<u32> {
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    Some(v.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().expect("test value is an object").clone()
    }

    #[test]
    fn canonical_field_wins_over_fallbacks() {
        let play = obj(json!({"durationMin": 45, "duration": 90, "durationSec": 1200}));
        assert_eq!(
            resolve_minutes(&play, DurationPolicy::TrustFieldKind),
            Some(45)
        );
    }

    #[test]
    fn minute_fallback_wins_over_seconds() {
        let play = obj(json!({"playTime": "75", "durationSec": 1200}));
        assert_eq!(
            resolve_minutes(&play, DurationPolicy::TrustFieldKind),
            Some(75)
        );
    }

    #[test]
    fn second_fields_convert_and_round_half_up() {
        // 1230 / 60 = 20.5 -> 21
        let play = obj(json!({"durationSeconds": 1230}));
        assert_eq!(
            resolve_minutes(&play, DurationPolicy::TrustFieldKind),
            Some(21)
        );
    }

    #[test]
    fn magnitude_policy_reads_large_minute_values_as_seconds() {
        let play = obj(json!({"duration": 2700}));
        assert_eq!(
            resolve_minutes(&play, DurationPolicy::TrustFieldKind),
            Some(2700)
        );
        assert_eq!(
            resolve_minutes(&play, DurationPolicy::MagnitudeHeuristic),
            Some(45)
        );
        // At or below the cutoff the value stays minutes.
        let short = obj(json!({"duration": 600}));
        assert_eq!(
            resolve_minutes(&short, DurationPolicy::MagnitudeHeuristic),
            Some(600)
        );
    }

    #[test]
    fn magnitude_policy_never_touches_canonical_field() {
        let play = obj(json!({"durationMin": 720}));
        assert_eq!(
            resolve_minutes(&play, DurationPolicy::MagnitudeHeuristic),
            Some(720)
        );
    }

    #[test]
    fn unknown_is_none_not_zero() {
        assert_eq!(
            resolve_minutes(&obj(json!({})), DurationPolicy::TrustFieldKind),
            None
        );
        assert_eq!(
            resolve_minutes(
                &obj(json!({"durationMin": null, "playTime": "", "length": "soon"})),
                DurationPolicy::TrustFieldKind
            ),
            None
        );
        assert_eq!(
            resolve_minutes(
                &obj(json!({"durationMin": -5})),
                DurationPolicy::TrustFieldKind
            ),
            None
        );
    }
}
