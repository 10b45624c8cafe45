use serde::{Deserialize, Deserializer};

const REL_TOL: f64 = 1e-9;
const ABS_TOL: f64 = 1e-9;

/// Floating-point closeness used for duration bookkeeping.
///
/// Clip sub-ranges are cut independently, so sums of segment lengths drift by a few ulps
/// from the requested total.
pub fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    diff <= (REL_TOL * a.abs().max(b.abs())).max(ABS_TOL)
}

/// Deserialize seconds given either as a JSON number or a numeric string.
pub(crate) fn de_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Num(f64),
        Str(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Num(n) => Ok(n),
        Seconds::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid seconds `{}`: {}", s, e))),
    }
}

pub(crate) fn de_opt_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "de_seconds")] f64);

    let v: Option<Wrap> = Option::deserialize(deserializer)?;
    Ok(v.map(|Wrap(s)| s))
}
