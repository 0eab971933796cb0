use once_cell::sync::Lazy;
use regex::Regex;

/// Period codes are six digits: a four digit start year and a two digit end suffix.
static PERIOD_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})$").unwrap());

/// Prefixes that mark a column as a metric (`pt_` percentage, `t_` total count).
pub const METRIC_PREFIXES: [&str; 2] = ["pt_", "t_"];

/// Suppressed (`c`) and not-applicable (`x`) placeholders.
pub const SENTINELS: [&str; 2] = ["c", "x"];

/// Turn a raw file name, column name or group value into a display label:
/// drop a `.csv` extension, underscores become spaces, then title-case.
///
/// Title-casing upper-cases the first letter of every alphabetic run and
/// lower-cases the rest, so `ks2_national` becomes `Ks2 National` and
/// `pt_mat_met_expected_standard` becomes `Pt Mat Met Expected Standard`.
pub fn normalize_label(raw: &str) -> String {
    let stripped = raw.replace(".csv", "").replace('_', " ");

    let mut out = String::with_capacity(stripped.len());
    let mut prev_alpha = false;
    for ch in stripped.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// `201617` → `2016-17`. Anything that is not a six digit code is returned unchanged.
pub fn period_label(code: &str) -> String {
    let code = code.trim();
    match PERIOD_CODE.captures(code) {
        Some(caps) => format!("{}-{}", &caps[1], &caps[2]),
        None => code.to_string(),
    }
}

pub fn is_metric_column(name: &str) -> bool {
    METRIC_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// True for values that must never reach numeric aggregation.
pub fn is_sentinel(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => true,
        Some(v) => SENTINELS.contains(&v),
    }
}
