use crate::models::Category;

/// Placeholder used whenever a representative name is missing.
pub const NO_REPRESENTATIVE: &str = "Sem Representante";

/// Technical prefixes stripped from display names. Fixed lookup table,
/// mirrored from the operation's Power BI rules; unlisted prefixes pass
/// through untouched.
const STRIP_PREFIXES: &[&str] = &[
    "CAEPTOX - ",
    "CAEPTOX -",
    "CAEPTOX-",
    "CAEPTOX \u{2013} ",
    "CAEPTOX \u{2013}",
    "CAEPTOX\u{2013}",
    "CAEPTOX \u{2014}",
    "CAEPTOX\u{2014}",
    "EXT -",
    "EXT-",
    "INT -",
    "INT-",
    "TLMK -",
    "TLMK",
    "TMLK -",
];

/// Prefixes that mark a representative as internal. Everything else,
/// including `EXT-` and missing names, is external.
const INTERNAL_PREFIXES: &[&str] = &[
    "INT -",
    "INT-",
    "CAEPTOX -",
    "CAEPTOX-",
    "CAEPTOX \u{2013}",
    "CAEPTOX\u{2013}",
    "CAEPTOX \u{2014}",
    "CAEPTOX\u{2014}",
    "TLMK -",
    "TLMK",
    "TMLK -",
];

fn strip_prefix_ci<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = name.chars();
    for expected in prefix.chars() {
        let got = rest.next()?;
        if got != expected && !got.eq_ignore_ascii_case(&expected) {
            return None;
        }
    }
    Some(rest.as_str())
}

/// Strip the first matching technical prefix and trim the remainder.
/// The content after the prefix is never re-cased. An input that becomes
/// empty after stripping falls back to the trimmed original.
pub fn clean_representative_name(raw: Option<&str>) -> String {
    let name = match raw.map(str::trim) {
        Some(n) if !n.is_empty() && !n.eq_ignore_ascii_case("nan") => n,
        _ => return NO_REPRESENTATIVE.to_string(),
    };

    for prefix in STRIP_PREFIXES {
        if let Some(rest) = strip_prefix_ci(name, prefix) {
            let rest = rest.trim();
            if rest.is_empty() {
                return name.to_string();
            }
            return rest.to_string();
        }
    }

    name.to_string()
}

/// Classify a representative from the raw (uncleaned) name.
pub fn categorize(raw: Option<&str>) -> Category {
    let name = match raw.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => return Category::External,
    };

    if INTERNAL_PREFIXES
        .iter()
        .any(|prefix| strip_prefix_ci(name, prefix).is_some())
    {
        Category::Internal
    } else {
        Category::External
    }
}
