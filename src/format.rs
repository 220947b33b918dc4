use chrono::NaiveDateTime;

/// Label shown wherever a lab never collected.
pub const NO_COLLECTIONS: &str = "Sem coletas";

/// Brazilian digit grouping: 1234567 -> "1.234.567".
pub fn thousands_br(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Fixed-precision decimal with a comma separator: 12.5 -> "12,5".
pub fn decimal_br(value: f64, places: usize) -> String {
    format!("{value:.places$}").replace('.', ",")
}

/// Rate in [0, 1] rendered as a percentage: 0.933 -> "93,3%".
pub fn percent_br(rate: f64) -> String {
    format!("{}%", decimal_br(rate * 100.0, 1))
}

/// CNPJ mask when the value has the canonical 14 digits, passthrough
/// otherwise.
pub fn cnpj_br(raw: &str) -> String {
    if raw.len() == 14 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!(
            "{}.{}.{}/{}-{}",
            &raw[0..2],
            &raw[2..5],
            &raw[5..8],
            &raw[8..12],
            &raw[12..14]
        )
    } else {
        raw.to_string()
    }
}

/// Collection timestamp for tables: "dd/mm/aaaa HH:MM".
pub fn datetime_br(value: Option<&NaiveDateTime>) -> String {
    match value {
        Some(at) => at.format("%d/%m/%Y %H:%M").to_string(),
        None => NO_COLLECTIONS.to_string(),
    }
}

/// Days-without-collecting column; "-" when there is no valid date.
pub fn days_label(days: Option<i64>) -> String {
    match days {
        Some(days) => days.to_string(),
        None => "-".to_string(),
    }
}

/// Collection status label for the lab ranking.
pub fn status_label(active: bool, has_collection: bool) -> &'static str {
    if !has_collection {
        "Sem Coletas"
    } else if active {
        "Ativo"
    } else {
        "Inativo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn thousands_groups_with_dots() {
        assert_eq!(thousands_br(0), "0");
        assert_eq!(thousands_br(999), "999");
        assert_eq!(thousands_br(1000), "1.000");
        assert_eq!(thousands_br(1234567), "1.234.567");
    }

    #[test]
    fn decimals_use_comma() {
        assert_eq!(decimal_br(12.5, 1), "12,5");
        assert_eq!(percent_br(0.9333), "93,3%");
        assert_eq!(percent_br(0.0), "0,0%");
    }

    #[test]
    fn cnpj_masks_canonical_values_only() {
        assert_eq!(cnpj_br("00111222000133"), "00.111.222/0001-33");
        assert_eq!(cnpj_br("123"), "123");
        assert_eq!(cnpj_br(""), "");
    }

    #[test]
    fn datetime_and_days_have_empty_labels() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(datetime_br(Some(&at)), "10/03/2025 09:05");
        assert_eq!(datetime_br(None), "Sem coletas");
        assert_eq!(days_label(Some(12)), "12");
        assert_eq!(days_label(None), "-");
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label(true, true), "Ativo");
        assert_eq!(status_label(false, true), "Inativo");
        assert_eq!(status_label(false, false), "Sem Coletas");
    }
}
