use std::cmp::Ordering;

/// Sort a copy of `items` descending by `metric`, breaking ties by
/// ascending case-insensitive name so the order is total and stable.
/// The input slice is left untouched.
pub fn rank_by<T, M, N>(items: &[T], metric: M, name: N) -> Vec<T>
where
    T: Clone,
    M: Fn(&T) -> f64,
    N: Fn(&T) -> &str,
{
    let mut ranked = items.to_vec();
    ranked.sort_by(|a, b| {
        metric(b)
            .total_cmp(&metric(a))
            .then_with(|| compare_names(name(a), name(b)))
    });
    ranked
}

/// Borrowed top-N prefix; callers keep the full ranking around.
pub fn top<T>(ranked: &[T], n: usize) -> &[T] {
    &ranked[..n.min(ranked.len())]
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        volume: f64,
    }

    fn row(name: &'static str, volume: f64) -> Row {
        Row { name, volume }
    }

    #[test]
    fn sorts_descending_by_metric() {
        let rows = vec![row("a", 1.0), row("b", 3.0), row("c", 2.0)];
        let ranked = rank_by(&rows, |r| r.volume, |r| r.name);
        let names: Vec<_> = ranked.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_break_by_case_insensitive_name() {
        let rows = vec![row("zeta", 5.0), row("Alfa", 5.0), row("beta", 5.0)];
        let ranked = rank_by(&rows, |r| r.volume, |r| r.name);
        let names: Vec<_> = ranked.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Alfa", "beta", "zeta"]);
    }

    #[test]
    fn input_is_not_mutated_and_top_borrows() {
        let rows = vec![row("a", 1.0), row("b", 2.0)];
        let ranked = rank_by(&rows, |r| r.volume, |r| r.name);
        assert_eq!(rows[0].name, "a");
        assert_eq!(top(&ranked, 1).len(), 1);
        assert_eq!(top(&ranked, 10).len(), 2);
        assert_eq!(ranked.len(), 2);
    }
}
