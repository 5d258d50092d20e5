use std::collections::HashSet;

use crate::models::{Clause, RawClause};

/// Build the final clause list.
///
/// Orders by `(section_index, number)` with a stable sort, drops clauses whose
/// trimmed body is empty (this includes failure stubs) and keeps the first
/// clause for each `(section_index, number)` pair. Pure: the same input always
/// yields the same output.
pub fn assemble(raw_clauses: &[RawClause]) -> Vec<Clause> {
    let mut ordered: Vec<&RawClause> = raw_clauses.iter().collect();
    ordered.sort_by_key(|raw| (raw.section_index, raw.number));

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|raw| !raw.text.trim().is_empty())
        .filter(|raw| seen.insert((raw.section_index, raw.number)))
        .map(|raw| Clause {
            id: raw.number.to_string(),
            title: raw.title.clone(),
            text: raw.text.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractedClause;
    use pretty_assertions::assert_eq;

    fn raw(section_index: usize, number: u32, text: &str) -> RawClause {
        RawClause::from_extracted(
            section_index,
            number,
            ExtractedClause {
                number: None,
                title: format!("Title {number}"),
                text: text.to_string(),
                sub_parts: Vec::new(),
                status: None,
                references: Vec::new(),
            },
        )
    }

    fn keys(clauses: &[Clause]) -> Vec<(&str, &str)> {
        clauses
            .iter()
            .map(|c| (c.id.as_str(), c.text.as_str()))
            .collect()
    }

    #[test]
    fn test_orders_by_section_then_number() {
        let input = vec![
            raw(1, 2, "rider two"),
            raw(0, 10, "main ten"),
            raw(1, 1, "rider one"),
            raw(0, 2, "main two"),
        ];

        let clauses = assemble(&input);
        assert_eq!(
            keys(&clauses),
            vec![
                ("2", "main two"),
                ("10", "main ten"),
                ("1", "rider one"),
                ("2", "rider two"),
            ]
        );
    }

    #[test]
    fn test_drops_empty_bodies_and_stubs() {
        let input = vec![
            raw(0, 1, "Owners to provide."),
            raw(0, 2, "   \n\n "),
            RawClause::stub(0, 3, "timeout"),
            raw(0, 4, "Charterers to pay."),
        ];

        let clauses = assemble(&input);
        assert_eq!(
            keys(&clauses),
            vec![("1", "Owners to provide."), ("4", "Charterers to pay.")]
        );
    }

    #[test]
    fn test_trims_body() {
        let clauses = assemble(&[raw(0, 1, "\n  Lien clause.  \n")]);
        assert_eq!(clauses[0].text, "Lien clause.");
        assert_eq!(clauses[0].title, "Title 1");
    }

    #[test]
    fn test_duplicate_pairs_keep_first() {
        let input = vec![raw(0, 1, "first"), raw(0, 1, "second")];
        assert_eq!(keys(&assemble(&input)), vec![("1", "first")]);
    }

    #[test]
    fn test_idempotent() {
        let input = vec![raw(1, 1, "b"), raw(0, 3, "a"), RawClause::stub(0, 4, "x")];
        assert_eq!(assemble(&input), assemble(&input));
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble(&[]).is_empty());
    }
}
