use crate::{
    catalog::{Catalog, MatchOp, SavedSearch},
    query::compile::collect_conditions,
    value::Value,
};

///
/// Description synthesis
///
/// Renders a saved search into a deterministic human-readable
/// sentence for audit and display. Pure function of persisted state;
/// conditions that no longer resolve are omitted rather than
/// failing.
///

/// Describe a saved search.
#[must_use]
pub fn describe(catalog: &Catalog, search: &SavedSearch) -> String {
    let plural = catalog
        .collection(search.collection)
        .map_or_else(|| "records".to_string(), |c| c.plural.clone());

    let (include, exclude) = collect_conditions(search);
    let mut text: Vec<String> = Vec::new();

    for (buckets, title, attribute_joiner) in [
        (include, "Include", " and, "),
        (exclude, "Exclude", " or, "),
    ] {
        let mut field_texts: Vec<String> = Vec::new();

        for bucket in buckets {
            let Some(attribute) = catalog.attribute(bucket.attribute) else {
                continue;
            };
            let field_title = attribute.name.to_lowercase();
            let value_joiner = if bucket.and_together { " and " } else { " or " };

            let mut match_texts: Vec<String> = Vec::new();
            for (op, values) in group_by_op(bucket.entries) {
                if op == MatchOp::IsNull {
                    if values.contains(&Value::Bool(true)) {
                        match_texts.push("is null".to_string());
                    } else if values.contains(&Value::Bool(false)) {
                        match_texts.push("is not null".to_string());
                    }
                    continue;
                }

                let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                match_texts.push(format!("{} {}", phrase(op), quoted.join(value_joiner)));
            }

            field_texts.push(format!("{field_title} {}", match_texts.join(" or ")));
        }

        if !field_texts.is_empty() {
            text.push(format!(
                "{title} {plural} where {}.",
                field_texts.join(attribute_joiner)
            ));
        }
    }

    let ordering_names: Vec<String> = search
        .orderings()
        .iter()
        .filter_map(|o| catalog.attribute(o.attribute))
        .map(|a| a.name.to_lowercase())
        .collect();
    if !ordering_names.is_empty() {
        text.push(format!("Order result by {}.", ordering_names.join(", ")));
    }

    if text.is_empty() {
        format!("Include all {plural}.")
    } else {
        text.join(" ")
    }
}

/// Group one attribute's coerced entries by operator, preserving
/// first-seen operator order.
fn group_by_op(entries: Vec<(MatchOp, Value)>) -> Vec<(MatchOp, Vec<Value>)> {
    let mut groups: Vec<(MatchOp, Vec<Value>)> = Vec::new();

    for (op, value) in entries {
        match groups.iter_mut().find(|(existing, _)| *existing == op) {
            Some((_, values)) => values.push(value),
            None => groups.push((op, vec![value])),
        }
    }

    groups
}

/// English phrase for one operator. The shared comparison codes of
/// the After/Before aliases extend to their phrasing: a plain
/// greater-than reads as "is after", matching the alias that owns
/// the code.
const fn phrase(op: MatchOp) -> &'static str {
    match op {
        MatchOp::Exact => "matches",
        MatchOp::IExact => "matches (case-insensitive)",
        MatchOp::Regex => "matches regular expression",
        MatchOp::IRegex => "matches regular expression (case-insensitive)",

        MatchOp::Contains => "contains",
        MatchOp::IContains => "contains (case-insensitive)",
        MatchOp::StartsWith => "starts with",
        MatchOp::IStartsWith => "starts with (case-insensitive)",
        MatchOp::EndsWith => "ends with",
        MatchOp::IEndsWith => "ends with (case-insensitive)",

        MatchOp::Year => "year is",
        MatchOp::Month => "month is",
        MatchOp::Day => "day is",
        MatchOp::WeekDay => "week day is",

        MatchOp::Gt | MatchOp::After => "is after",
        MatchOp::Gte => "is greater than or equal to",
        MatchOp::Lt => "is less than",
        MatchOp::Lte | MatchOp::Before => "is before",

        // Rendered via the dedicated null phrases above.
        MatchOp::IsNull => "is null",
    }
}

///
/// TESTS
///
