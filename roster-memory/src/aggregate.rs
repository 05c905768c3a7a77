//! Group-by aggregation over in-memory documents.

use bson::{Bson, Document as BsonDocument};

use roster_core::{
    query::{Accumulator, AccumulatorOp, Aggregation},
    error::DocumentStoreResult,
};

use crate::evaluator::{Comparable, DocumentEvaluator, field_of, sort_documents};


/// Running state of one accumulator within one group.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    sum: f64,
    numeric: u64,
    documents: u64,
}

impl Tally {
    fn push(&mut self, value: Option<&Bson>) {
        self.documents += 1;

        let number = match value {
            Some(Bson::Int32(v)) => Some(*v as f64),
            Some(Bson::Int64(v)) => Some(*v as f64),
            Some(Bson::Double(v)) => Some(*v),
            _ => None,
        };

        if let Some(number) = number {
            self.sum += number;
            self.numeric += 1;
        }
    }

    fn finish(self, op: AccumulatorOp) -> Bson {
        match op {
            // Non-numeric values are ignored; a group without any numbers averages to null.
            AccumulatorOp::Avg if self.numeric == 0 => Bson::Null,
            AccumulatorOp::Avg => Bson::Double(self.sum / self.numeric as f64),
            AccumulatorOp::Sum => Bson::Double(self.sum),
            AccumulatorOp::Count => Bson::Int64(self.documents as i64),
        }
    }
}

struct Group {
    key: Bson,
    tallies: Vec<Tally>,
}

/// Evaluates `aggregation` over `documents`.
///
/// Produces one row per distinct value of the group-by field (missing values group
/// under `null`), in first-seen order unless the aggregation is sorted. Each row holds
/// the group-by field under its own name plus one entry per accumulator output.
pub(crate) fn run_aggregation<'a>(
    documents: impl IntoIterator<Item = &'a Bson>,
    aggregation: &Aggregation,
) -> DocumentStoreResult<Vec<Bson>> {
    let matched = DocumentEvaluator::filter_documents(documents, aggregation.filter.as_ref())?;
    let mut groups: Vec<Group> = Vec::new();

    for document in &matched {
        let key = field_of(document, &aggregation.group_by)
            .cloned()
            .unwrap_or(Bson::Null);

        let position = groups
            .iter()
            .position(|group| Comparable::from(&group.key) == Comparable::from(&key));
        let group = match position {
            Some(index) => &mut groups[index],
            None => {
                groups.push(Group {
                    key,
                    tallies: vec![Tally::default(); aggregation.accumulators.len()],
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };

        for (tally, accumulator) in group.tallies.iter_mut().zip(&aggregation.accumulators) {
            tally.push(field_of(document, &accumulator.field));
        }
    }

    let mut rows = groups
        .into_iter()
        .map(|group| into_row(group, &aggregation.group_by, &aggregation.accumulators))
        .collect::<Vec<_>>();

    if let Some(sort) = &aggregation.sort {
        sort_documents(&mut rows, sort);
    }

    Ok(rows)
}

fn into_row(group: Group, group_by: &str, accumulators: &[Accumulator]) -> Bson {
    let mut row = BsonDocument::new();
    row.insert(group_by, group.key);

    for (tally, accumulator) in group.tallies.into_iter().zip(accumulators) {
        row.insert(accumulator.output.clone(), tally.finish(accumulator.op));
    }

    Bson::Document(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use roster_core::query::{Filter, SortDirection};

    fn staff() -> Vec<Bson> {
        [
            doc! { "department": "Engineering", "salary": 75000.0 },
            doc! { "department": "HR", "salary": 60000 },
            doc! { "department": "Engineering", "salary": 80000.0 },
            doc! { "department": "Sales", "salary": "n/a" },
            doc! { "salary": 10.0 },
        ]
        .into_iter()
        .map(Bson::Document)
        .collect()
    }

    #[test]
    fn groups_in_first_seen_order_with_null_for_missing_keys() {
        let aggregation = Aggregation::builder("department")
            .avg("avg_salary", "salary")
            .count("headcount")
            .build();

        let rows = run_aggregation(&staff(), &aggregation).unwrap();

        assert_eq!(rows, vec![
            Bson::Document(doc! { "department": "Engineering", "avg_salary": 77500.0, "headcount": 2_i64 }),
            Bson::Document(doc! { "department": "HR", "avg_salary": 60000.0, "headcount": 1_i64 }),
            Bson::Document(doc! { "department": "Sales", "avg_salary": Bson::Null, "headcount": 1_i64 }),
            Bson::Document(doc! { "department": Bson::Null, "avg_salary": 10.0, "headcount": 1_i64 }),
        ]);
    }

    #[test]
    fn filters_before_grouping_and_sorts_rows() {
        let aggregation = Aggregation::builder("department")
            .filter(Filter::exists("department"))
            .sum("payroll", "salary")
            .sort("department", SortDirection::Desc)
            .build();

        let rows = run_aggregation(&staff(), &aggregation).unwrap();
        let departments: Vec<&str> = rows
            .iter()
            .map(|row| row.as_document().unwrap().get_str("department").unwrap())
            .collect();

        assert_eq!(departments, vec!["Sales", "HR", "Engineering"]);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let aggregation = Aggregation::builder("department").avg("avg_salary", "salary").build();

        assert!(run_aggregation(&Vec::<Bson>::new(), &aggregation).unwrap().is_empty());
    }
}
