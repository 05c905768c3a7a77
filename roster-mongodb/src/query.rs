//! Query translation from the roster query AST to MongoDB query syntax.
//!
//! This module translates abstract query expressions and aggregations into
//! MongoDB BSON documents and pipelines for execution by the MongoDB query engine.

use bson::{Document, Bson, doc};

use roster_core::{
    query::{Aggregation, AccumulatorOp, QueryVisitor, Expr, FieldOp, SortDirection},
    error::{DocumentStoreError, DocumentStoreResult},
};

use crate::sanitizer::KeySanitizer;


/// Translates query expressions into MongoDB query documents.
///
/// This struct implements the [`QueryVisitor`] trait to convert abstract
/// query expressions into MongoDB's native BSON query syntax. Field names are
/// escaped the same way stored keys are.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub(crate) fn translate(expr: &Expr) -> DocumentStoreResult<Document> {
        MongoQueryTranslator.visit_expr(expr)
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    // `$not` only applies to a single field's operator, so negate whole expressions with `$nor`.
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            KeySanitizer::sanitize_key(field): { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Ne => doc! { "$ne": value },
            FieldOp::Gt => doc! { "$gt": value },
            FieldOp::Gte => doc! { "$gte": value },
            FieldOp::Lt => doc! { "$lt": value },
            FieldOp::Lte => doc! { "$lte": value },
            FieldOp::AnyOf | FieldOp::NoneOf => {
                let Bson::Array(values) = value else {
                    return Err(DocumentStoreError::InvalidQuery(format!(
                        "{op:?} on field {field} requires an array of values"
                    )));
                };

                if *op == FieldOp::AnyOf {
                    doc! { "$in": values }
                } else {
                    doc! { "$nin": values }
                }
            },
        };

        Ok(doc! { KeySanitizer::sanitize_key(field): condition })
    }
}

/// Builds the aggregation pipeline for `aggregation`:
/// `$match` (optional), `$group`, `$project` back to named fields, `$sort` (optional).
pub(crate) fn aggregation_pipeline(aggregation: &Aggregation) -> DocumentStoreResult<Vec<Document>> {
    let group_by = KeySanitizer::sanitize_key(&aggregation.group_by);
    let mut pipeline = Vec::with_capacity(4);

    if let Some(filter) = &aggregation.filter {
        pipeline.push(doc! { "$match": MongoQueryTranslator::translate(filter)? });
    }

    let mut group = doc! { "_id": format!("${group_by}") };
    let mut project = doc! { "_id": 0, group_by.clone(): "$_id" };

    for accumulator in &aggregation.accumulators {
        let output = KeySanitizer::sanitize_key(&accumulator.output);
        let source = format!("${}", KeySanitizer::sanitize_key(&accumulator.field));
        let expression = match accumulator.op {
            AccumulatorOp::Avg => doc! { "$avg": source },
            AccumulatorOp::Sum => doc! { "$sum": source },
            AccumulatorOp::Count => doc! { "$sum": 1 },
        };

        group.insert(output.clone(), expression);
        project.insert(output, 1);
    }

    pipeline.push(doc! { "$group": group });
    pipeline.push(doc! { "$project": project });

    if let Some(sort) = &aggregation.sort {
        pipeline.push(doc! { "$sort": sort_document(&sort.field, sort.direction) });
    }

    Ok(pipeline)
}

pub(crate) fn sort_document(field: &str, direction: SortDirection) -> Document {
    doc! {
        KeySanitizer::sanitize_key(field): match direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::query::Filter;

    #[test]
    fn translates_field_operators() {
        assert_eq!(
            MongoQueryTranslator::translate(&Filter::eq("department", "HR")).unwrap(),
            doc! { "department": { "$eq": "HR" } },
        );
        assert_eq!(
            MongoQueryTranslator::translate(&Filter::any_of("skills", ["Node.js"])).unwrap(),
            doc! { "skills": { "$in": ["Node.js"] } },
        );
        assert_eq!(
            MongoQueryTranslator::translate(&Filter::gte("salary", 10.5)).unwrap(),
            doc! { "salary": { "$gte": 10.5 } },
        );
    }

    #[test]
    fn translates_logical_operators() {
        let expr = Filter::and([Filter::exists("skills"), Filter::ne("name", "x")]).not();

        assert_eq!(
            MongoQueryTranslator::translate(&expr).unwrap(),
            doc! {
                "$nor": [{
                    "$and": [
                        { "skills": { "$exists": true } },
                        { "name": { "$ne": "x" } },
                    ]
                }]
            },
        );
    }

    #[test]
    fn membership_operators_require_arrays() {
        let expr = Expr::field("skills".into(), FieldOp::NoneOf, Bson::String("Go".into()));

        assert!(matches!(
            MongoQueryTranslator::translate(&expr),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn builds_average_pipeline() {
        let aggregation = Aggregation::builder("department")
            .avg("avg_salary", "salary")
            .sort("avg_salary", SortDirection::Desc)
            .build();

        assert_eq!(aggregation_pipeline(&aggregation).unwrap(), vec![
            doc! { "$group": { "_id": "$department", "avg_salary": { "$avg": "$salary" } } },
            doc! { "$project": { "_id": 0, "department": "$_id", "avg_salary": 1 } },
            doc! { "$sort": { "avg_salary": -1 } },
        ]);
    }

    #[test]
    fn filtered_count_pipeline_starts_with_match() {
        let aggregation = Aggregation::builder("department")
            .filter(Filter::gt("salary", 0))
            .count("headcount")
            .build();
        let pipeline = aggregation_pipeline(&aggregation).unwrap();

        assert_eq!(pipeline[0], doc! { "$match": { "salary": { "$gt": 0 } } });
        assert_eq!(pipeline[1], doc! { "$group": { "_id": "$department", "headcount": { "$sum": 1 } } });
        assert_eq!(pipeline.len(), 3);
    }
}
