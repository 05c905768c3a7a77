//! Query expression evaluation for in-memory document filtering.
//!
//! This module provides the evaluation engine for query expressions,
//! enabling filtering and comparison operations on BSON documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, datetime::DateTime};

use roster_core::{
    query::{QueryVisitor, Expr, FieldOp, Sort, SortDirection},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Type-erased, comparable representation of BSON values.
///
/// All integer and floating point types are normalized to `f64` so that an
/// `Int32` salary compares equal to the same `Double` salary.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Looks up a top-level field of a stored document.
pub(crate) fn field_of<'a>(document: &'a Bson, field: &str) -> Option<&'a Bson> {
    document
        .as_document()
        .and_then(|doc| doc.get(field))
}

/// Stable-sorts documents by one field. Missing fields sort as `null`, and
/// values of incomparable types keep their relative order.
pub(crate) fn sort_documents(documents: &mut [Bson], sort: &Sort) {
    documents.sort_by(|a, b| {
        let left = field_of(a, &sort.field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);
        let right = field_of(b, &sort.field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);

        match sort.direction {
            SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
            SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
        }
    });
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Bson,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Bson) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Returns true when `document` satisfies `filter`; no filter matches everything.
    pub fn matches(document: &'a Bson, filter: Option<&Expr>) -> DocumentStoreResult<bool> {
        match filter {
            Some(expr) => DocumentEvaluator::new(document).evaluate(expr),
            None => Ok(true),
        }
    }

    /// Returns clones of the documents matching `filter`, preserving input order.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Bson>,
        filter: Option<&Expr>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::matches(document, filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }
}

/// True when `candidate`, or any element of it if it is an array, equals one of `values`.
fn contains_any(candidate: &Bson, values: &[Bson]) -> bool {
    let hit = |item: &Bson| {
        values
            .iter()
            .any(|value| Comparable::from(item) == Comparable::from(value))
    };

    match candidate {
        Bson::Array(items) => items.iter().any(hit),
        single => hit(single),
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(field_of(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field_value = field_of(self.document, field);

        match op {
            FieldOp::AnyOf | FieldOp::NoneOf => {
                let Bson::Array(values) = value else {
                    return Err(DocumentStoreError::InvalidQuery(format!(
                        "{op:?} on field {field} requires an array of values"
                    )));
                };
                let hit = field_value.is_some_and(|candidate| contains_any(candidate, values));

                Ok(if *op == FieldOp::AnyOf { hit } else { !hit })
            },
            // A missing field is "not equal" to anything, matching MongoDB's `$ne`.
            FieldOp::Ne => Ok(field_value
                .is_none_or(|candidate| Comparable::from(candidate) != Comparable::from(value))),
            FieldOp::Eq => Ok(field_value
                .is_some_and(|candidate| Comparable::from(candidate) == Comparable::from(value))),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                let Some(candidate) = field_value else {
                    return Ok(false);
                };

                Ok(match Comparable::from(candidate).partial_cmp(&Comparable::from(value)) {
                    Some(ordering) => match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    },
                    None => false,
                })
            },
        }
    }
}
