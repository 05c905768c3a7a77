//! Query and aggregation construction for document stores.
//!
//! This module provides backend-agnostic query construction with filtering, sorting and
//! pagination, a grouped aggregation description, and a visitor pattern that each
//! backend uses to evaluate or translate filter expressions.
//!
//! # Query Building
//!
//! ```ignore
//! use roster_core::query::{Query, Filter, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("department", "Engineering"))
//!     .sort("joining_date", SortDirection::Desc)
//!     .offset(0)
//!     .limit(10)
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - Array membership: `any_of`, `none_of` (exact element match)
//! - Existence: `exists`, `not_exists`
//! - Logical: `and`, `or`, and [`Expr::not`]
//!
//! # Aggregation
//!
//! ```ignore
//! use roster_core::query::{Aggregation, SortDirection};
//!
//! let aggregation = Aggregation::builder("department")
//!     .avg("avg_salary", "salary")
//!     .sort("department", SortDirection::Asc)
//!     .build();
//! ```

use bson::Bson;

use crate::error::DocumentStoreError;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification: which field to sort by and in which direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// The field (or one of its array elements) equals one of the given values.
    AnyOf,
    /// The field (or every one of its array elements) equals none of the given values.
    NoneOf,
}

/// A filter expression for querying documents.
///
/// Expressions can be combined using logical operators (`And`, `Or`, `Not`)
/// to build complex filter predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// A structured query for retrieving and filtering documents.
///
/// Use [`QueryBuilder`] for ergonomic construction. Without a sort, results come
/// back in whatever order the backend yields them.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip (for pagination).
    pub offset: Option<usize>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
}

impl Query {
    /// Creates a new empty query with no filters or limits.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Helper struct for constructing filter expressions.
///
/// All methods accept field names and values as `Into<String>` and `Into<Bson>`.
///
/// # Example
///
/// ```ignore
/// use roster_core::query::Filter;
///
/// let expr = Filter::eq("department", "HR")
///     .and(Filter::gt("salary", 50_000.0));
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the specified value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents where the field does not equal the specified value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Matches documents where the field is greater than the specified value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Matches documents where the field is greater than or equal to the specified value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches documents where the field is less than the specified value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Matches documents where the field is less than or equal to the specified value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents where the field exists.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches documents where the field is missing.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Combines multiple expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines multiple expressions such that any can match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Matches documents where the field, or any element of an array field,
    /// is exactly equal to one of `values`.
    ///
    /// Matching is exact and case-sensitive; `"Rust"` never matches `"rust"`.
    pub fn any_of<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(
            field.into(),
            FieldOp::AnyOf,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Matches documents where neither the field nor any element of an array
    /// field equals one of `values`.
    pub fn none_of<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(
            field.into(),
            FieldOp::NoneOf,
            Bson::Array(values.into_iter().map(Into::into).collect()),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the filter expression only when one is given.
    pub fn maybe_filter(mut self, filter: Option<Expr>) -> Self {
        self.query.filter = filter;
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Sets the sort specification for the query results.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Accumulator functions available to an [`Aggregation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorOp {
    /// Arithmetic mean of the numeric values of a field; `null` if there are none.
    Avg,
    /// Sum of the numeric values of a field; `0` if there are none.
    Sum,
    /// Number of documents in the group.
    Count,
}

/// One output column of an aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    /// Name of the output field in each result row.
    pub output: String,
    /// The accumulator function.
    pub op: AccumulatorOp,
    /// The input field (ignored for [`AccumulatorOp::Count`]).
    pub field: String,
}

/// A grouped aggregation over a collection.
///
/// Every result row is a document holding the group key under the `group_by`
/// field name plus one field per accumulator. Documents missing the grouping
/// field are grouped under `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Optional filter applied before grouping.
    pub filter: Option<Expr>,
    /// Field whose distinct values form the groups.
    pub group_by: String,
    /// Output columns.
    pub accumulators: Vec<Accumulator>,
    /// Optional sort over the output rows.
    pub sort: Option<Sort>,
}

impl Aggregation {
    /// Creates a builder grouping by `group_by`.
    pub fn builder(group_by: impl Into<String>) -> AggregationBuilder {
        AggregationBuilder::new(group_by)
    }
}

#[derive(Debug, Clone)]
pub struct AggregationBuilder {
    aggregation: Aggregation,
}

impl AggregationBuilder {
    pub fn new(group_by: impl Into<String>) -> Self {
        Self {
            aggregation: Aggregation {
                filter: None,
                group_by: group_by.into(),
                accumulators: Vec::new(),
                sort: None,
            },
        }
    }

    /// Restricts the aggregation to documents matching `filter`.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.aggregation.filter = Some(filter);
        self
    }

    /// Adds an average of `field` written to `output`.
    pub fn avg(self, output: impl Into<String>, field: impl Into<String>) -> Self {
        self.accumulate(output, AccumulatorOp::Avg, field)
    }

    /// Adds a sum of `field` written to `output`.
    pub fn sum(self, output: impl Into<String>, field: impl Into<String>) -> Self {
        self.accumulate(output, AccumulatorOp::Sum, field)
    }

    /// Adds a per-group document count written to `output`.
    pub fn count(self, output: impl Into<String>) -> Self {
        self.accumulate(output, AccumulatorOp::Count, String::new())
    }

    fn accumulate(mut self, output: impl Into<String>, op: AccumulatorOp, field: impl Into<String>) -> Self {
        self.aggregation.accumulators.push(Accumulator {
            output: output.into(),
            op,
            field: field.into(),
        });
        self
    }

    /// Sorts the output rows by one of their fields.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.aggregation.sort = Some(Sort { field: field.into(), direction });
        self
    }

    pub fn build(self) -> Aggregation {
        self.aggregation
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
