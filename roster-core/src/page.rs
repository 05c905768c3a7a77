//! Pagination parameters for paged queries.
//!
//! Pages are 1-indexed and a page holds at most [`MAX_PAGE_SIZE`] items.

use thiserror::Error;

use crate::query::QueryBuilder;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Reasons a set of pagination parameters is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be greater than or equal to 1, got {0}")]
    PageOutOfRange(usize),
    #[error("size must be between 1 and 100, got {0}")]
    SizeOutOfRange(usize),
}

/// Parameters for paginating through large result sets.
///
/// # Example
///
/// ```ignore
/// use roster_core::page::PaginationParams;
///
/// let params = PaginationParams::new(3, 20);
/// assert_eq!(params.offset(), 40);  // Skip 40 items for page 3
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// The page number (1-indexed).
    pub page: usize,
    /// Number of items per page.
    pub size: usize,
}

impl PaginationParams {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Checks `page >= 1` and `1 <= size <= MAX_PAGE_SIZE`.
    pub fn validate(&self) -> Result<(), PaginationError> {
        if self.page < 1 {
            return Err(PaginationError::PageOutOfRange(self.page));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.size) {
            return Err(PaginationError::SizeOutOfRange(self.size));
        }

        Ok(())
    }

    /// Number of items to skip to reach this page.
    ///
    /// Saturates instead of overflowing for absurd page numbers, which simply
    /// yields an empty page.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }

    /// Applies offset and limit to a query under construction.
    pub fn apply(&self, builder: QueryBuilder) -> QueryBuilder {
        builder.offset(self.offset()).limit(self.size)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, size: DEFAULT_PAGE_SIZE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;

    #[test]
    fn offset_calculation() {
        assert_eq!(PaginationParams::new(1, 10).offset(), 0);
        assert_eq!(PaginationParams::new(2, 10).offset(), 10);
        assert_eq!(PaginationParams::new(3, 25).offset(), 50);
    }

    #[test]
    fn offset_saturates() {
        assert_eq!(PaginationParams::new(usize::MAX, 100).offset(), usize::MAX);
    }

    #[test]
    fn rejects_page_zero() {
        assert_eq!(
            PaginationParams::new(0, 10).validate(),
            Err(PaginationError::PageOutOfRange(0))
        );
    }

    #[test]
    fn rejects_size_outside_bounds() {
        assert_eq!(
            PaginationParams::new(1, 0).validate(),
            Err(PaginationError::SizeOutOfRange(0))
        );
        assert_eq!(
            PaginationParams::new(1, 101).validate(),
            Err(PaginationError::SizeOutOfRange(101))
        );
        assert!(PaginationParams::new(1, 100).validate().is_ok());
        assert!(PaginationParams::new(1, 1).validate().is_ok());
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let params = PaginationParams::default();
        assert_eq!((params.page, params.size), (1, 10));
    }

    #[test]
    fn apply_sets_offset_and_limit() {
        let query = PaginationParams::new(4, 5).apply(Query::builder()).build();

        assert_eq!(query.offset, Some(15));
        assert_eq!(query.limit, Some(5));
    }
}
