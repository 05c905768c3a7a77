//! A thin document database layer that provides a unified interface over document stores.
//!
//! This crate is the backend-agnostic core of roster and provides:
//!
//! - **Document traits** ([`document`]) - Core traits for defining and serializing documents
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Query and aggregation API** ([`query`]) - Filter, sort and group-by construction
//! - **Collections interface** ([`collection`]) - Typed access to one collection
//! - **Document store** ([`store`]) - The process-wide store handle
//! - **Pagination** ([`page`]) - Validated page/size parameters
//! - **Error handling** ([`error`]) - Error and result types

#[allow(unused_extern_crates)]
extern crate self as roster_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod page;
pub mod query;
pub mod store;
