//! Cache-aware wrappers
//!
//! Adapters that make data-producing operations cacheable without changing
//! their call sites:
//! - [`CachedHttpClient`] for idempotent outbound HTTP calls
//! - [`CachedRepository`] for data-access objects
//! - [`Swr`] for stale-while-revalidate reads
//!
//! All of them hold a [`crate::cache::CacheService`] handle and release the
//! store lock before running the wrapped operation.

pub mod http;
pub mod repository;
pub mod swr;

pub use http::{CachedHttpClient, HttpResponse, HttpTransport, RequestDescriptor, ReqwestTransport};
pub use repository::CachedRepository;
pub use swr::{MutateOptions, Mutation, RevalidationEvent, Swr, SwrResource};
