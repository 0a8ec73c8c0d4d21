//! Generic resource-client layer
//!
//! Every remote operation follows the same template: build a URL from a typed
//! [`Endpoint`], perform one authenticated call, unwrap the JSON payload and
//! classify failures into [`IdcError`](crate::idc::IdcError).
//!
//! # Architecture
//!
//! - [`endpoint`] - Typed path builder and request descriptors
//! - [`fetcher`] - Executes descriptors, decodes bodies, aggregates pages
//! - [`skeleton`] - Open-ended entity shapes, paged results, export metadata
//! - [`json`] - Pure payload transforms applied before writes
//! - [`batch`] - Collect-then-report bulk processing
//!
//! # Example
//!
//! ```ignore
//! use tidc::resource::{fetch_all_pages, Descriptor, Endpoint, Skeleton};
//!
//! async fn list(client: &tidc::idc::client::IdcClient) -> tidc::idc::Result<Vec<Skeleton>> {
//!     fetch_all_pages(client, &Descriptor::get(Endpoint::Variables), None).await
//! }
//! ```

pub mod batch;
pub mod endpoint;
pub mod fetcher;
pub mod json;
pub mod skeleton;

pub use endpoint::{Api, Descriptor, Endpoint};
pub use fetcher::{decode, fetch, fetch_all_pages, fetch_as, fetch_items, fetch_optional, to_body};
pub use skeleton::{EntityType, ExportMeta, PagedResult, ResponseItems, Skeleton};
