//! Identity cloud API interaction module
//!
//! Session context, HTTP transport and the single domain error type shared by
//! every operation.
//!
//! # Module Structure
//!
//! - [`auth`] - Session context, credentials and realm path resolution
//! - [`client`] - Main client executing one described request at a time
//! - [`error`] - [`IdcError`](error::IdcError) and its [`ErrorKind`](error::ErrorKind)
//! - [`http`] - reqwest transport with retry strategy
//!
//! # Example
//!
//! ```ignore
//! use tidc::idc::{auth::{Credentials, Session}, client::IdcClient};
//! use tidc::ops::variables;
//!
//! async fn example() -> tidc::idc::Result<()> {
//!     let session = Session::new("https://tenant.example.com/am", "alpha", Credentials::from_env())?;
//!     let client = IdcClient::new(session)?;
//!     let all = variables::read_variables(&client).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;

pub use error::{ErrorKind, IdcError, Result};
