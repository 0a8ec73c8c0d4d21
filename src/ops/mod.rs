//! Resource operations
//!
//! One module per remote resource family. Operations take an
//! [`IdcClient`](crate::idc::client::IdcClient) and return
//! [`idc::Result`](crate::idc::Result).

pub mod social_idp;
pub mod variables;
pub mod wsfed;
