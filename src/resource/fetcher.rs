//! Resource Fetcher
//!
//! Runs described requests through an [`IdcClient`] and turns the opaque JSON
//! body into the shape the caller expects.

use super::endpoint::Descriptor;
use super::skeleton::{PagedResult, ResponseItems};
use crate::idc::client::IdcClient;
use crate::idc::error::{ErrorKind, IdcError, Result};
use crate::idc::http::TransportError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Perform one request and return the raw body
pub async fn fetch(
    client: &IdcClient,
    descriptor: &Descriptor<'_>,
    body: Option<&Value>,
) -> Result<Value> {
    client.execute(descriptor, body).await
}

/// Perform one request and decode the body into `T`
pub async fn fetch_as<T: DeserializeOwned>(
    client: &IdcClient,
    descriptor: &Descriptor<'_>,
    body: Option<&Value>,
) -> Result<T> {
    decode(client.execute(descriptor, body).await?)
}

/// Read a single entity; a remote 404 or an empty body means absent
pub async fn fetch_optional<T: DeserializeOwned>(
    client: &IdcClient,
    descriptor: &Descriptor<'_>,
) -> Result<Option<T>> {
    match client.execute(descriptor, None).await {
        Ok(Value::Null) => Ok(None),
        Ok(value) => decode(value).map(Some),
        Err(err) if err.status() == Some(404) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Unwrap an `{items: [...]}` list response
pub async fn fetch_items<T: DeserializeOwned>(
    client: &IdcClient,
    descriptor: &Descriptor<'_>,
) -> Result<Vec<T>> {
    let response: ResponseItems<T> = fetch_as(client, descriptor, None).await?;
    Ok(response.items)
}

/// Follow continuation cookies until the last page, concatenating results
///
/// Results keep the order the remote service returned them in. A cookie that
/// comes back a second time means the service is cycling, which is an error.
pub async fn fetch_all_pages<T: DeserializeOwned>(
    client: &IdcClient,
    descriptor: &Descriptor<'_>,
    body: Option<&Value>,
) -> Result<Vec<T>> {
    let mut all_items = Vec::new();
    let mut cookie: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let response = client
            .execute_page(descriptor, body, cookie.as_deref())
            .await?;
        let page: PagedResult<T> = decode(response)?;
        pages += 1;

        let next = page.next_cookie().map(str::to_string);
        all_items.extend(page.result);

        let Some(next) = next else {
            break;
        };
        if !seen.insert(next.clone()) {
            tracing::warn!("Paging cookie repeated after {} pages", pages);
            return Err(IdcError::new(
                ErrorKind::Transport,
                format!("Paging cookie repeated after {} pages", pages),
            ));
        }
        cookie = Some(next);
    }

    tracing::debug!("Fetched {} items in {} pages", all_items.len(), pages);
    Ok(all_items)
}

/// Serialize a request payload
pub fn to_body<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| IdcError::usage("Failed to serialize request payload").with_source(e))
}

/// Decode an opaque response body into the expected shape
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e).into())
}
