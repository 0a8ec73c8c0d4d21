//! WS-Federation admin operations
//!
//! Thin operations over the federation admin API: SP connections, policy
//! contracts, signing keys, server settings, adapters, authentication
//! policies and cluster replication.

pub mod types;

pub use types::*;

use crate::idc::client::IdcClient;
use crate::idc::error::{IdcError, Result};
use crate::resource::{fetch, fetch_as, fetch_items, fetch_optional, to_body, Descriptor, Endpoint};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

/// GET a single object; 404 or an empty body becomes not-found
async fn read_by_id<T: DeserializeOwned>(
    client: &IdcClient,
    endpoint: Endpoint<'_>,
    missing: String,
) -> Result<T> {
    fetch_optional(client, &Descriptor::get(endpoint))
        .await?
        .ok_or_else(|| IdcError::not_found(missing))
}

async fn send<T: DeserializeOwned, B: Serialize>(
    client: &IdcClient,
    descriptor: Descriptor<'_>,
    payload: &B,
) -> Result<T> {
    let body = to_body(payload)?;
    fetch_as(client, &descriptor, Some(&body)).await
}

pub async fn read_sp_connections(client: &IdcClient) -> Result<Vec<SpConnection>> {
    tracing::debug!("wsfed::read_sp_connections: start");
    let items = fetch_items(client, &Descriptor::get(Endpoint::SpConnections))
        .await
        .map_err(|e| IdcError::wrap("Error reading SP connections", e))?;
    tracing::debug!("wsfed::read_sp_connections: end");
    Ok(items)
}

pub async fn read_sp_connection(client: &IdcClient, id: &str) -> Result<SpConnection> {
    read_by_id(
        client,
        Endpoint::SpConnection { id },
        format!("SP connection with ID {} not found", id),
    )
    .await
    .map_err(|e| IdcError::wrap(format!("Error reading SP connection with ID {}", id), e))
}

pub async fn create_sp_connection(
    client: &IdcClient,
    connection: &SpConnection,
) -> Result<SpConnection> {
    send(client, Descriptor::post(Endpoint::SpConnections), connection)
        .await
        .map_err(|e| IdcError::wrap("Error creating SP connection", e))
}

pub async fn update_sp_connection(
    client: &IdcClient,
    id: &str,
    connection: &SpConnection,
) -> Result<SpConnection> {
    send(client, Descriptor::put(Endpoint::SpConnection { id }), connection)
        .await
        .map_err(|e| IdcError::wrap(format!("Error updating SP connection {}", id), e))
}

pub async fn read_policy_contracts(client: &IdcClient) -> Result<Vec<AuthenticationPolicyContract>> {
    fetch_items(client, &Descriptor::get(Endpoint::PolicyContracts))
        .await
        .map_err(|e| IdcError::wrap("Error reading authentication policy contracts", e))
}

pub async fn read_policy_contract(
    client: &IdcClient,
    id: &str,
) -> Result<AuthenticationPolicyContract> {
    read_by_id(
        client,
        Endpoint::PolicyContract { id },
        format!("Authentication policy contract with ID {} not found", id),
    )
    .await
    .map_err(|e| {
        IdcError::wrap(
            format!("Error reading authentication policy contract with ID {}", id),
            e,
        )
    })
}

pub async fn create_policy_contract(
    client: &IdcClient,
    contract: &AuthenticationPolicyContract,
) -> Result<AuthenticationPolicyContract> {
    send(client, Descriptor::post(Endpoint::PolicyContracts), contract)
        .await
        .map_err(|e| IdcError::wrap("Error creating authentication policy contract", e))
}

pub async fn update_policy_contract(
    client: &IdcClient,
    id: &str,
    contract: &AuthenticationPolicyContract,
) -> Result<AuthenticationPolicyContract> {
    send(client, Descriptor::put(Endpoint::PolicyContract { id }), contract)
        .await
        .map_err(|e| {
            IdcError::wrap(
                format!("Error updating authentication policy contract {}", id),
                e,
            )
        })
}

/// Generate a new signing key pair; `SigningKeyPairRequest::default()` gives the stock parameters
pub async fn generate_signing_key_pair(
    client: &IdcClient,
    request: &SigningKeyPairRequest,
) -> Result<SigningKeyPair> {
    tracing::debug!("wsfed::generate_signing_key_pair: start");
    let pair = send(client, Descriptor::post(Endpoint::SigningKeyPairGenerate), request)
        .await
        .map_err(|e| IdcError::wrap("Error generating signing key pair", e))?;
    tracing::debug!("wsfed::generate_signing_key_pair: end");
    Ok(pair)
}

pub async fn read_signing_key_pairs(client: &IdcClient) -> Result<Vec<SigningKeyPair>> {
    fetch_items(client, &Descriptor::get(Endpoint::SigningKeyPairs))
        .await
        .map_err(|e| IdcError::wrap("Error reading signing key pairs", e))
}

pub async fn read_signing_key_pair(client: &IdcClient, id: &str) -> Result<SigningKeyPair> {
    read_by_id(
        client,
        Endpoint::SigningKeyPair { id },
        format!("Signing key pair with ID {} not found", id),
    )
    .await
    .map_err(|e| IdcError::wrap(format!("Error reading signing key pair {}", id), e))
}

pub async fn update_or_create_signing_key_pair(
    client: &IdcClient,
    id: &str,
    request: &SigningKeyPairRequest,
) -> Result<SigningKeyPair> {
    send(client, Descriptor::put(Endpoint::SigningKeyPair { id }), request)
        .await
        .map_err(|e| {
            IdcError::wrap(format!("Error updating or creating signing key pair {}", id), e)
        })
}

/// PEM encoded certificate of a signing key pair
pub async fn read_signing_key_pair_certificate(client: &IdcClient, id: &str) -> Result<String> {
    let label = format!("Error reading signing key pair certificate {}", id);
    let descriptor = Descriptor::get(Endpoint::SigningKeyPairCertificate { id }).text();
    match fetch(client, &descriptor, None).await {
        Ok(Value::String(pem)) => Ok(pem),
        Ok(Value::Null) => Err(IdcError::wrap(
            label,
            IdcError::not_found(format!("Certificate of signing key pair {} not found", id)),
        )),
        Ok(other) => Ok(other.to_string()),
        Err(e) if e.status() == Some(404) => Err(IdcError::wrap(
            label,
            IdcError::not_found(format!("Certificate of signing key pair {} not found", id)),
        )),
        Err(e) => Err(IdcError::wrap(label, e)),
    }
}

pub async fn update_or_create_signing_key_pair_certificate(
    client: &IdcClient,
    id: &str,
    certificate: &str,
) -> Result<Value> {
    let body = json!({ "certificate": certificate });
    let descriptor = Descriptor::put(Endpoint::SigningKeyPairCertificate { id }).text();
    fetch(client, &descriptor, Some(&body)).await.map_err(|e| {
        IdcError::wrap(
            format!("Error updating or creating signing key pair certificate {}", id),
            e,
        )
    })
}

pub async fn delete_signing_key_pair(client: &IdcClient, id: &str) -> Result<()> {
    fetch(client, &Descriptor::delete(Endpoint::SigningKeyPair { id }), None)
        .await
        .map(|_| ())
        .map_err(|e| IdcError::wrap(format!("Error deleting signing key pair {}", id), e))
}

pub async fn delete_signing_key_pair_certificate(client: &IdcClient, id: &str) -> Result<()> {
    fetch(
        client,
        &Descriptor::delete(Endpoint::SigningKeyPairCertificate { id }),
        None,
    )
    .await
    .map(|_| ())
    .map_err(|e| {
        IdcError::wrap(
            format!("Error deleting signing key pair certificate {}", id),
            e,
        )
    })
}

pub async fn read_federation_info(client: &IdcClient) -> Result<FederationInfo> {
    fetch_as(client, &Descriptor::get(Endpoint::FederationInfo), None)
        .await
        .map_err(|e| IdcError::wrap("Error reading federation info", e))
}

pub async fn update_federation_info(
    client: &IdcClient,
    info: &FederationInfo,
) -> Result<FederationInfo> {
    send(client, Descriptor::put(Endpoint::FederationInfo), info)
        .await
        .map_err(|e| IdcError::wrap("Error updating federation info", e))
}

/// Configured virtual host names
pub async fn read_virtual_host_names(client: &IdcClient) -> Result<Vec<String>> {
    let names: VirtualHostNames = fetch_as(client, &Descriptor::get(Endpoint::VirtualHostNames), None)
        .await
        .map_err(|e| IdcError::wrap("Error reading virtual host names", e))?;
    Ok(names.virtual_host_names)
}

pub async fn read_idp_adapters(client: &IdcClient) -> Result<Vec<IdpAdapter>> {
    fetch_items(client, &Descriptor::get(Endpoint::IdpAdapters))
        .await
        .map_err(|e| IdcError::wrap("Error reading IdP adapters", e))
}

pub async fn read_idp_adapter(client: &IdcClient, id: &str) -> Result<IdpAdapter> {
    read_by_id(
        client,
        Endpoint::IdpAdapter { id },
        format!("IdP adapter with ID {} not found", id),
    )
    .await
    .map_err(|e| IdcError::wrap(format!("Error reading IdP adapter {}", id), e))
}

pub async fn create_idp_adapter(client: &IdcClient, adapter: &IdpAdapter) -> Result<IdpAdapter> {
    send(client, Descriptor::post(Endpoint::IdpAdapters), adapter)
        .await
        .map_err(|e| IdcError::wrap(format!("Error creating IdP adapter {}", adapter.id), e))
}

pub async fn update_idp_adapter(
    client: &IdcClient,
    id: &str,
    adapter: &IdpAdapter,
) -> Result<IdpAdapter> {
    send(client, Descriptor::put(Endpoint::IdpAdapter { id }), adapter)
        .await
        .map_err(|e| IdcError::wrap(format!("Error updating IdP adapter {}", id), e))
}

pub async fn delete_idp_adapter(client: &IdcClient, id: &str) -> Result<()> {
    fetch(client, &Descriptor::delete(Endpoint::IdpAdapter { id }), None)
        .await
        .map(|_| ())
        .map_err(|e| IdcError::wrap(format!("Error deleting IdP adapter {}", id), e))
}

pub async fn read_authentication_policy(
    client: &IdcClient,
    id: &str,
) -> Result<AuthenticationPolicy> {
    read_by_id(
        client,
        Endpoint::AuthenticationPolicy { id },
        format!("Authentication policy with ID {} not found", id),
    )
    .await
    .map_err(|e| IdcError::wrap(format!("Error reading authentication policy {}", id), e))
}

/// Create an authentication policy; the id is assigned remotely
pub async fn create_authentication_policy(
    client: &IdcClient,
    policy: &AuthenticationPolicy,
) -> Result<AuthenticationPolicy> {
    let mut request = policy.clone();
    request.id = None;
    send(client, Descriptor::post(Endpoint::AuthenticationPolicies), &request)
        .await
        .map_err(|e| {
            IdcError::wrap(
                format!("Error creating authentication policy {}", policy.name),
                e,
            )
        })
}

pub async fn update_authentication_policy(
    client: &IdcClient,
    id: &str,
    policy: &AuthenticationPolicy,
) -> Result<AuthenticationPolicy> {
    let mut request = policy.clone();
    request.id = None;
    send(client, Descriptor::put(Endpoint::AuthenticationPolicy { id }), &request)
        .await
        .map_err(|e| IdcError::wrap(format!("Error updating authentication policy {}", id), e))
}

/// Push the admin node's configuration to the cluster
pub async fn replicate(client: &IdcClient) -> Result<ClusterReplicateResponse> {
    fetch_as(client, &Descriptor::post(Endpoint::ClusterReplicate), None)
        .await
        .map_err(|e| IdcError::wrap("Error replicating configuration", e))
}
