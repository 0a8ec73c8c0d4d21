//! Social identity providers
//!
//! Providers live in the realm configuration, addressed by provider type
//! (e.g. `googleConfig`) and id. Every write goes through
//! [`prepare_provider_write`], which fills `redirectAfterFormPostURI` and
//! strips attributes that can only be written encrypted.

use crate::idc::client::IdcClient;
use crate::idc::error::{IdcError, Result};
use crate::resource::batch::run_sequential;
use crate::resource::json::{default_to_empty_string, delete_deep_by_key_suffix, ENCRYPTED_SUFFIX};
use crate::resource::{
    fetch_all_pages, fetch_as, fetch_optional, to_body, Descriptor, Endpoint, EntityType,
    ExportMeta, PagedResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Attribute that must always be present on provider writes
pub const REDIRECT_AFTER_FORM_POST_URI: &str = "redirectAfterFormPostURI";

/// One social identity provider configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialIdpSkeleton {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SocialIdpSkeleton {
    /// Provider type from `_type._id`
    pub fn provider_type(&self) -> Option<&str> {
        self.entity_type.as_ref().map(|t| t.id.as_str())
    }
}

/// Export envelope for social identity providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialIdpExport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ExportMeta>,
    #[serde(default)]
    pub idp: BTreeMap<String, SocialIdpSkeleton>,
}

impl SocialIdpExport {
    pub fn new(client: &IdcClient) -> Self {
        Self {
            meta: Some(ExportMeta::new(client.session())),
            idp: BTreeMap::new(),
        }
    }
}

/// Normalize a provider payload before it is written
pub fn prepare_provider_write(provider: &SocialIdpSkeleton) -> Result<Value> {
    let mut body = to_body(provider)?;
    default_to_empty_string(&mut body, REDIRECT_AFTER_FORM_POST_URI);
    delete_deep_by_key_suffix(&mut body, ENCRYPTED_SUFFIX);
    Ok(body)
}

async fn get_provider(
    client: &IdcClient,
    provider_type: &str,
    provider_id: &str,
) -> Result<SocialIdpSkeleton> {
    fetch_optional(
        client,
        &Descriptor::get(Endpoint::SocialProvider {
            provider_type,
            id: provider_id,
        }),
    )
    .await?
    .ok_or_else(|| {
        IdcError::not_found(format!(
            "Social identity provider {} of type {} not found",
            provider_id, provider_type
        ))
    })
}

async fn put_provider(
    client: &IdcClient,
    provider_type: &str,
    provider_id: &str,
    provider: &SocialIdpSkeleton,
) -> Result<SocialIdpSkeleton> {
    let body = prepare_provider_write(provider)?;
    fetch_as(
        client,
        &Descriptor::put(Endpoint::SocialProvider {
            provider_type,
            id: provider_id,
        }),
        Some(&body),
    )
    .await
}

/// All provider types the realm supports
pub async fn read_provider_types(client: &IdcClient) -> Result<Vec<EntityType>> {
    let page: PagedResult<EntityType> = fetch_as(
        client,
        &Descriptor::get(Endpoint::SocialProviderTypes),
        None,
    )
    .await
    .map_err(|e| IdcError::wrap("Error reading social identity provider types", e))?;
    Ok(page.result)
}

pub async fn read_providers_by_type(
    client: &IdcClient,
    provider_type: &str,
) -> Result<Vec<SocialIdpSkeleton>> {
    fetch_all_pages(
        client,
        &Descriptor::get(Endpoint::SocialProvidersByType { provider_type }),
        None,
    )
    .await
    .map_err(|e| {
        IdcError::wrap(
            format!(
                "Error reading social identity providers of type {}",
                provider_type
            ),
            e,
        )
    })
}

/// Every provider of every type, following continuation cookies
pub async fn read_providers(client: &IdcClient) -> Result<Vec<SocialIdpSkeleton>> {
    tracing::debug!("social_idp::read_providers: start");
    let providers = fetch_all_pages(
        client,
        &Descriptor::post(Endpoint::SocialProviderDescendants),
        Some(&json!({})),
    )
    .await
    .map_err(|e| IdcError::wrap("Error reading social identity providers", e))?;
    tracing::debug!("social_idp::read_providers: end");
    Ok(providers)
}

pub async fn read_provider(
    client: &IdcClient,
    provider_type: &str,
    provider_id: &str,
) -> Result<SocialIdpSkeleton> {
    get_provider(client, provider_type, provider_id)
        .await
        .map_err(|e| {
            IdcError::wrap(
                format!("Error reading social identity provider {}", provider_id),
                e,
            )
        })
}

/// Locate a provider by id without knowing its type
pub async fn find_provider(client: &IdcClient, provider_id: &str) -> Result<SocialIdpSkeleton> {
    read_providers(client)
        .await?
        .into_iter()
        .find(|provider| provider.id == provider_id)
        .ok_or_else(|| {
            IdcError::not_found(format!(
                "Social identity provider {} not found",
                provider_id
            ))
        })
}

/// Replace a provider's configuration, creating it if missing
pub async fn update_provider(
    client: &IdcClient,
    provider_type: &str,
    provider_id: &str,
    provider: &SocialIdpSkeleton,
) -> Result<SocialIdpSkeleton> {
    tracing::debug!("social_idp::update_provider: start");
    let updated = put_provider(client, provider_type, provider_id, provider)
        .await
        .map_err(|e| {
            IdcError::wrap(
                format!("Error updating social identity provider {}", provider_id),
                e,
            )
        })?;
    tracing::debug!("social_idp::update_provider: end");
    Ok(updated)
}

/// Create a provider; fails with a conflict if it already exists
pub async fn create_provider(
    client: &IdcClient,
    provider_type: &str,
    provider_id: &str,
    provider: &SocialIdpSkeleton,
) -> Result<SocialIdpSkeleton> {
    let label = format!("Error creating social identity provider {}", provider_id);
    match get_provider(client, provider_type, provider_id).await {
        Ok(_) => {
            return Err(IdcError::conflict(format!(
                "Social identity provider {} already exists",
                provider_id
            )))
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(IdcError::wrap(label, e)),
    }

    put_provider(client, provider_type, provider_id, provider)
        .await
        .map_err(|e| IdcError::wrap(label, e))
}

pub async fn delete_provider(
    client: &IdcClient,
    provider_type: &str,
    provider_id: &str,
) -> Result<SocialIdpSkeleton> {
    fetch_as(
        client,
        &Descriptor::delete(Endpoint::SocialProvider {
            provider_type,
            id: provider_id,
        }),
        None,
    )
    .await
    .map_err(|e| {
        IdcError::wrap(
            format!("Error deleting social identity provider {}", provider_id),
            e,
        )
    })
}

pub async fn export_provider(client: &IdcClient, provider_id: &str) -> Result<SocialIdpExport> {
    let mut export = SocialIdpExport::new(client);
    let provider = find_provider(client, provider_id).await.map_err(|e| {
        IdcError::wrap(
            format!("Error exporting social identity provider {}", provider_id),
            e,
        )
    })?;
    export.idp.insert(provider.id.clone(), provider);
    Ok(export)
}

pub async fn export_providers(client: &IdcClient) -> Result<SocialIdpExport> {
    tracing::debug!("social_idp::export_providers: start");
    let mut export = SocialIdpExport::new(client);
    let providers = read_providers(client)
        .await
        .map_err(|e| IdcError::wrap("Error exporting social identity providers", e))?;

    let progress = client.progress();
    let total = providers.len();
    let indicator = progress.create(total, "Exporting providers...");
    for provider in providers {
        progress.update(indicator, &format!("Exporting provider {}", provider.id));
        export.idp.insert(provider.id.clone(), provider);
    }
    progress.stop(indicator, &format!("Exported {} providers.", total));
    tracing::debug!("social_idp::export_providers: end");
    Ok(export)
}

/// Update-or-create one import entry; the type comes from `_type._id`
async fn import_entry(
    client: &IdcClient,
    key: String,
    mut provider: SocialIdpSkeleton,
) -> Result<SocialIdpSkeleton> {
    provider.rev = None;
    let id = if provider.id.is_empty() { key } else { provider.id.clone() };
    let provider_type = provider
        .provider_type()
        .map(str::to_string)
        .ok_or_else(|| {
            IdcError::usage(format!(
                "Social identity provider {} has no type (_type._id)",
                id
            ))
        })?;
    update_provider(client, &provider_type, &id, &provider).await
}

fn import_items(
    import_data: &SocialIdpExport,
    filter: Option<&str>,
) -> Vec<(String, SocialIdpSkeleton)> {
    import_data
        .idp
        .iter()
        .filter(|(id, _)| filter.map_or(true, |wanted| id.as_str() == wanted))
        .map(|(id, provider)| (id.clone(), provider.clone()))
        .collect()
}

/// Import a single provider from an export envelope
pub async fn import_provider(
    client: &IdcClient,
    provider_id: &str,
    import_data: &SocialIdpExport,
) -> Result<SocialIdpSkeleton> {
    let items = import_items(import_data, Some(provider_id));
    let outcome = run_sequential(client.progress(), "providers", items, |key, provider| {
        import_entry(client, key, provider)
    })
    .await;

    let mut imported = outcome.into_result(format!(
        "Error importing social identity provider {}",
        provider_id
    ))?;
    imported.pop().ok_or_else(|| {
        IdcError::target_not_found(format!(
            "Social identity provider {} not found in import data",
            provider_id
        ))
    })
}

/// Import every provider of an export envelope
pub async fn import_providers(
    client: &IdcClient,
    import_data: &SocialIdpExport,
) -> Result<Vec<SocialIdpSkeleton>> {
    let items = import_items(import_data, None);
    run_sequential(client.progress(), "providers", items, |key, provider| {
        import_entry(client, key, provider)
    })
    .await
    .into_result("Error importing social identity providers")
}
