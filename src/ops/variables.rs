//! Environment variables (ESV)
//!
//! Read, write, export and import environment variables. Values travel
//! base64-encoded (`valueBase64`); exports can carry the decoded plaintext in
//! `value` as well.

use crate::idc::client::IdcClient;
use crate::idc::error::{IdcError, Result};
use crate::resource::batch::{run_bounded, run_sequential};
use crate::resource::{
    fetch_all_pages, fetch_as, fetch_optional, to_body, Descriptor, Endpoint, ExportMeta,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// How the platform interprets a variable's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionType {
    Array,
    Base64EncodedInlined,
    Bool,
    Int,
    List,
    Number,
    Object,
    #[default]
    String,
}

impl ExpressionType {
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(Value::String(s.to_lowercase())).ok()
    }
}

/// One environment variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSkeleton {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_base64: Option<String>,
    /// Decoded plaintext, only present in exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub expression_type: ExpressionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Export envelope for variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariablesExport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ExportMeta>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSkeleton>,
}

impl VariablesExport {
    /// Empty envelope stamped with export metadata
    pub fn new(client: &IdcClient) -> Self {
        Self {
            meta: Some(ExportMeta::new(client.session())),
            variables: BTreeMap::new(),
        }
    }
}

/// Write payload for `PUT /environment/variables/{id}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VariableWrite<'a> {
    value_base64: String,
    expression_type: ExpressionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> VariableWrite<'a> {
    fn new(value_base64: String, description: Option<&'a str>, expression_type: ExpressionType) -> Self {
        Self {
            value_base64,
            expression_type,
            description: description.filter(|d| !d.is_empty()),
        }
    }
}

pub fn encode_value(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

pub fn decode_value(value_base64: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(value_base64.trim())
        .map_err(|e| IdcError::usage("Invalid base64 value").with_source(e))?;
    String::from_utf8(bytes).map_err(|e| IdcError::usage("Decoded value is not UTF-8").with_source(e))
}

/// Fill `value` from `valueBase64`
fn decode_in_place(variable: &mut VariableSkeleton) -> Result<()> {
    if let Some(encoded) = &variable.value_base64 {
        variable.value = Some(decode_value(encoded)?);
    }
    Ok(())
}

async fn get_variable(client: &IdcClient, variable_id: &str) -> Result<VariableSkeleton> {
    fetch_optional(client, &Descriptor::get(Endpoint::Variable { id: variable_id }))
        .await?
        .ok_or_else(|| IdcError::not_found(format!("Variable {} not found", variable_id)))
}

async fn put_variable(
    client: &IdcClient,
    variable_id: &str,
    write: &VariableWrite<'_>,
) -> Result<VariableSkeleton> {
    let body = to_body(write)?;
    fetch_as(
        client,
        &Descriptor::put(Endpoint::Variable { id: variable_id }),
        Some(&body),
    )
    .await
}

/// Read a variable by id
pub async fn read_variable(client: &IdcClient, variable_id: &str) -> Result<VariableSkeleton> {
    get_variable(client, variable_id)
        .await
        .map_err(|e| IdcError::wrap(format!("Error reading variable {}", variable_id), e))
}

/// Read every variable, following continuation cookies
pub async fn read_variables(client: &IdcClient) -> Result<Vec<VariableSkeleton>> {
    fetch_all_pages(client, &Descriptor::get(Endpoint::Variables), None)
        .await
        .map_err(|e| IdcError::wrap("Error reading variables", e))
}

/// Export one variable, decoding its value unless `no_decode`
pub async fn export_variable(
    client: &IdcClient,
    variable_id: &str,
    no_decode: bool,
) -> Result<VariablesExport> {
    tracing::debug!("variables::export_variable: start");
    let result = async {
        let mut export = VariablesExport::new(client);
        let mut variable = get_variable(client, variable_id).await?;
        if !no_decode {
            decode_in_place(&mut variable)?;
        }
        export.variables.insert(variable.id.clone(), variable);
        Ok(export)
    }
    .await
    .map_err(|e| IdcError::wrap(format!("Error exporting variable {}", variable_id), e));
    tracing::debug!("variables::export_variable: end");
    result
}

/// Export every variable, decoding values unless `no_decode`
pub async fn export_variables(client: &IdcClient, no_decode: bool) -> Result<VariablesExport> {
    tracing::debug!("variables::export_variables: start");
    let result = async {
        let mut export = VariablesExport::new(client);
        let variables = read_variables(client).await?;

        let progress = client.progress();
        let indicator = progress.create(variables.len(), "Exporting variables...");
        let total = variables.len();
        for mut variable in variables {
            progress.update(indicator, &format!("Exporting variable {}", variable.id));
            if !no_decode {
                decode_in_place(&mut variable).map_err(|e| {
                    IdcError::wrap(format!("Error decoding variable {}", variable.id), e)
                })?;
            }
            export.variables.insert(variable.id.clone(), variable);
        }
        progress.stop(indicator, &format!("Exported {} variables.", total));
        Ok(export)
    }
    .await
    .map_err(|e| IdcError::wrap("Error exporting variables", e));
    tracing::debug!("variables::export_variables: end");
    result
}

/// Update-or-create one import entry; `_rev` is dropped, `valueBase64` sent as is
async fn import_entry(
    client: &IdcClient,
    key: String,
    mut variable: VariableSkeleton,
) -> Result<VariableSkeleton> {
    variable.rev = None;
    let id = if variable.id.is_empty() { key } else { variable.id.clone() };
    let value_base64 = match (&variable.value_base64, &variable.value) {
        (Some(encoded), _) => encoded.clone(),
        (None, Some(plain)) => encode_value(plain),
        (None, None) => {
            return Err(IdcError::usage(format!("Variable {} has no value", id)));
        }
    };
    let write = VariableWrite::new(
        value_base64,
        variable.description.as_deref(),
        variable.expression_type,
    );
    put_variable(client, &id, &write)
        .await
        .map_err(|e| IdcError::wrap(format!("Error updating variable {}", id), e))
}

/// Import a single variable from an export envelope
pub async fn import_variable(
    client: &IdcClient,
    variable_id: &str,
    import_data: &VariablesExport,
) -> Result<VariableSkeleton> {
    let items: Vec<(String, VariableSkeleton)> = import_data
        .variables
        .iter()
        .filter(|(id, _)| id.as_str() == variable_id)
        .map(|(id, variable)| (id.clone(), variable.clone()))
        .collect();

    let outcome = run_sequential(client.progress(), "variables", items, |key, variable| {
        import_entry(client, key, variable)
    })
    .await;

    let mut imported = outcome.into_result(format!("Error importing variable {}", variable_id))?;
    imported.pop().ok_or_else(|| {
        IdcError::target_not_found(format!("Variable {} not found in import data", variable_id))
    })
}

/// Import every variable of an export envelope, one at a time
pub async fn import_variables(
    client: &IdcClient,
    import_data: &VariablesExport,
) -> Result<Vec<VariableSkeleton>> {
    let items = import_data
        .variables
        .iter()
        .map(|(id, variable)| (id.clone(), variable.clone()))
        .collect();

    run_sequential(client.progress(), "variables", items, |key, variable| {
        import_entry(client, key, variable)
    })
    .await
    .into_result("Error importing variables")
}

/// Import every variable with up to `limit` writes in flight
pub async fn import_variables_concurrent(
    client: &IdcClient,
    import_data: &VariablesExport,
    limit: usize,
) -> Result<Vec<VariableSkeleton>> {
    let items = import_data
        .variables
        .iter()
        .map(|(id, variable)| (id.clone(), variable.clone()))
        .collect();

    run_bounded(client.progress(), "variables", items, limit, |key, variable| {
        import_entry(client, key, variable)
    })
    .await
    .into_result("Error importing variables")
}

/// Create a variable; fails with a conflict if it already exists
pub async fn create_variable(
    client: &IdcClient,
    variable_id: &str,
    value: &str,
    description: Option<&str>,
    expression_type: ExpressionType,
) -> Result<VariableSkeleton> {
    tracing::debug!("variables::create_variable: start");
    let label = format!("Error creating variable {}", variable_id);
    match get_variable(client, variable_id).await {
        Ok(_) => {
            return Err(IdcError::conflict(format!(
                "Variable {} already exists",
                variable_id
            )))
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(IdcError::wrap(label, e)),
    }

    let write = VariableWrite::new(encode_value(value), description, expression_type);
    let created = put_variable(client, variable_id, &write)
        .await
        .map_err(|e| IdcError::wrap(label, e))?;
    tracing::debug!("variables::create_variable: end");
    Ok(created)
}

/// Create or replace a variable
pub async fn update_variable(
    client: &IdcClient,
    variable_id: &str,
    value: &str,
    description: Option<&str>,
    expression_type: ExpressionType,
) -> Result<VariableSkeleton> {
    let write = VariableWrite::new(encode_value(value), description, expression_type);
    put_variable(client, variable_id, &write)
        .await
        .map_err(|e| IdcError::wrap(format!("Error updating variable {}", variable_id), e))
}

/// Change only the description of a variable
pub async fn update_variable_description(
    client: &IdcClient,
    variable_id: &str,
    description: &str,
) -> Result<Value> {
    let body = json!({ "description": description });
    crate::resource::fetch(
        client,
        &Descriptor::post(Endpoint::VariableDescription { id: variable_id }),
        Some(&body),
    )
    .await
    .map_err(|e| {
        IdcError::wrap(
            format!("Error updating description of variable {}", variable_id),
            e,
        )
    })
}

/// Delete a variable
pub async fn delete_variable(client: &IdcClient, variable_id: &str) -> Result<VariableSkeleton> {
    fetch_as(
        client,
        &Descriptor::delete(Endpoint::Variable { id: variable_id }),
        None,
    )
    .await
    .map_err(|e| IdcError::wrap(format!("Error deleting variable {}", variable_id), e))
}
