//! Profile sync.
//!
//! Reads the signed-in account's profile NFT through the service-signed
//! profile contract and flattens it into a [`ProfileView`]: the raw record,
//! the keys of its JSON `metadata.extra` field, and `profileImg` taken from
//! `metadata.media`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::{ClientError, ClientResult};
use crate::manifest::ContractKind;
use crate::store::SessionStore;

pub const PROFILE_IMAGE_KEY: &str = "profileImg";

/// Derived view of an on-chain profile. Recomputed on every sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileView(Map<String, Value>);

impl ProfileView {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn profile_img(&self) -> Option<&str> {
        self.0.get(PROFILE_IMAGE_KEY).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Build the view from a `profile_by_id` record.
///
/// A malformed `extra` field is dropped with a warning; the rest of the record
/// is still used.
pub fn build_profile_view(user_info: Value) -> ClientResult<ProfileView> {
    let Value::Object(mut fields) = user_info else {
        return Err(ClientError::InvalidResponse(
            "profile_by_id did not return an object".to_string(),
        ));
    };

    let metadata = fields.get("metadata").cloned().unwrap_or(Value::Null);

    if let Some(raw) = metadata.get("extra").and_then(non_empty_str) {
        match parse_extra(raw) {
            Ok(extra) => fields.extend(extra),
            Err(err) => log::warn!("{}; ignoring extra profile fields", err),
        }
    }

    let image = metadata
        .get("media")
        .and_then(non_empty_str)
        .map(|media| Value::String(media.to_string()))
        .unwrap_or(Value::Null);
    fields.insert(PROFILE_IMAGE_KEY.to_string(), image);

    Ok(ProfileView(fields))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn parse_extra(raw: &str) -> ClientResult<Map<String, Value>> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(extra)) => Ok(extra),
        Ok(other) => Err(ClientError::MalformedMetadata(format!(
            "extra is JSON but not an object: {}",
            other
        ))),
        Err(err) => Err(ClientError::MalformedMetadata(err.to_string())),
    }
}

/// Refresh the profile view for the session's account.
///
/// Returns `Ok(None)` without touching the store when there is no account or
/// no service-signed profile handle, or when the account has not registered.
pub async fn sync(store: &dyn SessionStore) -> ClientResult<Option<ProfileView>> {
    let (Some(account_id), Some(profile)) = (
        store.account_id(),
        store.contract(ContractKind::ProfileService),
    ) else {
        log::debug!("Skipping profile sync: no account or profile contract");
        return Ok(None);
    };

    let registered: bool = profile
        .view("has_registered", &json!({ "user_id": account_id }))
        .await?;
    if !registered {
        log::info!("{} has not minted a profile yet", account_id);
        return Ok(None);
    }

    let user_info: Value = profile
        .view(
            "profile_by_id",
            &json!({ "user_id": account_id, "user_to_find_id": account_id }),
        )
        .await?;
    let view = build_profile_view(user_info)?;
    store.set_profile(Some(view.clone()));
    log::info!("Profile synced for {}", account_id);
    Ok(Some(view))
}
