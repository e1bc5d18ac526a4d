//! Scan-destination management with a local mirror of the remote listing.
//!
//! The cache is never an independent source of truth: a fresh `list` replaces
//! it wholesale, and mutations update it only after the remote call succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{OnceCell, RwLock};

use crate::auth::context::{AuthContext, EMPTY_BODY_MESSAGE};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    Mail,
    Url,
}

/// A registered scan target, as the remote service stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub alias_name: String,
    pub destination: String,
    #[serde(rename = "type")]
    pub kind: DestinationType,
}

#[derive(Debug, Deserialize)]
struct DestinationList {
    destinations: Vec<Destination>,
}

#[derive(Debug)]
pub struct Scanner {
    auth: Arc<AuthContext>,
    cache: RwLock<HashMap<String, Destination>>,
    bootstrap: OnceCell<()>,
}

impl Scanner {
    pub(crate) fn new(auth: Arc<AuthContext>) -> Self {
        Scanner {
            auth,
            cache: RwLock::new(HashMap::new()),
            bootstrap: OnceCell::new(),
        }
    }

    /// One-shot bootstrap listing. Every cache operation joins it before
    /// proceeding. A failed attempt leaves the cell empty: each waiter in
    /// turn re-attempts the listing and observes its own error, so nothing
    /// free-runs past a failed bootstrap.
    async fn ensure_ready(&self) -> Result<()> {
        self.bootstrap
            .get_or_try_init(|| async { self.fetch_destinations().await.map(|_| ()) })
            .await?;
        Ok(())
    }

    async fn destinations_path(&self) -> Result<String> {
        self.auth.ensure_authenticated().await?;
        Ok(format!(
            "/api/1/scanning/scanners/{}/destinations",
            self.auth.device_id().await
        ))
    }

    /// Lists scan destinations. With `use_cache` the current mirror is
    /// returned without a remote call (after the bootstrap listing has
    /// completed); otherwise a fresh listing replaces the whole cache.
    pub async fn list(&self, use_cache: bool) -> Result<Vec<Destination>> {
        if use_cache {
            self.ensure_ready().await?;
            let cache = self.cache.read().await;
            return Ok(cache.values().cloned().collect());
        }
        self.fetch_destinations().await
    }

    async fn fetch_destinations(&self) -> Result<Vec<Destination>> {
        let path = self.destinations_path().await?;
        let body = self.auth.send(Method::GET, &path, None).await?;
        let listing: DestinationList = serde_json::from_value(body)?;

        let mut cache = self.cache.write().await;
        cache.clear();
        for destination in &listing.destinations {
            cache.insert(destination.id.clone(), destination.clone());
        }
        // An explicit fresh list also satisfies the bootstrap.
        let _ = self.bootstrap.set(());

        Ok(listing.destinations)
    }

    /// Registers a new destination. The creation endpoint does not echo the
    /// record, so the fresh listing is searched by alias name afterwards.
    pub async fn add(
        &self,
        alias_name: &str,
        destination: &str,
        kind: DestinationType,
    ) -> Result<Destination> {
        self.ensure_ready().await?;
        validate_destination(alias_name, destination)?;

        let path = self.destinations_path().await?;
        let body = json!({
            "alias_name": alias_name,
            "destination": destination,
            "type": kind,
        });
        let response = self.auth.send(Method::POST, &path, Some(body)).await?;
        if !is_success_sentinel(&response) {
            return Err(Error::Scanner("failed to add scan destination".to_string()));
        }

        let listing = self.list(false).await?;
        let mut matches = listing.iter().filter(|d| d.alias_name == alias_name);
        let added = matches.next().cloned().ok_or_else(|| {
            Error::Scanner("newly added destination missing from listing".to_string())
        })?;
        if matches.next().is_some() {
            warn!("multiple scan destinations share alias {alias_name}, returning the first");
        }
        Ok(added)
    }

    /// Updates a destination the cache has already observed. Omitted fields
    /// fall back to the cached record. The cache entry is replaced with the
    /// submitted data once the remote call succeeds.
    pub async fn update(
        &self,
        id: &str,
        alias_name: Option<&str>,
        destination: Option<&str>,
        kind: Option<DestinationType>,
    ) -> Result<Destination> {
        self.ensure_ready().await?;

        let cached = { self.cache.read().await.get(id).cloned() }.ok_or_else(|| {
            Error::Scanner("scan destination is not yet registered".to_string())
        })?;

        let updated = Destination {
            id: id.to_string(),
            alias_name: alias_name.map(str::to_string).unwrap_or(cached.alias_name),
            destination: destination.map(str::to_string).unwrap_or(cached.destination),
            kind: kind.unwrap_or(cached.kind),
        };
        validate_destination(&updated.alias_name, &updated.destination)?;

        let path = self.destinations_path().await?;
        let response = self
            .auth
            .send(Method::PUT, &path, Some(serde_json::to_value(&updated)?))
            .await?;
        if !is_success_sentinel(&response) {
            return Err(Error::Scanner(
                "failed to update scan destination".to_string(),
            ));
        }

        self.cache
            .write()
            .await
            .insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    /// Deletes a destination remotely and drops it from the cache regardless
    /// of the response shape.
    pub async fn remove(&self, id: &str) -> Result<Value> {
        self.ensure_ready().await?;

        let path = self.destinations_path().await?;
        let response = self
            .auth
            .send(Method::DELETE, &path, Some(json!({ "id": id })))
            .await?;

        self.cache.write().await.remove(id);
        Ok(response)
    }
}

fn is_success_sentinel(response: &Value) -> bool {
    response.get("message").and_then(Value::as_str) == Some(EMPTY_BODY_MESSAGE)
}

fn validate_destination(alias_name: &str, destination: &str) -> Result<()> {
    let alias_len = alias_name.chars().count();
    if !(1..=32).contains(&alias_len) {
        return Err(Error::Scanner(format!(
            "invalid scan destination alias length {alias_len}, must be 1-32 characters"
        )));
    }
    let destination_len = destination.chars().count();
    if !(4..=544).contains(&destination_len) {
        return Err(Error::Scanner(format!(
            "invalid scan destination length {destination_len}, must be 4-544 characters"
        )));
    }
    Ok(())
}
