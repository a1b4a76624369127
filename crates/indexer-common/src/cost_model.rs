// SPDX-License-Identifier: Apache-2.0
//! `CostModel` — append-only per-deployment cost-model history.

use crate::{DeploymentId, NetworkIdentifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel deployment id supplying cost-model defaults.
pub const GLOBAL_COST_MODEL_DEPLOYMENT: &str = "global";

/// One entry in a deployment's append-only cost-model history. The row
/// with the greatest `id` for a given `deployment` is the active version
/// (`spec.md` §3, §4.2, §8 invariant on `MAX(id)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostModel {
    /// Monotonic history id, assigned by the store on insert.
    pub id: Option<i64>,
    /// Deployment this cost model prices, or [`GLOBAL_COST_MODEL_DEPLOYMENT`].
    pub deployment: DeploymentId,
    /// Network the deployment lives on.
    pub protocol_network: NetworkIdentifier,
    /// The Agora cost-model source text (compiled externally; out of
    /// scope per `spec.md` §1).
    pub model: String,
    /// Variables referenced by `model`, as a JSON object.
    pub variables: Option<serde_json::Value>,
    /// Insert timestamp, computed at write time.
    pub created_at: Option<DateTime<Utc>>,
}

impl CostModel {
    /// `true` when this is the network-wide default cost model.
    pub fn is_global(&self) -> bool {
        self.deployment.0 == GLOBAL_COST_MODEL_DEPLOYMENT
    }
}
