//! Cluster introspection built on the raw client commands.

use tracing::{debug, instrument};

use super::types::{ClusterInfo, ParsedClusterNodes};
use super::valkey_client::{ValkeyClient, ValkeyError};

/// Everything the `topology` command prints, fetched in one go.
#[derive(Debug, Clone)]
pub struct ClusterOverview {
    /// Cluster info from CLUSTER INFO command.
    pub info: ClusterInfo,
    /// Parsed cluster nodes from CLUSTER NODES command.
    pub nodes: ParsedClusterNodes,
}

impl ClusterOverview {
    /// Short health line, listing every problem found.
    pub fn health_status_message(&self) -> String {
        let mut issues = Vec::new();

        if !self.info.is_healthy() {
            issues.push(format!(
                "cluster_state is '{}' ({} slots fail, {} pfail)",
                self.info.state, self.info.slots_fail, self.info.slots_pfail
            ));
        }

        if !self.info.all_slots_assigned() {
            issues.push(format!(
                "not all slots assigned ({}/16384)",
                self.info.slots_assigned
            ));
        }

        let failed = self
            .nodes
            .nodes
            .iter()
            .filter(|n| !n.is_healthy())
            .count();
        if failed > 0 {
            issues.push(format!("{} node(s) failing or disconnected", failed));
        }

        if issues.is_empty() {
            "Cluster is healthy".to_string()
        } else {
            format!("Cluster health issues: {}", issues.join(", "))
        }
    }
}

impl ValkeyClient {
    /// Get parsed cluster info.
    #[instrument(skip(self))]
    pub async fn cluster_info(&self) -> Result<ClusterInfo, ValkeyError> {
        let raw = self.cluster_info_raw().await?;
        let info = ClusterInfo::parse(&raw)?;
        Ok(info)
    }

    /// Fetch CLUSTER INFO and CLUSTER NODES.
    #[instrument(skip(self))]
    pub async fn cluster_overview(&self) -> Result<ClusterOverview, ValkeyError> {
        let info = self.cluster_info().await?;
        let raw = self.cluster_nodes_raw().await?;
        let nodes = ParsedClusterNodes::parse(&raw)?;
        debug!(
            state = %info.state,
            known_nodes = info.known_nodes,
            masters = nodes.masters().len(),
            "Fetched cluster overview"
        );
        Ok(ClusterOverview { info, nodes })
    }
}
