//! Small-host-preference consolidation algorithm.

use indexmap::IndexMap;

use crate::core::common::{CloudResource, ConsolidationError, HostResource};
use crate::core::consolidation_algorithm::ConsolidationAlgorithm;
use crate::core::consolidation_algorithms::base;

/// Ranks hosts upward by their profile product score, so small hosts land at
/// the end of the list and get drained into the remaining hosts for shutdown.
#[derive(Clone)]
pub struct SmallHostPreference {
    interval: u64,
}

impl SmallHostPreference {
    pub fn new() -> Self {
        Self {
            interval: base::DEFAULT_CONSOLIDATION_INTERVAL,
        }
    }

    pub fn from_str(options_str: &str) -> Self {
        Self {
            interval: base::interval_from_options(options_str),
        }
    }
}

impl ConsolidationAlgorithm for SmallHostPreference {
    fn consolidation_interval(&self) -> u64 {
        self.interval
    }

    fn rank_hosts(
        &mut self,
        hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        let mut hosts = base::clone_hosts(hosts)?;
        base::score_by_profile(&mut hosts);
        hosts.sort_by(|a, b| base::compare_scores(a.score, b.score));
        Ok(hosts)
    }

    fn map_vms_to_host(
        &mut self,
        ranked_hosts: &[HostResource],
    ) -> Result<IndexMap<u32, HostResource>, ConsolidationError> {
        base::map_vms_greedy(ranked_hosts, 1)
    }

    fn rank_hosts_to_power_off(
        &mut self,
        idle_hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        let mut idle = base::clone_hosts(idle_hosts)?;
        base::score_by_profile(&mut idle);
        idle.sort_by(|a, b| base::compare_scores(b.score, a.score));
        Ok(idle)
    }

    fn can_power_off_host(&self, host: &HostResource, cloud: &CloudResource) -> bool {
        base::can_power_off_host(host, cloud)
    }

    fn can_power_off_another_host_in_cloud(&self, cloud: &CloudResource) -> bool {
        base::can_power_off_another_host(cloud)
    }

    fn can_heuristic_shutdown_hosts(&self) -> bool {
        true
    }
}
