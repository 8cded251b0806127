//! Fallback algorithm used when no real algorithm is configured.

use indexmap::IndexMap;

use crate::core::common::{CloudResource, ConsolidationError, HostResource};
use crate::core::consolidation_algorithm::ConsolidationAlgorithm;
use crate::core::consolidation_algorithms::base::clone_hosts;

/// Identity pass-through. Ranks nothing, migrates nothing and never permits
/// shutdown, so a misconfigured cluster stays untouched.
#[derive(Clone, Default)]
pub struct Dummy;

impl Dummy {
    pub fn new() -> Self {
        Default::default()
    }
}

impl ConsolidationAlgorithm for Dummy {
    fn consolidation_interval(&self) -> u64 {
        u64::MAX
    }

    fn rank_hosts(
        &mut self,
        hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        clone_hosts(hosts)
    }

    fn map_vms_to_host(
        &mut self,
        _ranked_hosts: &[HostResource],
    ) -> Result<IndexMap<u32, HostResource>, ConsolidationError> {
        Ok(IndexMap::new())
    }

    fn rank_hosts_to_power_off(
        &mut self,
        idle_hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        clone_hosts(idle_hosts)
    }

    fn can_power_off_host(&self, _host: &HostResource, _cloud: &CloudResource) -> bool {
        false
    }

    fn can_power_off_another_host_in_cloud(&self, _cloud: &CloudResource) -> bool {
        false
    }

    fn can_heuristic_shutdown_hosts(&self) -> bool {
        false
    }
}
