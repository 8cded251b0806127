//! Big-host-preference variant aware of Xen HA fencing requirements.

use indexmap::IndexMap;

use crate::core::common::{CloudResource, ConsolidationError, HostResource};
use crate::core::consolidation_algorithm::ConsolidationAlgorithm;
use crate::core::consolidation_algorithms::base;
use crate::core::consolidation_algorithms::dispersion::Dispersion;

/// Minimum number of running hosts required by Xen HA fencing.
pub const XEN_HA_HOST_FLOOR: usize = 3;

/// Big-host preference that guarantees at least [XEN_HA_HOST_FLOOR] hosts
/// stay running. On clusters at or below the floor it stops consolidating and
/// delegates entirely to [Dispersion], since draining any further host would
/// break HA fencing.
///
/// The cluster size observed by `rank_hosts` gates the power-off answers of
/// the same instance, per the one-instance-per-cycle discipline.
#[derive(Clone)]
pub struct XenHaBigHostPreference {
    interval: u64,
    cluster_size: usize,
    dispersion: Dispersion,
}

impl XenHaBigHostPreference {
    pub fn new() -> Self {
        Self {
            interval: base::DEFAULT_CONSOLIDATION_INTERVAL,
            cluster_size: 0,
            dispersion: Dispersion::new(),
        }
    }

    pub fn from_str(options_str: &str) -> Self {
        Self {
            interval: base::interval_from_options(options_str),
            cluster_size: 0,
            dispersion: Dispersion::new(),
        }
    }

    fn delegating(&self) -> bool {
        self.cluster_size != 0 && self.cluster_size <= XEN_HA_HOST_FLOOR
    }
}

impl ConsolidationAlgorithm for XenHaBigHostPreference {
    fn consolidation_interval(&self) -> u64 {
        self.interval
    }

    fn rank_hosts(
        &mut self,
        hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        self.cluster_size = hosts.len();
        if self.delegating() {
            return self.dispersion.rank_hosts(hosts);
        }
        let mut hosts = base::clone_hosts(hosts)?;
        base::score_by_profile(&mut hosts);
        hosts.sort_by(|a, b| base::compare_scores(b.score, a.score));
        Ok(hosts)
    }

    fn map_vms_to_host(
        &mut self,
        ranked_hosts: &[HostResource],
    ) -> Result<IndexMap<u32, HostResource>, ConsolidationError> {
        if self.delegating() {
            return self.dispersion.map_vms_to_host(ranked_hosts);
        }
        base::map_vms_greedy(ranked_hosts, XEN_HA_HOST_FLOOR)
    }

    fn rank_hosts_to_power_off(
        &mut self,
        idle_hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        if self.cluster_size <= XEN_HA_HOST_FLOOR {
            return Ok(Vec::new());
        }
        let mut idle = base::clone_hosts(idle_hosts)?;
        base::score_by_profile(&mut idle);
        idle.sort_by(|a, b| base::compare_scores(b.score, a.score));
        // never propose more shutdowns than the floor allows
        idle.truncate(self.cluster_size - XEN_HA_HOST_FLOOR);
        Ok(idle)
    }

    fn can_power_off_host(&self, host: &HostResource, cloud: &CloudResource) -> bool {
        if self.delegating() {
            return false;
        }
        base::can_power_off_host(host, cloud)
    }

    fn can_power_off_another_host_in_cloud(&self, cloud: &CloudResource) -> bool {
        if self.delegating() {
            return false;
        }
        base::can_power_off_another_host(cloud)
    }

    fn can_heuristic_shutdown_hosts(&self) -> bool {
        !self.delegating()
    }
}
