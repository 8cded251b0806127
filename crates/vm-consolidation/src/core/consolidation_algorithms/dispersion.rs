//! Statistics-driven load-balancing algorithm.

use indexmap::IndexMap;
use log::debug;

use crate::core::common::{
    CloudResource, ConsolidationError, HostResource, MigrationVerdict,
};
use crate::core::consolidation_algorithm::ConsolidationAlgorithm;
use crate::core::consolidation_algorithms::base::{
    clone_hosts, compare_scores, DEFAULT_CONSOLIDATION_INTERVAL,
};
use crate::core::stats;

/// Outcome of a single what-if simulation.
struct DispersalPlan {
    label: &'static str,
    deviation: f64,
    hosts: Vec<HostResource>,
    placements: IndexMap<u32, usize>,
}

/// Spreads VMs across hosts to balance memory load. Never powers off hosts.
///
/// `rank_hosts` records the cluster mean memory usage and two population
/// spreads (standard deviation of VM memory sizes and of per-host used
/// memory); `map_vms_to_host` then simulates re-balancing with each spread
/// plus their average on separate clones of the ranked list and commits to
/// the plan with the lowest resulting standard deviation of host usage.
#[derive(Clone)]
pub struct Dispersion {
    mean_usage: f64,
    vm_spread: f64,
    host_spread: f64,
}

impl Dispersion {
    pub fn new() -> Self {
        Self {
            mean_usage: 0.,
            vm_spread: 0.,
            host_spread: 0.,
        }
    }

    /// Re-balances a clone of the ranked list with the specified spread.
    ///
    /// Hosts are scanned from the end of the list toward the front; every
    /// host above `mean - spread` tries to off-load its VMs onto hosts at or
    /// below the mean, as long as the source stays at or above `mean - spread`,
    /// the target stays below `mean + spread` and the capacity-fit test holds.
    /// Moves take effect immediately, so later iterations of the same
    /// simulation observe them and may move a VM again.
    fn simulate(
        &self,
        ranked_hosts: &[HostResource],
        spread: f64,
        label: &'static str,
    ) -> DispersalPlan {
        let mut hosts = ranked_hosts.to_vec();
        let min_load = self.mean_usage - spread;
        let max_load = self.mean_usage + spread;
        let mut placements: IndexMap<u32, usize> = IndexMap::new();
        for source in (0..hosts.len()).rev() {
            if hosts[source].used_memory as f64 <= min_load {
                continue;
            }
            let vms = hosts[source].vms.clone();
            for vm in vms {
                if hosts[source].used_memory as f64 - (vm.memory as f64) < min_load {
                    continue;
                }
                let target = (0..hosts.len()).find(|&target| {
                    target != source
                        && hosts[target].used_memory as f64 <= self.mean_usage
                        && ((hosts[target].used_memory + vm.memory) as f64) < max_load
                        && hosts[target].can_migrate(&vm) == MigrationVerdict::Success
                });
                if let Some(target) = target {
                    if let Some(moved) = hosts[source].release(vm.id) {
                        placements.insert(moved.id, target);
                        hosts[target].allocate(moved);
                    }
                }
            }
        }
        let usages: Vec<f64> = hosts.iter().map(|host| host.used_memory as f64).collect();
        DispersalPlan {
            label,
            deviation: stats::population_std_dev(&usages),
            hosts,
            placements,
        }
    }
}

impl ConsolidationAlgorithm for Dispersion {
    fn consolidation_interval(&self) -> u64 {
        DEFAULT_CONSOLIDATION_INTERVAL
    }

    fn rank_hosts(
        &mut self,
        hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        let mut hosts = clone_hosts(hosts)?;
        let usages: Vec<f64> = hosts.iter().map(|host| host.used_memory as f64).collect();
        self.mean_usage = stats::mean(&usages);
        self.host_spread = stats::population_std_dev(&usages);
        let vm_sizes: Vec<f64> = hosts
            .iter()
            .flat_map(|host| host.vms.iter().map(|vm| vm.memory as f64))
            .collect();
        self.vm_spread = stats::population_std_dev(&vm_sizes);
        for host in &mut hosts {
            host.score = if host.used_memory == 0 {
                f64::INFINITY
            } else {
                host.total_memory_mb() as f64 / host.used_memory as f64
            };
        }
        hosts.sort_by(|a, b| compare_scores(b.score, a.score));
        Ok(hosts)
    }

    fn map_vms_to_host(
        &mut self,
        ranked_hosts: &[HostResource],
    ) -> Result<IndexMap<u32, HostResource>, ConsolidationError> {
        let hosts = clone_hosts(ranked_hosts)?;
        // zero spread of host usage means the cluster is already balanced
        if hosts.is_empty() || self.host_spread == 0. {
            return Ok(IndexMap::new());
        }
        let average_spread = (self.vm_spread + self.host_spread) / 2.;
        // ties resolve in favor of the average spread, then the host spread
        let mut best = self.simulate(&hosts, average_spread, "average");
        let host_plan = self.simulate(&hosts, self.host_spread, "host");
        if host_plan.deviation < best.deviation {
            best = host_plan;
        }
        let vm_plan = self.simulate(&hosts, self.vm_spread, "vm");
        if vm_plan.deviation < best.deviation {
            best = vm_plan;
        }
        debug!(
            "dispersing by {} spread: {} migrations, resulting deviation {}",
            best.label,
            best.placements.len(),
            best.deviation
        );
        let DispersalPlan {
            hosts, placements, ..
        } = best;
        Ok(placements
            .into_iter()
            .map(|(vm_id, target)| (vm_id, hosts[target].clone()))
            .collect())
    }

    fn rank_hosts_to_power_off(
        &mut self,
        _idle_hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        Ok(Vec::new())
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
