//! Shared mechanics of the consolidation algorithm family.

use std::cmp::Ordering;

use indexmap::IndexMap;
use log::debug;

use crate::core::common::{
    CloudResource, ConsolidationError, HostResource, MigrationVerdict,
};
use crate::core::config::parse_options;
use crate::core::consolidation_algorithm::ConsolidationAlgorithm;
use crate::core::host_profiler::HostProfiler;

/// Default interval in seconds between consolidation passes.
pub const DEFAULT_CONSOLIDATION_INTERVAL: u64 = 600;

/// Cluster-wide usage ratio at or above which powering off a host is unsafe.
pub const POWER_OFF_USAGE_THRESHOLD: f64 = 0.70;

/// Validates the input snapshot and returns a working copy of it.
/// The caller's records are never mutated.
pub(crate) fn clone_hosts(
    hosts: &[HostResource],
) -> Result<Vec<HostResource>, ConsolidationError> {
    for host in hosts {
        host.validate()?;
    }
    Ok(hosts.to_vec())
}

/// Compares scores through a truncated fixed-point difference: differences
/// with magnitude below 1.0 compare equal, so the stable sort preserves the
/// input order of near-tied hosts.
pub(crate) fn compare_scores(a: f64, b: f64) -> Ordering {
    ((a - b) as i64).cmp(&0)
}

/// Scores every host as the product of its normalized profile components,
/// with the profiler built over this same host population.
pub(crate) fn score_by_profile(hosts: &mut [HostResource]) {
    let profiler = HostProfiler::new(hosts);
    for host in hosts.iter_mut() {
        host.score = profiler.profile(host).score();
    }
}

/// Greedy first-fit consolidation over a ranked host list.
///
/// Hosts from the last index down to (excluding) `reserved_targets` act as
/// migration sources; for each of their VMs the targets are scanned from
/// index 0 up to the source and the VM goes to the first host that fits.
/// Target running totals are updated immediately, so later fit tests within
/// the pass observe earlier placements. A VM is migrated at most once.
pub(crate) fn map_vms_greedy(
    ranked_hosts: &[HostResource],
    reserved_targets: usize,
) -> Result<IndexMap<u32, HostResource>, ConsolidationError> {
    let mut hosts = clone_hosts(ranked_hosts)?;
    if hosts.len() <= reserved_targets {
        return Ok(IndexMap::new());
    }
    let mut placements: IndexMap<u32, usize> = IndexMap::new();
    for source in (reserved_targets..hosts.len()).rev() {
        let vms = hosts[source].vms.clone();
        for vm in vms {
            if placements.contains_key(&vm.id) {
                continue;
            }
            let target = (0..source)
                .find(|&target| hosts[target].can_migrate(&vm) == MigrationVerdict::Success);
            if let Some(target) = target {
                debug!(
                    "mapping vm {} from host {} to host {}",
                    vm.id, hosts[source].id, hosts[target].id
                );
                placements.insert(vm.id, target);
                hosts[target].allocate(vm);
            }
        }
    }
    Ok(placements
        .into_iter()
        .map(|(vm_id, target)| (vm_id, hosts[target].clone()))
        .collect())
}

/// Checks the hypothetical cluster-wide usage after removing the host's
/// overprovisioned capacity from the cloud aggregate. CPU is checked first
/// and short-circuits the memory check.
pub(crate) fn can_power_off_host(host: &HostResource, cloud: &CloudResource) -> bool {
    let cpu_capacity = cloud.cpu_capacity() as f64 - host.cpu_capacity();
    if cpu_capacity <= 0. {
        return false;
    }
    if cloud.used_cpu as f64 / cpu_capacity >= POWER_OFF_USAGE_THRESHOLD {
        return false;
    }
    let memory_capacity = cloud.memory_capacity_mb() as f64 - host.memory_capacity_mb();
    if memory_capacity <= 0. {
        return false;
    }
    cloud.used_memory as f64 / memory_capacity < POWER_OFF_USAGE_THRESHOLD
}

/// Checks the current cluster-wide usage against the safety threshold.
pub(crate) fn can_power_off_another_host(cloud: &CloudResource) -> bool {
    cloud.used_cpu as f64 / (cloud.cpu_capacity() as f64) < POWER_OFF_USAGE_THRESHOLD
        && cloud.used_memory as f64 / (cloud.memory_capacity_mb() as f64)
            < POWER_OFF_USAGE_THRESHOLD
}

pub(crate) fn interval_from_options(options_str: &str) -> u64 {
    parse_options(options_str)
        .get("interval")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_CONSOLIDATION_INTERVAL)
}

/// Base consolidation algorithm. Provides the shared mechanics with an
/// unscored pass-through ranking.
#[derive(Clone)]
pub struct BaseConsolidation {
    interval: u64,
}

impl BaseConsolidation {
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_CONSOLIDATION_INTERVAL,
        }
    }

    pub fn from_str(options_str: &str) -> Self {
        Self {
            interval: interval_from_options(options_str),
        }
    }
}

impl ConsolidationAlgorithm for BaseConsolidation {
    fn consolidation_interval(&self) -> u64 {
        self.interval
    }

    fn rank_hosts(
        &mut self,
        hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        clone_hosts(hosts)
    }

    fn map_vms_to_host(
        &mut self,
        ranked_hosts: &[HostResource],
    ) -> Result<IndexMap<u32, HostResource>, ConsolidationError> {
        map_vms_greedy(ranked_hosts, 1)
    }

    fn rank_hosts_to_power_off(
        &mut self,
        idle_hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError> {
        let mut idle = clone_hosts(idle_hosts)?;
        idle.sort_by(|a, b| compare_scores(b.score, a.score));
        Ok(idle)
    }

    fn can_power_off_host(&self, host: &HostResource, cloud: &CloudResource) -> bool {
        can_power_off_host(host, cloud)
    }

    fn can_power_off_another_host_in_cloud(&self, cloud: &CloudResource) -> bool {
        can_power_off_another_host(cloud)
    }

    fn can_heuristic_shutdown_hosts(&self) -> bool {
        true
    }
}
