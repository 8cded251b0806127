//! Cluster consolidation and load-placement algorithms.

use dyn_clone::{clone_trait_object, DynClone};
use indexmap::IndexMap;
use log::warn;

use crate::core::common::{CloudResource, ConsolidationError, HostResource};
use crate::core::config::parse_config_value;
use crate::core::consolidation_algorithms::base::BaseConsolidation;
use crate::core::consolidation_algorithms::big_host_preference::BigHostPreference;
use crate::core::consolidation_algorithms::dispersion::Dispersion;
use crate::core::consolidation_algorithms::dummy::Dummy;
use crate::core::consolidation_algorithms::small_host_preference::SmallHostPreference;
use crate::core::consolidation_algorithms::xen_ha_big_host_preference::XenHaBigHostPreference;

/// Trait for implementation of cluster consolidation algorithms.
///
/// An algorithm ranks the hosts of one cluster, proposes VM migrations over
/// the ranked list and answers power-off feasibility questions. It never
/// performs I/O and never mutates the caller's snapshots: every input list is
/// defensively cloned before scoring or simulated migrations.
///
/// `rank_hosts` may record transient per-cluster state (e.g. population
/// statistics) that the subsequent `map_vms_to_host` and
/// `rank_hosts_to_power_off` calls on the same instance rely on. An instance
/// therefore serves one cluster-management cycle at a time and is not safe
/// for concurrent reuse; create one instance per cycle.
pub trait ConsolidationAlgorithm: DynClone {
    /// Interval in seconds between consolidation passes for this algorithm.
    fn consolidation_interval(&self) -> u64;

    /// Returns a cloned, scored and sorted copy of the cluster's hosts.
    /// Hosts placed at higher indices are the preferred migration sources.
    fn rank_hosts(
        &mut self,
        hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError>;

    /// Proposes migrations over a list previously returned by `rank_hosts`.
    /// Maps each migrated VM ID to the post-migration snapshot of its target
    /// host. VMs that fit nowhere are skipped, not reported as errors.
    fn map_vms_to_host(
        &mut self,
        ranked_hosts: &[HostResource],
    ) -> Result<IndexMap<u32, HostResource>, ConsolidationError>;

    /// Ranks idle (VM-less) hosts so that the most disposable host comes
    /// first, for the orchestrator to evaluate as a shutdown candidate.
    fn rank_hosts_to_power_off(
        &mut self,
        idle_hosts: &[HostResource],
    ) -> Result<Vec<HostResource>, ConsolidationError>;

    /// Checks whether powering off the specified host keeps the hypothetical
    /// cluster-wide CPU and memory usage below the safety threshold.
    fn can_power_off_host(&self, host: &HostResource, cloud: &CloudResource) -> bool;

    /// Checks whether the current cluster-wide usage leaves room to power off
    /// one more host, independent of which host is targeted.
    fn can_power_off_another_host_in_cloud(&self, cloud: &CloudResource) -> bool;

    /// Whether this algorithm ever proposes host shutdowns.
    fn can_heuristic_shutdown_hosts(&self) -> bool;
}

clone_trait_object!(ConsolidationAlgorithm);

/// Resolves an algorithm from its config string, e.g. "SmallHostPreference"
/// or "Base[interval=300]". Unknown names fall back to [Dummy] so that a bad
/// configuration never disables cluster management altogether.
pub fn consolidation_algorithm_resolver(config_str: &str) -> Box<dyn ConsolidationAlgorithm> {
    let (algorithm_name, options) = parse_config_value(config_str);
    let options = options.unwrap_or_default();
    match algorithm_name.as_str() {
        "Dummy" => Box::new(Dummy::new()),
        "Base" => Box::new(BaseConsolidation::from_str(&options)),
        "SmallHostPreference" => Box::new(SmallHostPreference::from_str(&options)),
        "BigHostPreference" => Box::new(BigHostPreference::from_str(&options)),
        "XenHABigHostPreference" => Box::new(XenHaBigHostPreference::from_str(&options)),
        "Dispersion" => Box::new(Dispersion::new()),
        _ => {
            warn!(
                "can't resolve consolidation algorithm \"{}\", falling back to Dummy",
                config_str
            );
            Box::new(Dummy::new())
        }
    }
}
