use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vm_consolidation::core::common::{ConsolidationError, HostResource, VmResource};
use vm_consolidation::core::consolidation_algorithm::ConsolidationAlgorithm;
use vm_consolidation::core::consolidation_algorithms::big_host_preference::BigHostPreference;
use vm_consolidation::core::consolidation_algorithms::small_host_preference::SmallHostPreference;
use vm_consolidation::core::consolidation_algorithms::xen_ha_big_host_preference::XenHaBigHostPreference;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn megabytes(mb: u64) -> u64 {
    mb * 1_000_000
}

fn host(id: u32, cpus: u32, speed: u32, memory_mb: u64) -> HostResource {
    HostResource::new(id, cpus, speed, 1.0, 1.0, megabytes(memory_mb))
}

fn host_with_vm(id: u32, cpus: u32, speed: u32, memory_mb: u64, vm: VmResource) -> HostResource {
    let mut host = host(id, cpus, speed, memory_mb);
    host.allocate(vm);
    host
}

#[test]
// Ranking works on a defensive clone: the caller's snapshot stays untouched
// and the result differs from it only in the score field.
fn test_rank_hosts_does_not_mutate_input() {
    let hosts = vec![
        host_with_vm(1, 4, 2000, 8192, VmResource::new(101, 1, 1000, 500)),
        host_with_vm(2, 8, 2500, 16384, VmResource::new(102, 2, 1000, 1024)),
        host(3, 2, 1000, 4096),
    ];
    let snapshot = hosts.clone();

    let mut algorithm = SmallHostPreference::new();
    let ranked = algorithm.rank_hosts(&hosts).unwrap();

    assert_eq!(hosts, snapshot);
    assert_eq!(ranked.len(), hosts.len());
    for ranked_host in &ranked {
        let original = hosts.iter().find(|h| h.id == ranked_host.id).unwrap();
        let mut unscored = ranked_host.clone();
        unscored.score = original.score;
        assert_eq!(&unscored, original);
    }
}

#[test]
// Two identical hosts with one VM each: both score equally, and the VM of the
// lower-ranked host is consolidated into the other one, whose reported used
// memory becomes the sum of both VMs.
fn test_small_host_preference_consolidates_two_hosts() {
    init_logger();
    let hosts = vec![
        host_with_vm(1, 4, 2000, 8192, VmResource::new(101, 1, 1000, 500)),
        host_with_vm(2, 4, 2000, 8192, VmResource::new(102, 1, 1000, 500)),
    ];

    let mut algorithm = SmallHostPreference::new();
    let ranked = algorithm.rank_hosts(&hosts).unwrap();
    assert_eq!(ranked[0].score, ranked[1].score);
    assert_eq!(ranked[0].id, 1);
    assert_eq!(ranked[1].id, 2);

    let migrations = algorithm.map_vms_to_host(&ranked).unwrap();
    assert_eq!(migrations.len(), 1);
    let target = &migrations[&102];
    assert_eq!(target.id, 1);
    assert_eq!(target.used_memory, 1000);
    assert_eq!(target.used_cpu, 2000);
    assert_eq!(target.vms.len(), 2);
}

#[test]
// Small-host preference ranks upward, big-host preference downward.
fn test_ranking_direction() {
    let big = host(1, 16, 3000, 32768);
    let small = host(2, 2, 1000, 4096);

    let mut small_pref = SmallHostPreference::new();
    let ranked = small_pref.rank_hosts(&[big.clone(), small.clone()]).unwrap();
    assert_eq!(ranked[0].id, 2);
    assert_eq!(ranked[1].id, 1);
    assert!(ranked[0].score < ranked[1].score);

    let mut big_pref = BigHostPreference::new();
    let ranked = big_pref.rank_hosts(&[small, big]).unwrap();
    assert_eq!(ranked[0].id, 1);
    assert_eq!(ranked[1].id, 2);
}

#[test]
// Score differences below 1.0 are truncated away by the fixed-point
// comparator, so nearly identical hosts keep their input order.
fn test_score_tie_preserves_input_order() {
    let hosts = vec![
        host(5, 4, 2000, 8192),
        host(3, 4, 2000, 8000),
        host(9, 4, 2000, 8100),
    ];

    let mut algorithm = SmallHostPreference::new();
    let ranked = algorithm.rank_hosts(&hosts).unwrap();
    let ids: Vec<u32> = ranked.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![5, 3, 9]);
}

#[test]
// Four identical hosts under Xen HA: only the host ranked last may be
// drained, so exactly one migration is proposed.
fn test_xen_ha_four_hosts_single_migration() {
    let hosts: Vec<HostResource> = (1..=4)
        .map(|i| host_with_vm(i, 4, 2000, 8192, VmResource::new(100 + i, 1, 1000, 500)))
        .collect();

    let mut algorithm = XenHaBigHostPreference::new();
    let ranked = algorithm.rank_hosts(&hosts).unwrap();
    let migrations = algorithm.map_vms_to_host(&ranked).unwrap();

    assert_eq!(migrations.len(), 1);
    let target = &migrations[&104];
    assert_eq!(target.id, 1);
    assert_eq!(target.used_memory, 1000);
}

#[test]
// Ten identical hosts under Xen HA: the top three stay as targets, the other
// seven are drained, one small VM each.
fn test_xen_ha_ten_hosts_drain_all_but_floor() {
    let hosts: Vec<HostResource> = (1..=10)
        .map(|i| host_with_vm(i, 8, 2000, 16384, VmResource::new(100 + i, 1, 500, 256)))
        .collect();

    let mut algorithm = XenHaBigHostPreference::new();
    let ranked = algorithm.rank_hosts(&hosts).unwrap();
    let migrations = algorithm.map_vms_to_host(&ranked).unwrap();

    assert_eq!(migrations.len(), 7);
    for i in 4u32..=10 {
        let target = &migrations[&(100 + i)];
        assert_eq!(target.id, 1);
    }
    assert!(!migrations.contains_key(&101));
    assert!(!migrations.contains_key(&102));
    assert!(!migrations.contains_key(&103));
}

#[test]
// At or below the HA floor the Xen variant stops consolidating and delegates
// to dispersion, which leaves an already balanced cluster alone.
fn test_xen_ha_small_cluster_delegates_to_dispersion() {
    let hosts: Vec<HostResource> = (1..=3)
        .map(|i| host_with_vm(i, 4, 2000, 8192, VmResource::new(100 + i, 1, 1000, 500)))
        .collect();

    let mut algorithm = XenHaBigHostPreference::new();
    assert!(algorithm.can_heuristic_shutdown_hosts());

    let ranked = algorithm.rank_hosts(&hosts).unwrap();
    assert_eq!(ranked.len(), 3);
    let migrations = algorithm.map_vms_to_host(&ranked).unwrap();
    assert!(migrations.is_empty());

    assert!(!algorithm.can_heuristic_shutdown_hosts());
}

#[test]
// Every proposed migration respects the capacity-fit test: the reported
// target state never exceeds its overprovisioned CPU or memory capacity.
fn test_capacity_invariant_on_random_clusters() {
    let mut rng = StdRng::seed_from_u64(123);
    let mut vm_id = 100;
    for _ in 0..30 {
        let host_count = rng.gen_range(3..=8);
        let mut hosts = Vec::new();
        for host_id in 1..=host_count {
            let overprovisioning = if rng.gen_bool(0.5) { 1.0 } else { 1.5 };
            let mut host = HostResource::new(
                host_id,
                rng.gen_range(2..=16),
                rng.gen_range(1..=3) * 1000,
                overprovisioning,
                overprovisioning,
                megabytes(rng.gen_range(4..=32) * 1024),
            );
            for _ in 0..rng.gen_range(0..=4) {
                vm_id += 1;
                host.allocate(VmResource::new(
                    vm_id,
                    rng.gen_range(1..=4),
                    rng.gen_range(1..=3) * 500,
                    rng.gen_range(256..=2048),
                ));
            }
            hosts.push(host);
        }

        let mut algorithm = SmallHostPreference::new();
        let ranked = algorithm.rank_hosts(&hosts).unwrap();
        let migrations = algorithm.map_vms_to_host(&ranked).unwrap();
        for (migrated_vm, target) in &migrations {
            assert!(target.used_cpu as f64 <= target.cpu_capacity());
            assert!(target.used_memory as f64 <= target.memory_capacity_mb());
            assert!(target.vms.iter().any(|vm| vm.id == *migrated_vm));
        }
    }
}

#[test]
// Empty input yields empty output, not an error.
fn test_empty_cluster() {
    let mut algorithm = BigHostPreference::new();
    let ranked = algorithm.rank_hosts(&[]).unwrap();
    assert!(ranked.is_empty());
    let migrations = algorithm.map_vms_to_host(&ranked).unwrap();
    assert!(migrations.is_empty());
}

#[test]
// Malformed snapshots surface as the single invalid-input error kind.
fn test_invalid_input() {
    let mut algorithm = SmallHostPreference::new();

    let no_cpus = HostResource::new(1, 0, 2000, 1.0, 1.0, megabytes(8192));
    let result = algorithm.rank_hosts(&[no_cpus]);
    assert!(matches!(result, Err(ConsolidationError::InvalidInput(_))));

    let bad_factor = HostResource::new(1, 4, 2000, 0.5, 1.0, megabytes(8192));
    let result = algorithm.rank_hosts(&[bad_factor]);
    assert!(matches!(result, Err(ConsolidationError::InvalidInput(_))));

    let mut bad_vm = host(1, 4, 2000, 8192);
    bad_vm.allocate(VmResource::new(101, 0, 1000, 500));
    let result = algorithm.rank_hosts(&[bad_vm]);
    assert!(matches!(result, Err(ConsolidationError::InvalidInput(_))));
}
