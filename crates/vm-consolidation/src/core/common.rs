//! Resource snapshots exchanged with the cluster orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte to megabyte divisor. Decimal mega, not 2^20.
pub const BYTES_IN_MEGABYTE: u64 = 1_000_000;

/// The only error kind surfaced to the caller. All other degenerate inputs
/// (empty lists, unused hosts, VMs that fit nowhere) degrade silently.
#[derive(Debug, Error)]
pub enum ConsolidationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Resource demand of a single virtual machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmResource {
    pub id: u32,
    /// Number of virtual CPUs.
    pub cpus: u32,
    /// Clock speed per vCPU in MHz.
    pub speed: u32,
    /// Memory footprint in MB.
    pub memory: u64,
}

impl VmResource {
    pub fn new(id: u32, cpus: u32, speed: u32, memory: u64) -> Self {
        Self {
            id,
            cpus,
            speed,
            memory,
        }
    }

    /// Total CPU demand in MHz.
    pub fn cpu_demand(&self) -> u64 {
        self.cpus as u64 * self.speed as u64
    }

    pub(crate) fn validate(&self) -> Result<(), ConsolidationError> {
        if self.cpus == 0 || self.speed == 0 {
            return Err(ConsolidationError::InvalidInput(format!(
                "vm {} has zero cpu count or speed",
                self.id
            )));
        }
        Ok(())
    }
}

/// Verdict of the capacity-fit test for migrating a VM onto a host.
#[derive(Debug, PartialEq)]
pub enum MigrationVerdict {
    NotEnoughCpus,
    NotEnoughCpuCapacity,
    NotEnoughMemory,
    Success,
}

/// Capacity and current load of a single host, together with the VMs it runs.
///
/// A freshly built snapshot satisfies `used_cpu == Σ vm.cpu_demand()` and
/// `used_memory == Σ vm.memory`; the engine updates these totals in place only
/// on simulated migrations over its own clones, never on the caller's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResource {
    pub id: u32,
    /// Number of physical CPUs.
    pub cpus: u32,
    /// Clock speed per CPU in MHz.
    pub speed: u32,
    /// Multiplier (>= 1.0) applied to usable CPU capacity.
    pub cpu_overprovisioning: f64,
    /// Multiplier (>= 1.0) applied to usable memory capacity.
    pub memory_overprovisioning: f64,
    /// Total memory capacity in bytes.
    pub total_memory: u64,
    /// CPU currently in use by hosted VMs, in MHz.
    pub used_cpu: u64,
    /// Memory currently in use by hosted VMs, in MB.
    pub used_memory: u64,
    /// Ranking score. Meaning depends on the active algorithm.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub vms: Vec<VmResource>,
}

impl HostResource {
    /// Creates an empty host with the specified capacity.
    pub fn new(
        id: u32,
        cpus: u32,
        speed: u32,
        cpu_overprovisioning: f64,
        memory_overprovisioning: f64,
        total_memory: u64,
    ) -> Self {
        Self {
            id,
            cpus,
            speed,
            cpu_overprovisioning,
            memory_overprovisioning,
            total_memory,
            used_cpu: 0,
            used_memory: 0,
            score: 0.,
            vms: Vec::new(),
        }
    }

    /// Total memory capacity in MB.
    pub fn total_memory_mb(&self) -> u64 {
        self.total_memory / BYTES_IN_MEGABYTE
    }

    /// Usable CPU capacity in MHz, including overprovisioning.
    pub fn cpu_capacity(&self) -> f64 {
        self.cpu_overprovisioning * (self.cpus as u64 * self.speed as u64) as f64
    }

    /// Usable memory capacity in MB, including overprovisioning.
    pub fn memory_capacity_mb(&self) -> f64 {
        self.memory_overprovisioning * self.total_memory_mb() as f64
    }

    /// Checks whether the specified VM currently fits on this host.
    pub fn can_migrate(&self, vm: &VmResource) -> MigrationVerdict {
        if self.cpus < vm.cpus {
            return MigrationVerdict::NotEnoughCpus;
        }
        if self.cpu_capacity() - (self.used_cpu as f64) < vm.cpu_demand() as f64 {
            return MigrationVerdict::NotEnoughCpuCapacity;
        }
        if self.memory_capacity_mb() - (self.used_memory as f64) < vm.memory as f64 {
            return MigrationVerdict::NotEnoughMemory;
        }
        MigrationVerdict::Success
    }

    /// Attaches the VM to this host and updates the running totals.
    pub fn allocate(&mut self, vm: VmResource) {
        self.used_cpu += vm.cpu_demand();
        self.used_memory += vm.memory;
        self.vms.push(vm);
    }

    /// Detaches the VM with the specified ID and updates the running totals.
    pub fn release(&mut self, vm_id: u32) -> Option<VmResource> {
        let index = self.vms.iter().position(|vm| vm.id == vm_id)?;
        let vm = self.vms.remove(index);
        self.used_cpu = self.used_cpu.saturating_sub(vm.cpu_demand());
        self.used_memory = self.used_memory.saturating_sub(vm.memory);
        Some(vm)
    }

    pub(crate) fn validate(&self) -> Result<(), ConsolidationError> {
        if self.cpus == 0 || self.speed == 0 {
            return Err(ConsolidationError::InvalidInput(format!(
                "host {} has zero cpu count or speed",
                self.id
            )));
        }
        if !self.cpu_overprovisioning.is_finite() || self.cpu_overprovisioning < 1.0 {
            return Err(ConsolidationError::InvalidInput(format!(
                "host {} has bad cpu overprovisioning factor {}",
                self.id, self.cpu_overprovisioning
            )));
        }
        if !self.memory_overprovisioning.is_finite() || self.memory_overprovisioning < 1.0 {
            return Err(ConsolidationError::InvalidInput(format!(
                "host {} has bad memory overprovisioning factor {}",
                self.id, self.memory_overprovisioning
            )));
        }
        for vm in &self.vms {
            vm.validate()?;
        }
        Ok(())
    }
}

/// Cluster-wide resource aggregate used by the power-off feasibility checks.
/// Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudResource {
    /// Total CPU count across hosts.
    pub cpus: u32,
    /// Per-CPU clock speed in MHz.
    pub speed: u32,
    /// Total memory capacity in bytes.
    pub total_memory: u64,
    /// CPU currently in use, in MHz.
    pub used_cpu: u64,
    /// Memory currently in use, in MB.
    pub used_memory: u64,
}

impl CloudResource {
    pub fn new(cpus: u32, speed: u32, total_memory: u64, used_cpu: u64, used_memory: u64) -> Self {
        Self {
            cpus,
            speed,
            total_memory,
            used_cpu,
            used_memory,
        }
    }

    /// Aggregates the cloud record from its constituent hosts.
    /// The per-CPU speed is the CPU-count weighted average across hosts.
    pub fn from_hosts(hosts: &[HostResource]) -> Self {
        let cpus: u32 = hosts.iter().map(|host| host.cpus).sum();
        let total_speed: u64 = hosts
            .iter()
            .map(|host| host.cpus as u64 * host.speed as u64)
            .sum();
        let speed = if cpus == 0 {
            0
        } else {
            (total_speed / cpus as u64) as u32
        };
        Self {
            cpus,
            speed,
            total_memory: hosts.iter().map(|host| host.total_memory).sum(),
            used_cpu: hosts.iter().map(|host| host.used_cpu).sum(),
            used_memory: hosts.iter().map(|host| host.used_memory).sum(),
        }
    }

    /// Cloud-wide CPU capacity in MHz, without overprovisioning.
    pub fn cpu_capacity(&self) -> u64 {
        self.cpus as u64 * self.speed as u64
    }

    /// Cloud-wide memory capacity in MB.
    pub fn memory_capacity_mb(&self) -> u64 {
        self.total_memory / BYTES_IN_MEGABYTE
    }
}
