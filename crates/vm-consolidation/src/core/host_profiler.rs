//! Per-host normalized resource profiles.

use crate::core::common::HostResource;

/// Normalized proportions of a host's resources relative to the averages of
/// the host population the profiler was built over.
#[derive(Debug, Clone, PartialEq)]
pub struct HostProfile {
    pub cpu_speed: f64,
    pub cpu_count: f64,
    pub memory: f64,
}

impl HostProfile {
    /// Combined score used by the host preference algorithms.
    pub fn score(&self) -> f64 {
        self.cpu_speed * self.cpu_count * self.memory
    }
}

/// Computes host profiles within a fixed host population.
///
/// Constructed once per ranking pass over the full host list so that it can
/// reference population-wide averages. Holds no other state.
pub struct HostProfiler {
    average_speed: f64,
    average_cpus: f64,
    average_memory: f64,
}

impl HostProfiler {
    pub fn new(hosts: &[HostResource]) -> Self {
        if hosts.is_empty() {
            return Self {
                average_speed: 0.,
                average_cpus: 0.,
                average_memory: 0.,
            };
        }
        let count = hosts.len() as f64;
        Self {
            average_speed: hosts.iter().map(|host| host.speed as f64).sum::<f64>() / count,
            average_cpus: hosts.iter().map(|host| host.cpus as f64).sum::<f64>() / count,
            average_memory: hosts
                .iter()
                .map(|host| host.total_memory_mb() as f64)
                .sum::<f64>()
                / count,
        }
    }

    /// Returns the profile of the specified host within the population.
    pub fn profile(&self, host: &HostResource) -> HostProfile {
        HostProfile {
            cpu_speed: proportion(host.speed as f64, self.average_speed),
            cpu_count: proportion(host.cpus as f64, self.average_cpus),
            memory: proportion(host.total_memory_mb() as f64, self.average_memory),
        }
    }
}

fn proportion(value: f64, average: f64) -> f64 {
    if average == 0. {
        0.
    } else {
        value / average
    }
}
