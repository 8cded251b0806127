pub mod base;
pub mod big_host_preference;
pub mod dispersion;
pub mod dummy;
pub mod small_host_preference;
pub mod xen_ha_big_host_preference;
