//! Host port allocation.
//!
//! Allocation is bookkeeping-only: correctness is defined relative to the
//! ports held by tracked sessions, never by asking the OS for socket
//! availability. A port freed by an untracked process is out of scope.

use crate::error_handling::types::ManagerError;
use std::collections::HashSet;

/// Number of candidate ports scanned above the base before the allocator
/// reports exhaustion.
const PORT_SCAN_RANGE: u16 = 1000;

/// Returns the lowest port at or above `base` not present in `in_use`.
pub fn next_free_port(base: u16, in_use: &HashSet<u16>) -> Result<u16, ManagerError> {
    (0..PORT_SCAN_RANGE)
        .filter_map(|offset| base.checked_add(offset))
        .find(|port| !in_use.contains(port))
        .ok_or(ManagerError::NoPortAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_yields_base() {
        assert_eq!(next_free_port(3001, &HashSet::new()).unwrap(), 3001);
    }

    #[test]
    fn taken_ports_are_skipped() {
        let in_use: HashSet<u16> = [3001, 3002, 3004].into_iter().collect();
        assert_eq!(next_free_port(3001, &in_use).unwrap(), 3003);
    }

    #[test]
    fn freed_port_is_reused_lowest_first() {
        let mut in_use: HashSet<u16> = (3001..3010).collect();
        assert_eq!(next_free_port(3001, &in_use).unwrap(), 3010);
        in_use.remove(&3004);
        assert_eq!(next_free_port(3001, &in_use).unwrap(), 3004);
    }

    #[test]
    fn sequential_allocation_is_dense_and_distinct() {
        let mut in_use = HashSet::new();
        for expected in 3001..3021 {
            let port = next_free_port(3001, &in_use).unwrap();
            assert_eq!(port, expected);
            in_use.insert(port);
        }
        assert_eq!(in_use.len(), 20);
    }

    #[test]
    fn exhausted_range_reports_no_port() {
        let in_use: HashSet<u16> = (3001..3001 + PORT_SCAN_RANGE).collect();
        assert!(matches!(
            next_free_port(3001, &in_use),
            Err(ManagerError::NoPortAvailable)
        ));
    }

    #[test]
    fn base_near_u16_max_does_not_wrap() {
        let result = next_free_port(u16::MAX, &HashSet::new());
        assert_eq!(result.unwrap(), u16::MAX);

        let in_use: HashSet<u16> = [u16::MAX].into_iter().collect();
        assert!(matches!(
            next_free_port(u16::MAX, &in_use),
            Err(ManagerError::NoPortAvailable)
        ));
    }
}
