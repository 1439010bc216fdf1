//! Plane-level (sub-group) primitives.
//!
//! A plane is a group of lanes executing in lock-step. The emulated device represents the
//! registers of a plane as a slice with one value per lane, so these functions play the role of
//! the cross-lane instructions of a real device. Combining operations always preserve lane
//! order, making them valid for associative operators that are not commutative.

/// Elect the first lane of the plane.
pub fn plane_elect(lane: u32) -> bool {
    lane == 0
}

/// The lane elected by [plane_elect] in a plane of `plane_dim` lanes.
pub fn plane_leader(plane_dim: u32) -> u32 {
    let elected: Vec<bool> = (0..plane_dim).map(plane_elect).collect();
    ballot_first_lane(plane_ballot(&elected), plane_dim)
}

/// Broadcast the value of `lane` to every lane.
pub fn plane_broadcast<T: Copy>(values: &[T], lane: u32) -> T {
    values[lane as usize]
}

/// Bitmask of the lanes where `predicate` is true, lane `i` being bit `i`.
pub fn plane_ballot(predicate: &[bool]) -> u64 {
    debug_assert!(predicate.len() <= 64);

    predicate
        .iter()
        .enumerate()
        .filter(|(_, value)| **value)
        .fold(0u64, |ballot, (lane, _)| ballot | (1 << lane))
}

/// Lowest lane set in a ballot, or `plane_dim` when no lane is set.
pub fn ballot_first_lane(ballot: u64, plane_dim: u32) -> u32 {
    match ballot {
        0 => plane_dim,
        ballot => ballot.trailing_zeros(),
    }
}

/// Whether `predicate` holds on every lane.
pub fn plane_all(predicate: &[bool]) -> bool {
    predicate.iter().all(|value| *value)
}

/// Whether `predicate` holds on at least one lane.
pub fn plane_any(predicate: &[bool]) -> bool {
    predicate.iter().any(|value| *value)
}

/// Reduce the values of every lane with a tree of pairwise combinations.
pub fn plane_reduce<T: Copy, F: Fn(T, T) -> T>(values: &[T], identity: T, op: F) -> T {
    let mut lanes = values.to_vec();
    let num_lanes = lanes.len();
    let mut width = 1;

    while width < num_lanes {
        for lane in (0..num_lanes).step_by(2 * width) {
            if lane + width < num_lanes {
                lanes[lane] = op(lanes[lane], lanes[lane + width]);
            }
        }
        width *= 2;
    }

    lanes.first().copied().unwrap_or(identity)
}

/// Inclusive scan across lanes, in place.
pub fn plane_inclusive_scan<T: Copy, F: Fn(T, T) -> T>(values: &mut [T], op: F) {
    let num_lanes = values.len();
    let mut offset = 1;

    while offset < num_lanes {
        let snapshot = values.to_vec();
        for lane in offset..num_lanes {
            values[lane] = op(snapshot[lane - offset], snapshot[lane]);
        }
        offset *= 2;
    }
}

/// Exclusive scan across lanes, in place, returning the reduction of all lanes.
pub fn plane_exclusive_scan<T: Copy, F: Fn(T, T) -> T>(values: &mut [T], identity: T, op: F) -> T {
    plane_inclusive_scan(values, &op);

    let total = values.last().copied().unwrap_or(identity);
    for lane in (1..values.len()).rev() {
        values[lane] = values[lane - 1];
    }
    if let Some(first) = values.first_mut() {
        *first = identity;
    }

    total
}
