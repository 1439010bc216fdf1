//! Cube-wide primitives over the elements of a tile.
//!
//! Unit `u` of the cube owns the elements `[u * elements_per_unit, (u + 1) * elements_per_unit)`
//! of the tile. Units combine their own elements serially, planes combine the unit results with
//! cross-lane operations, and the cube combines the plane results in order.

use crate::ScanInstruction;
use cubedpl_runtime::{
    cube::CubeContext,
    element::CubeElement,
    plane::{plane_exclusive_scan, plane_reduce},
};

/// Reduction of the elements owned by every unit.
fn unit_totals<N: CubeElement, I: ScanInstruction<N>>(
    cube: &CubeContext<'_>,
    items: &[N],
    elements_per_unit: usize,
    instruction: &I,
) -> Vec<N> {
    debug_assert!(items.len() <= cube.units() as usize * elements_per_unit);

    (0..cube.units() as usize)
        .map(|unit| {
            let start = (unit * elements_per_unit).min(items.len());
            let end = (start + elements_per_unit).min(items.len());
            items[start..end]
                .iter()
                .fold(instruction.identity(), |acc, item| {
                    instruction.combine(acc, *item)
                })
        })
        .collect()
}

/// Reduce the elements of a tile.
pub fn cube_reduce<N: CubeElement, I: ScanInstruction<N>>(
    cube: &CubeContext<'_>,
    items: &[N],
    elements_per_unit: usize,
    instruction: &I,
) -> N {
    let totals = unit_totals(cube, items, elements_per_unit, instruction);

    totals
        .chunks(cube.plane_dim as usize)
        .map(|plane| {
            plane_reduce(plane, instruction.identity(), |a, b| {
                instruction.combine(a, b)
            })
        })
        .fold(instruction.identity(), |acc, plane| {
            instruction.combine(acc, plane)
        })
}

/// The carry of every unit: `carry` combined with the elements of the units before it.
fn unit_carries<N: CubeElement, I: ScanInstruction<N>>(
    cube: &CubeContext<'_>,
    items: &[N],
    elements_per_unit: usize,
    carry: N,
    instruction: &I,
) -> Vec<N> {
    let mut carries = unit_totals(cube, items, elements_per_unit, instruction);
    let mut plane_carry = carry;

    for plane in carries.chunks_mut(cube.plane_dim as usize) {
        let total = plane_exclusive_scan(plane, instruction.identity(), |a, b| {
            instruction.combine(a, b)
        });
        for lane in plane.iter_mut() {
            *lane = instruction.combine(plane_carry, *lane);
        }
        plane_carry = instruction.combine(plane_carry, total);
    }

    carries
}

/// Inclusive scan of a tile in place, every output starting with `carry`.
pub fn cube_inclusive_scan<N: CubeElement, I: ScanInstruction<N>>(
    cube: &CubeContext<'_>,
    items: &mut [N],
    elements_per_unit: usize,
    carry: N,
    instruction: &I,
) {
    let carries = unit_carries(cube, items, elements_per_unit, carry, instruction);

    for (chunk, carry) in items.chunks_mut(elements_per_unit).zip(carries) {
        let mut running = carry;
        for item in chunk {
            running = instruction.combine(running, *item);
            *item = running;
        }
    }
}

/// Exclusive scan of a tile in place, the first output being `carry`.
pub fn cube_exclusive_scan<N: CubeElement, I: ScanInstruction<N>>(
    cube: &CubeContext<'_>,
    items: &mut [N],
    elements_per_unit: usize,
    carry: N,
    instruction: &I,
) {
    let carries = unit_carries(cube, items, elements_per_unit, carry, instruction);

    for (chunk, carry) in items.chunks_mut(elements_per_unit).zip(carries) {
        let mut running = carry;
        for item in chunk {
            let value = *item;
            *item = running;
            running = instruction.combine(running, value);
        }
    }
}
