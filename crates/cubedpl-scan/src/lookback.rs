use crate::{FULL_MASK, NOT_READY, ScanInstruction, TileStatus};
use cubedpl_runtime::{
    cube::CubeContext,
    element::CubeElement,
    plane::{ballot_first_lane, plane_all, plane_any, plane_ballot, plane_reduce},
};

/// Cooperative backward walk of one plane over the status array.
///
/// Returns the reduction of every tile before `tile` for the given bucket. Lane `l` inspects the
/// tile `base - l` for windows of `plane_dim` tiles going backward. The walk stops on the first
/// window where a lane sees a full aggregate: the lanes before it contribute their partial
/// aggregates, the lane itself its full aggregate. Combinations keep the tile order, older tiles
/// on the left.
///
/// The calling tile must have published its partial aggregate before looking back, and the plane
/// size must match the padding of the status layout.
pub fn decoupled_lookback<N: CubeElement, I: ScanInstruction<N>>(
    cube: &CubeContext<'_>,
    status: &TileStatus<'_, N>,
    tile: u32,
    bucket: u32,
    instruction: &I,
) -> N {
    let plane_dim = cube.plane_dim;
    let padding = status.layout().padding as i64;
    debug_assert_eq!(plane_dim as i64, padding);

    let mut sum = instruction.identity();
    let mut flags = vec![NOT_READY; plane_dim as usize];
    let mut ready = vec![false; plane_dim as usize];
    let mut contributions = vec![instruction.identity(); plane_dim as usize];
    let mut tile_base = tile as i64 - 1;

    while tile_base >= -padding {
        let active = |lane: u32| tile_base - lane as i64 >= -padding;

        cube.spin_wait(|| {
            for lane in 0..plane_dim as usize {
                flags[lane] = match active(lane as u32) {
                    true => status.load_flag(tile_base - lane as i64, bucket),
                    false => FULL_MASK,
                };
                ready[lane] = flags[lane] != NOT_READY;
            }
            plane_all(&ready)
        });

        let is_full: Vec<bool> = (0..plane_dim)
            .map(|lane| active(lane) && flags[lane as usize] == FULL_MASK)
            .collect();
        let ballot = plane_ballot(&is_full);
        let winner = ballot_first_lane(ballot, plane_dim);

        // Lane 0 holds the newest tile, the reduction runs from the oldest.
        for lane in 0..plane_dim {
            let target = tile_base - lane as i64;
            let slot = (plane_dim - 1 - lane) as usize;
            contributions[slot] = match active(lane) && lane <= winner && target >= 0 {
                true => status.value(target, bucket, is_full[lane as usize]),
                false => instruction.identity(),
            };
        }
        let window = plane_reduce(&contributions, instruction.identity(), |a, b| {
            instruction.combine(a, b)
        });
        sum = instruction.combine(window, sum);

        if plane_any(&is_full) {
            break;
        }
        tile_base -= plane_dim as i64;
    }

    sum
}
