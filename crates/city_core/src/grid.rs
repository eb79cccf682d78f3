//! Grid helpers: bounds, neighborhoods, service distance, and the road
//! placement rule shared by player and planner.

use smallvec::SmallVec;

pub fn in_bounds(x: i32, z: i32, grid_size: i32) -> bool {
    x >= 0 && x < grid_size && z >= 0 && z < grid_size
}

/// 4-connected neighbors in fixed (+x, -x, +z, -z) order. Fire spread and
/// planner road probes depend on this order being stable.
pub fn neighbors4(x: i32, z: i32) -> SmallVec<[(i32, i32); 4]> {
    SmallVec::from_buf([(x + 1, z), (x - 1, z), (x, z + 1), (x, z - 1)])
}

/// Euclidean distance between cell centers, used for service radii.
pub fn service_distance(ax: i32, az: i32, bx: i32, bz: i32) -> f64 {
    let dx = f64::from(ax - bx);
    let dz = f64::from(az - bz);
    dx.hypot(dz)
}

/// Would a road at `(x, z)` complete a solid 2x2 road block?
///
/// The candidate is checked as each of the four corners of a potential
/// block; `is_road` answers for existing *and* proposed road cells, so the
/// planner can validate a whole draft batch with one closure.
pub fn completes_road_block(x: i32, z: i32, is_road: impl Fn(i32, i32) -> bool) -> bool {
    // Candidate as top-left, top-right, bottom-left, bottom-right.
    if is_road(x + 1, z) && is_road(x, z + 1) && is_road(x + 1, z + 1) {
        return true;
    }
    if is_road(x - 1, z) && is_road(x, z + 1) && is_road(x - 1, z + 1) {
        return true;
    }
    if is_road(x + 1, z) && is_road(x, z - 1) && is_road(x + 1, z - 1) {
        return true;
    }
    if is_road(x - 1, z) && is_road(x, z - 1) && is_road(x - 1, z - 1) {
        return true;
    }
    false
}
