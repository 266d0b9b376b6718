//! Continuous-time collision detection between body pairs
//!
//! Bodies are integrated first; each collidable pair is then solved for the
//! exact instant inside the step where their trajectories cross.

use super::body::BodyState;
use super::tag::TagSet;

/// Stable identity of an entity inside one engine
pub type EntityId = u64;

/// A collision seen from one participant
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    /// The other participant
    pub other: EntityId,
    /// The other participant's tags at detection time
    pub other_tags: TagSet,
    /// Seconds into the step when the bodies met
    pub time: f64,
    /// Length of the step the collision happened in
    pub step: f64,
    /// This participant at the moment of impact
    pub own_at_impact: BodyState,
    /// The other participant at the moment of impact
    pub other_at_impact: BodyState,
}

/// Earliest time in `[0, dt]` at which two bodies, starting from `a` and `b`,
/// occupy the same position
///
/// Solves `dp + dv*t + da*t^2/2 = 0` on the relative motion. Degenerate cases
/// (no relative motion, no real root) mean no collision. Bodies that start the
/// step coincident were resolved on the previous step, so the `t = 0` root is
/// skipped for them.
pub fn solve_collision_time(a: &BodyState, b: &BodyState, dt: f64) -> Option<f64> {
    let dp = a.position - b.position;
    let dv = a.velocity - b.velocity;
    let da = a.acceleration - b.acceleration;
    let admissible = |t: f64| t.is_finite() && (if dp == 0.0 { t > 0.0 } else { t >= 0.0 });

    let t = if da != 0.0 {
        let discriminant = dv * dv - 2.0 * da * dp;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let r1 = (-dv - root) / da;
        let r2 = (-dv + root) / da;
        let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
        if admissible(lo) { lo } else { hi }
    } else if dv != 0.0 {
        -dp / dv
    } else {
        return None;
    };

    (admissible(t) && t <= dt).then_some(t)
}
