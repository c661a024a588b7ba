//! Pose types built on the manifold layer.
//!
//! - [`ScaledPose3`]: 7-DOF similarity pose with analytic Jacobians
//! - [`consistency`]: batch self-checks of the underlying group algebra

pub mod consistency;
pub mod scaled_pose3;

pub use consistency::{
    check_exp_log, check_hat_vee, check_inverse, check_lie_bracket, check_point_action,
    CheckKind, ConsistencyFailure,
};
pub use scaled_pose3::ScaledPose3;
