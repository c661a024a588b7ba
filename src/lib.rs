//! Sim(3) scaled poses with analytic Jacobians.
//!
//! A [`ScaledPose3`] combines a rotation, a translation and a positive uniform
//! scale into one 7-DOF Lie group element, and provides the derivatives needed
//! to use it as a variable in bundle adjustment or pose-graph optimization:
//! - group operations (compose, inverse, between) with Jacobians
//! - exponential/logarithm maps and the adjoint representation
//! - point transforms and range measurements with Jacobians with respect to
//!   both the pose and the operand
//!
//! The [`numerical`] module provides central-difference Jacobians on manifolds
//! used to verify every analytic derivative.

pub mod error;
pub mod geometry;
pub mod logger;
pub mod manifold;
pub mod numerical;

pub use error::{PoseError, PoseResult};
pub use geometry::ScaledPose3;
pub use logger::{init_logger, init_logger_with_level};
pub use manifold::{Chart, CoordinatesMode, LieGroup, ManifoldError, Tangent};
pub use manifold::sim3::{Sim3, Sim3Tangent};
pub use manifold::so3::SO3;
