//! Manifold representations for optimization on non-Euclidean spaces.
//!
//! This module provides the Lie groups needed to express a 3D similarity pose:
//! - **SO(3)**: Special Orthogonal group (rotations)
//! - **RxSO(3)**: Direct product of positive scalars and rotations
//! - **Sim(3)**: Similarity transformations (rotation, translation, uniform scale)
//! - **SE(2)**: Rigid transformations in 2D
//!
//! Lie group M,° | size   | dim | X ∈ M                   | Constraint        | T_E M              | Exp(T)              | Comp. | Action
//! ------------- | ------ | --- | ----------------------- | ----------------- | ------------------ | ------------------- | ----- | ------
//! Rotation      | SO(3),.| 3   | R                       | RᵀR = I           | [θ]x ∈ so(3)       | R = exp([θ]x)       | R₁R₂  | Rx
//! Rot. + scale  | RxSO(3)| 4   | sR                      | RᵀR = I, s > 0    | [θ]x + σI          | sR = exp([θ]x + σI) | s₁s₂R₁R₂ | sRx
//! Similarity    | Sim(3) | 7   | M = [sR t; 0 1]         | RᵀR = I, s > 0    | [v̂] ∈ sim(3)       | Exp([v̂])            | M₁M₂  | sRx+t
//! Rigid motion  | SE(2),.| 3   | M = [R t; 0 1]          | RᵀR = I           | [v̂] ∈ se(2)        | Exp([v̂])            | M₁M₂  | Rx+t
//!
//! The design is inspired by the [manif](https://github.com/artivis/manif) C++ library
//! and the Sophus Sim3 implementation, and provides:
//! - Analytic Jacobian computations for group operations (right perturbation model)
//! - Composition, inverse and relative (between) operations
//! - Exponential and logarithmic maps
//! - Retraction / local-coordinate charts for optimizers
//!
//! # Example
//!
//! ```rust
//! use apex_sim3::geometry::ScaledPose3;
//! use apex_sim3::manifold::{Chart, CoordinatesMode, LieGroup, Matrix7};
//! use apex_sim3::manifold::sim3::Sim3Tangent;
//! use nalgebra::Vector3;
//!
//! let pose = ScaledPose3::identity();
//! let delta = Sim3Tangent::new(Vector3::new(0.1, 0.0, 0.0), Vector3::new(0.0, 0.1, 0.0), 0.05);
//!
//! let perturbed = pose.retract(&delta, CoordinatesMode::Expmap).unwrap();
//! let mut jacobian = Matrix7::zeros();
//! let _relative = pose.between(&perturbed, Some(&mut jacobian), None);
//! ```

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use std::fmt::{self, Debug, Display, Formatter};
use thiserror::Error;

pub mod rxso3;
pub mod se2;
pub mod sim3;
pub mod so3;

/// 7-dimensional column vector (Sim(3) tangent coordinates).
pub type Vector7<T> = SVector<T, 7>;
/// 7×7 matrix (Sim(3) adjoint and Jacobians).
pub type Matrix7<T> = SMatrix<T, 7, 7>;
/// 3×7 matrix (point Jacobians with respect to a Sim(3) pose).
pub type Matrix3x7<T> = SMatrix<T, 3, 7>;
/// 1×7 row (scalar Jacobians with respect to a Sim(3) pose).
pub type RowVector7<T> = SMatrix<T, 1, 7>;

/// Chart used to move between a manifold element and its tangent space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatesMode {
    /// Lie group exponential map, traces out geodesics.
    #[default]
    Expmap,
    /// First-order approximation of the exponential map (not supported).
    FirstOrder,
}

impl Display for CoordinatesMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatesMode::Expmap => write!(f, "Expmap"),
            CoordinatesMode::FirstOrder => write!(f, "FirstOrder"),
        }
    }
}

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifoldError {
    /// Invalid tangent vector dimension
    #[error("Invalid tangent dimension: expected {expected}, got {actual}")]
    InvalidTangentDimension { expected: usize, actual: usize },
    /// Numerical instability in computation
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
    /// Invalid manifold element
    #[error("Invalid manifold element: {0}")]
    InvalidElement(String),
    /// Chart mode the element does not implement
    #[error("Unsupported coordinates mode: {0}")]
    UnsupportedChartMode(CoordinatesMode),
}

/// Result type for manifold operations.
pub type ManifoldResult<T> = Result<T, ManifoldError>;

/// Skew-symmetric matrix [v]× such that [v]× w = v × w.
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Core trait for Lie group operations.
///
/// This trait provides the fundamental operations for Lie groups, including:
/// - Group operations (composition, inverse, identity, between)
/// - The logarithmic map and the adjoint representation
/// - Random sampling and validity checks
///
/// Jacobians follow the right perturbation convention: for a function
/// `Y = f(X)`, the Jacobian `J` satisfies `f(X ∘ exp(δ)) ≈ f(X) ∘ exp(J δ)`.
///
/// # Dimensions
///
/// Three key dimensions characterize each Lie group:
/// - `DIM`: Space dimension - dimension of ambient space (e.g., 3 for Sim(3))
/// - `DOF`: Degrees of freedom - tangent space dimension (e.g., 7 for Sim(3))
/// - `REP_SIZE`: Representation size - underlying data size (e.g., 8 for Sim(3))
pub trait LieGroup: Clone + Debug + PartialEq + Sized {
    /// The tangent space vector type
    type TangentVector: Tangent<Self>;

    /// The Jacobian matrix type
    type JacobianMatrix: Clone + Debug + PartialEq;

    /// Associated Lie algebra type
    type LieAlgebra: Clone + Debug + PartialEq;

    /// Space dimension - dimension of the ambient space that the group acts on
    const DIM: usize;

    /// Degrees of freedom - dimension of the tangent space
    const DOF: usize;

    /// Representation size - size of the underlying data representation
    const REP_SIZE: usize;

    /// Get the identity element of the group.
    fn identity() -> Self;

    /// Compute the inverse of this element.
    ///
    /// # Arguments
    /// * `jacobian` - Optional mutable reference to store the Jacobian ∂(g⁻¹)/∂g
    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self;

    /// Compose this element with another (group multiplication).
    ///
    /// # Arguments
    /// * `other` - The right operand for composition
    /// * `jacobian_self` - Optional Jacobian ∂(g₁ ∘ g₂)/∂g₁
    /// * `jacobian_other` - Optional Jacobian ∂(g₁ ∘ g₂)/∂g₂
    fn compose(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self;

    /// Compute g₁⁻¹ ∘ g₂ (relative transformation).
    ///
    /// # Arguments
    /// * `other` - The target element g₂
    /// * `jacobian_self` - Optional Jacobian with respect to g₁
    /// * `jacobian_other` - Optional Jacobian with respect to g₂
    fn between(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self;

    /// Logarithmic map from the group to its tangent space.
    fn log(&self) -> Self::TangentVector;

    /// Adjoint matrix Ad(g).
    ///
    /// Ad(g) φ = log(g ∘ exp(φ^∧) ∘ g⁻¹)^∨.
    fn adjoint_map(&self) -> Self::JacobianMatrix;

    /// Generate a random element (useful for testing and initialization).
    fn random() -> Self;

    /// Check if the element is approximately on the manifold.
    fn is_valid(&self, tolerance: f64) -> bool;

    /// Check if two elements are approximately equal.
    fn is_approx(&self, other: &Self, tolerance: f64) -> bool;
}

/// Trait for Lie algebra operations.
///
/// # Type Parameters
///
/// - `G`: The associated Lie group type
pub trait Tangent<G: LieGroup>: Clone + Debug + PartialEq {
    /// Dimension of the tangent space (same as Lie group DOF)
    const DIM: usize = G::DOF;

    /// Exponential map to the Lie group: exp(φ^∧).
    fn exp(&self) -> G;

    /// Hat operator: φ^∧ (vector to matrix).
    fn hat(&self) -> G::LieAlgebra;

    /// Vee operator: φ^∨ (matrix to vector), the inverse of [`Tangent::hat`].
    fn vee(algebra: &G::LieAlgebra) -> Self;

    /// Lie bracket [self, other] = (self^∧ other^∧ − other^∧ self^∧)^∨.
    fn lie_bracket(&self, other: &Self) -> Self;

    /// Zero tangent vector.
    fn zero() -> Self;

    /// Random tangent vector (useful for testing).
    fn random() -> Self;

    /// Check if the tangent vector is approximately zero.
    fn is_zero(&self, tolerance: f64) -> bool;
}

/// Retraction / local-coordinates chart consumed by optimizers.
pub trait Chart: Sized {
    /// Tangent vector type of the chart
    type TangentVector;

    /// Move away from `self` along `delta` using the given chart.
    fn retract(&self, delta: &Self::TangentVector, mode: CoordinatesMode) -> ManifoldResult<Self>;

    /// Tangent vector that [`Chart::retract`] maps back onto `other`.
    fn local_coordinates(
        &self,
        other: &Self,
        mode: CoordinatesMode,
    ) -> ManifoldResult<Self::TangentVector>;
}
