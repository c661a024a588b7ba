//! Sim(3) - Similarity Transformations in 3D
//!
//! This module implements the Similarity group Sim(3), which represents
//! transformations including rotation, translation, and uniform scaling in 3D space.
//!
//! Sim(3) is the semi-direct product: (SO(3) × ℝ₊) ⋉ ℝ³
//!
//! Sim(3) elements are represented as (sR, t) where:
//! - sR ∈ RxSO(3): rotation and scale kept together
//! - t ∈ ℝ³: translation
//!
//! Sim(3) tangent elements are represented as [ρ(3), ω(3), σ(1)] = 7 components:
//! - ρ: translational component
//! - ω: rotational component (axis-angle)
//! - σ: logarithmic scale (log(s))
//!
//! The hat operator maps the tangent vector to the 4×4 matrix
//!
//! ```text
//!     ⎡ [ω]× + σI   ρ ⎤
//!     ⎣     0       0 ⎦
//! ```
//!
//! The exponential map is `Exp(ξ) = (e^σ Exp(ω), W(ω, σ) ρ)` with
//! `W = ∫₀¹ e^{στ} Exp(τω) dτ = C·I + A·[ω]× + B·[ω]×²`.
//! The coefficients are evaluated with moment series near θ = 0 so that
//! the round trip `Log(Exp(ξ)) = ξ` holds to machine precision for tiny
//! perturbations, and the logarithm uses the closed-form inverse
//! `W⁻¹ = x·I + y·[ω]× + z·[ω]×²`.
//!
//! # References
//! - Ethan Eade: "Lie Groups for Computer Vision" - https://www.ethaneade.com/lie.pdf
//! - Sophus library: sophus/sim3.hpp, sophus/sim_details.hpp

use crate::manifold::rxso3::RxSO3;
use crate::manifold::so3::SO3;
use crate::manifold::{skew, ManifoldError, ManifoldResult, Matrix7, Vector7};
use nalgebra::{DVector, Matrix3, Matrix4, Vector3};
use std::{
    fmt,
    fmt::{Display, Formatter},
    ops::{Mul, Neg},
};

/// Below this rotation angle the W coefficients come from the moment series.
pub const SMALL_ANGLE_THRESHOLD: f64 = 1e-2;

/// Moments ∫₀¹ e^{στ} τⁿ dτ are summed as a power series for |σ| up to this value.
const MOMENT_SERIES_LIMIT: f64 = 2.0;
const MOMENT_SERIES_TERMS: usize = 40;

/// Sim(3) group element representing similarity transformations in 3D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sim3 {
    /// Rotation and scale
    rxso3: RxSO3,
    /// Translation part
    translation: Vector3<f64>,
}

impl Display for Sim3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let t = self.translation;
        let q = self.rotation().quaternion();
        write!(
            f,
            "Sim3(translation: [{:.4}, {:.4}, {:.4}], scale: {:.4}, rotation: [w: {:.4}, x: {:.4}, y: {:.4}, z: {:.4}])",
            t.x,
            t.y,
            t.z,
            self.scale(),
            q.w,
            q.i,
            q.j,
            q.k
        )
    }
}

impl Sim3 {
    /// Space dimension - dimension of the ambient space
    pub const DIM: usize = 3;

    /// Degrees of freedom - dimension of the tangent space
    pub const DOF: usize = 7;

    /// Representation size - size of the underlying data representation
    pub const REP_SIZE: usize = 8;

    /// Get the identity element of the group.
    pub fn identity() -> Self {
        Sim3 {
            rxso3: RxSO3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Create a new Sim(3) element from rotation, translation, and scale.
    ///
    /// # Arguments
    /// * `rotation` - Rotation part
    /// * `translation` - Translation vector [x, y, z]
    /// * `scale` - Scale factor (must be positive)
    pub fn new(rotation: SO3, translation: Vector3<f64>, scale: f64) -> Self {
        Sim3 {
            rxso3: RxSO3::new(rotation, scale),
            translation,
        }
    }

    /// Create Sim(3) from an already validated rotation+scale block.
    pub fn from_parts(rxso3: RxSO3, translation: Vector3<f64>) -> Self {
        Sim3 { rxso3, translation }
    }

    /// Rebuild an element from a 4×4 homogeneous matrix `[sR t; 0 1]`.
    ///
    /// The scale is recovered as the cube root of det(sR).
    pub fn from_matrix(matrix: &Matrix4<f64>) -> ManifoldResult<Self> {
        let scaled_rotation: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let determinant = scaled_rotation.determinant();
        if !(determinant > 0.0 && determinant.is_finite()) {
            return Err(ManifoldError::InvalidElement(format!(
                "sR block must have a positive determinant, got {determinant}"
            )));
        }

        let scale = determinant.cbrt();
        let rotation = SO3::from_rotation_matrix(&(scaled_rotation / scale));
        let translation = matrix.fixed_view::<3, 1>(0, 3).into_owned();

        Ok(Sim3::new(rotation, translation, scale))
    }

    pub fn rxso3(&self) -> RxSO3 {
        self.rxso3
    }

    pub fn rotation(&self) -> SO3 {
        self.rxso3.rotation()
    }

    /// Get the rotation matrix (3x3).
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rxso3.rotation().rotation_matrix()
    }

    pub fn scale(&self) -> f64 {
        self.rxso3.scale()
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    /// Get the 4x4 homogeneous transformation matrix.
    pub fn matrix(&self) -> Matrix4<f64> {
        let (scaled_rotation, t) = (self.rxso3.matrix(), self.translation);
        let mut mat = Matrix4::identity();
        mat.fixed_view_mut::<3, 3>(0, 0).copy_from(&scaled_rotation);
        mat.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
        mat
    }

    /// g⁻¹ = ((sR)⁻¹, -(sR)⁻¹ t)
    pub fn inverse(&self) -> Self {
        let rxso3_inv = self.rxso3.inverse();
        Sim3 {
            rxso3: rxso3_inv,
            translation: -rxso3_inv.act(&self.translation),
        }
    }

    /// g1 ∘ g2 = (s1 s2 R1 R2, s1 R1 t2 + t1)
    pub fn compose(&self, other: &Self) -> Self {
        Sim3 {
            rxso3: self.rxso3 * other.rxso3,
            translation: self.rxso3.act(&other.translation) + self.translation,
        }
    }

    /// Group action on a point: s R x + t.
    pub fn act(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rxso3.act(point) + self.translation
    }

    /// Inverse group action on a point: Rᵀ (x - t) / s.
    pub fn inverse_act(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rxso3.inverse_act(&(point - self.translation))
    }

    /// Exponential map from the tangent space.
    pub fn exp(tangent: &Sim3Tangent) -> Self {
        let rho = tangent.rho();
        let omega = tangent.theta();
        let sigma = tangent.sigma();

        let coefficients = TranslationCoefficients::new(omega.norm(), sigma);
        let omega_rho = omega.cross(&rho);
        let translation = coefficients.c * rho
            + coefficients.a * omega_rho
            + coefficients.b * omega.cross(&omega_rho);

        Sim3 {
            rxso3: RxSO3::exp(&omega, sigma),
            translation,
        }
    }

    /// Logarithmic map to the tangent space.
    ///
    /// The rotation part lies on the principal branch |ω| ≤ π.
    pub fn log(&self) -> Sim3Tangent {
        let (omega, sigma) = self.rxso3.log();
        let theta = omega.norm();

        let coefficients = TranslationCoefficients::new(theta, sigma);
        let (x, y, z) = coefficients.inverse(theta);

        let t = self.translation;
        let omega_t = omega.cross(&t);
        let rho = x * t + y * omega_t + z * omega.cross(&omega_t);

        Sim3Tangent::new(rho, omega, sigma)
    }

    /// Adjoint matrix.
    ///
    /// ```text
    ///     ⎡ sR  [t]×R  -t ⎤
    ///     ⎢  0     R    0 ⎥
    ///     ⎣  0     0    1 ⎦
    /// ```
    pub fn adjoint(&self) -> Matrix7<f64> {
        let rotation_matrix = self.rotation_matrix();
        let mut adjoint_matrix = Matrix7::zeros();

        adjoint_matrix
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(self.scale() * rotation_matrix));
        adjoint_matrix
            .fixed_view_mut::<3, 3>(0, 3)
            .copy_from(&(skew(&self.translation) * rotation_matrix));
        adjoint_matrix
            .fixed_view_mut::<3, 1>(0, 6)
            .copy_from(&(-self.translation));
        adjoint_matrix
            .fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&rotation_matrix);
        adjoint_matrix[(6, 6)] = 1.0;

        adjoint_matrix
    }
}

impl Mul for Sim3 {
    type Output = Sim3;

    fn mul(self, rhs: Sim3) -> Sim3 {
        self.compose(&rhs)
    }
}

impl Mul<Vector3<f64>> for Sim3 {
    type Output = Vector3<f64>;

    fn mul(self, rhs: Vector3<f64>) -> Vector3<f64> {
        self.act(&rhs)
    }
}

/// Coefficients of W(ω, σ) = C·I + A·[ω]× + B·[ω]×².
#[derive(Clone, Copy, Debug)]
struct TranslationCoefficients {
    a: f64,
    b: f64,
    c: f64,
}

impl TranslationCoefficients {
    fn new(theta: f64, sigma: f64) -> Self {
        let theta_sq = theta * theta;

        if theta < SMALL_ANGLE_THRESHOLD {
            let m = scaled_moments(sigma);
            let theta_4 = theta_sq * theta_sq;
            return TranslationCoefficients {
                c: m[0],
                a: m[1] - theta_sq / 6.0 * m[3] + theta_4 / 120.0 * m[5],
                b: 0.5 * m[2] - theta_sq / 24.0 * m[4] + theta_4 / 720.0 * m[6],
            };
        }

        let c = exp_integral(sigma);
        let scale = sigma.exp();
        let a_term = scale * theta.sin();
        let b_term = scale * theta.cos();
        let denominator = theta_sq + sigma * sigma;

        TranslationCoefficients {
            c,
            a: (a_term * sigma + (1.0 - b_term) * theta) / (theta * denominator),
            b: (c - ((b_term - 1.0) * sigma + a_term * theta) / denominator) / theta_sq,
        }
    }

    /// Coefficients (x, y, z) of W⁻¹ = x·I + y·[ω]× + z·[ω]×².
    fn inverse(&self, theta: f64) -> (f64, f64, f64) {
        let theta_sq = theta * theta;
        let d = self.c - theta_sq * self.b;
        let determinant = d * d + theta_sq * self.a * self.a;

        let x = 1.0 / self.c;
        let y = -self.a / determinant;
        let z = (self.a * self.a - self.b * d) / (self.c * determinant);
        (x, y, z)
    }
}

/// (e^σ - 1) / σ, continuous at σ = 0.
fn exp_integral(sigma: f64) -> f64 {
    if sigma.abs() < f64::EPSILON {
        1.0 + 0.5 * sigma
    } else {
        sigma.exp_m1() / sigma
    }
}

/// Moments Mₙ(σ) = ∫₀¹ e^{στ} τⁿ dτ for n = 0..=6.
fn scaled_moments(sigma: f64) -> [f64; 7] {
    let mut moments = [0.0; 7];

    if sigma.abs() <= MOMENT_SERIES_LIMIT {
        // Mₙ = Σₖ σᵏ / (k! (k + n + 1))
        for (n, moment) in moments.iter_mut().enumerate() {
            let mut term = 1.0;
            let mut sum = 0.0;
            for k in 0..MOMENT_SERIES_TERMS {
                sum += term / (k + n + 1) as f64;
                term *= sigma / (k + 1) as f64;
            }
            *moment = sum;
        }
    } else {
        // Integration by parts: Mₙ = (e^σ - n Mₙ₋₁) / σ
        let scale = sigma.exp();
        moments[0] = exp_integral(sigma);
        for n in 1..moments.len() {
            moments[n] = (scale - n as f64 * moments[n - 1]) / sigma;
        }
    }

    moments
}

/// Sim(3) tangent space element.
///
/// Represented as [ρ(3), ω(3), σ(1)] where:
/// - ρ: translational component
/// - ω: rotational component (axis-angle)
/// - σ: logarithmic scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sim3Tangent {
    /// Internal data: [ρ_x, ρ_y, ρ_z, ω_x, ω_y, ω_z, σ]
    data: Vector7<f64>,
}

impl Display for Sim3Tangent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rho = self.rho();
        let theta = self.theta();
        write!(
            f,
            "sim3(rho: [{:.4}, {:.4}, {:.4}], theta: [{:.4}, {:.4}, {:.4}], sigma: {:.4})",
            rho.x,
            rho.y,
            rho.z,
            theta.x,
            theta.y,
            theta.z,
            self.sigma()
        )
    }
}

impl TryFrom<&DVector<f64>> for Sim3Tangent {
    type Error = ManifoldError;

    fn try_from(data_vector: &DVector<f64>) -> Result<Self, Self::Error> {
        if data_vector.len() != Sim3::DOF {
            return Err(ManifoldError::InvalidTangentDimension {
                expected: Sim3::DOF,
                actual: data_vector.len(),
            });
        }
        Ok(Sim3Tangent {
            data: Vector7::from_iterator(data_vector.iter().copied()),
        })
    }
}

impl From<Sim3Tangent> for DVector<f64> {
    fn from(tangent: Sim3Tangent) -> Self {
        DVector::from_column_slice(tangent.data.as_slice())
    }
}

impl Neg for Sim3Tangent {
    type Output = Sim3Tangent;

    fn neg(self) -> Sim3Tangent {
        Sim3Tangent { data: -self.data }
    }
}

impl Mul<f64> for Sim3Tangent {
    type Output = Sim3Tangent;

    fn mul(self, rhs: f64) -> Sim3Tangent {
        Sim3Tangent {
            data: self.data * rhs,
        }
    }
}

impl Sim3Tangent {
    /// Create a new Sim3Tangent from components.
    pub fn new(rho: Vector3<f64>, theta: Vector3<f64>, sigma: f64) -> Self {
        let mut data = Vector7::zeros();
        data.fixed_rows_mut::<3>(0).copy_from(&rho);
        data.fixed_rows_mut::<3>(3).copy_from(&theta);
        data[6] = sigma;
        Sim3Tangent { data }
    }

    pub fn from_vector(data: Vector7<f64>) -> Self {
        Sim3Tangent { data }
    }

    /// The seven coordinates as a column vector.
    pub fn coeffs(&self) -> Vector7<f64> {
        self.data
    }

    /// Get the ρ (translational) part.
    pub fn rho(&self) -> Vector3<f64> {
        self.data.fixed_rows::<3>(0).into_owned()
    }

    /// Get the ω (rotational) part.
    pub fn theta(&self) -> Vector3<f64> {
        self.data.fixed_rows::<3>(3).into_owned()
    }

    /// Get the σ (logarithmic scale) part.
    pub fn sigma(&self) -> f64 {
        self.data[6]
    }

    /// i-th standard basis vector of the tangent space.
    ///
    /// # Panics
    /// If `i >= 7`.
    pub fn basis(i: usize) -> Self {
        assert!(i < Sim3::DOF, "Sim(3) only has generators for indices 0-6");
        let mut data = Vector7::zeros();
        data[i] = 1.0;
        Sim3Tangent { data }
    }

    /// i-th generator of the Lie algebra, `hat(e_i)`.
    pub fn generator(i: usize) -> Matrix4<f64> {
        Self::basis(i).hat()
    }

    /// Hat operator: maps tangent vector to Lie algebra matrix (4x4).
    pub fn hat(&self) -> Matrix4<f64> {
        let mut lie_alg = Matrix4::zeros();
        let block = skew(&self.theta()) + self.sigma() * Matrix3::identity();
        lie_alg.fixed_view_mut::<3, 3>(0, 0).copy_from(&block);
        lie_alg.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.rho());
        lie_alg
    }

    /// Vee operator, inverse of [`Sim3Tangent::hat`].
    ///
    /// σ is read from the diagonal, ω from the antisymmetric entries.
    pub fn vee(algebra: &Matrix4<f64>) -> Self {
        Sim3Tangent::new(
            Vector3::new(algebra[(0, 3)], algebra[(1, 3)], algebra[(2, 3)]),
            Vector3::new(algebra[(2, 1)], algebra[(0, 2)], algebra[(1, 0)]),
            algebra[(0, 0)],
        )
    }

    /// Lie bracket [a, b] = vee(hat(a) hat(b) - hat(b) hat(a)).
    ///
    /// ρ = ω_a × ρ_b - ω_b × ρ_a + σ_a ρ_b - σ_b ρ_a, ω = ω_a × ω_b, σ = 0
    pub fn lie_bracket(&self, other: &Self) -> Self {
        let (rho_a, omega_a, sigma_a) = (self.rho(), self.theta(), self.sigma());
        let (rho_b, omega_b, sigma_b) = (other.rho(), other.theta(), other.sigma());

        Sim3Tangent::new(
            omega_a.cross(&rho_b) - omega_b.cross(&rho_a) + sigma_a * rho_b - sigma_b * rho_a,
            omega_a.cross(&omega_b),
            0.0,
        )
    }

    /// Matrix of the bracket with this vector: column i is `[e_i, self]`,
    /// so `bracket_map() * y == [y, self]`.
    pub fn bracket_map(&self) -> Matrix7<f64> {
        let mut map = Matrix7::zeros();
        for i in 0..Sim3::DOF {
            map.set_column(i, &Self::basis(i).lie_bracket(self).data);
        }
        map
    }

    /// `bracket_map(self) * y`, with the Jacobian with respect to `self`.
    ///
    /// Column i of the Jacobian is `bracket_map(e_i) * y`.
    pub fn adjoint(&self, y: &Sim3Tangent, jacobian: Option<&mut Matrix7<f64>>) -> Sim3Tangent {
        if let Some(jac) = jacobian {
            for i in 0..Sim3::DOF {
                jac.set_column(i, &(Self::basis(i).bracket_map() * y.data));
            }
        }
        Sim3Tangent::from_vector(self.bracket_map() * y.data)
    }

    /// `bracket_map(self)ᵀ * y`, with the Jacobian with respect to `self`.
    pub fn adjoint_transpose(
        &self,
        y: &Sim3Tangent,
        jacobian: Option<&mut Matrix7<f64>>,
    ) -> Sim3Tangent {
        if let Some(jac) = jacobian {
            for i in 0..Sim3::DOF {
                jac.set_column(i, &(Self::basis(i).bracket_map().transpose() * y.data));
            }
        }
        Sim3Tangent::from_vector(self.bracket_map().transpose() * y.data)
    }

    /// Matrix exponential of `hat(self)` by a Taylor series truncated after
    /// `terms` terms.
    ///
    /// # Errors
    /// `NumericalInstability` when the partial sum overflows, which happens
    /// for tangents far outside the range the series can represent.
    pub fn expm(&self, terms: usize) -> ManifoldResult<Sim3> {
        let algebra = self.hat();
        let mut result = Matrix4::<f64>::identity();
        let mut term = Matrix4::identity();
        for k in 1..terms {
            term = term * algebra / k as f64;
            result += term;
        }

        if result.iter().any(|value| !value.is_finite()) {
            return Err(ManifoldError::NumericalInstability(format!(
                "matrix series over {terms} terms is not finite"
            )));
        }
        Sim3::from_matrix(&result)
    }

    pub fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        (self.data - other.data).norm() < tolerance
    }
}
