//! Differentiable versor rigid transform.
//!
//! Tensor form of [`RigidTransform`] used inside the registration loop. The
//! six parameters live in a single `[6]` tensor so the metric gradient with
//! respect to all of them comes out of one backward pass.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::rigid::RigidTransform;
use super::trait_::Transform;

/// Versor rigid transform over a `[6]` parameter tensor.
///
/// Parameters are `(vx, vy, vz, tx, ty, tz)`; the quaternion scalar part is
/// `w = sqrt(1 - |v|²)`. Maps `T(x) = R(x - c) + c + t` with a fixed center.
#[derive(Debug, Clone)]
pub struct VersorRigid3DTransform<B: Backend> {
    parameters: Tensor<B, 1>,
    center: Tensor<B, 1>,
}

impl<B: Backend> VersorRigid3DTransform<B> {
    /// Create a transform from a `[6]` parameter tensor and a `[3]` center.
    pub fn new(parameters: Tensor<B, 1>, center: Tensor<B, 1>) -> Self {
        Self { parameters, center }
    }

    /// Tensor form of a host transform.
    pub fn from_rigid(transform: &RigidTransform, device: &B::Device) -> Self {
        let p = transform.parameters();
        let parameters = Tensor::<B, 1>::from_floats(
            [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32, p[4] as f32, p[5] as f32],
            device,
        );
        let center = Tensor::<B, 1>::from_floats(transform.center().to_f32_array(), device);
        Self::new(parameters, center)
    }

    /// Build the rotation matrix from the versor.
    ///
    /// A versor part longer than 1 is divided by its length first, the same
    /// projection [`RigidTransform::from_parameters`] applies.
    fn build_rotation_matrix(&self) -> Tensor<B, 2> {
        let v = self.parameters.clone().slice([0..3]);
        // Clamping the squared norm keeps the sqrt gradient finite at v = 0.
        let length = v.clone().mul(v.clone()).sum().clamp_min(1.0).sqrt();
        let v = v.div(length);

        let x = v.clone().slice([0..1]);
        let y = v.clone().slice([1..2]);
        let z = v.slice([2..3]);

        let xx = x.clone().mul(x.clone());
        let yy = y.clone().mul(y.clone());
        let zz = z.clone().mul(z.clone());

        // The clamp keeps the sqrt differentiable when |v| approaches 1.
        let w = (xx.clone() + yy.clone() + zz.clone())
            .neg()
            .add_scalar(1.0)
            .clamp(1e-12, 1.0)
            .sqrt();

        let xy = x.clone().mul(y.clone());
        let xz = x.clone().mul(z.clone());
        let yz = y.clone().mul(z.clone());
        let xw = x.mul(w.clone());
        let yw = y.mul(w.clone());
        let zw = z.mul(w);

        let r11 = (yy.clone() + zz.clone()).mul_scalar(-2.0).add_scalar(1.0);
        let r12 = (xy.clone() - zw.clone()).mul_scalar(2.0);
        let r13 = (xz.clone() + yw.clone()).mul_scalar(2.0);

        let r21 = (xy + zw).mul_scalar(2.0);
        let r22 = (xx.clone() + zz).mul_scalar(-2.0).add_scalar(1.0);
        let r23 = (yz.clone() - xw.clone()).mul_scalar(2.0);

        let r31 = (xz - yw).mul_scalar(2.0);
        let r32 = (yz + xw).mul_scalar(2.0);
        let r33 = (xx + yy).mul_scalar(-2.0).add_scalar(1.0);

        let row1 = Tensor::cat(vec![r11, r12, r13], 0).reshape([1, 3]);
        let row2 = Tensor::cat(vec![r21, r22, r23], 0).reshape([1, 3]);
        let row3 = Tensor::cat(vec![r31, r32, r33], 0).reshape([1, 3]);

        Tensor::cat(vec![row1, row2, row3], 0)
    }
}

impl<B: Backend> Transform<B> for VersorRigid3DTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let r = self.build_rotation_matrix();
        let t = self.parameters.clone().slice([3..6]).reshape([1, 3]);
        let c = self.center.clone().reshape([1, 3]);

        let centered = points - c.clone();
        centered.matmul(r.transpose()) + c + t
    }
}
