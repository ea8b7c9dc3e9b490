//! Transform types and operations.
//!
//! [`RigidTransform`] is the host-side value returned by registration;
//! [`VersorRigid3DTransform`] is its differentiable tensor form used while
//! optimizing.

pub mod trait_;
pub mod rigid;
pub mod versor;

pub use trait_::Transform;
pub use rigid::RigidTransform;
pub use versor::VersorRigid3DTransform;
