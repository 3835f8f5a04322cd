//! Systems module - prediction algorithms and the ECS systems serving them.

pub mod carrier;
pub mod debug;
pub mod intercept;
pub mod kinematics;
pub mod prediction;
pub mod probe;
pub mod requests;
