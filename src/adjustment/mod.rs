pub mod descriptor;
pub mod engine;

pub use descriptor::{
    AdjustmentDescriptor, AdjustmentMode, AdjustmentRequest, Adjustments, Direction, Scope,
};
pub use engine::{Adjustable, AdjustmentEngine, compute_effective};
