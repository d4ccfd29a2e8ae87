pub mod item;
pub mod ltv;

pub use item::{fine_weight, CollateralItem, CollateralSummary, MetalRates};
pub use ltv::LtvCalculator;
