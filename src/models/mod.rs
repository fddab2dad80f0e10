//! Domain models shared across the Range & Yield service.

pub mod controls;
pub mod market;
pub mod range;

pub use controls::{Controls, ControlsUpdate, RangeSelection, Theme};
pub use market::{Candle, Freshness, MarketSnapshot};
pub use range::{
    Bias, BiasSelection, ComplianceStatus, HorizonYield, RangeParameters, RiskParameters,
    YieldBasis, YieldProjection,
};
