//! # engine::compliance
//!
//! A band is compliant only when its lower edge sits strictly above the
//! liquidation floor. The verdict drives a warning; it never blocks anything.

use crate::models::ComplianceStatus;

#[inline]
pub fn check_compliance(selected_lower: f64, liquidation_floor: f64) -> ComplianceStatus {
    ComplianceStatus {
        compliant: selected_lower > liquidation_floor,
        selected_lower,
        liquidation_floor,
        margin: selected_lower - liquidation_floor,
    }
}
