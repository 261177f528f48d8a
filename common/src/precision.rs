use thiserror::Error;

use crate::asset::AssetClass;
use crate::constant::{PERP_MAX_DECIMALS, SPOT_MAX_DECIMALS};

/// Largest raw `szDecimals` accepted from a listing. Covers every token on
/// the venue (`weiDecimals <= 18`) with headroom.
const MAX_RAW_SZ_DECIMALS: i64 = 18;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PrecisionError {
    #[error("szDecimals {0} out of range for {1} asset")]
    InvalidInput(i64, AssetClass),
}

/// Price-precision budget for an asset class.
pub fn class_max_decimals(class: AssetClass) -> u32 {
    match class {
        AssetClass::Perp | AssetClass::PerpDex => PERP_MAX_DECIMALS,
        AssetClass::Spot => SPOT_MAX_DECIMALS,
    }
}

/// Derive price decimals from raw size decimals:
/// `max(0, class_max_decimals - sz_decimals)`.
///
/// Raw listing values outside `[0, 18]` are rejected, never defaulted.
pub fn resolve_px_decimals(class: AssetClass, sz_decimals: i64) -> Result<u32, PrecisionError> {
    if !(0..=MAX_RAW_SZ_DECIMALS).contains(&sz_decimals) {
        return Err(PrecisionError::InvalidInput(sz_decimals, class));
    }
    let budget = class_max_decimals(class) as i64;
    Ok((budget - sz_decimals).max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_holds_over_observed_range() {
        for sz in 0..=8i64 {
            assert_eq!(
                resolve_px_decimals(AssetClass::Perp, sz).unwrap(),
                (6 - sz).max(0) as u32
            );
            assert_eq!(
                resolve_px_decimals(AssetClass::PerpDex, sz).unwrap(),
                (6 - sz).max(0) as u32
            );
            assert_eq!(
                resolve_px_decimals(AssetClass::Spot, sz).unwrap(),
                (8 - sz).max(0) as u32
            );
        }
    }

    #[test]
    fn same_size_precision_differs_by_class() {
        assert_eq!(resolve_px_decimals(AssetClass::Spot, 2).unwrap(), 6);
        assert_eq!(resolve_px_decimals(AssetClass::Perp, 2).unwrap(), 4);
    }

    #[test]
    fn clamps_at_zero() {
        assert_eq!(resolve_px_decimals(AssetClass::Perp, 7).unwrap(), 0);
        assert_eq!(resolve_px_decimals(AssetClass::Spot, 12).unwrap(), 0);
    }

    #[test]
    fn rejects_out_of_range_input() {
        assert!(resolve_px_decimals(AssetClass::Perp, -1).is_err());
        assert!(resolve_px_decimals(AssetClass::Spot, 19).is_err());
    }
}
