//! Risk models.
//!
//! Each model is a set of small, pure functions over reference data and
//! validated artifacts:
//! - hedonic fair value V0 (`hedonic`)
//! - WOE/logistic structural risk (`structural`)
//! - GBM market risk and the safe-deposit solver (`market`)
//! - Monte-Carlo PD cross-check (`simulate`)

pub mod hedonic;
pub mod market;
pub mod simulate;
pub mod structural;

pub use hedonic::*;
pub use market::*;
pub use simulate::*;
pub use structural::*;
