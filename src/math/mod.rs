//! Numerical utilities: normal/lognormal probabilities, the logistic link, and
//! bisection root bracketing.

pub mod bisect;
pub mod logistic;
pub mod normal;

pub use bisect::*;
pub use logistic::*;
pub use normal::*;
