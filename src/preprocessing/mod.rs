//! Data preparation ahead of evaluation
//!
//! - [`LabelEncoder`]: categorical columns to integer codes
//! - [`StandardScaler`]: z-score scaling fitted on the training partition

mod encoder;
mod scaler;

pub use encoder::LabelEncoder;
pub use scaler::StandardScaler;
