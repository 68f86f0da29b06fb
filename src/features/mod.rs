//! Feature engineering for the forecasting pipeline

pub mod builder;

pub use builder::{FeatureBuilder, FeatureRow, MA_WINDOWS, VOL_WINDOW};
