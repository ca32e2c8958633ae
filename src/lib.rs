//! SkillLens candidate/project matching.
//!
//! A shared feature encoder ([`features`]) feeds a logistic-regression
//! classifier ([`model`]) both when training offline ([`training`]) and when
//! serving predictions over HTTP ([`web`]). GitHub repositories contribute a
//! complexity score ([`github`]) that can be blended into an overall fit
//! score ([`scoring`]).

/// Logging front-end used across the crate; forwards to `tracing`.
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}

pub mod core;
pub mod error;
pub mod features;
pub mod github;
pub mod model;
pub mod scoring;
pub mod template_processor;
pub mod trainer_cli;
pub mod training;
pub mod web;

pub use error::MatchError;
pub use features::{FeatureVector, RawRecord};
pub use model::{Prediction, SelectionModel};
pub use web::{build_context, build_rocket, start_web_server, AppContext};
