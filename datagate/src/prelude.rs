//! Prelude for commonly used types and traits in datagate.

pub use crate::checkpoint::{Action, Checkpoint};
pub use crate::context::DataContext;
pub use crate::error::{GateError, Result};
pub use crate::expectations::{Rule, RuleStatus};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::logging::LogConfig;
pub use crate::result::ValidationResult;
pub use crate::runner::{CheckpointPlan, CheckpointRunner};
pub use crate::store::{ConfigStore, ConfigStoreExt, Reconciliation, RecordKind};
pub use crate::suite::ExpectationSuite;
pub use crate::validator::Validator;
