//! # Services
//!
//! Stateful orchestrators of this component.

pub mod intermediate_results;
pub mod scr_preprocessor;

pub use intermediate_results::IntermediateResultsProcessor;
pub use scr_preprocessor::SmartContractResultPreprocessor;
