//! examples of usage of RustedAutoDiff
/// derivative structures: construction, arithmetic, functions, Taylor expansion
pub mod derivative_examples;
