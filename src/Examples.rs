//! examples of usage of RustedPurifier
/// Equation purification examples
pub mod purification_examples;
