//! Argument model shared by all step variants.

mod args;

pub use args::CallArgs;
