//! # CLI Command Implementations
//!
//! valgrade has a single command, the upgrade. Its arguments are defined
//! with `clap` in an `Args` struct that the top-level parser flattens, and
//! its `execute` function orchestrates the run by calling into the
//! `valgrade` library.

pub mod upgrade;
