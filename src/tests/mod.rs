//! Cross-module tests, compiled into the library test target.

pub mod common;

mod evolution_tests;
