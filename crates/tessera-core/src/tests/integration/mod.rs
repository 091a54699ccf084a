#![cfg(test)]

pub mod common;
pub mod load_tests;
pub mod update_tests;
