pub mod registry_tests;
pub mod scope_tests;
pub mod support;
