//! 集成测试

mod integration_tests;
mod test_helpers;
