// ==========================================
// 集成测试公共模块
// ==========================================
#![allow(dead_code)]

pub mod mock_proposer;
pub mod test_data_builder;
