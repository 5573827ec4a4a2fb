//! cfg 模块 - 配置相关的公共设施
//!
//! - 配置到组件的转换宏
//! - 人类可读的时间间隔
//! - 外部 `KEY=VALUE` 日志配置文件

pub mod macros;
pub mod properties;
pub mod serde_duration;

pub use properties::ExternalConfig;
pub use serde_duration::HumanDur;
