//! daylog - 嵌入式按天滚动日志
//!
//! 面向应用进程内部的日志组件：模板格式化、类/包级别覆盖、
//! 单线程按天写文件、按天数或大小清理旧日志，以及 panic 时的排空。
//!
//! ## 模块
//!
//! - **log**: 日志系统（格式化、级别、文件写入、清理、panic 排空）
//! - **cfg**: 配置辅助（时间间隔、外部 `KEY=VALUE` 配置文件、转换宏）
//!
//! ## 设计理念
//!
//! - 📝 **显式上下文**: 通过 `LogManager` 传递，全局入口可选
//! - 🧵 **单写线程**: 生产者只短暂持锁，文件由唯一的线程写入
//! - 💥 **panic 排空**: 崩溃前写完所有已入队的日志

pub mod cfg;
pub mod log;

pub use crate::log::{LogError, LogLevel, LogManager, LogManagerConfig, Logger, LoggerIdentity};
