//! 外部 `KEY=VALUE` 日志配置文件
//!
//! ```text
//! # 注释
//! LOG_TAG=demo
//! LOG_LEVEL=debug
//! TIME_FORMAT=%H:%M:%S
//! TERMINAL_LOG_FORMAT=[%c][%M]%m%n
//! FILE_LOG_FORMAT=%d %L %m%n
//! PACKAGE_LOG_LEVEL=app::net:warn
//! CLASS_LOG_LEVEL=app::net::Client:debug
//! ```
//!
//! 无法解析的行会被报告并跳过，不会导致初始化失败。

use crate::log::error::ConfigLineError;
use crate::log::formatter::validate_time_format;
use crate::log::level::LogLevel;
use crate::log::level_resolver::LevelOverride;
use crate::log::manager::LogManagerConfig;
use anyhow::{Context, Result};
use std::path::Path;

pub const KEY_TAG: &str = "LOG_TAG";
pub const KEY_LEVEL: &str = "LOG_LEVEL";
pub const KEY_TIME_FORMAT: &str = "TIME_FORMAT";
pub const KEY_TERMINAL_FORMAT: &str = "TERMINAL_LOG_FORMAT";
pub const KEY_FILE_FORMAT: &str = "FILE_LOG_FORMAT";
pub const KEY_PACKAGE_LEVEL: &str = "PACKAGE_LOG_LEVEL";
pub const KEY_CLASS_LEVEL: &str = "CLASS_LOG_LEVEL";

/// 解析后的外部配置，未出现的键为 None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalConfig {
    pub tag: Option<String>,
    pub level: Option<LogLevel>,
    pub time_format: Option<String>,
    pub terminal_format: Option<String>,
    pub file_format: Option<String>,
    pub overrides: Vec<LevelOverride>,
    pub errors: Vec<ConfigLineError>,
}

impl ExternalConfig {
    /// 读取配置文件，文件不存在时返回 None
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "external log config not found");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", path.display()));
            }
        };
        Ok(Some(Self::parse_str(&text)))
    }

    /// 解析配置文本
    pub fn parse_str(text: &str) -> Self {
        let mut config = Self::default();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(reason) = config.parse_line(line) {
                let error = ConfigLineError {
                    line_no: index + 1,
                    line: line.to_string(),
                    reason,
                };
                tracing::warn!(%error, "invalid external log config line skipped");
                config.errors.push(error);
            }
        }
        config
    }

    fn parse_line(&mut self, line: &str) -> std::result::Result<(), String> {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| "missing '='".to_string())?;
        let (key, value) = (key.trim(), value.trim());
        if value.is_empty() {
            return Err(format!("empty value for {}", key));
        }

        match key {
            KEY_TAG => self.tag = Some(value.to_string()),
            KEY_LEVEL => self.level = Some(value.parse()?),
            KEY_TIME_FORMAT => {
                validate_time_format(value)?;
                self.time_format = Some(value.to_string());
            }
            KEY_TERMINAL_FORMAT => self.terminal_format = Some(value.to_string()),
            KEY_FILE_FORMAT => self.file_format = Some(value.to_string()),
            KEY_PACKAGE_LEVEL => {
                let (name, level) = split_scoped_level(value)?;
                self.overrides.push(LevelOverride::package(name, level));
            }
            KEY_CLASS_LEVEL => {
                let (name, level) = split_scoped_level(value)?;
                self.overrides.push(LevelOverride::class(name, level));
            }
            _ => return Err(format!("unknown key {}", key)),
        }
        Ok(())
    }

    /// 用文件中的值覆盖初始化配置，级别覆盖项追加在后面
    pub fn apply_to(&self, config: &mut LogManagerConfig) {
        if let Some(tag) = &self.tag {
            config.tag = tag.clone();
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(time_format) = &self.time_format {
            config.time_format = time_format.clone();
        }
        if let Some(format) = &self.terminal_format {
            config.terminal_format = format.clone();
        }
        if let Some(format) = &self.file_format {
            config.file_format = format.clone();
        }
        config.level_overrides.extend(self.overrides.iter().cloned());
    }
}

// 在最后一个冒号处拆分，名字本身可以包含 `::`
fn split_scoped_level(value: &str) -> std::result::Result<(String, LogLevel), String> {
    let (name, level) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected name:level, got {}", value))?;
    let name = name.trim();
    if name.is_empty() || name.ends_with(':') {
        return Err(format!("expected name:level, got {}", value));
    }
    Ok((name.to_string(), level.trim().parse()?))
}
