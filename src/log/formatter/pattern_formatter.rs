use crate::log::log_record::LogEvent;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use smart_default::SmartDefault;
use std::fmt::Write;

/// 调用点等信息缺失时的占位文本
pub const UNKNOWN: &str = "Unknow";

/// 平台换行符
pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// `%T` 的固定宽度
const TAG_WIDTH: usize = 15;

/// PatternFormatter 配置
#[derive(Debug, Clone, Deserialize, SmartDefault, PartialEq)]
#[serde(default)]
pub struct PatternFormatterConfig {
    /// 日志模板
    #[default = "[%c][%M]%m%n"]
    pub pattern: String,

    /// 日志 TAG
    #[default = "daylog"]
    pub tag: String,

    /// `%d` 使用的时间格式（strftime 语法）
    #[default = "%Y-%m-%d %H:%M:%S%.3f"]
    pub time_format: String,

    /// 应用标识，用于 `%p`
    pub app_id: String,
}

/// 模板格式化器
///
/// 模板由普通文本和两字符指令组成，指令如下：
///
/// | 指令 | 含义 |
/// |------|------|
/// | `%T` | TAG，左对齐补齐到 15 个字符 |
/// | `%d` | 时间 |
/// | `%c` | 简单类名 |
/// | `%C` | 完整类名 |
/// | `%p` | 应用标识 |
/// | `%t` | 线程名 |
/// | `%L` | 单字母级别 |
/// | `%f` | 文件名 |
/// | `%M` | 函数名 |
/// | `%l` | 行号，右对齐宽度 4 |
/// | `%m` | 日志内容（含错误跟踪，续行使用悬挂缩进） |
/// | `%n` | 换行 |
///
/// 无法识别的指令直接丢弃。
pub struct PatternFormatter {
    config: PatternFormatterConfig,
}

impl PatternFormatter {
    pub fn new(config: PatternFormatterConfig) -> Self {
        Self { config }
    }

    pub fn pattern(&self) -> &str {
        &self.config.pattern
    }

    /// 使用配置中的模板渲染日志事件
    pub fn render_event(&self, event: &LogEvent) -> String {
        self.render(&self.config.pattern, event)
    }

    /// 使用指定模板渲染日志事件
    pub fn render(&self, template: &str, event: &LogEvent) -> String {
        if !template.contains('%') {
            return template.to_string();
        }

        let mut out = String::with_capacity(template.len() + event.message.len() + 64);
        let mut rest = template;

        while let Some(index) = rest.find('%') {
            out.push_str(&rest[..index]);
            let after = &rest[index + 1..];
            match after.chars().next() {
                Some(directive) => {
                    self.expand(directive, event, &mut out);
                    rest = &after[directive.len_utf8()..];
                }
                None => rest = "",
            }
        }
        out.push_str(rest);

        out
    }

    fn expand(&self, directive: char, event: &LogEvent, out: &mut String) {
        let site = event.call_site.as_ref();
        match directive {
            'T' => {
                let _ = write!(out, "{:<width$}", self.config.tag, width = TAG_WIDTH);
            }
            'd' => {
                let _ = write!(out, "{}", event.timestamp.format(&self.config.time_format));
            }
            'c' => out.push_str(
                site.map(|s| s.simple_class_name())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNKNOWN),
            ),
            'C' => out.push_str(
                site.map(|s| s.class_name.as_str())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNKNOWN),
            ),
            'p' => {
                if self.config.app_id.is_empty() {
                    out.push_str(UNKNOWN);
                } else {
                    out.push_str(&self.config.app_id);
                }
            }
            't' => out.push_str(&event.thread_name),
            'L' => out.push_str(event.level.code()),
            'f' => out.push_str(site.map(|s| s.file_name()).unwrap_or(UNKNOWN)),
            'M' => out.push_str(site.and_then(|s| s.method.as_deref()).unwrap_or(UNKNOWN)),
            'l' => match site {
                Some(s) => {
                    let _ = write!(out, "{:>4}", s.line);
                }
                None => out.push_str(UNKNOWN),
            },
            'm' => {
                // 错误跟踪的续行以 %m 之前已渲染的内容作为前缀
                let header = out.clone();
                out.push_str(&event.message);
                if let Some(error) = &event.error {
                    out.push_str(LINE_ENDING);
                    for (i, line) in error.lines().enumerate() {
                        if i > 0 {
                            out.push_str(LINE_ENDING);
                            out.push_str(&header);
                        }
                        out.push_str(line);
                    }
                }
            }
            'n' => out.push_str(LINE_ENDING),
            _ => {}
        }
    }
}

/// 校验 strftime 时间格式
pub fn validate_time_format(format: &str) -> Result<(), String> {
    if format.is_empty() {
        return Err("time format is empty".to_string());
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid time format: {}", format));
    }
    Ok(())
}

crate::impl_from!(PatternFormatterConfig => PatternFormatter);
