use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};

/// 日志文件后缀
pub const LOG_FILE_SUFFIX: &str = ".log";

/// 日期键格式，定长且高位在前，字典序即日期序
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// 按天切分的日志文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub date_key: String,
}

impl LogFile {
    /// 某一天对应的日志文件
    pub fn for_day(dir: &Path, day: NaiveDate) -> Self {
        let date_key = date_key(day);
        let path = dir.join(format!("{}{}", date_key, LOG_FILE_SUFFIX));
        Self { path, date_key }
    }

    /// 从路径识别日志文件，文件名不以 `.log` 结尾时返回 None
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let date_key = name.strip_suffix(LOG_FILE_SUFFIX)?.to_string();
        Some(Self { path, date_key })
    }
}

/// 格式化日期键
pub fn date_key(day: NaiveDate) -> String {
    day.format(DATE_KEY_FORMAT).to_string()
}

/// 列出目录下的全部日志文件，按文件名升序
///
/// 目录不存在时返回空列表
pub fn list_log_files(dir: &Path) -> io::Result<Vec<LogFile>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(file) = LogFile::from_path(entry.path()) {
            files.push(file);
        }
    }
    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    Ok(files)
}
