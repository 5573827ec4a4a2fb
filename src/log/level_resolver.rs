use crate::log::level::LogLevel;
use serde::Deserialize;

/// Logger 身份
///
/// `full_name` 为类型路径或模块路径，`package` 为去掉最后一段后的路径。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoggerIdentity {
    pub full_name: String,
    pub package: String,
}

impl LoggerIdentity {
    pub fn new(full_name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            package: package.into(),
        }
    }

    /// 从路径推导身份，例如 `app::net::Client` 的包为 `app::net`
    pub fn from_path(path: impl Into<String>) -> Self {
        let full_name = path.into();
        // 泛型参数里也可能有 `::`，先截掉
        let base = full_name.split('<').next().unwrap_or(&full_name);
        let package = base
            .rsplit_once("::")
            .map(|(package, _)| package.to_string())
            .unwrap_or_default();
        Self { full_name, package }
    }

    /// 以类型名作为身份
    pub fn of<T: ?Sized>() -> Self {
        Self::from_path(std::any::type_name::<T>())
    }
}

/// 级别覆盖的作用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideScope {
    Class,
    Package,
}

/// 级别覆盖项
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelOverride {
    pub scope: OverrideScope,
    #[serde(rename = "key")]
    pub match_key: String,
    pub level: LogLevel,
}

impl LevelOverride {
    pub fn class(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            scope: OverrideScope::Class,
            match_key: name.into(),
            level,
        }
    }

    pub fn package(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            scope: OverrideScope::Package,
            match_key: name.into(),
            level,
        }
    }
}

/// 有效级别解析器
///
/// 查找顺序：类覆盖 > 包覆盖 > 全局级别，均为精确匹配，先注册者优先。
#[derive(Debug, Clone)]
pub struct LevelResolver {
    global: LogLevel,
    class_levels: Vec<(String, LogLevel)>,
    package_levels: Vec<(String, LogLevel)>,
}

impl LevelResolver {
    pub fn new(global: LogLevel) -> Self {
        Self {
            global,
            class_levels: Vec::new(),
            package_levels: Vec::new(),
        }
    }

    pub fn with_overrides<'a>(
        global: LogLevel,
        overrides: impl IntoIterator<Item = &'a LevelOverride>,
    ) -> Self {
        let mut resolver = Self::new(global);
        for item in overrides {
            resolver.add_override(item.clone());
        }
        resolver
    }

    /// 追加覆盖项，重复的 key 保留在后面，不会影响先注册的结果
    pub fn add_override(&mut self, item: LevelOverride) {
        match item.scope {
            OverrideScope::Class => self.class_levels.push((item.match_key, item.level)),
            OverrideScope::Package => self.package_levels.push((item.match_key, item.level)),
        }
    }

    pub fn global(&self) -> LogLevel {
        self.global
    }

    /// 解析有效级别
    pub fn resolve(&self, identity: &LoggerIdentity) -> LogLevel {
        if let Some((_, level)) = self
            .class_levels
            .iter()
            .find(|(name, _)| *name == identity.full_name)
        {
            return *level;
        }
        if let Some((_, level)) = self
            .package_levels
            .iter()
            .find(|(name, _)| *name == identity.package)
        {
            return *level;
        }
        self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn test_identity_from_path() {
        let identity = LoggerIdentity::from_path("app::net::Client");
        assert_eq!(identity.full_name, "app::net::Client");
        assert_eq!(identity.package, "app::net");

        let identity = LoggerIdentity::from_path("main");
        assert_eq!(identity.package, "");

        let identity = LoggerIdentity::from_path("app::Cache<std::string::String>");
        assert_eq!(identity.package, "app");
    }

    #[test]
    fn test_identity_of_type() {
        let identity = LoggerIdentity::of::<Marker>();
        assert!(identity.full_name.ends_with("level_resolver::tests::Marker"));
        assert!(identity.package.ends_with("level_resolver::tests"));
    }

    #[test]
    fn test_global_level_when_no_override() {
        let resolver = LevelResolver::new(LogLevel::Info);
        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::x::Y")),
            LogLevel::Info
        );
    }

    #[test]
    fn test_class_beats_package() {
        let resolver = LevelResolver::with_overrides(
            LogLevel::Info,
            &[
                LevelOverride::package("app::net", LogLevel::Warn),
                LevelOverride::class("app::net::Client", LogLevel::Debug),
            ],
        );
        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::net::Client")),
            LogLevel::Debug
        );
        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::net::Server")),
            LogLevel::Warn
        );
        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::db::Pool")),
            LogLevel::Info
        );
    }

    #[test]
    fn test_package_match_is_exact() {
        let resolver = LevelResolver::with_overrides(
            LogLevel::Info,
            &[LevelOverride::package("app", LogLevel::Error)],
        );
        // 子包不继承父包的覆盖
        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::net::Client")),
            LogLevel::Info
        );
        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::Main")),
            LogLevel::Error
        );
    }

    #[test]
    fn test_first_registered_wins() {
        let mut resolver = LevelResolver::new(LogLevel::Info);
        resolver.add_override(LevelOverride::class("app::A", LogLevel::Warn));
        resolver.add_override(LevelOverride::class("app::A", LogLevel::Verbose));
        resolver.add_override(LevelOverride::package("app", LogLevel::Error));
        resolver.add_override(LevelOverride::package("app", LogLevel::Debug));

        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::A")),
            LogLevel::Warn
        );
        assert_eq!(
            resolver.resolve(&LoggerIdentity::from_path("app::B")),
            LogLevel::Error
        );
    }

    #[test]
    fn test_override_deserialize() {
        let item: LevelOverride =
            serde_json::from_str(r#"{"scope": "package", "key": "app::net", "level": "warn"}"#)
                .unwrap();
        assert_eq!(item, LevelOverride::package("app::net", LogLevel::Warn));
    }
}
