//! 配置类型到组件的转换宏

/// 为配置类型实现 `From<Config> for Component`，调用 `Component::new(config)`
///
/// 用法：`impl_from!(FileSinkConfig => FileSink)`
#[macro_export]
macro_rules! impl_from {
    ($config_type:ty => $target_type:ty) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config)
            }
        }
    };
}
