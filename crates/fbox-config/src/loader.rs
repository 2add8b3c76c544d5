use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::FboxConfig;

/// 旧部署使用的环境变量名 → 配置键
const LEGACY_ENV: &[(&str, &str)] = &[
    ("BOT_TOKEN", "telegram.bot_token"),
    ("CHAT_ID", "telegram.chat_id"),
    ("FBOX_SSID", "api.ssid"),
    ("FBOX_ADMIN_TOKEN", "api.admin_token"),
    ("DROPBOX_PATH", "storage.data_dir"),
];

/// 配置加载器
///
/// 层次：默认值 < TOML 文件 < `FBOX__` 前缀环境变量 < 旧环境变量名。
pub struct ConfigLoader {
    config_path: PathBuf,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// 使用默认路径 `config/fbox.toml`
    pub fn new() -> Self {
        Self::with_file("config/fbox.toml")
    }

    pub fn with_file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            env: None,
        }
    }

    /// 以给定的变量表代替进程环境（测试用）
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// 读取进程环境
    pub fn from_process_env(mut self) -> Self {
        self.env = Some(std::env::vars().collect());
        self
    }

    /// 加载配置；文件不存在时使用默认值
    pub fn load(&self) -> Result<FboxConfig> {
        let mut builder = Config::builder();

        if self.config_path.exists() {
            builder = builder.add_source(File::new(
                self.config_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ));
        }

        let env = self.env.clone().unwrap_or_default();

        builder = builder.add_source(
            Environment::with_prefix("FBOX")
                .separator("__")
                .source(Some(env.clone())),
        );

        for (name, key) in LEGACY_ENV {
            let value = env
                .get(*name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 加载并校验凭据；缺失凭据是唯一的致命错误
    pub fn validate(&self) -> Result<FboxConfig> {
        let config = self.load()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
