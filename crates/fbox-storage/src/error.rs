use std::path::PathBuf;
use thiserror::Error;

/// 状态文件读写错误
///
/// 只在存储内部传递，对外的读操作退回默认值、写操作记录日志。
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
