use crate::error::NotifyError;
use crate::notifier::ChatTransport;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Telegram 单条消息的最大长度
pub const MESSAGE_LIMIT: usize = 4096;

/// Telegram 机器人配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramBotConfig {
    pub api_base: String,
    pub bot_token: String,
    /// 默认会话
    pub chat_id: String,
    pub send_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub poll_timeout_secs: u64,
}

/// `setMyCommands` 的命令条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub text: Option<String>,
    pub chat: Chat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API 客户端
pub struct TelegramClient {
    config: TelegramBotConfig,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(config: TelegramBotConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn default_chat(&self) -> &str {
        &self.config.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn parse<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<Option<T>, NotifyError> {
        let body: ApiResponse<T> = response.json().await?;
        if body.ok {
            Ok(body.result)
        } else {
            Err(NotifyError::Api {
                method: method.to_string(),
                description: body.description.unwrap_or_else(|| "unknown error".into()),
            })
        }
    }

    /// 发送文本，超长时按行拆分为多条
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        for chunk in split_message(text, MESSAGE_LIMIT) {
            let response = self
                .client
                .post(self.method_url("sendMessage"))
                .timeout(Duration::from_secs(self.config.send_timeout_secs))
                .json(&json!({ "chat_id": chat_id, "text": chunk }))
                .send()
                .await?;

            Self::parse::<serde_json::Value>("sendMessage", response).await?;
        }

        debug!(chat_id = %chat_id, len = text.len(), "Telegram message sent");
        Ok(())
    }

    /// 以 multipart 上传文件
    pub async fn send_document(
        &self,
        chat_id: &str,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), NotifyError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "report".to_string());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .timeout(Duration::from_secs(self.config.upload_timeout_secs))
            .multipart(form)
            .send()
            .await?;

        Self::parse::<serde_json::Value>("sendDocument", response).await?;
        debug!(chat_id = %chat_id, path = %path.display(), "Telegram document sent");
        Ok(())
    }

    /// 长轮询获取更新
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, NotifyError> {
        let mut body = json!({
            "timeout": self.config.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(self.config.poll_timeout_secs + 5))
            .json(&body)
            .send()
            .await?;

        Ok(Self::parse::<Vec<Update>>("getUpdates", response)
            .await?
            .unwrap_or_default())
    }

    /// 注册命令菜单
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url("setMyCommands"))
            .timeout(Duration::from_secs(self.config.send_timeout_secs))
            .json(&json!({ "commands": commands }))
            .send()
            .await?;

        Self::parse::<serde_json::Value>("setMyCommands", response).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.send_message(chat_id, text).await
    }

    async fn send_file(
        &self,
        chat_id: &str,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), NotifyError> {
        self.send_document(chat_id, path, caption).await
    }
}

/// 按行拆分文本，每段不超过 `limit` 个 UTF-16 码元（Telegram 的计数方式）；单行超长时硬切
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(2);
    if utf16_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = utf16_len(line);

        if line_len > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(hard_split(line, limit));
            continue;
        }

        let extra = if current.is_empty() { line_len } else { line_len + 1 };
        if current_len + extra > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    if chunks.len() > 1 {
        warn!(parts = chunks.len(), "Message exceeds Telegram limit, split");
    }
    chunks
}

fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// 不拆开代理对
fn hard_split(line: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_len = 0;

    for c in line.chars() {
        let len = c.len_utf16();
        if piece_len + len > limit {
            pieces.push(std::mem::take(&mut piece));
            piece_len = 0;
        }
        piece.push(c);
        piece_len += len;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
