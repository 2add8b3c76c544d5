use fbox_notify::BotCommand;

/// 机器人命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 告警历史概要
    Summary,
    /// 导出最近 N 天的告警（0 = 全部）
    Export { days: u32 },
    /// 周报
    Weekly,
    Help,
}

impl Command {
    /// 解析消息文本
    ///
    /// 斜杠可省略、大小写不敏感，`/cmd@botname` 形式与下划线写法都接受，
    /// 旧的西班牙语命令名作为别名保留。
    pub fn parse(text: &str) -> Option<Command> {
        let token = text.split_whitespace().next()?;
        let token = token.strip_prefix('/').unwrap_or(token);
        let token = token.split('@').next().unwrap_or(token);
        let name = token.to_lowercase().replace('_', "-");

        match name.as_str() {
            "summary" | "resumen" => Some(Command::Summary),
            "summary-7-days" | "resumen7" => Some(Command::Export { days: 7 }),
            "summary-30-days" | "resumen30" => Some(Command::Export { days: 30 }),
            "summary-all" | "resumentodo" => Some(Command::Export { days: 0 }),
            "weekly" | "semanal" => Some(Command::Weekly),
            "help" | "ayuda" | "start" => Some(Command::Help),
            _ => None,
        }
    }
}

/// 注册到 Telegram 菜单的命令（Telegram 命令名只允许下划线）
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("summary", "Alert history summary"),
        BotCommand::new("summary_7_days", "Alert export, last 7 days"),
        BotCommand::new("summary_30_days", "Alert export, last 30 days"),
        BotCommand::new("summary_all", "Alert export, full history"),
        BotCommand::new("weekly", "Weekly statistics report"),
        BotCommand::new("help", "Show available commands"),
    ]
}

pub fn help_text() -> String {
    [
        "🤖 AVAILABLE COMMANDS",
        "━━━━━━━━━━━━━━━━━━━━━━━━",
        "/summary - Alert history summary",
        "/summary_7_days - Alert export, last 7 days",
        "/summary_30_days - Alert export, last 30 days",
        "/summary_all - Alert export, full history",
        "/weekly - Weekly statistics report",
        "/help - Show this help",
    ]
    .join("\n")
}

pub fn unknown_command_text(text: &str) -> String {
    format!(
        "❓ Unknown command: {}\nUse /help to see the available commands.",
        text.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/summary"), Some(Command::Summary));
        assert_eq!(Command::parse("SUMMARY"), Some(Command::Summary));
        assert_eq!(Command::parse("/summary-7-days"), Some(Command::Export { days: 7 }));
        assert_eq!(Command::parse("/summary_30_days"), Some(Command::Export { days: 30 }));
        assert_eq!(Command::parse("summary-all"), Some(Command::Export { days: 0 }));
        assert_eq!(Command::parse("  /Weekly  "), Some(Command::Weekly));
        assert_eq!(Command::parse("/help@fbox_bot"), Some(Command::Help));
    }

    #[test]
    fn test_parse_legacy_aliases() {
        assert_eq!(Command::parse("/resumen"), Some(Command::Summary));
        assert_eq!(Command::parse("/resumen7"), Some(Command::Export { days: 7 }));
        assert_eq!(Command::parse("/RESUMEN30"), Some(Command::Export { days: 30 }));
        assert_eq!(Command::parse("resumentodo"), Some(Command::Export { days: 0 }));
        assert_eq!(Command::parse("/semanal"), Some(Command::Weekly));
        assert_eq!(Command::parse("/ayuda"), Some(Command::Help));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse("/status"), None);
        assert_eq!(Command::parse(""), None);
        assert!(unknown_command_text(" /status ").contains("Unknown command: /status"));
    }

    #[test]
    fn test_menu_matches_parser() {
        for command in bot_commands() {
            assert!(Command::parse(&command.command).is_some(), "{}", command.command);
        }
        assert!(help_text().contains("/summary_7_days"));
    }
}
