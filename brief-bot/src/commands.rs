//! Command parsing and dispatch

use tracing::info;

use brief_services::DigestBuilder;

use crate::telegram::TelegramClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Brief,
    Geo,
    Market,
    Tech,
    Liqs,
}

/// Parse a message into a command, tolerating `/cmd@BotName` mentions
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    let name = first[1..].split('@').next()?.to_ascii_lowercase();
    match name.as_str() {
        "help" => Some(Command::Help),
        "all" | "brief" | "full" => Some(Command::Brief),
        "geo" | "geopolitics" => Some(Command::Geo),
        "market" => Some(Command::Market),
        "tech" => Some(Command::Tech),
        "liqs" => Some(Command::Liqs),
        _ => None,
    }
}

const HELP_TEXT: &str = "\u{1f4cb} *Commands*\n\n\
/all -- full morning brief\n\
/geo -- geopolitics & conflicts\n\
/market -- markets, macro, tickers & sentiment\n\
/tech -- AI & tech news\n\
/liqs -- Hyperliquid liquidation snapshot\n\
/help -- show this menu\n";

/// Run one command to completion, sending its output to `chat_id`
pub async fn dispatch(
    command: Command,
    builder: &DigestBuilder,
    telegram: &TelegramClient,
    chat_id: &str,
) {
    info!(?command, chat_id, "Handling command");
    match command {
        Command::Help => {
            telegram.send_markdown(chat_id, HELP_TEXT).await;
        }
        Command::Brief => {
            telegram
                .send_markdown(chat_id, "Building your morning brief...")
                .await;
            let brief = builder.build_full().await;
            telegram.send_markdown(chat_id, &brief).await;
        }
        Command::Geo => {
            telegram
                .send_markdown(chat_id, "Fetching geopolitics...")
                .await;
            let section = builder.build_geo().await;
            telegram.send_markdown(chat_id, &section).await;
        }
        Command::Market => {
            telegram.send_markdown(chat_id, "Fetching markets...").await;
            let section = builder.build_market().await;
            telegram.send_markdown(chat_id, &section).await;
        }
        Command::Tech => {
            telegram
                .send_markdown(chat_id, "Fetching AI & tech...")
                .await;
            let section = builder.build_tech().await;
            telegram.send_markdown(chat_id, &section).await;
        }
        Command::Liqs => {
            let snapshot = builder.build_liqs();
            telegram.send_markdown(chat_id, &snapshot).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_with_aliases() {
        assert_eq!(parse_command("/help"), Some(Command::Help));
        assert_eq!(parse_command("/all"), Some(Command::Brief));
        assert_eq!(parse_command("/brief"), Some(Command::Brief));
        assert_eq!(parse_command("/geopolitics"), Some(Command::Geo));
        assert_eq!(parse_command("/liqs"), Some(Command::Liqs));
    }

    #[test]
    fn bot_mentions_are_stripped() {
        assert_eq!(parse_command("/market@MorningBriefBot"), Some(Command::Market));
    }

    #[test]
    fn non_commands_are_ignored() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
    }
}
