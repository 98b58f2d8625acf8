//! Line-based transport for running the engine from a terminal.
//!
//! Each line is `<chat> <user> <name> <text>`. A chat id equal to the user id
//! is that user's private chat. Group text starting with `^` is a reply to
//! the current clue announcement.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    engine::{GameEngine, IncomingGuess},
    error::GameError,
    models::{ChatId, UserProfile},
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("{field} is not a number: {value}")]
    NotANumber { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartGame { rounds: Option<u32> },
    Join,
    Play,
    End,
    StartAlone,
    /// Reply to the clue announcement
    Reply(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundLine {
    pub chat_id: ChatId,
    pub profile: UserProfile,
    pub command: Command,
}

impl InboundLine {
    pub fn is_private(&self) -> bool {
        self.chat_id == self.profile.user_id
    }
}

fn number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::NotANumber {
        field,
        value: value.to_string(),
    })
}

pub fn parse_line(line: &str) -> Result<InboundLine, ParseError> {
    let mut parts = line.trim().splitn(4, ' ');
    let chat = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::Missing("chat"))?;
    let chat_id = number("chat", chat)?;
    let user_id = number("user", parts.next().ok_or(ParseError::Missing("user"))?)?;
    let name = parts.next().ok_or(ParseError::Missing("name"))?;
    let text = parts.next().ok_or(ParseError::Missing("text"))?.trim();

    let mut words = text.split_whitespace();
    let command = match words.next() {
        Some("/startgame") => Command::StartGame {
            rounds: words.next().map(|r| number("rounds", r)).transpose()?,
        },
        Some("/join") => Command::Join,
        Some("/play") => Command::Play,
        Some("/end") => Command::End,
        Some("/startalone") => Command::StartAlone,
        _ => match text.strip_prefix('^') {
            Some(reply) => Command::Reply(reply.trim().to_string()),
            None => Command::Text(text.to_string()),
        },
    };

    Ok(InboundLine {
        chat_id,
        profile: UserProfile::new(user_id, name),
        command,
    })
}

/// Apply one parsed line to the engine
pub async fn handle(engine: &GameEngine, line: InboundLine) -> Result<(), GameError> {
    let chat_id = line.chat_id;
    let user_id = line.profile.user_id;
    let private = line.is_private();

    match line.command {
        Command::StartGame { rounds } => engine
            .create_game(chat_id, &line.profile, rounds)
            .await
            .map(|_| ()),
        Command::Join => engine.join_game(chat_id, &line.profile).await.map(|_| ()),
        Command::Play => engine.start_game(chat_id, user_id).await,
        Command::End => engine.end_game_by_host(chat_id, user_id).await,
        Command::StartAlone => engine.start_solo(chat_id, &line.profile).await,
        Command::Text(text) | Command::Reply(text) if private => engine
            .handle_private_message(&line.profile, &text)
            .await
            .map(|_| ()),
        Command::Reply(text) => {
            let reply_to = engine
                .snapshot(chat_id)
                .await
                .and_then(|snapshot| snapshot.clue_message);
            engine
                .submit_guess(
                    chat_id,
                    IncomingGuess {
                        user_id,
                        text,
                        message: None,
                        reply_to,
                    },
                )
                .await
                .map(|_| ())
        }
        // Group chatter that is not a reply
        Command::Text(_) => Ok(()),
    }
}

/// Read lines from stdin until EOF
pub async fn run(engine: GameEngine) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tracing::info!("Console ready: <chat> <user> <name> <text>");

    while let Some(raw) = lines.next_line().await? {
        if raw.trim().is_empty() {
            continue;
        }
        let line = match parse_line(&raw) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Ignoring line {:?}: {}", raw, e);
                continue;
            }
        };
        if let Err(e) = handle(&engine, line).await {
            tracing::info!("Rejected: {}", e);
        }
    }

    tracing::info!("Console input closed, {} games still running", engine.active_games());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::GameStatus,
        test_support::{harness, settle, Harness},
    };

    #[test]
    fn test_parse_commands() {
        let line = parse_line("-5 1 Ana /startgame 7").unwrap();
        assert_eq!(line.chat_id, -5);
        assert_eq!(line.profile.first_name, "Ana");
        assert_eq!(line.command, Command::StartGame { rounds: Some(7) });
        assert!(!line.is_private());

        assert_eq!(parse_line("-5 2 Budi /join").unwrap().command, Command::Join);
        assert_eq!(
            parse_line("-5 2 Budi ^ apple").unwrap().command,
            Command::Reply("apple".into())
        );
        let private = parse_line("2 2 Budi red fruit").unwrap();
        assert!(private.is_private());
        assert_eq!(private.command, Command::Text("red fruit".into()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_line(""), Err(ParseError::Missing("chat")));
        assert_eq!(parse_line("-5 1 Ana"), Err(ParseError::Missing("text")));
        assert_eq!(
            parse_line("x 1 Ana /join"),
            Err(ParseError::NotANumber {
                field: "chat",
                value: "x".into()
            })
        );
        assert!(matches!(
            parse_line("-5 1 Ana /startgame many"),
            Err(ParseError::NotANumber { field: "rounds", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_session_plays_a_round() {
        let h = harness();
        let chat = -5;
        for raw in ["-5 1 Ana /startgame 3", "-5 2 Budi /join", "-5 1 Ana /play"] {
            handle(&h.engine, parse_line(raw).unwrap()).await.unwrap();
        }
        settle().await;

        let snapshot = h.engine.snapshot(chat).await.unwrap();
        let giver = Harness::clue_giver(&snapshot);
        let guesser = Harness::guesser(&snapshot);

        handle(&h.engine, parse_line(&format!("{0} {0} X fruit", giver)).unwrap())
            .await
            .unwrap();
        assert_eq!(
            h.engine.snapshot(chat).await.unwrap().status,
            GameStatus::WaitingForGuesses
        );

        // plain group text is not a guess
        handle(&h.engine, parse_line(&format!("-5 {} X apple", guesser)).unwrap())
            .await
            .unwrap();
        assert_eq!(h.engine.snapshot(chat).await.unwrap().round, 1);

        handle(&h.engine, parse_line(&format!("-5 {} X ^apple", guesser)).unwrap())
            .await
            .unwrap();
        settle().await;
        let after = h.engine.snapshot(chat).await.unwrap();
        assert_eq!(after.round, 2);
        assert_eq!(after.session_scores.get(&guesser), Some(&20));
    }
}
