//! Operator-facing side of the client.
//!
//! Lines come from a dedicated stdin thread (see [`spawn_stdin_reader`]) so a
//! blocking read never holds up the runtime. Meta-commands are handled locally;
//! everything else goes to the server untouched.

use std::{
    io::{self as std_io, BufRead},
    thread,
};

use tokio::{
    io::{self, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tracing::{debug, warn};

use crate::{
    error::chain,
    render::write_lines,
    session::{Session, SessionSnapshot},
    transport::Transport,
};

pub type LineReceiver = mpsc::Receiver<std_io::Result<String>>;

const RULE: &str = "════════════════════════════════════════════════════════════════════════";

/// Commands interpreted by the client itself. Never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Help,
    Quick,
    Info,
}

impl MetaCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "exit" => Some(MetaCommand::Exit),
            "help" => Some(MetaCommand::Help),
            "quick" => Some(MetaCommand::Quick),
            "info" => Some(MetaCommand::Info),
            _ => None,
        }
    }
}

/// One line of operator input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Empty,
    Meta(MetaCommand),
    Forward(String),
}

impl ShellInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ShellInput::Empty;
        }
        match MetaCommand::parse(trimmed) {
            Some(command) => ShellInput::Meta(command),
            None => ShellInput::Forward(trimmed.to_string()),
        }
    }
}

/// How the shell loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    Quit,
    EndOfInput,
}

/// Reads stdin line by line on its own OS thread.
///
/// The receiver yields `None` at end of input. The thread is detached; it exits
/// on EOF, on a read error, or once the receiver is dropped and the next line
/// arrives.
pub fn spawn_stdin_reader() -> std_io::Result<LineReceiver> {
    let (tx, rx) = mpsc::channel(16);
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std_io::stdin();
            for line in stdin.lock().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
            debug!("stdin reader finished");
        })?;
    Ok(rx)
}

pub struct Shell<'a> {
    transport: &'a Transport,
    session: &'a Session,
    prompt: bool,
}

impl<'a> Shell<'a> {
    pub fn new(transport: &'a Transport, session: &'a Session) -> Self {
        Self {
            transport,
            session,
            prompt: false,
        }
    }

    /// Writes `<name>> ` before each read. Only useful on a terminal.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub async fn run<W>(&self, lines: &mut LineReceiver, out: &mut W) -> io::Result<ShellExit>
    where
        W: AsyncWrite + Unpin,
    {
        loop {
            if self.prompt {
                let prompt = format!("{}> ", self.session.player_name());
                out.write_all(prompt.as_bytes()).await?;
                out.flush().await?;
            }

            let line = match lines.recv().await {
                Some(Ok(line)) => line,
                Some(Err(error)) => {
                    warn!(?error, "failed to read operator input");
                    return Ok(ShellExit::EndOfInput);
                }
                None => return Ok(ShellExit::EndOfInput),
            };

            if let Some(exit) = self.handle_line(&line, out).await? {
                return Ok(exit);
            }
        }
    }

    async fn handle_line<W>(&self, line: &str, out: &mut W) -> io::Result<Option<ShellExit>>
    where
        W: AsyncWrite + Unpin,
    {
        match ShellInput::parse(line) {
            ShellInput::Empty => {}
            ShellInput::Meta(MetaCommand::Exit) => return Ok(Some(ShellExit::Quit)),
            ShellInput::Meta(MetaCommand::Help) => write_lines(out, &help_text()).await?,
            ShellInput::Meta(MetaCommand::Quick) => {
                write_lines(out, &quick_commands(self.session)).await?
            }
            ShellInput::Meta(MetaCommand::Info) => {
                write_lines(out, &session_info(self.session)).await?
            }
            ShellInput::Forward(command) => match self.transport.send(&command).await {
                Ok(()) => write_lines(out, &[format!("📤 Sent: {command}")]).await?,
                Err(err) => {
                    warn!(error = ?err, command = %command, "send failed");
                    let report = format!("❌ Error sending command: {}", chain(&err));
                    write_lines(out, &[report]).await?;
                }
            },
        }
        Ok(None)
    }
}

fn banner(title: &str) -> Vec<String> {
    vec![
        String::new(),
        "╔══════════════════════════════════════════════════════════════════════╗".to_string(),
        format!("║{title:^70}║"),
        "╚══════════════════════════════════════════════════════════════════════╝".to_string(),
        String::new(),
    ]
}

pub fn help_text() -> Vec<String> {
    let mut lines = banner("AVAILABLE COMMANDS");
    lines.extend(
        [
            "Player Management:",
            "  REGISTER <name> <chips>              Register a new player",
            "  LEADERBOARD [limit]                  Show top players",
            "",
            "Lobby Management:",
            "  CREATE_LOBBY <name> <maxPlayers> <adminId>    Create a new lobby",
            "  JOIN_LOBBY <lobbyId> <playerId>               Join existing lobby",
            "",
            "Game Management:",
            "  START_GAME <playerIds...> <sb> <bb>  Start a new game",
            "  GET_GAME_STATE <gameId>              View current game state",
            "  GET_MY_CARDS <gameId> <playerId>     View your hole cards",
            "  DEAL_FLOP <gameId>                   Deal flop cards",
            "  DEAL_TURN <gameId>                   Deal turn card",
            "  DEAL_RIVER <gameId>                  Deal river card",
            "  DETERMINE_WINNER <gameId>            Determine winner",
            "",
            "Player Actions:",
            "  FOLD <gameId> <playerId>             Fold current hand",
            "  CHECK <gameId> <playerId>            Check",
            "  CALL <gameId> <playerId> <amount>    Call bet",
            "  RAISE <gameId> <playerId> <amount>   Raise bet",
            "  ALL_IN <gameId> <playerId>           Go all-in",
            "",
            "Other:",
            "  help                                 Show this help",
            "  quick                                Show quick command shortcuts",
            "  info                                 Show current player info",
            "  exit                                 Disconnect and quit",
            "",
            RULE,
            "",
        ]
        .map(str::to_string),
    );
    lines
}

/// Copy-paste templates filled in with whatever ids the session has learned.
pub fn quick_commands(session: &Session) -> Vec<String> {
    let ids = session.snapshot();
    let mut lines = banner("QUICK COMMAND TEMPLATES");
    lines.push("Current Session:".to_string());
    lines.extend(id_lines(&ids, 1));
    lines.push(String::new());
    lines.push("Quick Commands (copy-paste ready):".to_string());

    match &ids.player_id {
        None => lines.push(format!("  REGISTER {} 1000", session.player_name())),
        Some(player) => {
            let game = ids.game_id.as_deref().unwrap_or("<gameId>");
            lines.extend([
                format!("  GET_MY_CARDS {game} {player}"),
                format!("  GET_GAME_STATE {game}"),
                format!("  CHECK {game} {player}"),
                format!("  CALL {game} {player} <amount>"),
                format!("  RAISE {game} {player} <amount>"),
                format!("  FOLD {game} {player}"),
            ]);
        }
    }

    lines.extend([String::new(), RULE.to_string(), String::new()]);
    lines
}

pub fn session_info(session: &Session) -> Vec<String> {
    let ids = session.snapshot();
    let mut lines = banner("CURRENT SESSION INFO");
    lines.push(format!("  Player Name: {}", session.player_name()));
    lines.extend(id_lines(&ids, 3));
    lines.extend([String::new(), RULE.to_string(), String::new()]);
    lines
}

fn id_lines(ids: &SessionSnapshot, pad: usize) -> [String; 3] {
    let show = |value: &Option<String>, unset: &str| {
        value.clone().unwrap_or_else(|| unset.to_string())
    };
    let gap = " ".repeat(pad);
    [
        format!("  Player ID:{gap}{}", show(&ids.player_id, "(not registered)")),
        format!("  Game ID:{gap}  {}", show(&ids.game_id, "(no game)")),
        format!("  Lobby ID:{gap} {}", show(&ids.lobby_id, "(no lobby)")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_commands_are_case_insensitive() {
        assert_eq!(MetaCommand::parse("exit"), Some(MetaCommand::Exit));
        assert_eq!(MetaCommand::parse("EXIT"), Some(MetaCommand::Exit));
        assert_eq!(MetaCommand::parse("Help"), Some(MetaCommand::Help));
        assert_eq!(MetaCommand::parse("qUiCk"), Some(MetaCommand::Quick));
        assert_eq!(MetaCommand::parse("INFO"), Some(MetaCommand::Info));
        assert_eq!(MetaCommand::parse("exit now"), None);
    }

    #[test]
    fn input_is_trimmed_and_classified() {
        assert_eq!(ShellInput::parse("   \t"), ShellInput::Empty);
        assert_eq!(
            ShellInput::parse("  info  "),
            ShellInput::Meta(MetaCommand::Info)
        );
        assert_eq!(
            ShellInput::parse("  REGISTER Alice 1000 \n"),
            ShellInput::Forward("REGISTER Alice 1000".into())
        );
        assert_eq!(
            ShellInput::parse("register alice"),
            ShellInput::Forward("register alice".into())
        );
    }

    #[test]
    fn quick_offers_registration_before_a_player_id_is_known() {
        let session = Session::new("Alice");
        let output = quick_commands(&session).join("\n");
        assert!(output.contains("REGISTER Alice 1000"));
        assert!(output.contains("(not registered)"));
        assert!(!output.contains("CHECK"));
    }

    #[test]
    fn quick_offers_gameplay_once_registered() {
        let session = Session::new("Alice");
        session.set_player_id("p1");
        let output = quick_commands(&session).join("\n");
        assert!(!output.contains("REGISTER"));
        assert!(output.contains("GET_MY_CARDS <gameId> p1"));
        assert!(output.contains("FOLD <gameId> p1"));

        session.set_game_id("g1");
        let output = quick_commands(&session).join("\n");
        assert!(output.contains("CALL g1 p1 <amount>"));
        assert!(output.contains("GET_GAME_STATE g1"));
    }

    #[test]
    fn info_shows_name_and_ids() {
        let session = Session::new("Alice");
        session.set_lobby_id("l1");
        let output = session_info(&session).join("\n");
        assert!(output.contains("Player Name: Alice"));
        assert!(output.contains("Player ID:   (not registered)"));
        assert!(output.contains("Game ID:     (no game)"));
        assert!(output.contains("Lobby ID:    l1"));
    }

    #[test]
    fn help_lists_the_command_vocabulary() {
        let output = help_text().join("\n");
        for command in [
            "REGISTER",
            "LEADERBOARD",
            "CREATE_LOBBY",
            "JOIN_LOBBY",
            "START_GAME",
            "GET_GAME_STATE",
            "GET_MY_CARDS",
            "DEAL_FLOP",
            "DEAL_TURN",
            "DEAL_RIVER",
            "DETERMINE_WINNER",
            "FOLD",
            "CHECK",
            "CALL",
            "RAISE",
            "ALL_IN",
        ] {
            assert!(output.contains(command), "help is missing {command}");
        }
    }

    #[tokio::test]
    async fn shell_handles_meta_commands_and_reports_send_failures() {
        let transport = Transport::new("tcp://127.0.0.1:9".parse().unwrap());
        let session = Session::new("Alice");
        let shell = Shell::new(&transport, &session);
        let (tx, mut rx) = mpsc::channel(8);
        for line in ["", "quick", "LEADERBOARD 10", "exit", "never read"] {
            tx.send(Ok(line.to_string())).await.unwrap();
        }

        let mut out = Vec::new();
        let exit = shell.run(&mut rx, &mut out).await.unwrap();

        assert_eq!(exit, ShellExit::Quit);
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("REGISTER Alice 1000"));
        assert!(output.contains("❌ Error sending command: not connected to server"));
        assert!(!output.contains("Alice> "));
        assert!(rx.try_recv().is_ok(), "lines after exit stay unread");
    }

    #[tokio::test]
    async fn shell_stops_at_end_of_input() {
        let transport = Transport::new("tcp://127.0.0.1:9".parse().unwrap());
        let session = Session::new("Alice");
        let shell = Shell::new(&transport, &session).with_prompt(true);
        let (tx, mut rx) = mpsc::channel::<std_io::Result<String>>(1);
        drop(tx);

        let mut out = Vec::new();
        let exit = shell.run(&mut rx, &mut out).await.unwrap();

        assert_eq!(exit, ShellExit::EndOfInput);
        assert_eq!(String::from_utf8(out).unwrap(), "Alice> ");
    }
}
