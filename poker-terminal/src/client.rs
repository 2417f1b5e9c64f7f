use std::{
    io::{IsTerminal, stdout as std_stdout},
    sync::Arc,
};

use anyhow::{Context, Result};
use tokio::{
    io::{self, Stdout},
    select,
    sync::oneshot,
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    cli::{Cli, resolve_player_name},
    receiver::{self, ReceiveOutcome},
    render::write_lines,
    session::Session,
    shell::{LineReceiver, Shell, ShellExit, spawn_stdin_reader},
    transport::Transport,
};

type ReceiveTask = JoinHandle<io::Result<ReceiveOutcome>>;

/// Why the interactive session ended.
#[derive(Debug)]
enum Stop {
    Shell(ShellExit),
    Interrupted,
    Receiver(Result<io::Result<ReceiveOutcome>, tokio::task::JoinError>),
}

pub async fn run(cli: Cli) -> Result<()> {
    let player_name = player_name(&cli).await?;
    let mut stdout = io::stdout();

    let transport = Arc::new(establish_connection(&cli, &mut stdout).await?);
    let session = Arc::new(Session::new(player_name));
    write_lines(&mut stdout, &banner(&session)).await?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut receive_task = spawn_receive_loop(&transport, &session, shutdown_rx);
    let mut lines = spawn_stdin_reader().context("failed to start stdin reader")?;

    let stop = run_client_loop(
        &transport,
        &session,
        &mut lines,
        &mut receive_task,
        &mut stdout,
    )
    .await;

    // Teardown order: cancel the receive loop, close the connection, then join.
    let _ = shutdown_tx.send(());
    transport.close().await;
    let receive_result = match stop {
        Stop::Receiver(result) => result,
        Stop::Shell(exit) => {
            info!(?exit, "shell finished");
            receive_task.await
        }
        Stop::Interrupted => {
            info!("interrupted by operator");
            receive_task.await
        }
    };
    report_receive_result(receive_result);

    write_lines(&mut stdout, &["👋 Goodbye!"]).await?;
    Ok(())
}

async fn player_name(cli: &Cli) -> Result<String> {
    let given = cli.name.clone();
    tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        if given.as_deref().is_none_or(|name| name.trim().is_empty()) {
            print!("Enter your player name: ");
            let _ = std::io::Write::flush(&mut std_stdout());
        }
        resolve_player_name(given.as_deref(), stdin.lock())
    })
    .await
    .context("player name prompt failed")
}

async fn establish_connection(cli: &Cli, stdout: &mut Stdout) -> Result<Transport> {
    write_lines(stdout, &[format!("🎰 Connecting to {}...", cli.server)]).await?;

    let transport = Transport::new(cli.server.clone());
    transport
        .connect(cli.connect_timeout())
        .await
        .context("connection failed")?;

    write_lines(stdout, &["✅ Connected successfully!", ""]).await?;
    Ok(transport)
}

fn banner(session: &Session) -> Vec<String> {
    let rule = "═".repeat(51);
    vec![
        rule.clone(),
        format!("  🎴 POKER CLIENT - {}", session.player_name()),
        rule,
        "Type 'help' for available commands".to_string(),
        "Type 'quick' for quick command shortcuts".to_string(),
        "Type 'exit' to quit".to_string(),
        String::new(),
    ]
}

fn spawn_receive_loop(
    transport: &Arc<Transport>,
    session: &Arc<Session>,
    shutdown: oneshot::Receiver<()>,
) -> ReceiveTask {
    let transport = Arc::clone(transport);
    let session = Arc::clone(session);
    tokio::spawn(async move {
        let mut stdout = io::stdout();
        let shutdown = async move {
            let _ = shutdown.await;
        };
        receiver::run_until(&transport, &session, &mut stdout, shutdown).await
    })
}

async fn run_client_loop(
    transport: &Transport,
    session: &Session,
    lines: &mut LineReceiver,
    receive_task: &mut ReceiveTask,
    stdout: &mut Stdout,
) -> Stop {
    let shell = Shell::new(transport, session).with_prompt(std_stdout().is_terminal());

    select! {
        exit = shell.run(lines, stdout) => match exit {
            Ok(exit) => Stop::Shell(exit),
            Err(error) => {
                warn!(?error, "failed to write to stdout");
                Stop::Shell(ShellExit::EndOfInput)
            }
        },
        ctrl_c = tokio::signal::ctrl_c() => {
            handle_ctrl_c(ctrl_c);
            let _ = write_lines(stdout, &["", "^C"]).await;
            Stop::Interrupted
        }
        finished = receive_task => Stop::Receiver(finished),
    }
}

fn handle_ctrl_c(result: std::io::Result<()>) {
    if let Err(error) = result {
        warn!(?error, "ctrl-c handler failed");
    }
}

fn report_receive_result(result: Result<io::Result<ReceiveOutcome>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(ReceiveOutcome::Failed(err))) => warn!(error = ?err, "connection lost"),
        Ok(Ok(outcome)) => info!(?outcome, "receive loop stopped"),
        Ok(Err(error)) => warn!(?error, "receive loop could not write to stdout"),
        Err(error) => warn!(?error, "receive loop task failed"),
    }
}
