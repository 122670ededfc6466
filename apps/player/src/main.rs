use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    format_clock, HttpQuizBackend, QuizController, SessionEvent, SessionPhase, SessionSettings,
    DEFAULT_QUIZ_DURATION_SECS,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod command;
mod view;

use command::{Command, HELP};

#[derive(Parser, Debug)]
#[command(about = "Take the timed quiz in a terminal")]
struct Args {
    #[arg(long, default_value = "http://localhost:5000")]
    server_url: String,
    #[arg(
        long,
        default_value_t = DEFAULT_QUIZ_DURATION_SECS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    duration_secs: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let backend = HttpQuizBackend::new(&args.server_url)
        .with_context(|| format!("cannot use server url '{}'", args.server_url))?;
    let controller = QuizController::new(
        Arc::new(backend),
        SessionSettings {
            duration_secs: args.duration_secs,
            tick_period: Duration::from_secs(1),
        },
    )?;
    let mut events = controller.subscribe();

    println!("{HELP}\n");
    controller.load().await?;
    show(&controller).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(cmd) => run_command(&controller, cmd).await,
                    Err(err) => {
                        debug!(%err, input = %line, "unparsed command");
                        println!("{err}");
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(SessionEvent::Tick { remaining_secs }) => {
                        if remaining_secs > 0 && (remaining_secs % 60 == 0 || remaining_secs <= 10) {
                            println!("[{} left]", format_clock(remaining_secs));
                        }
                    }
                    Ok(SessionEvent::PhaseChanged(SessionPhase::Submitting)) => {
                        println!("Submitting answers...");
                    }
                    Ok(SessionEvent::PhaseChanged(
                        SessionPhase::Results | SessionPhase::Failed,
                    )) => show(&controller).await,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

async fn run_command(controller: &Arc<QuizController>, cmd: Command) {
    let result = match cmd {
        Command::Next => controller.next().await.map(drop),
        Command::Previous => controller.previous().await.map(drop),
        Command::GoTo(index) => controller.go_to_question(index).await.map(drop),
        Command::Select(index) => {
            let snapshot = controller.snapshot().await;
            match snapshot
                .current_question()
                .and_then(|question| question.options.get(index))
            {
                Some(option) => controller.select_answer(option).await,
                None => {
                    println!("choose an option between 1 and 4");
                    return;
                }
            }
        }
        // Results and failures are drawn from the event stream.
        Command::Submit => controller.submit().await.map(drop),
        Command::Retry => controller.retry().await.map(drop),
        Command::Restart => controller.restart().await.map(drop),
        Command::Show => Ok(()),
        Command::Help => {
            println!("{HELP}");
            return;
        }
        Command::Quit => return,
    };

    match result {
        Ok(()) if matches!(
            cmd,
            Command::Submit | Command::Retry | Command::Restart
        ) => {
            if controller.phase().await == SessionPhase::InProgress {
                show(controller).await;
            }
        }
        Ok(()) => show(controller).await,
        Err(err) => {
            warn!(%err, command = ?cmd, "command rejected");
            println!("{err}");
        }
    }
}

async fn show(controller: &QuizController) {
    println!("{}\n", view::render(&controller.snapshot().await));
}
