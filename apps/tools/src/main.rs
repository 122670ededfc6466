use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server_api::{grade, QuestionStore};
use shared::{
    domain::QuestionId,
    protocol::{AnswerMap, SubmitRequest},
};

#[derive(Parser, Debug)]
struct Cli {
    /// Question bank JSON file; the builtin bank is used when omitted.
    #[arg(long, global = true)]
    questions: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every question with its answer key.
    List,
    Show {
        id: i64,
    },
    /// Validate the bank and report how many questions it holds.
    Check,
    /// Grade a submission body or a bare id-to-answer map.
    Grade {
        #[arg(long)]
        answers: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = match &cli.questions {
        Some(path) => QuestionStore::from_json_file(path)
            .with_context(|| format!("invalid question bank {}", path.display()))?,
        None => QuestionStore::builtin(),
    };

    match cli.command {
        Command::List => {
            for question in store.list_all() {
                println!(
                    "{}\t{}\t[{}]",
                    question.id,
                    question.question,
                    question.correct_answer
                );
            }
        }
        Command::Show { id } => {
            let question = store.get_by_id(QuestionId(id))?;
            println!("Q{}: {}", question.id, question.question);
            for (index, option) in question.options.iter().enumerate() {
                let marker = if *option == question.correct_answer {
                    '*'
                } else {
                    ' '
                };
                println!(" {marker} {}. {option}", index + 1);
            }
        }
        Command::Check => {
            println!("ok: {} questions", store.len());
        }
        Command::Grade { answers } => {
            let answers = read_answers(&answers)?;
            let outcome = grade(&store, &answers);
            for result in &outcome.results {
                println!(
                    "{} {}\t{}\t{}",
                    if result.correct { '+' } else { '-' },
                    result.question_id,
                    result.user_answer.as_deref().unwrap_or("-"),
                    result.correct_answer
                );
            }
            println!(
                "score={} total={} percentage={:.1}",
                outcome.score,
                outcome.total_questions,
                outcome.percentage()
            );
        }
    }

    Ok(())
}

fn read_answers(path: &Path) -> Result<AnswerMap> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not JSON", path.display()))?;
    let answers = if value.get("answers").is_some() {
        serde_json::from_value::<SubmitRequest>(value).map(|request| request.answers)
    } else {
        serde_json::from_value::<AnswerMap>(value)
    };
    answers.with_context(|| format!("{} is not an answer map", path.display()))
}
