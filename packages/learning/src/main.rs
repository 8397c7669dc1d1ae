use std::sync::Arc;

use lexis_algo::{GamificationEvent, QuestionType};
use tokio::io::{AsyncBufReadExt, BufReader};

use lexis_learning::config::{env_u64, Config};
use lexis_learning::logging::init_tracing;
use lexis_learning::pronunciation::{Pronouncer, UnsupportedSpeaker};
use lexis_learning::{
    HttpWordSource, JsonFileStore, ProgressStore, SessionManager, SessionOutcome, SessionSettings,
    Step,
};

const DEFAULT_QUESTION_COUNT: u64 = 10;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    if let Err(message) = run(config).await {
        tracing::error!(error = %message, "lexis exited with an error");
        eprintln!("{message}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), String> {
    let library_id = parse_library_id(env_u64("LEXIS_LIBRARY_ID"))?;
    let question_count = usize::try_from(
        env_u64("LEXIS_QUESTION_COUNT").unwrap_or(DEFAULT_QUESTION_COUNT),
    )
    .map_err(|_| "LEXIS_QUESTION_COUNT is too large".to_string())?;

    let store = JsonFileStore::open(&config.data_dir).map_err(|e| e.to_string())?;
    let words = HttpWordSource::from_config(&config).map_err(|e| e.to_string())?;
    let progress = ProgressStore::new(Arc::new(store), &config.user_id);
    let manager = SessionManager::load(
        Arc::new(words),
        progress,
        SessionSettings::from_config(&config),
    )
    .map_err(|e| e.to_string())?;
    let pronouncer = Pronouncer::new(Arc::new(UnsupportedSpeaker));

    tracing::info!(library_id, question_count, user_id = %config.user_id, "starting quiz");
    manager
        .start_quiz_session(library_id, question_count)
        .await
        .map_err(|e| e.user_message())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(question) = manager.current_question() else {
            break;
        };
        if question.question_type != QuestionType::FillBlank {
            let _ = pronouncer.pronounce(&question.word.term);
        }
        println!();
        println!("{}", question.question);
        if let Some(options) = &question.options {
            for (i, option) in options.iter().enumerate() {
                println!("  {}. {}", i + 1, option);
            }
        }

        let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? else {
            break;
        };
        let answer = resolve_option(line.trim(), question.options.as_deref());
        match manager.submit_answer(&answer) {
            Some(true) => println!("Correct!"),
            Some(false) => println!("Incorrect. Answer: {}", question.correct_answer),
            None => {}
        }

        match manager.next_question() {
            Step::Moved(_) => continue,
            Step::Finished(outcome) => {
                print_outcome(&outcome);
                return Ok(());
            }
            Step::Inactive => break,
        }
    }

    if let Some(outcome) = manager.end_session() {
        print_outcome(&outcome);
    }
    Ok(())
}

/// Lets the learner answer a listed option by its number.
fn resolve_option(input: &str, options: Option<&[String]>) -> String {
    options
        .zip(input.parse::<usize>().ok())
        .and_then(|(options, n)| n.checked_sub(1).and_then(|i| options.get(i)))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

fn print_outcome(outcome: &SessionOutcome) {
    let summary = &outcome.summary;
    println!();
    println!(
        "Session completed! Accuracy: {:.1}% ({}/{})",
        summary.accuracy, summary.correct_answers, summary.total_answered
    );
    println!(
        "Level {} - {} XP / {} XP",
        outcome.level.level, outcome.level.current_xp, outcome.level.xp_to_next_level
    );
    println!("Streak: {} day(s)", outcome.learning_stats.streak_days);
    for event in &outcome.events {
        match event {
            GamificationEvent::LevelUp { level, title } => {
                println!("Level up! You are now level {level}: {title}");
            }
            GamificationEvent::AchievementUnlocked { title, xp_reward, .. } => {
                println!("Achievement unlocked: {title} (+{xp_reward} XP)");
            }
            GamificationEvent::XpAwarded { .. } => {}
        }
    }
    if !outcome.persisted {
        println!("Warning: progress could not be saved.");
    }
}

fn parse_library_id(raw: Option<u64>) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| "LEXIS_LIBRARY_ID must be set to the library to quiz".to_string())?;
    i64::try_from(raw).map_err(|_| format!("LEXIS_LIBRARY_ID {raw} is out of range"))
}
