//! Property-based tests for the session manager
//!
//! Invariants:
//! - totalAnswered >= correctAnswers after every operation
//! - the word cursor stays inside the session's word list
//! - a finished session never changes its counters again

mod common;

use std::sync::Arc;
use std::time::Duration;

use lexis_algo::FlashcardMode;
use lexis_learning::{
    InMemoryWordSource, MemoryStore, Progress, ProgressStore, SessionManager, SessionSettings, Step,
};
use proptest::prelude::*;

use common::*;

#[derive(Debug, Clone)]
enum Op {
    Known(i64),
    Unknown(i64),
    Next,
    Previous,
    Submit(String),
    NextQuestion,
    End,
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..=6).prop_map(Op::Known),
        (1i64..=6).prop_map(Op::Unknown),
        Just(Op::Next),
        Just(Op::Previous),
        "[a-zA-Z ]{0,12}".prop_map(Op::Submit),
        Just(Op::NextQuestion),
        Just(Op::End),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counters_stay_consistent(
        quiz in any::<bool>(),
        seed in any::<u64>(),
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        runtime().block_on(async {
            let source =
                Arc::new(InMemoryWordSource::new().with_library(LIBRARY_ID, numbered_words(6)));
            let session_settings = SessionSettings {
                clear_delay: Duration::from_secs(3600),
                ..settings(seed)
            };
            let progress = ProgressStore::new(Arc::new(MemoryStore::new()), "tester");
            let manager = SessionManager::with_progress(
                source,
                progress,
                session_settings,
                Progress::default(),
            );
            if quiz {
                manager.start_quiz_session(LIBRARY_ID, 6).await.unwrap();
            } else {
                manager
                    .start_flashcard_session(LIBRARY_ID, FlashcardMode::Mixed, None)
                    .await
                    .unwrap();
            }

            let mut finished: Option<(u32, u32)> = None;
            for op in ops {
                let step = match op {
                    Op::Known(id) => { let _ = manager.mark_word_known(id).await; None }
                    Op::Unknown(id) => { let _ = manager.mark_word_unknown(id).await; None }
                    Op::Next => Some(manager.next_card()),
                    Op::Previous => { manager.previous_card(); None }
                    Op::Submit(answer) => { manager.submit_answer(&answer); None }
                    Op::NextQuestion => Some(manager.next_question()),
                    Op::End => manager.end_session().map(|o| Step::Finished(Box::new(o))),
                };

                let session = manager.current_session().unwrap();
                prop_assert!(session.total_answered() >= session.correct_answers());
                prop_assert!(session.current_index() < session.words().len());

                if let Some(counts) = finished {
                    prop_assert_eq!(counts, (session.correct_answers(), session.total_answered()));
                }
                if let Some(Step::Finished(outcome)) = step {
                    prop_assert!(session.is_completed());
                    let summary = &outcome.summary;
                    prop_assert!(summary.accuracy >= 0.0 && summary.accuracy <= 100.0);
                    finished = Some((summary.correct_answers, summary.total_answered));
                }
            }
            Ok(())
        })?;
    }
}
