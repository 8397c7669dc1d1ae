//! Quiz question generation
//!
//! Maps a batch of vocabulary entries to one question per entry. The question
//! type is drawn uniformly per entry; distractors and substituted meanings are
//! taken from the other entries of the same batch.

use rand::seq::SliceRandom;
use rand::Rng;
use regex::RegexBuilder;

use crate::shuffle::{sample, shuffle};
use crate::types::{
    normalize_answer, QuestionType, QuizQuestion, VocabularyEntry, BLANK_MARKER, FALSE_ANSWER,
    MAX_DISTRACTORS, TRUE_ANSWER,
};

/// Generates one question per word, in input order.
pub fn generate_questions<R: Rng + ?Sized>(
    words: &[VocabularyEntry],
    rng: &mut R,
) -> Vec<QuizQuestion> {
    words
        .iter()
        .map(|word| {
            let kind = *QuestionType::ALL
                .choose(rng)
                .unwrap_or(&QuestionType::MultipleChoice);
            generate_question(kind, word, words, rng)
        })
        .collect()
}

pub fn generate_question<R: Rng + ?Sized>(
    kind: QuestionType,
    word: &VocabularyEntry,
    batch: &[VocabularyEntry],
    rng: &mut R,
) -> QuizQuestion {
    match kind {
        QuestionType::MultipleChoice => multiple_choice(word, batch, rng),
        QuestionType::FillBlank => fill_blank(word),
        QuestionType::TrueFalse => true_false(word, batch, rng),
    }
}

pub fn multiple_choice<R: Rng + ?Sized>(
    word: &VocabularyEntry,
    batch: &[VocabularyEntry],
    rng: &mut R,
) -> QuizQuestion {
    let candidates = distractor_pool(word, batch);
    let mut options: Vec<String> = sample(&candidates, MAX_DISTRACTORS, rng)
        .into_iter()
        .map(|m| m.to_string())
        .collect();
    options.push(word.meaning.clone());
    shuffle(&mut options, rng);

    QuizQuestion {
        id: question_id(word, QuestionType::MultipleChoice),
        question_type: QuestionType::MultipleChoice,
        word: word.clone(),
        question: format!("What is the meaning of \"{}\"?", word.term),
        options: Some(options),
        correct_answer: word.meaning.clone(),
        user_answer: None,
        is_correct: None,
    }
}

pub fn fill_blank(word: &VocabularyEntry) -> QuizQuestion {
    let question = match word.example_sentence() {
        Some(example) => blank_out(example, &word.term),
        None => format!("{BLANK_MARKER} means \"{}\".", word.meaning),
    };

    QuizQuestion {
        id: question_id(word, QuestionType::FillBlank),
        question_type: QuestionType::FillBlank,
        word: word.clone(),
        question,
        options: None,
        correct_answer: word.term.clone(),
        user_answer: None,
        is_correct: None,
    }
}

pub fn true_false<R: Rng + ?Sized>(
    word: &VocabularyEntry,
    batch: &[VocabularyEntry],
    rng: &mut R,
) -> QuizQuestion {
    let state_truth = rng.gen_bool(0.5);
    let mut stated = word.meaning.as_str();

    if !state_truth {
        let others: Vec<&VocabularyEntry> = batch.iter().filter(|w| w.id != word.id).collect();
        if let Some(&other) = others.choose(rng) {
            stated = other.meaning.as_str();
        }
    }

    // A substituted meaning that happens to equal the real one is still true.
    let is_true = normalize_answer(stated) == normalize_answer(&word.meaning);

    QuizQuestion {
        id: question_id(word, QuestionType::TrueFalse),
        question_type: QuestionType::TrueFalse,
        word: word.clone(),
        question: format!("True or False: \"{}\" means \"{}\"", word.term, stated),
        options: Some(vec![TRUE_ANSWER.to_string(), FALSE_ANSWER.to_string()]),
        correct_answer: if is_true { TRUE_ANSWER } else { FALSE_ANSWER }.to_string(),
        user_answer: None,
        is_correct: None,
    }
}

/// Replaces every case-insensitive occurrence of `term` with the blank marker.
pub fn blank_out(sentence: &str, term: &str) -> String {
    let term = term.trim();
    if term.is_empty() {
        return sentence.to_string();
    }
    match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.replace_all(sentence, BLANK_MARKER).into_owned(),
        Err(_) => sentence.to_string(),
    }
}

fn question_id(word: &VocabularyEntry, kind: QuestionType) -> String {
    format!("q_{}_{}", word.id, kind.id_suffix())
}

/// Distinct meanings of the other entries, excluding the correct meaning
fn distractor_pool<'a>(word: &VocabularyEntry, batch: &'a [VocabularyEntry]) -> Vec<&'a str> {
    let correct = normalize_answer(&word.meaning);
    let mut seen = vec![correct];
    let mut pool = Vec::new();
    for other in batch.iter().filter(|w| w.id != word.id) {
        let key = normalize_answer(&other.meaning);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        pool.push(other.meaning.as_str());
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::rng_from_seed;

    fn batch(n: i64) -> Vec<VocabularyEntry> {
        (1..=n)
            .map(|i| VocabularyEntry::new(i, format!("term{i}"), format!("meaning {i}")))
            .collect()
    }

    #[test]
    fn test_single_word_quiz() {
        let words = batch(1);
        let mut rng = rng_from_seed(Some(3));
        let questions = generate_questions(&words, &mut rng);
        assert_eq!(questions.len(), 1);
        assert!(QuestionType::ALL.contains(&questions[0].question_type));
        assert!(!questions[0].correct_answer.is_empty());
    }

    #[test]
    fn test_one_question_per_word_in_order() {
        let words = batch(12);
        let mut rng = rng_from_seed(Some(11));
        let questions = generate_questions(&words, &mut rng);
        let ids: Vec<_> = questions.iter().map(|q| q.word.id).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
        assert!(questions.iter().all(|q| q.user_answer.is_none()));
    }

    #[test]
    fn test_multiple_choice_has_four_distinct_options() {
        let words = batch(6);
        let mut rng = rng_from_seed(Some(5));
        let q = multiple_choice(&words[0], &words, &mut rng);
        let options = q.options.unwrap();
        assert_eq!(options.len(), 4);
        assert!(options.contains(&"meaning 1".to_string()));
        let mut dedup = options.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 4);
    }

    #[test]
    fn test_multiple_choice_with_few_words() {
        let words = batch(2);
        let mut rng = rng_from_seed(Some(5));
        let q = multiple_choice(&words[1], &words, &mut rng);
        assert_eq!(q.options.unwrap().len(), 2);

        let alone = batch(1);
        let q = multiple_choice(&alone[0], &alone, &mut rng);
        assert_eq!(q.options.unwrap(), vec!["meaning 1".to_string()]);
    }

    #[test]
    fn test_multiple_choice_skips_duplicate_meanings() {
        let mut words = batch(3);
        words[1].meaning = "MEANING 1".into();
        let mut rng = rng_from_seed(Some(8));
        let q = multiple_choice(&words[0], &words, &mut rng);
        assert_eq!(q.options.unwrap().len(), 2);
    }

    #[test]
    fn test_fill_blank_replaces_all_cases() {
        let word = VocabularyEntry::new(4, "Ephemeral", "short-lived")
            .with_example("ephemeral joys are EPHEMERAL by nature");
        let q = fill_blank(&word);
        assert_eq!(q.question, "_____ joys are _____ by nature");
        assert_eq!(q.correct_answer, "Ephemeral");
        assert!(q.id.ends_with("_fb"));
    }

    #[test]
    fn test_fill_blank_template_without_example() {
        let word = VocabularyEntry::new(4, "terse", "brief").with_example("   ");
        let q = fill_blank(&word);
        assert_eq!(q.question, "_____ means \"brief\".");
        assert!(!q.question.contains("terse"));
    }

    #[test]
    fn test_blank_out_escapes_regex_metacharacters() {
        assert_eq!(blank_out("c++ and C++ are fun", "c++"), "_____ and _____ are fun");
        assert_eq!(blank_out("a.b axb", "a.b"), "_____ axb");
    }

    #[test]
    fn test_true_false_without_others_is_true() {
        let words = batch(1);
        let mut rng = rng_from_seed(Some(2));
        for _ in 0..20 {
            let q = true_false(&words[0], &words, &mut rng);
            assert_eq!(q.correct_answer, TRUE_ANSWER);
        }
    }

    #[test]
    fn test_true_false_produces_both_answers() {
        let words = batch(5);
        let mut rng = rng_from_seed(Some(21));
        let answers: Vec<_> = (0..64)
            .map(|_| true_false(&words[0], &words, &mut rng).correct_answer)
            .collect();
        assert!(answers.iter().any(|a| a == TRUE_ANSWER));
        assert!(answers.iter().any(|a| a == FALSE_ANSWER));
    }

    #[test]
    fn test_true_false_case_insensitive_submission() {
        let words = batch(1);
        let mut rng = rng_from_seed(Some(2));
        let mut q = true_false(&words[0], &words, &mut rng);
        assert_eq!(q.answer("true"), Some(true));
    }
}
