use super::*;
use shared::domain::QuestionId;

fn answers(entries: &[(i64, &str)]) -> AnswerMap {
    entries
        .iter()
        .map(|(id, text)| (QuestionId(*id), text.to_string()))
        .collect()
}

#[test]
fn empty_answers_score_zero_with_every_answer_absent() {
    let store = QuestionStore::builtin();
    let outcome = grade(&store, &AnswerMap::new());

    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.total_questions, store.len());
    assert!(outcome
        .results
        .iter()
        .all(|r| !r.correct && r.user_answer.is_none()));
}

#[test]
fn all_correct_answers_score_full_marks() {
    let store = QuestionStore::builtin();
    let all_correct: AnswerMap = store
        .list_all()
        .iter()
        .map(|q| (q.id, q.correct_answer.clone()))
        .collect();

    let outcome = grade(&store, &all_correct);
    assert_eq!(outcome.score, outcome.total_questions);
    assert_eq!(outcome.percentage(), 100.0);
}

#[test]
fn unknown_ids_are_ignored() {
    let store = QuestionStore::builtin();
    let outcome = grade(&store, &answers(&[(1, "string"), (42, "x"), (-3, "y")]));

    assert_eq!(outcome.results.len(), store.len());
    assert_eq!(outcome.score, 1);
    assert!(outcome
        .results
        .iter()
        .all(|r| r.question_id != QuestionId(42)));
}

#[test]
fn comparison_is_exact_and_case_sensitive() {
    let store = QuestionStore::builtin();
    let outcome = grade(
        &store,
        &answers(&[(1, "String"), (3, " extends"), (6, "false")]),
    );

    assert_eq!(outcome.score, 1);
    assert!(!outcome.results[0].correct);
    assert_eq!(outcome.results[0].user_answer.as_deref(), Some("String"));
    assert!(!outcome.results[2].correct);
    assert!(outcome.results[5].correct);
}

#[test]
fn results_follow_store_order_and_score_matches_flags() {
    let store = QuestionStore::builtin();
    let outcome = grade(&store, &answers(&[(10, "Both A and B"), (2, "52"), (5, "123var")]));

    let ids: Vec<QuestionId> = outcome.results.iter().map(|r| r.question_id).collect();
    let expected: Vec<QuestionId> = store.list_all().iter().map(|q| q.id).collect();
    assert_eq!(ids, expected);
    assert_eq!(
        outcome.score,
        outcome.results.iter().filter(|r| r.correct).count()
    );
    assert_eq!(outcome.score, 2);
}

#[test]
fn grading_is_idempotent() {
    let store = QuestionStore::builtin();
    let submitted = answers(&[(1, "string"), (4, "8 bytes")]);
    assert_eq!(grade(&store, &submitted), grade(&store, &submitted));
}

#[test]
fn first_answer_only_scenario() {
    let store = QuestionStore::builtin();
    let outcome = grade(&store, &answers(&[(1, "string")]));

    assert_eq!(outcome.score, 1);
    assert!(outcome.results[0].correct);
    for result in &outcome.results[1..] {
        assert!(!result.correct);
        assert!(result.user_answer.is_none());
    }
}
