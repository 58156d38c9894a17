use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::bank::QuestionBank;
use adaptest_core::level::classify_level;
use adaptest_core::model::{
    AnswerKey, AnswerOption, AssessmentDefinition, AssessmentItem, GradeBand, Question,
    QuestionKind, SubmittedAnswer,
};
use adaptest_core::scoring::score_attempt;

const TOPICS: [&str; 5] = ["kinematics", "forces", "energy", "waves", "optics"];

fn make_question(i: usize) -> Question {
    let topics = vec![
        TOPICS[i % TOPICS.len()].to_string(),
        TOPICS[(i + 2) % TOPICS.len()].to_string(),
    ];
    let (kind, options, answer_key) = match i % 3 {
        0 => (
            QuestionKind::MultipleChoice,
            vec![
                AnswerOption {
                    id: "a".into(),
                    text: String::new(),
                    is_correct: false,
                },
                AnswerOption {
                    id: "b".into(),
                    text: String::new(),
                    is_correct: true,
                },
            ],
            None,
        ),
        1 => (QuestionKind::Numeric, vec![], Some(AnswerKey::Number(i as f64))),
        _ => (
            QuestionKind::ShortText,
            vec![],
            Some(AnswerKey::Pattern("^new?tons?$".into())),
        ),
    };
    Question {
        id: format!("q{i}"),
        stem: String::new(),
        kind,
        options,
        answer_key,
        topics,
        difficulty: (i % 5 + 1) as u8,
    }
}

fn make_answer(i: usize) -> SubmittedAnswer {
    match i % 3 {
        0 => SubmittedAnswer::new(format!("q{i}"), "b"),
        1 => SubmittedAnswer::new(format!("q{i}"), i as f64 + 0.005),
        _ => SubmittedAnswer::new(format!("q{i}"), "Newtons"),
    }
}

fn fixture(n: usize) -> (QuestionBank, AssessmentDefinition, Vec<SubmittedAnswer>) {
    let bank = QuestionBank::new((0..n).map(make_question));
    let definition = AssessmentDefinition {
        id: "bench".into(),
        title: String::new(),
        grade_range: vec![GradeBand::Grade(9)],
        items: (0..n)
            .map(|i| AssessmentItem {
                question_id: format!("q{i}"),
                weight: 1.0,
                difficulty: None,
            })
            .collect(),
        active: true,
    };
    // Answer every other question, in reverse order.
    let answers = (0..n).rev().step_by(2).map(make_answer).collect();
    (bank, definition, answers)
}

fn bench_score_attempt(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_attempt");

    for n in [20, 200, 2000] {
        let (bank, definition, answers) = fixture(n);
        group.bench_function(format!("{n}_items"), |b| {
            b.iter(|| score_attempt(black_box(&definition), black_box(&bank), black_box(&answers)))
        });
    }

    group.finish();
}

fn bench_classify_level(c: &mut Criterion) {
    c.bench_function("classify_level", |b| {
        b.iter(|| {
            for score in 0..=100 {
                black_box(classify_level(black_box(score as f64), GradeBand::Grade(11)));
            }
        })
    });
}

criterion_group!(benches, bench_score_attempt, bench_classify_level);
criterion_main!(benches);
