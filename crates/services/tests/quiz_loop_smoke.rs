use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::RecordCodec;
use quiz_core::model::{
    CategorySelector, Partition, Question, QuestionId, QuizMode, QuizSession, QuizSettings,
};
use quiz_core::time::fixed_now;
use services::{
    ClientContext, Clock, DashboardService, Notice, QuizLoopService, Route, SessionError,
    StartRequest, StudyScreen,
};
use storage::repository::{InMemoryQuestionBank, QuestionBank, Storage, StorageError};

fn question(id: &str, category: &str, answer: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        category,
        format!("{id} の答えは {answer}"),
        answer,
        None,
        vec!["ダミー".to_string()],
    )
}

fn theory_bank() -> InMemoryQuestionBank {
    InMemoryQuestionBank::with_questions((0..5).map(|i| {
        question(&format!("f_theory_{i}"), "理論", &format!("答{i}"))
    }))
}

fn loop_service(bank: InMemoryQuestionBank) -> QuizLoopService {
    let storage = Storage::in_memory(bank);
    QuizLoopService::new(Clock::fixed(fixed_now()), QuizSettings::default(), storage.questions)
}

fn session_of(ctx: &ClientContext) -> QuizSession {
    quiz_core::SessionCodec.decode(ctx.session_token.as_deref())
}

fn theory_request(count: usize) -> StartRequest {
    StartRequest {
        mode: QuizMode::Fill,
        category: CategorySelector::Theory,
        count: Some(count),
        review: false,
    }
}

#[tokio::test]
async fn full_quiz_loop_through_the_control_surface() {
    let svc = loop_service(theory_bank());
    let mut ctx = ClientContext::new();

    let started = svc.start_session(&ctx, &theory_request(3)).await.unwrap();
    assert_eq!(started.route, Route::Study);
    ctx.absorb(&started.cookies);

    let session = session_of(&ctx);
    assert_eq!(session.total(), 3);
    assert_eq!(session.remaining(), 3);
    assert_eq!(session.correct_count(), 0);

    let StudyScreen::Question(view) = svc.study(&ctx) else {
        panic!("expected a question");
    };
    assert_eq!((view.index, view.total, view.progress), (1, 3, 0));
    assert!(view.prompt.contains("【 ？ 】"));
    assert_eq!(view.choices.len(), 4);

    let answer = session.head().unwrap().back().to_string();
    let submitted = svc.submit_answer(&ctx, view.id.as_str(), &answer).unwrap();
    assert_eq!(submitted.route, Route::Study);
    assert_eq!(submitted.cookies.len(), 2);
    ctx.absorb(&submitted.cookies);

    let record = RecordCodec::new(100).decode(ctx.record_token.as_deref());
    assert_eq!(record.logs().len(), 1);
    assert!(record.logs()[0].correct);
    assert_eq!(record.wrong_count(), 0);

    // A reload of the feedback screen shows the same verdict.
    for _ in 0..2 {
        let StudyScreen::Feedback(feedback) = svc.study(&ctx) else {
            panic!("expected feedback");
        };
        assert!(feedback.correct);
        assert_eq!(feedback.progress, 33);
        assert_eq!(feedback.index, 1);
        assert_eq!(feedback.canonical_answer, answer);
    }
    let session = session_of(&ctx);
    assert_eq!(session.correct_count(), 1);
    assert_eq!(session.remaining(), 2);

    let advanced = svc.advance(&ctx).unwrap();
    ctx.absorb(&advanced.cookies);

    for _ in 0..2 {
        let StudyScreen::Question(view) = svc.study(&ctx) else {
            panic!("expected a question");
        };
        let response = svc.submit_answer(&ctx, view.id.as_str(), "まちがい").unwrap();
        ctx.absorb(&response.cookies);
        let response = svc.advance(&ctx).unwrap();
        ctx.absorb(&response.cookies);
    }

    assert_eq!(svc.study(&ctx), StudyScreen::Redirect(Route::Result));
    let result = svc.show_result(&ctx);
    assert_eq!((result.score, result.total, result.correct), (33, 3, 1));

    let record = RecordCodec::new(100).decode(ctx.record_token.as_deref());
    assert_eq!(record.wrong_count(), 2);
    assert_eq!(record.logs().len(), 3);

    let home = svc.return_home(&ctx);
    assert_eq!(home.route, Route::Home);
    ctx.absorb(&home.cookies);
    assert_eq!(ctx.session_token, None);
    assert!(ctx.record_token.is_some());

    let dashboard = DashboardService::new(Clock::fixed(fixed_now()), QuizSettings::default());
    let view = dashboard.home(&ctx, Some("理論"));
    assert_eq!(view.wrong_count, 2);
    assert_eq!(view.values.iter().sum::<usize>(), 3);
}

#[tokio::test]
async fn review_mode_selects_exactly_the_wrong_questions() {
    let bank = theory_bank();
    bank.insert(question("f_x_1", "直流機", "a")).unwrap();
    bank.insert(question("o_y_2", "照明", "○")).unwrap();
    bank.insert(question("o_y_3", "照明", "×")).unwrap();
    let svc = loop_service(bank);

    let record = r#"{"wrong_list":["f_x_1","o_y_2"],"logs":[]}"#;
    let mut ctx = ClientContext::new().with_record(record);
    let request = StartRequest {
        mode: QuizMode::Fill,
        category: CategorySelector::Theory,
        count: Some(10),
        review: true,
    };
    let started = svc.start_session(&ctx, &request).await.unwrap();
    ctx.absorb(&started.cookies);

    let session = session_of(&ctx);
    assert_eq!(session.total(), 2);
    let ids: HashSet<&str> = session.queue().iter().map(|q| q.id().as_str()).collect();
    assert_eq!(ids, HashSet::from(["f_x_1", "o_y_2"]));
}

#[tokio::test]
async fn empty_pool_returns_home_without_a_session() {
    let svc = loop_service(theory_bank());
    let ctx = ClientContext::new().with_session("stale");
    let request = StartRequest {
        category: CategorySelector::parse("照明"),
        ..StartRequest::default()
    };

    let response = svc.start_session(&ctx, &request).await.unwrap();
    assert_eq!(response.route, Route::Home);
    assert_eq!(response.notice, Some(Notice::NoQuestions));

    let mut ctx = ctx;
    ctx.absorb(&response.cookies);
    assert_eq!(ctx.session_token, None);
    assert_eq!(session_of(&ctx).total(), 0);
}

#[tokio::test]
async fn count_larger_than_pool_under_fills() {
    let bank = InMemoryQuestionBank::with_questions(
        (0..12).map(|i| question(&format!("o_m_{i}"), "変圧器", "○")),
    );
    let svc = loop_service(bank);
    let mut ctx = ClientContext::new();
    let request = StartRequest {
        mode: QuizMode::Ox,
        category: CategorySelector::MachineRoot,
        count: Some(30),
        review: false,
    };
    let started = svc.start_session(&ctx, &request).await.unwrap();
    ctx.absorb(&started.cookies);
    assert_eq!(session_of(&ctx).total(), 12);

    let StudyScreen::Question(view) = svc.study(&ctx) else {
        panic!("expected a question");
    };
    assert!(view.choices.is_empty());
}

#[tokio::test]
async fn missing_count_uses_the_configured_default() {
    let bank = InMemoryQuestionBank::with_questions(
        (0..15).map(|i| question(&format!("f_t_{i}"), "理論", "答")),
    );
    let svc = loop_service(bank);
    let mut ctx = ClientContext::new();
    let started = svc
        .start_session(&ctx, &StartRequest::from_raw(None, None, Some("abc"), false))
        .await
        .unwrap();
    ctx.absorb(&started.cookies);
    assert_eq!(session_of(&ctx).total(), 10);
}

struct BrokenBank;

#[async_trait]
impl QuestionBank for BrokenBank {
    async fn load(
        &self,
        _mode: QuizMode,
        _partition: Option<Partition>,
    ) -> Result<Vec<Question>, StorageError> {
        Err(StorageError::Connection("offline".to_string()))
    }
}

#[tokio::test]
async fn unusable_bank_is_a_hard_error() {
    let svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(BrokenBank),
    );
    let err = svc
        .start_session(&ClientContext::new(), &StartRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
}
