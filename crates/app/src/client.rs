//! Terminal stand-in for the browser: holds cookies in the jar and renders screens.

use std::error::Error;

use quiz_core::model::{QuizMode, QuizSettings};
use services::{
    ClientContext, Clock, DashboardService, FeedbackView, HomeView, Notice, QuestionView,
    QuizLoopService, Response, ResultView, Route, StartRequest, StudyScreen,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

type CliResult = Result<(), Box<dyn Error>>;

pub struct Client {
    clock: Clock,
    storage: Storage,
    quiz: QuizLoopService,
    dashboard: DashboardService,
}

impl Client {
    pub fn new(clock: Clock, settings: QuizSettings, storage: Storage) -> Self {
        let quiz = QuizLoopService::new(clock, settings.clone(), storage.questions.clone());
        let dashboard = DashboardService::new(clock, settings);
        Self {
            clock,
            storage,
            quiz,
            dashboard,
        }
    }

    async fn context(&self) -> Result<ClientContext, Box<dyn Error>> {
        Ok(ClientContext::from_jar(self.storage.cookies.as_ref(), self.clock.now()).await?)
    }

    /// Store the cookies, report any notice, then show the target screen.
    async fn follow(&self, response: Response) -> CliResult {
        response
            .apply(self.storage.cookies.as_ref(), self.clock.now())
            .await?;
        debug!(route = ?response.route, cookies = response.cookies.len(), "response applied");
        match response.notice {
            Some(Notice::NoQuestions) => println!("該当する問題がありません。"),
            Some(Notice::StaleRequest) => println!("セッションが終了しています。"),
            None => {}
        }
        match response.route {
            Route::Home => self.home(None).await,
            Route::Study => self.study().await,
            Route::Result => self.result().await,
        }
    }

    pub async fn home(&self, chart_category: Option<&str>) -> CliResult {
        let ctx = self.context().await?;
        print_home(&self.dashboard.home(&ctx, chart_category));
        Ok(())
    }

    pub async fn start(&self, request: &StartRequest) -> CliResult {
        let ctx = self.context().await?;
        let response = self.quiz.start_session(&ctx, request).await?;
        self.follow(response).await
    }

    pub async fn study(&self) -> CliResult {
        let ctx = self.context().await?;
        match self.quiz.study(&ctx) {
            StudyScreen::Question(view) => print_question(&view),
            StudyScreen::Feedback(view) => print_feedback(&view),
            StudyScreen::Redirect(Route::Result) => print_result(&self.quiz.show_result(&ctx)),
            StudyScreen::Redirect(_) => println!("進行中のセッションはありません。"),
        }
        Ok(())
    }

    pub async fn answer(&self, question_id: &str, text: &str) -> CliResult {
        let ctx = self.context().await?;
        let response = self.quiz.submit_answer(&ctx, question_id, text)?;
        self.follow(response).await
    }

    pub async fn next(&self) -> CliResult {
        let ctx = self.context().await?;
        let response = self.quiz.advance(&ctx)?;
        self.follow(response).await
    }

    pub async fn result(&self) -> CliResult {
        let ctx = self.context().await?;
        print_result(&self.quiz.show_result(&ctx));
        Ok(())
    }

    pub async fn reset(&self) -> CliResult {
        let ctx = self.context().await?;
        let response = self.quiz.return_home(&ctx);
        self.follow(response).await
    }

    /// Answer the current session interactively. `:q` leaves without ending it.
    pub async fn play(&self) -> CliResult {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let ctx = self.context().await?;
            let response = match self.quiz.study(&ctx) {
                StudyScreen::Question(view) => {
                    print_question(&view);
                    let Some(line) = lines.next_line().await? else {
                        return Ok(());
                    };
                    if line.trim() == ":q" {
                        return Ok(());
                    }
                    let answer = resolve_choice(&view, &line);
                    self.quiz.submit_answer(&ctx, view.id.as_str(), &answer)?
                }
                StudyScreen::Feedback(view) => {
                    print_feedback(&view);
                    println!("(Enter で次へ)");
                    if lines.next_line().await?.is_none() {
                        return Ok(());
                    }
                    self.quiz.advance(&ctx)?
                }
                StudyScreen::Redirect(Route::Result) => {
                    print_result(&self.quiz.show_result(&ctx));
                    return Ok(());
                }
                StudyScreen::Redirect(_) => {
                    println!("進行中のセッションはありません。`start` で開始してください。");
                    return Ok(());
                }
            };
            response
                .apply(self.storage.cookies.as_ref(), self.clock.now())
                .await?;
        }
    }
}

/// A bare number picks the numbered choice of a fill question.
fn resolve_choice(view: &QuestionView, line: &str) -> String {
    let trimmed = line.trim();
    // A choice typed out verbatim wins over a numbered pick.
    if view.mode != QuizMode::Fill || view.choices.iter().any(|choice| choice == trimmed) {
        return trimmed.to_string();
    }
    trimmed
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| view.choices.get(i))
        .cloned()
        .unwrap_or_else(|| trimmed.to_string())
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn print_home(view: &HomeView) {
    println!("試験まで あと {} 日", view.days_left);
    println!("復習待ち: {} 問", view.wrong_count);
    println!();
    println!("{}", view.chart_title);
    for (label, value) in view.labels.iter().zip(&view.values) {
        println!("  {label}  {:>3} {}", value, "#".repeat(*value));
    }
    println!();
    println!("分野: {}", view.categories.join(" / "));
}

fn print_question(view: &QuestionView) {
    println!(
        "[{}/{}] {}% ({})  {}",
        view.index, view.total, view.progress, view.category, view.id
    );
    println!("{}", view.prompt);
    for (n, choice) in view.choices.iter().enumerate() {
        println!("  {}. {choice}", n + 1);
    }
}

fn print_feedback(view: &FeedbackView) {
    let verdict = if view.correct { "正解" } else { "不正解" };
    println!(
        "[{}/{}] {}% ({})  {verdict}",
        view.index, view.total, view.progress, view.category
    );
    println!("{}", view.prompt);
    println!("正答: {}", view.canonical_answer);
    println!("解説: {}", view.note);
}

fn print_result(view: &ResultView) {
    println!("結果: {} / {} 問正解 ({}点)", view.correct, view.total, view.score);
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    fn view(mode: QuizMode, choices: &[&str]) -> QuestionView {
        QuestionView {
            id: QuestionId::new("f_a_0"),
            mode,
            category: "理論".into(),
            prompt: "p".into(),
            choices: choices.iter().map(ToString::to_string).collect(),
            index: 1,
            total: 1,
            progress: 0,
        }
    }

    #[test]
    fn numbers_pick_fill_choices() {
        let fill = view(QuizMode::Fill, &["V", "A", "W", "Ω"]);
        assert_eq!(resolve_choice(&fill, " 3\n"), "W");
        assert_eq!(resolve_choice(&fill, "9"), "9");
        assert_eq!(resolve_choice(&fill, "0"), "0");
        assert_eq!(resolve_choice(&fill, "V"), "V");

        let ox = view(QuizMode::Ox, &[]);
        assert_eq!(resolve_choice(&ox, "1"), "1");
    }

    #[test]
    fn numeric_choices_match_literally_first() {
        let fill = view(QuizMode::Fill, &["3", "1", "2", "4"]);
        assert_eq!(resolve_choice(&fill, "2"), "2");
        assert_eq!(resolve_choice(&fill, " 4 "), "4");

        let mixed = view(QuizMode::Fill, &["10", "20", "2", "40"]);
        assert_eq!(resolve_choice(&mixed, "2"), "2");
        assert_eq!(resolve_choice(&mixed, "1"), "10");
    }
}
