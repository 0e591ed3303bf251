//! Shared test harness: in-memory database plus fully wired components.
#![allow(dead_code)]

use std::sync::Arc;

use haikubot::SlackContext;
use haikubot::{
    BlameTracker, CommandHandler, DatabaseConnection, HaikuLine, LinePosition, LineRepository,
    LineRepositoryImpl, PoemComposer, PoemRepositoryImpl, Sampler, Scope, StatsAggregator,
    SyllableCount,
};

pub struct TestApp {
    pub db: DatabaseConnection,
    pub lines: Arc<LineRepositoryImpl>,
    pub poems: Arc<PoemRepositoryImpl>,
    pub handler: CommandHandler,
}

/// An in-memory SQLite pool must stay on a single connection, otherwise
/// each pooled connection sees its own empty database.
pub async fn setup() -> TestApp {
    let db = DatabaseConnection::new("sqlite::memory:", 1)
        .await
        .expect("failed to create database connection");
    db.migrate().await.expect("failed to run migrations");

    let lines = Arc::new(LineRepositoryImpl::new(db.pool().clone()));
    let poems = Arc::new(PoemRepositoryImpl::new(db.pool().clone()));

    let sampler = Sampler::new(lines.clone());
    let composer = PoemComposer::new(sampler, poems.clone());
    let stats = StatsAggregator::new(lines.clone(), poems.clone());
    let blame = BlameTracker::new(poems.clone());
    let handler = CommandHandler::new(lines.clone(), composer, stats, blame);

    TestApp {
        db,
        lines,
        poems,
        handler,
    }
}

pub fn context() -> SlackContext {
    SlackContext::new("U_TESTER", "C1", "T1")
}

pub fn scope() -> Scope {
    Scope::new("T1", "C1")
}

pub async fn add_line(
    app: &TestApp,
    text: &str,
    syllables: SyllableCount,
    owner: &str,
    position: Option<LinePosition>,
) -> HaikuLine {
    let line = HaikuLine::new(text, syllables, owner, scope(), position);
    app.lines.add(&line).await.expect("failed to add line");
    line
}

/// Seed enough unconstrained lines for unconstrained generation to succeed.
pub async fn seed_minimal_corpus(app: &TestApp, owner: &str) {
    add_line(app, "old silent pond here", SyllableCount::Five, owner, None).await;
    add_line(app, "splash and then silence", SyllableCount::Five, owner, None).await;
    add_line(
        app,
        "a frog jumps into the pond",
        SyllableCount::Seven,
        owner,
        None,
    )
    .await;
}
