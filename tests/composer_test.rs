//! Integration tests for poem composition and its degradation rules.

mod common;

use common::{add_line, scope, setup, TestApp};
use haikubot::{
    LinePosition, PoemComposer, PoemRepository, Sampler, SyllableCount,
};

fn composer(app: &TestApp) -> PoemComposer {
    PoemComposer::new(Sampler::new(app.lines.clone()), app.poems.clone())
}

#[tokio::test]
async fn test_generates_five_seven_five() {
    let app = setup().await;
    add_line(&app, "old silent pond here", SyllableCount::Five, "U1", None).await;
    add_line(&app, "splash and then silence", SyllableCount::Five, "U2", None).await;
    add_line(
        &app,
        "a frog jumps into the pond",
        SyllableCount::Seven,
        "U1",
        None,
    )
    .await;

    let poem = composer(&app)
        .generate(&scope(), None, None)
        .await
        .unwrap()
        .expect("poem should be generated");

    assert_eq!(poem.lines[1].text, "a frog jumps into the pond");
    assert_ne!(poem.lines[0].text, poem.lines[2].text);
    for slot in [0, 2] {
        assert!(
            ["old silent pond here", "splash and then silence"]
                .contains(&poem.lines[slot].text.as_str())
        );
    }
    assert_eq!(app.poems.count("T1", None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_fails_without_two_fives() {
    let app = setup().await;
    add_line(&app, "old silent pond here", SyllableCount::Five, "U1", None).await;
    add_line(
        &app,
        "a frog jumps into the pond",
        SyllableCount::Seven,
        "U1",
        None,
    )
    .await;

    let poem = composer(&app).generate(&scope(), None, None).await.unwrap();
    assert!(poem.is_none());
    assert_eq!(app.poems.count("T1", None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_fails_without_a_seven() {
    let app = setup().await;
    add_line(&app, "old silent pond here", SyllableCount::Five, "U1", None).await;
    add_line(&app, "splash and then silence", SyllableCount::Five, "U1", None).await;

    let poem = composer(&app).generate(&scope(), None, None).await.unwrap();
    assert!(poem.is_none());
    assert_eq!(app.poems.count("T1", None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_position_constraints_always_honored() {
    let app = setup().await;
    add_line(
        &app,
        "opening line one",
        SyllableCount::Five,
        "U1",
        Some(LinePosition::First),
    )
    .await;
    add_line(
        &app,
        "opening line two",
        SyllableCount::Five,
        "U1",
        Some(LinePosition::First),
    )
    .await;
    add_line(
        &app,
        "closing line one",
        SyllableCount::Five,
        "U1",
        Some(LinePosition::Last),
    )
    .await;
    add_line(
        &app,
        "closing line two",
        SyllableCount::Five,
        "U1",
        Some(LinePosition::Last),
    )
    .await;
    add_line(
        &app,
        "a frog jumps into the pond",
        SyllableCount::Seven,
        "U1",
        None,
    )
    .await;

    let composer = composer(&app);
    for _ in 0..20 {
        let poem = composer
            .generate(&scope(), None, None)
            .await
            .unwrap()
            .expect("poem should be generated");
        assert!(poem.lines[0].text.starts_with("opening"));
        assert!(poem.lines[2].text.starts_with("closing"));
    }
}

#[tokio::test]
async fn test_single_constrained_pair_is_deterministic() {
    let app = setup().await;
    add_line(
        &app,
        "dawn opens the sky",
        SyllableCount::Five,
        "U1",
        Some(LinePosition::First),
    )
    .await;
    add_line(
        &app,
        "splash and then silence",
        SyllableCount::Five,
        "U1",
        Some(LinePosition::Last),
    )
    .await;
    add_line(
        &app,
        "a frog jumps into the pond",
        SyllableCount::Seven,
        "U1",
        None,
    )
    .await;

    // With exactly one opening and one closing five there is only one
    // admissible arrangement; every draw must produce it.
    let composer = composer(&app);
    for _ in 0..30 {
        let poem = composer
            .generate(&scope(), None, None)
            .await
            .unwrap()
            .expect("poem should be generated");
        assert_eq!(poem.lines[0].text, "dawn opens the sky");
        assert_eq!(poem.lines[1].text, "a frog jumps into the pond");
        assert_eq!(poem.lines[2].text, "splash and then silence");
    }
}

#[tokio::test]
async fn test_owner_filter_restricts_all_lines() {
    let app = setup().await;
    common::seed_minimal_corpus(&app, "U1").await;
    add_line(&app, "written by the frog", SyllableCount::Five, "U2", None).await;
    add_line(&app, "signed by the old frog", SyllableCount::Five, "U2", None).await;
    add_line(
        &app,
        "seven syllables of frog",
        SyllableCount::Seven,
        "U2",
        None,
    )
    .await;

    let composer = composer(&app);
    for _ in 0..10 {
        let poem = composer
            .generate(&scope(), Some("U2"), None)
            .await
            .unwrap()
            .expect("poem should be generated");
        assert!(poem.owners().iter().all(|owner| *owner == "U2"));
    }
}

#[tokio::test]
async fn test_search_miss_fails_without_persisting() {
    let app = setup().await;
    common::seed_minimal_corpus(&app, "U1").await;

    let poem = composer(&app)
        .generate(&scope(), None, Some("zzz_nothing"))
        .await
        .unwrap();
    assert!(poem.is_none());
    assert_eq!(app.poems.count("T1", None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_search_matching_only_the_seven_still_succeeds() {
    let app = setup().await;
    add_line(&app, "old silent pond here", SyllableCount::Five, "U1", None).await;
    add_line(&app, "splash and then silence", SyllableCount::Five, "U1", None).await;
    add_line(
        &app,
        "the mountain wind sings softly",
        SyllableCount::Seven,
        "U1",
        None,
    )
    .await;

    let poem = composer(&app)
        .generate(&scope(), None, Some("mountain"))
        .await
        .unwrap()
        .expect("poem should be generated");
    assert_eq!(poem.lines[1].text, "the mountain wind sings softly");
}

#[tokio::test]
async fn test_search_matching_a_five_widens_the_pair() {
    let app = setup().await;
    add_line(&app, "the mountain stands tall", SyllableCount::Five, "U1", None).await;
    add_line(&app, "old silent pond here", SyllableCount::Five, "U1", None).await;
    add_line(
        &app,
        "a frog jumps into the pond",
        SyllableCount::Seven,
        "U1",
        None,
    )
    .await;

    // Only one five matches the term; the second slot is filled from the
    // wider pool and the poem still counts as matching.
    let poem = composer(&app)
        .generate(&scope(), None, Some("mountain"))
        .await
        .unwrap()
        .expect("poem should be generated");
    assert!(poem
        .lines
        .iter()
        .any(|line| line.text == "the mountain stands tall"));
}

#[tokio::test]
async fn test_anchored_literal_search_pins_a_line() {
    let app = setup().await;
    common::seed_minimal_corpus(&app, "U1").await;
    add_line(&app, "fresh line just added", SyllableCount::Five, "U1", None).await;

    let anchored = format!("^{}$", regex::escape("fresh line just added"));
    let composer = composer(&app);
    for _ in 0..10 {
        let poem = composer
            .generate(&scope(), None, Some(&anchored))
            .await
            .unwrap()
            .expect("poem should be generated");
        assert!(poem
            .lines
            .iter()
            .any(|line| line.text == "fresh line just added"));
    }
}

#[tokio::test]
async fn test_scoped_to_team() {
    let app = setup().await;
    common::seed_minimal_corpus(&app, "U1").await;

    let other_team = haikubot::Scope::new("T_OTHER", "C1");
    let poem = composer(&app)
        .generate(&other_team, None, None)
        .await
        .unwrap();
    assert!(poem.is_none());
}

#[tokio::test]
async fn test_poem_repository_round_trip() {
    let app = setup().await;
    common::seed_minimal_corpus(&app, "U1").await;

    let poem = composer(&app)
        .generate(&scope(), None, None)
        .await
        .unwrap()
        .expect("poem should be generated");

    let latest = app
        .poems
        .latest("T1", "C1")
        .await
        .unwrap()
        .expect("latest poem should exist");
    assert_eq!(latest.id, poem.id);
    assert_eq!(latest.text(), poem.text());
}
