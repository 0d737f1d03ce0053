//! Action dispatcher integration tests

mod common;

use std::sync::atomic::Ordering;

use common::{FakeLlm, FakeResults, Harness};
use cs2p::{Action, ActionSequence, Classifier, Outcome, RecentSearches};

async fn dispatch_text(harness: &Harness, text: &str, recent: &mut RecentSearches) -> Outcome {
    let actions = Classifier::default().classify(text);
    harness.dispatcher().dispatch(&actions, recent).await
}

fn reply(outcome: Outcome) -> String {
    match outcome {
        Outcome::Reply(text) => text,
        Outcome::Exit => panic!("unexpected exit"),
    }
}

#[tokio::test]
async fn test_first_site_without_search() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "open the first site", &mut recent).await;
    assert_eq!(reply(outcome), "No recent Google search to open.");

    let outcome = dispatch_text(&harness, "open the first video", &mut recent).await;
    assert_eq!(reply(outcome), "No recent YouTube search to open.");

    assert!(harness.calls().is_empty());
    assert!(harness.results.lookups().is_empty());
}

#[tokio::test]
async fn test_search_then_open_first_result() {
    let harness = Harness::with(
        FakeLlm::answering("unused"),
        FakeResults::with(Some("https://www.rust-lang.org/"), None),
    );
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "search google for rust language", &mut recent).await;
    assert_eq!(reply(outcome), "Searched Google for rust language.");
    assert_eq!(
        recent.web.as_deref(),
        Some("https://www.google.com/search?q=rust+language")
    );

    let outcome = dispatch_text(&harness, "open the first site", &mut recent).await;
    assert_eq!(
        reply(outcome),
        "Opened first Google result: https://www.rust-lang.org/"
    );

    assert_eq!(
        harness.results.lookups(),
        ["https://www.google.com/search?q=rust+language"]
    );
    assert_eq!(
        harness.calls(),
        [
            "open_url https://www.google.com/search?q=rust+language reuse=false",
            "open_url https://www.rust-lang.org/ reuse=false",
        ]
    );
}

#[tokio::test]
async fn test_video_search_without_result() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "search youtube for lofi beats", &mut recent).await;
    assert_eq!(reply(outcome), "Searched YouTube for lofi beats.");
    assert_eq!(
        recent.video.as_deref(),
        Some("https://www.youtube.com/results?search_query=lofi+beats")
    );
    assert!(recent.web.is_none());

    let outcome = dispatch_text(&harness, "open the first video", &mut recent).await;
    assert_eq!(reply(outcome), "Couldn't find the first YouTube video.");
}

#[tokio::test]
async fn test_empty_search_query() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "search google", &mut recent).await;
    assert_eq!(reply(outcome), "No search query provided.");
    assert!(recent.web.is_none());
}

#[tokio::test]
async fn test_browser_failure_is_reported() {
    let harness = Harness::new();
    harness.desktop.fail_browser.store(true, Ordering::SeqCst);
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "open youtube", &mut recent).await;
    assert_eq!(
        reply(outcome),
        "Could not open Youtube: browser error: no browser"
    );
}

#[tokio::test]
async fn test_open_website_reuses_tab() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "open youtube", &mut recent).await;
    assert_eq!(reply(outcome), "Opened Youtube.");
    assert_eq!(harness.calls(), ["open_url https://www.youtube.com reuse=true"]);
}

#[tokio::test]
async fn test_open_and_write() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "open notepad and type hello world", &mut recent).await;
    assert_eq!(reply(outcome), "Opened Notepad and wrote: hello world");
    assert_eq!(
        harness.calls(),
        ["launch notepad.exe", "type Notepad: hello world"]
    );
}

#[tokio::test]
async fn test_open_application_failure() {
    let harness = Harness::new();
    harness.desktop.fail_launch.store(true, Ordering::SeqCst);
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "open qwzx", &mut recent).await;
    assert_eq!(reply(outcome), "Could not open qwzx.");
}

#[tokio::test]
async fn test_open_without_name() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let actions = ActionSequence::single(Action::OpenApplication("  ".into()));
    let outcome = harness.dispatcher().dispatch(&actions, &mut recent).await;
    assert_eq!(reply(outcome), "I didn't catch which application to open.");
    assert!(harness.calls().is_empty());
}

#[tokio::test]
async fn test_folder_creation() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "create folder reports", &mut recent).await;
    assert_eq!(reply(outcome), "Folder reports created.");

    let outcome = dispatch_text(&harness, "create folder exists", &mut recent).await;
    assert_eq!(reply(outcome), "Could not create folder.");
}

#[tokio::test]
async fn test_levels_are_absolute() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "increase volume", &mut recent).await;
    assert_eq!(reply(outcome), "Volume set to 80.");
    let outcome = dispatch_text(&harness, "decrease brightness", &mut recent).await;
    assert_eq!(reply(outcome), "Brightness set to 40.");

    assert_eq!(harness.calls(), ["volume 80", "brightness 40"]);
}

#[tokio::test]
async fn test_language_model_fallback() {
    let harness = Harness::with(FakeLlm::answering("Paris."), FakeResults::default());
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "Capital of France", &mut recent).await;
    assert_eq!(reply(outcome), "Paris.");
    assert_eq!(harness.llm.prompts(), ["Capital of France"]);
}

#[tokio::test]
async fn test_language_model_unreachable() {
    let harness = Harness::with(FakeLlm::unreachable(), FakeResults::default());
    let mut recent = RecentSearches::default();

    let outcome = dispatch_text(&harness, "tell me a joke", &mut recent).await;
    assert_eq!(
        reply(outcome),
        "Failed to reach the language model: language model error: connection refused"
    );
}

#[tokio::test]
async fn test_sequence_replies_are_joined_and_exit_is_terminal() {
    let harness = Harness::new();
    let mut recent = RecentSearches::default();
    let dispatcher = harness.dispatcher();

    let actions = ActionSequence::new(Action::SetVolume(80), [Action::AdjustBrightness(90)]);
    let outcome = dispatcher.dispatch(&actions, &mut recent).await;
    assert_eq!(reply(outcome), "Volume set to 80. Brightness set to 90.");

    let actions = ActionSequence::new(Action::Exit, [Action::SetVolume(30)]);
    assert_eq!(dispatcher.dispatch(&actions, &mut recent).await, Outcome::Exit);
    assert_eq!(harness.calls(), ["volume 80", "brightness 90"]);
}
