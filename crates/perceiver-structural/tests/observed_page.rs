use std::sync::Arc;

use perceiver_structural::{ObservedPage, PageFacts, PageReader, SelectorSet};
use roundwatch_core_types::GameMode;

const ROUND_TWO: &str = r#"
<html><body><div id="__next">
  <main class="game-layout">
    <div class="status_inner__abc">
      <div data-qa="round-number">
        <div class="status_label__x">Round</div>
        <div class="status_value__y">2 / 5</div>
      </div>
    </div>
  </main>
</div></body></html>"#;

const RESULT_SCREEN: &str = r#"
<html><body><div id="__next">
  <main class="game-layout">
    <div class="status_inner__abc">
      <div data-qa="round-number">
        <div class="status_label__x">Round</div>
        <div class="status_value__y">2 / 5</div>
      </div>
    </div>
    <div class="round-result_wrapper__q1"></div>
  </main>
</div></body></html>"#;

fn page() -> Arc<ObservedPage> {
    Arc::new(ObservedPage::new(SelectorSet::default().compile().unwrap()))
}

#[test]
fn fresh_page_reads_as_unknown() {
    let page = page();
    assert_eq!(page.facts(), PageFacts::default());
    assert_eq!(page.current_round_number(), 0);
    assert_eq!(page.game_mode(), GameMode::Unrecognized);
}

#[test]
fn snapshots_replace_previous_facts() {
    let page = page();
    let shared: Arc<ObservedPage> = Arc::clone(&page);

    page.load("https://www.geoguessr.com/game/Qw3rTy", ROUND_TWO);
    assert_eq!(shared.current_round_number(), 2);
    assert_eq!(shared.game_id(), "Qw3rTy");
    assert!(shared.game_layout_visible());
    assert!(!shared.result_layout_visible());

    page.load("https://www.geoguessr.com/game/Qw3rTy", RESULT_SCREEN);
    assert!(shared.result_layout_visible());
    assert_eq!(shared.current_round_number(), 2);

    page.load("https://www.geoguessr.com/", "<html></html>");
    assert_eq!(shared.game_mode(), GameMode::Unrecognized);
    assert!(!shared.game_layout_visible());
}

#[test]
fn facts_can_be_set_directly() {
    let page = page();
    page.set_facts(PageFacts::in_round(GameMode::Challenge, "c1", 4).with_result());
    let facts = page.facts();
    assert!(facts.mode.is_challenge());
    assert_eq!(facts.round, 4);
    assert!(facts.result_layout);
}
