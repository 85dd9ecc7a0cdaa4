use std::sync::Arc;

use network_tap_light::{HttpClient, HttpRequest, HttpResponse, TappedClient};
use roundwatch::trace::ScriptedClient;
use roundwatch::{
    EngineBuilder, FileSlots, GameState, LifecycleKind, ObservedPage, Phase,
    ReconciliationEngine, SelectorSet, StateStore,
};
use serde_json::json;

const KEY: &str = "GeoGuessrEventFramework_STATE";

fn page_html(round: u32, result: bool, final_score: bool) -> String {
    let result = if result {
        r#"<div class="round-result_wrapper__Q1x"></div>"#
    } else {
        ""
    };
    let final_score = if final_score {
        r#"<div class="result-layout_root__Zz"><div class="result-overlay_overlayContent__Aa"></div></div>"#
    } else {
        ""
    };
    format!(
        r#"<html><body><div class="game-layout">
             <div class="status_inner__3xTa9">
               <div data-qa="round-number">
                 <div class="status_label__SNHKT">Round</div>
                 <div class="status_value__w_Nh0">{round} / 5</div>
               </div>
             </div>
             {result}{final_score}
           </div></body></html>"#
    )
}

fn payload(token: &str, round: u32) -> Vec<u8> {
    let rounds: Vec<_> = (1..=round)
        .map(|n| json!({"lat": n as f64, "lng": n as f64}))
        .collect();
    let guesses: Vec<_> = (1..=round)
        .map(|n| {
            json!({
                "lat": n as f64 + 0.1,
                "lng": n as f64 + 0.1,
                "roundScore": {"amount": "5000", "unit": "points", "percentage": 100.0},
                "distance": {
                    "meters": {"amount": "0.2", "unit": "km"},
                    "miles": {"amount": "0.1", "unit": "miles"}
                }
            })
        })
        .collect();
    json!({
        "token": token,
        "round": round,
        "map": "world",
        "mapName": "A Diverse World",
        "rounds": rounds,
        "player": {
            "guesses": guesses,
            "totalScore": {"amount": (5000 * round).to_string(), "unit": "points", "percentage": 100.0},
            "totalDistance": {
                "meters": {"amount": "0.2", "unit": "km"},
                "miles": {"amount": "0.1", "unit": "miles"}
            }
        }
    })
    .to_string()
    .into_bytes()
}

struct Session {
    page: Arc<ObservedPage>,
    client: TappedClient<ScriptedClient>,
    engine: ReconciliationEngine<Arc<ObservedPage>>,
}

impl Session {
    fn open(dir: &std::path::Path) -> Self {
        let page = Arc::new(ObservedPage::new(SelectorSet::default().compile().unwrap()));
        let engine = EngineBuilder::new()
            .slot(Arc::new(FileSlots::new(dir)))
            .build(page.clone())
            .unwrap();
        let client = TappedClient::new(ScriptedClient::new(), engine.tap().clone());
        Self {
            page,
            client,
            engine,
        }
    }

    fn show(&mut self, url: &str, html: &str) -> Vec<LifecycleKind> {
        self.page.load(url, html);
        self.engine
            .on_page_changed()
            .into_iter()
            .map(|event| event.kind)
            .collect()
    }

    async fn fetch(&self, url: &str, body: Vec<u8>) {
        self.client
            .inner()
            .push(url, HttpResponse::new(200, body));
        self.client.execute(HttpRequest::get(url)).await.unwrap();
    }
}

#[tokio::test]
async fn payload_from_a_previous_round_is_not_used() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(dir.path());
    let url = "https://www.geoguessr.com/game/abc";
    let api = "https://www.geoguessr.com/api/v3/games/abc";

    assert_eq!(
        session.show(url, &page_html(1, false, false)),
        vec![LifecycleKind::GameStart, LifecycleKind::RoundStart]
    );
    session.fetch(api, payload("abc", 1)).await;
    assert_eq!(
        session.show(url, &page_html(1, true, false)),
        vec![LifecycleKind::RoundEnd]
    );
    assert!(session.engine.state().round(1).is_some());

    assert_eq!(
        session.show(url, &page_html(2, false, false)),
        vec![LifecycleKind::RoundStart]
    );
    // Round 2's result shows before its payload arrives; the round-1 payload is stale.
    assert_eq!(
        session.show(url, &page_html(2, true, false)),
        vec![LifecycleKind::RoundEnd]
    );
    assert!(session.engine.state().round(2).is_none());
    assert_eq!(session.engine.state().recorded_rounds(), 1);
}

#[tokio::test]
async fn challenge_replay_under_same_id_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(dir.path());
    let url = "https://www.geoguessr.com/challenge/abc";
    let api = "https://www.geoguessr.com/api/v3/challenges/abc/game";

    session.show(url, &page_html(1, false, false));
    session.fetch(api, payload("abc", 1)).await;
    session.show(url, &page_html(1, true, false));
    session.show(url, &page_html(2, false, false));
    assert!(session.engine.state().is_challenge_link);
    assert_eq!(session.engine.state().recorded_rounds(), 1);

    let mut rx = session.engine.subscribe();
    let fired = session.show(url, &page_html(1, false, false));
    assert_eq!(
        fired,
        vec![
            LifecycleKind::RoundEnd,
            LifecycleKind::GameStart,
            LifecycleKind::RoundStart
        ]
    );
    let _round_end = rx.try_recv().unwrap();
    let game_start = rx.try_recv().unwrap();
    assert!(game_start.state.rounds.is_empty());
    assert_eq!(session.engine.state().current_round, 1);
}

#[tokio::test]
async fn full_game_persists_every_transition() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(dir.path());
    let url = "https://www.geoguessr.com/game/abc";
    let api = "https://www.geoguessr.com/api/v3/games/abc";
    let store = StateStore::new(Arc::new(FileSlots::new(dir.path())), KEY);

    let mut fired = Vec::new();
    for round in 1..=5 {
        fired.extend(session.show(url, &page_html(round, false, false)));
        fired.extend(session.show(url, &page_html(round, false, false)));
        session.fetch(api, payload("abc", round)).await;
        fired.extend(session.show(url, &page_html(round, true, false)));
        assert_eq!(&store.peek().unwrap().unwrap(), session.engine.state());
    }
    fired.extend(session.show(url, &page_html(5, true, true)));

    assert_eq!(fired.first(), Some(&LifecycleKind::GameStart));
    assert_eq!(fired.last(), Some(&LifecycleKind::GameEnd));
    assert_eq!(fired.len(), 12);

    let persisted = store.peek().unwrap().unwrap();
    assert!(!persisted.game_in_progress);
    assert_eq!(persisted.recorded_rounds(), 5);
    assert_eq!(persisted.total_score.amount, 25000.0);
    assert_eq!(persisted.map.name, "A Diverse World");
    assert_eq!(session.engine.phase(), Phase::GameFinished);
}

#[test]
fn reload_mid_round_resets_and_rewrites_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(Arc::new(FileSlots::new(dir.path())), KEY);
    let mut state = GameState::default();
    state.current_game_id = "abc".into();
    state.current_round = 3;
    state.round_in_progress = true;
    state.game_in_progress = false;
    store.save(&state).unwrap();

    let session = Session::open(dir.path());
    let restored = session.engine.state();
    assert_eq!(restored.current_game_id, "abc");
    assert_eq!(restored.current_round, 0);
    assert!(!restored.round_in_progress);
    assert!(restored.game_in_progress);

    let rewritten = store.peek().unwrap().unwrap();
    assert_eq!(&rewritten, restored);
}

#[test]
fn continuing_after_reload_keeps_recorded_rounds() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://www.geoguessr.com/game/abc";
    {
        let mut session = Session::open(dir.path());
        session.show(url, &page_html(1, false, false));
        session.engine.tap().observe(
            "https://www.geoguessr.com/api/v3/games/abc",
            200,
            &payload("abc", 1),
        );
        session.show(url, &page_html(1, true, false));
        session.show(url, &page_html(2, false, false));
    }

    let mut session = Session::open(dir.path());
    let fired = session.show(url, &page_html(2, false, false));
    assert_eq!(fired, vec![LifecycleKind::RoundStart]);
    assert_eq!(session.engine.state().recorded_rounds(), 1);
    assert_eq!(session.engine.state().current_round, 2);
}

#[test]
fn non_game_pages_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(dir.path());
    let fired = session.show(
        "https://www.geoguessr.com/maps/world",
        &page_html(1, false, false),
    );
    assert!(fired.is_empty());
    assert_eq!(session.engine.state(), &GameState::default());
    assert!(StateStore::new(Arc::new(FileSlots::new(dir.path())), KEY)
        .peek()
        .unwrap()
        .is_none());
}
