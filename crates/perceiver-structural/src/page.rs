use parking_lot::RwLock;
use roundwatch_core_types::GameMode;
use tracing::debug;

use crate::model::PageFacts;
use crate::reader::{read_document, PageReader};
use crate::selectors::PageSelectors;

/// Live handle onto the observed page. A driver feeds it DOM snapshots as they arrive;
/// the engine reads whatever the latest snapshot said.
pub struct ObservedPage {
    selectors: PageSelectors,
    facts: RwLock<PageFacts>,
}

impl ObservedPage {
    pub fn new(selectors: PageSelectors) -> Self {
        Self {
            selectors,
            facts: RwLock::new(PageFacts::default()),
        }
    }

    /// Re-reads the page from a fresh snapshot.
    pub fn load(&self, url: &str, html: &str) -> PageFacts {
        let facts = read_document(url, html, &self.selectors);
        debug!(
            %url,
            mode = %facts.mode,
            game_id = %facts.game_id,
            round = facts.round,
            game_layout = facts.game_layout,
            result_layout = facts.result_layout,
            final_score_layout = facts.final_score_layout,
            "page snapshot read"
        );
        *self.facts.write() = facts.clone();
        facts
    }

    /// Replaces the facts directly, for drivers that already derived them.
    pub fn set_facts(&self, facts: PageFacts) {
        *self.facts.write() = facts;
    }
}

impl PageReader for ObservedPage {
    fn game_mode(&self) -> GameMode {
        self.facts.read().mode
    }

    fn game_id(&self) -> String {
        self.facts.read().game_id.clone()
    }

    fn current_round_number(&self) -> u32 {
        self.facts.read().round
    }

    fn game_layout_visible(&self) -> bool {
        self.facts.read().game_layout
    }

    fn result_layout_visible(&self) -> bool {
        self.facts.read().result_layout
    }

    fn final_score_layout_visible(&self) -> bool {
        self.facts.read().final_score_layout
    }

    fn facts(&self) -> PageFacts {
        self.facts.read().clone()
    }
}
