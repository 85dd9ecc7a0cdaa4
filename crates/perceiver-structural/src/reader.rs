//! Page reads. Every read degrades to its default instead of failing: the page is
//! mid-render often enough that a missing element is normal.

use std::sync::Arc;

use roundwatch_core_types::GameMode;
use scraper::{ElementRef, Html};
use tracing::trace;
use url::Url;

use crate::model::PageFacts;
use crate::selectors::PageSelectors;

/// Cheap synchronous facts about the current page.
pub trait PageReader {
    fn game_mode(&self) -> GameMode;
    /// Last path segment of the URL; empty when unknown.
    fn game_id(&self) -> String;
    /// 0 when the round counter is missing or unreadable.
    fn current_round_number(&self) -> u32;
    fn game_layout_visible(&self) -> bool;
    fn result_layout_visible(&self) -> bool;
    fn final_score_layout_visible(&self) -> bool;

    fn facts(&self) -> PageFacts {
        PageFacts {
            mode: self.game_mode(),
            game_id: self.game_id(),
            round: self.current_round_number(),
            game_layout: self.game_layout_visible(),
            result_layout: self.result_layout_visible(),
            final_score_layout: self.final_score_layout_visible(),
        }
    }
}

impl PageReader for PageFacts {
    fn game_mode(&self) -> GameMode {
        self.mode
    }

    fn game_id(&self) -> String {
        self.game_id.clone()
    }

    fn current_round_number(&self) -> u32 {
        self.round
    }

    fn game_layout_visible(&self) -> bool {
        self.game_layout
    }

    fn result_layout_visible(&self) -> bool {
        self.result_layout
    }

    fn final_score_layout_visible(&self) -> bool {
        self.final_score_layout
    }

    fn facts(&self) -> PageFacts {
        self.clone()
    }
}

impl<R: PageReader + ?Sized> PageReader for Arc<R> {
    fn game_mode(&self) -> GameMode {
        (**self).game_mode()
    }

    fn game_id(&self) -> String {
        (**self).game_id()
    }

    fn current_round_number(&self) -> u32 {
        (**self).current_round_number()
    }

    fn game_layout_visible(&self) -> bool {
        (**self).game_layout_visible()
    }

    fn result_layout_visible(&self) -> bool {
        (**self).result_layout_visible()
    }

    fn final_score_layout_visible(&self) -> bool {
        (**self).final_score_layout_visible()
    }

    fn facts(&self) -> PageFacts {
        (**self).facts()
    }
}

pub fn game_mode_from_url(url: &Url) -> GameMode {
    let path = url.path();
    if path.starts_with("/game/") {
        GameMode::Game
    } else if path.starts_with("/challenge/") {
        GameMode::Challenge
    } else {
        GameMode::Unrecognized
    }
}

pub fn game_id_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_string()
}

/// Parses counter text such as `"2 / 5"`; leading digits before the slash win.
pub fn parse_round_counter(text: &str) -> u32 {
    let head = text.split('/').next().unwrap_or_default().trim();
    let digits: String = head.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Derives [`PageFacts`] from one HTML snapshot of the page at `url`.
pub fn read_document(url: &str, html: &str, selectors: &PageSelectors) -> PageFacts {
    let (mode, game_id) = match Url::parse(url) {
        Ok(parsed) => (game_mode_from_url(&parsed), game_id_from_url(&parsed)),
        Err(err) => {
            trace!(%url, ?err, "page url unreadable");
            (GameMode::Unrecognized, String::new())
        }
    };

    let document = Html::parse_document(html);
    let round = document
        .select(&selectors.round_counter)
        .next()
        .and_then(|counter| counter.children().filter_map(ElementRef::wrap).nth(1))
        .map(|value| parse_round_counter(&value.text().collect::<String>()))
        .unwrap_or(0);

    PageFacts {
        mode,
        game_id,
        round,
        game_layout: document.select(&selectors.game_layout).next().is_some(),
        result_layout: document.select(&selectors.result_layout).next().is_some(),
        final_score_layout: document
            .select(&selectors.final_score_layout)
            .next()
            .is_some(),
    }
}
