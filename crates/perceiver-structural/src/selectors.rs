//! CSS selectors used to probe the host page.
//!
//! The host page ships hashed class names (`status_inner__3xTa9`), so the defaults
//! match on class prefixes.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::errors::PerceiverError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    /// Element whose second child holds text like `"2 / 5"`.
    pub round_counter: String,
    pub game_layout: String,
    pub result_layout: String,
    pub final_score_layout: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            round_counter: r#"div[class^="status_inner__"]>div[data-qa="round-number"]"#
                .to_string(),
            game_layout: ".game-layout".to_string(),
            result_layout: r#"div[class^="round-result_wrapper__"]"#.to_string(),
            final_score_layout: r#"div[class^="result-layout_root__"] div[class^="result-overlay_overlayContent__"]"#
                .to_string(),
        }
    }
}

impl SelectorSet {
    pub fn compile(&self) -> Result<PageSelectors, PerceiverError> {
        Ok(PageSelectors {
            round_counter: parse("round_counter", &self.round_counter)?,
            game_layout: parse("game_layout", &self.game_layout)?,
            result_layout: parse("result_layout", &self.result_layout)?,
            final_score_layout: parse("final_score_layout", &self.final_score_layout)?,
        })
    }
}

/// Compiled form of [`SelectorSet`].
#[derive(Clone, Debug)]
pub struct PageSelectors {
    pub round_counter: Selector,
    pub game_layout: Selector,
    pub result_layout: Selector,
    pub final_score_layout: Selector,
}

fn parse(name: &'static str, selector: &str) -> Result<Selector, PerceiverError> {
    Selector::parse(selector).map_err(|err| PerceiverError::InvalidSelector {
        name,
        selector: selector.to_string(),
        reason: format!("{err:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selectors_compile() {
        SelectorSet::default().compile().expect("defaults compile");
    }

    #[test]
    fn broken_selector_names_the_field() {
        let set = SelectorSet {
            game_layout: "div[".into(),
            ..SelectorSet::default()
        };
        match set.compile() {
            Err(PerceiverError::InvalidSelector { name, .. }) => assert_eq!(name, "game_layout"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
