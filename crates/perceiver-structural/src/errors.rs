use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerceiverError {
    #[error("invalid {name} selector `{selector}`: {reason}")]
    InvalidSelector {
        name: &'static str,
        selector: String,
        reason: String,
    },
}
