use flock_derive::flock_error;
use std::borrow::Cow;

#[flock_error]
pub enum LookupError {
    #[error("Not found")]
    NotFound,

    #[error("Invalid key{}: {key}", format_context(.context))]
    InvalidKey { key: String, context: Option<Cow<'static, str>> },
}

fn main() {
    let missing = LookupError::NotFound;
    assert_eq!(missing.kind(), "NotFound");
    assert_eq!(missing.context_ref(), None);

    let invalid: Result<(), LookupError> =
        Err(LookupError::InvalidKey { key: "x".into(), context: None });
    let invalid = invalid.context("account").unwrap_err();
    assert_eq!(invalid.kind(), "InvalidKey");
    assert_eq!(invalid.to_string(), "Invalid key (account): x");
}
