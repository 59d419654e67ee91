use flock_derive::flock_error;
use std::borrow::Cow;

#[flock_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_config() -> Result<(), DemoError> {
    Err(std::io::Error::other("disk gone")).context("Reading config")?;
    Ok(())
}

fn main() {
    let err = read_config().unwrap_err();
    assert_eq!(err.kind(), "Io");
    assert_eq!(err.context_ref(), Some("Reading config"));
    assert_eq!(err.to_string(), "IO error (Reading config): disk gone");

    let internal: DemoError = "boom".into();
    assert_eq!(internal.kind(), "Internal");
    assert_eq!(internal.context_ref(), None);

    let tagged: Result<(), DemoError> = Err(DemoError::from(String::from("late")));
    let tagged = tagged.context("Retry").unwrap_err();
    assert_eq!(tagged.to_string(), "Internal error (Retry): late");
}
