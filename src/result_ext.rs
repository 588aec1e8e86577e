//! Extension methods for annotating `Result` values.

use std::error::Error;

use crate::{dict::Dict, flaw::Flaw};

/// Extension trait turning the error of a `Result` into a [`Flaw`].
///
/// Both methods delegate to [`Flaw::wrap`]: when the error already carries
/// a `Flaw` the annotation is appended to it, otherwise a new flaw is
/// created. This lets `?`-style call chains annotate failures in one call:
///
/// ```
/// use flaw::{Flaw, ResultExt, dict};
///
/// fn create_user(id: &str, age: u8) -> Result<(), Flaw> {
///     insert_key("bad-key", id).flaw_with(
///         "failed to create user",
///         dict! { "id" => id, "age" => age },
///     )
/// }
///
/// fn insert_key(key: &str, value: &str) -> Result<(), std::io::Error> {
///     # let _ = (key, value);
///     Err(std::io::Error::other("attempt to insert a bad key"))
/// }
///
/// let flaw = create_user("a", 42).unwrap_err();
/// assert_eq!(flaw.inner(), "failed to create user: attempt to insert a bad key");
/// ```
pub trait ResultExt<T> {
    /// Annotates the error with a message, wrapping it into a [`Flaw`].
    ///
    /// # Panics
    ///
    /// Panics if `message` or the error's description is empty.
    fn flaw(self, message: &str) -> Result<T, Flaw>;

    /// Annotates the error with a message and a payload.
    ///
    /// # Panics
    ///
    /// Panics if `message` or the error's description is empty.
    fn flaw_with(self, message: &str, payload: Dict) -> Result<T, Flaw>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    #[track_caller]
    fn flaw(self, message: &str) -> Result<T, Flaw> {
        self.flaw_with(message, Dict::new())
    }

    #[track_caller]
    fn flaw_with(self, message: &str, payload: Dict) -> Result<T, Flaw> {
        match self {
            Ok(value) => Ok(value),
            Err(failure) => Err(Flaw::wrap(failure, message, payload)),
        }
    }
}
