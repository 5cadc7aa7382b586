use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Two values have no order between them
    #[error("cannot order `{left}` against `{right}`")]
    Incomparable { left: String, right: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
impl Error {
    pub(crate) fn incomparable(
        left: &impl core::fmt::Debug,
        right: &impl core::fmt::Debug,
    ) -> Self {
        Self::Incomparable {
            left: format!("{left:?}"),
            right: format!("{right:?}"),
        }
    }
}
