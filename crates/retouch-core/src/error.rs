/// Errors raised by the retouch core.
///
/// Cancellation is not listed here: a superseded run ends with
/// [`crate::Cancelled`], which is a normal outcome rather than a failure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("pixel data holds {actual} pixels but a {width}x{height} image needs {expected}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("raw RGB data length {0} is not a multiple of 3")]
    RawLength(usize),
    #[error("no source image loaded")]
    NoSource,
    #[error("invalid adjustment parameter `{name}`: {value}")]
    InvalidParam { name: &'static str, value: f32 },
    #[error("failed to parse adjustment parameters: {0}")]
    Params(#[from] serde_json::Error),
    #[error("failed to spawn pipeline worker: {0}")]
    Spawn(#[source] std::io::Error),
}
