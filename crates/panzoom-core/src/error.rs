/// Rejected external input. The controller keeps its previous state
/// whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApzError {
    InvalidZoomConstraints { min: f32, max: f32 },
    NonFiniteZoomRect,
}

impl std::fmt::Display for ApzError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApzError::InvalidZoomConstraints { min, max } => {
                write!(f, "invalid zoom constraints: min {min}, max {max}")
            }
            ApzError::NonFiniteZoomRect => write!(f, "zoom target rect is not finite"),
        }
    }
}

impl std::error::Error for ApzError {}
