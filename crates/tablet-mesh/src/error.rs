use tablet_kernel::outline::OutlineError;

/// Hard failures surfaced to the caller. Everything recoverable is reported
/// through [`tablet_kernel::Diagnostics`] instead.
#[derive(Debug, thiserror::Error)]
pub enum TabletError {
    #[error("no outline available: the source resolved to zero usable polygons")]
    NoOutline,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl From<OutlineError> for TabletError {
    fn from(err: OutlineError) -> Self {
        match err {
            OutlineError::NoPolygon => Self::NoOutline,
        }
    }
}
