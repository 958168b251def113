use thiserror::Error;

/// Failures the editor reports to the user.
///
/// Interaction rejections inside the tool state machine are not errors;
/// these cover operations invoked from UI chrome that need a notification.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("could not read image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("no active layer")]
    NoActiveLayer,

    #[error("layer `{0}` is locked or hidden")]
    LayerNotEditable(String),

    #[error(transparent)]
    Core(#[from] sk_core::CoreError),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
