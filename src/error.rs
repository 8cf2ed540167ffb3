use thiserror::Error;

pub type FormResult<T> = Result<T, FormError>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("form document error: {0}")]
    Json(#[from] serde_json::Error),

    /// The settings file is neither valid TOML nor valid JSON.
    #[error("settings parse error: {0}")]
    SettingsParse(String),

    /// Settings could not be serialized for writing.
    #[error("settings write error: {0}")]
    SettingsWrite(String),

    /// Two elements on one page share an id.
    #[error("duplicate element id `{0}`")]
    DuplicateElementId(String),

    /// An image element's source failed to decode.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl FormError {
    pub fn settings_parse(msg: impl Into<String>) -> Self {
        Self::SettingsParse(msg.into())
    }

    pub fn settings_write(msg: impl Into<String>) -> Self {
        Self::SettingsWrite(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FormError::DuplicateElementId("e1".to_string())
                .to_string()
                .contains("duplicate element id `e1`")
        );
        assert!(
            FormError::settings_parse("x")
                .to_string()
                .starts_with("settings parse error:")
        );
        assert!(
            FormError::settings_write("x")
                .to_string()
                .starts_with("settings write error:")
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: FormError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, FormError::Io(_)));
    }
}
