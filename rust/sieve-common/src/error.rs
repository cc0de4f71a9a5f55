use thiserror::Error;

/// Error returned by posting decoders, executors and the posting resolver.
///
/// The error is a thin box around [`ErrorKind`], which keeps `Result<DocId>`
/// the size of a pointer plus a discriminant on the hot seek path.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Posting data could not be read.
    pub fn file_io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::FileIo {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Posting data is corrupt or uses an unsupported encoding.
    pub fn decode(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Decode {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn not_found(resource: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotFound {
                resource: resource.into(),
            }
            .into(),
        )
    }

    pub fn internal(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Internal {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn is_file_io(&self) -> bool {
        matches!(self.kind(), ErrorKind::FileIo { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self.kind(), ErrorKind::Decode { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound { .. })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Internal { .. })
    }

    pub fn is_invalid_arg(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("IO error for '{context}': {source}")]
    FileIo {
        context: String,
        source: std::io::Error,
    },

    #[error("failed to decode '{element}': {message}")]
    Decode { element: String, message: String },

    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("internal invariant violated: {message}")]
    Internal { message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::file_io("", e)
    }
}
