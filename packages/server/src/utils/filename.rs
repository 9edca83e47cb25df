/// Longest accepted file name, in characters.
pub const MAX_NAME_LEN: usize = 256;

/// Reason a file name was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    TooLong,
    /// Contains `/` or `\`.
    ContainsPathSeparator,
    /// Is `.` or `..`.
    DotSegment,
    /// Contains control characters (CR, LF, NUL, ...).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "File name cannot be empty",
            Self::TooLong => "File name exceeds maximum length of 256 characters",
            Self::ContainsPathSeparator => "Invalid file name: path separators are not allowed",
            Self::DotSegment => "Invalid file name: '.' and '..' are not allowed",
            Self::ControlCharacter => "Invalid file name: control characters are not allowed",
        }
    }
}

/// Validates a file name. Names are used verbatim, without trimming.
pub fn validate_file_name(name: &str) -> Result<&str, FilenameError> {
    if name.is_empty() {
        return Err(FilenameError::Empty);
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(FilenameError::TooLong);
    }

    // Names end up in Content-Disposition headers.
    if name.chars().any(char::is_control) {
        return Err(FilenameError::ControlCharacter);
    }

    if name.contains('/') || name.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if name == "." || name == ".." {
        return Err(FilenameError::DotSegment);
    }

    Ok(name)
}
