use crate::UtilsError;

/// Validates a backend key or folder so it cannot escape the backend root.
pub fn validate_remote_path(path: &str) -> Result<(), UtilsError> {
    if path.contains('\0') {
        return Err(UtilsError::PathError(
            "Path contains null byte".to_string()
        ));
    }

    // Check for path traversal attempts
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(UtilsError::PathError(
            format!("Path '{}' contains '..' (path traversal attempt)", path)
        ));
    }

    Ok(())
}

/// Reduces a client-supplied file name to a safe final component.
///
/// Browsers may send full client paths (`C:\Users\me\cat.png`), so only the
/// last segment is kept. Names that cannot address a regular file are rejected.
pub fn sanitize_file_name(file_name: &str) -> Result<String, UtilsError> {
    if file_name.contains('\0') {
        return Err(UtilsError::FileNameError(
            "File name contains null byte".to_string()
        ));
    }

    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => Err(UtilsError::FileNameError(
            format!("'{}' is not a usable file name", file_name)
        )),
        // Check for Windows drive letters (C:, D:, etc.)
        name if name.len() == 2 && name.ends_with(':') => Err(UtilsError::FileNameError(
            "Drive letters are not allowed".to_string()
        )),
        name => Ok(name.to_string()),
    }
}
