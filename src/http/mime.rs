//! MIME type detection module
//!
//! Returns the Content-Type and pre-compressed Content-Encoding for a file
//! extension.

/// Get MIME Content-Type based on file extension
///
/// Unknown or missing extensions are served as `text/plain`; HTML carries an
/// explicit UTF-8 charset.
///
/// # Examples
/// ```
/// use serw::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("html")), "text/html;charset=utf-8");
/// assert_eq!(get_content_type(Some("mp4")), "video/mp4");
/// assert_eq!(get_content_type(None), "text/plain");
/// ```
pub fn get_content_type(extension: Option<&str>) -> String {
    let Some(mime) = extension.and_then(|ext| mime_guess::from_ext(ext).first()) else {
        return "text/plain".to_string();
    };

    if mime.essence_str() == "text/html" {
        "text/html;charset=utf-8".to_string()
    } else {
        mime.essence_str().to_string()
    }
}

/// Content-Encoding implied by a pre-compressed file extension
pub fn get_content_encoding(extension: Option<&str>) -> Option<&'static str> {
    match extension {
        Some("br") => Some("br"),
        Some("gz") => Some("gzip"),
        Some("deflate") => Some("deflate"),
        _ => None,
    }
}
