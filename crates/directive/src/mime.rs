//! File extension to MIME type lookup.

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "gif", "png", "svg"];
const FONT_EXTENSIONS: &[&str] = &["woff", "ttf", "otf", "eot", "woff2"];

/// Return the extension after the last `.` of a file name, if any.
pub fn extension(name: &str) -> Option<&str> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => Some(&file_name[idx + 1..]),
        _ => None,
    }
}

/// Whether the name ends with a recognized image extension.
pub fn is_image(name: &str) -> bool {
    extension(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
}

/// Whether the name ends with a recognized font extension.
pub fn is_font(name: &str) -> bool {
    extension(name).is_some_and(|ext| FONT_EXTENSIONS.contains(&ext))
}

/// Look up the MIME type for a file name by its extension.
pub fn mime_type(name: &str) -> Option<&'static str> {
    let ext = extension(name)?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "md" => "text/markdown",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

/// Whether the MIME type should carry a `charset=UTF-8` parameter.
pub fn is_text(mime: &str) -> bool {
    mime.starts_with("text")
}

/// Build a `Content-Type` value with the charset parameter for text types.
pub fn content_type(mime: &str) -> String {
    if is_text(mime) {
        format!("{mime}; charset=UTF-8")
    } else {
        mime.to_string()
    }
}
