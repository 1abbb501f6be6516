use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Longest sanitized file name kept in a stored image name
pub const MAX_SANITIZED_NAME_LENGTH: usize = 100;

/// Hex characters of the content digest used as the stored name prefix
pub const CONTENT_HASH_PREFIX_LENGTH: usize = 16;

const WINDOWS_DEVICE_NAMES: [&str; 22] = [
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9", "LPT1",
    "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9", "PRN", "NUL",
];

/// An uploaded image file as received from a form
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn sanitized_name(&self) -> String {
        secure_filename(&self.file_name)
    }

    /// Lower-cased extension of the sanitized name, if any
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.sanitized_name())
    }

    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Name under which the image is stored: content digest prefix plus the sanitized name
    pub fn stored_file_name(&self) -> String {
        let hash = self.content_hash();
        let name = truncate_file_name(&self.sanitized_name(), MAX_SANITIZED_NAME_LENGTH);
        format!("{}_{}", &hash[..CONTENT_HASH_PREFIX_LENGTH], name)
    }
}

/// Reduce an uploaded file name to a safe, flat ASCII name.
///
/// Accented Latin letters are folded to their base letter, path separators
/// become word breaks, whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_` are trimmed.
/// Windows device names get a `_` prefix. The result may be empty.
pub fn secure_filename(file_name: &str) -> String {
    let folded: String = file_name
        .chars()
        .filter_map(|c| if c.is_ascii() { Some(c) } else { fold_accent(c) })
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = folded.split_whitespace().collect::<Vec<_>>().join("_");

    let stripped: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = stripped.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = trimmed.split('.').next().unwrap_or_default().to_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        format!("_{}", trimmed)
    } else {
        trimmed
    }
}

pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Shorten an ASCII file name to `max_length`, keeping its extension
fn truncate_file_name(name: &str, max_length: usize) -> String {
    if name.len() <= max_length {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, extension)) if extension.len() + 1 < max_length => {
            let keep = max_length - extension.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], extension)
        }
        _ => name[..max_length].to_string(),
    }
}

fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename_basic() {
        assert_eq!(secure_filename("cafe.png"), "cafe.png");
        assert_eq!(secure_filename("My cool photo.jpg"), "My_cool_photo.jpg");
        assert_eq!(secure_filename("Café com leite.png"), "Cafe_com_leite.png");
    }

    #[test]
    fn test_secure_filename_path_traversal() {
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\..\\windows\\win.ini"), "windows_win.ini");
        assert_eq!(secure_filename("/absolute/path.gif"), "absolute_path.gif");
        assert_eq!(secure_filename(".hidden.png"), "hidden.png");
    }

    #[test]
    fn test_secure_filename_unsafe_characters() {
        assert_eq!(secure_filename("a;b|c<d>.png"), "abcd.png");
        assert_eq!(secure_filename("日本語"), "");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_secure_filename_windows_devices() {
        assert_eq!(secure_filename("con.png"), "_con.png");
        assert_eq!(secure_filename("NUL"), "_NUL");
        assert_eq!(secure_filename("console.png"), "console.png");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("cafe.PNG"), Some("png".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_stored_file_name_uses_content_hash() {
        let first = ImageUpload::new("cafe.png", None, Bytes::from_static(b"first"));
        let second = ImageUpload::new("cafe.png", None, Bytes::from_static(b"second"));

        let first_name = first.stored_file_name();
        let second_name = second.stored_file_name();

        assert!(first_name.ends_with("_cafe.png"));
        assert_eq!(first_name.len(), CONTENT_HASH_PREFIX_LENGTH + 1 + "cafe.png".len());
        assert_ne!(first_name, second_name);

        let again = ImageUpload::new("cafe.png", None, Bytes::from_static(b"first"));
        assert_eq!(again.stored_file_name(), first_name);
    }

    #[test]
    fn test_long_names_are_truncated_keeping_extension() {
        let long_name = format!("{}.jpeg", "x".repeat(300));
        let upload = ImageUpload::new(long_name, None, Bytes::from_static(b"data"));

        let stored = upload.stored_file_name();
        assert!(stored.ends_with(".jpeg"));
        assert_eq!(
            stored.len(),
            CONTENT_HASH_PREFIX_LENGTH + 1 + MAX_SANITIZED_NAME_LENGTH
        );
    }
}
