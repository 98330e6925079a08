//! File and cloud-document classification
//!
//! Decides from a URL and title whether a search hit points at a
//! downloadable file. Precedence: file extension, then cloud host, then
//! title hints. The cloud flags are computed independently of the kind.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of file a result points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    Text,
    Archive,
    Audio,
    Video,
    Image,
    GoogleDoc,
    GoogleSheet,
    GoogleSlides,
    GoogleDrive,
    GoogleForm,
    Unknown,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Document => "document",
            Self::Spreadsheet => "spreadsheet",
            Self::Presentation => "presentation",
            Self::Text => "text",
            Self::Archive => "archive",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Image => "image",
            Self::GoogleDoc => "google_doc",
            Self::GoogleSheet => "google_sheet",
            Self::GoogleSlides => "google_slides",
            Self::GoogleDrive => "google_drive",
            Self::GoogleForm => "google_form",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of [`classify`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_file: bool,
    pub file_kind: Option<FileKind>,
    pub is_cloud_doc: bool,
    pub is_cloud_drive: bool,
}

/// Extension table. Order matters: the first `.ext` found wins, so `doc`
/// also claims `.docx` URLs (same kind either way).
const FILE_EXTENSIONS: &[(&str, FileKind)] = &[
    (".pdf", FileKind::Pdf),
    (".doc", FileKind::Document),
    (".docx", FileKind::Document),
    (".odt", FileKind::Document),
    (".xls", FileKind::Spreadsheet),
    (".xlsx", FileKind::Spreadsheet),
    (".ods", FileKind::Spreadsheet),
    (".ppt", FileKind::Presentation),
    (".pptx", FileKind::Presentation),
    (".odp", FileKind::Presentation),
    (".txt", FileKind::Text),
    (".rtf", FileKind::Text),
    (".zip", FileKind::Archive),
    (".rar", FileKind::Archive),
    (".7z", FileKind::Archive),
    (".mp3", FileKind::Audio),
    (".wav", FileKind::Audio),
    (".flac", FileKind::Audio),
    (".mp4", FileKind::Video),
    (".avi", FileKind::Video),
    (".mkv", FileKind::Video),
    (".jpg", FileKind::Image),
    (".jpeg", FileKind::Image),
    (".png", FileKind::Image),
    (".gif", FileKind::Image),
];

static CLOUD_HOSTS: Lazy<Vec<(Regex, FileKind)>> = Lazy::new(|| {
    [
        (r"docs\.google\.com", FileKind::GoogleDoc),
        (r"sheets\.google\.com", FileKind::GoogleSheet),
        (r"slides\.google\.com", FileKind::GoogleSlides),
        (r"drive\.google\.com", FileKind::GoogleDrive),
        (r"forms\.google\.com", FileKind::GoogleForm),
    ]
    .into_iter()
    .filter_map(|(pattern, kind)| Regex::new(pattern).ok().map(|re| (re, kind)))
    .collect()
});

const TITLE_HINTS: &[&str] = &["[pdf]", "[doc]", "[xls]", "filetype:", "download"];

const CLOUD_DOC_HOST: &str = "docs.google.com";
const CLOUD_DRIVE_HOST: &str = "drive.google.com";

fn extension_kind(haystack: &str) -> Option<FileKind> {
    FILE_EXTENSIONS
        .iter()
        .find(|(ext, _)| haystack.contains(ext))
        .map(|(_, kind)| *kind)
}

/// Classify a result by URL and title. Never fails; unparseable input is
/// simply not a file.
pub fn classify(url: &str, title: &str) -> Classification {
    let url_lower = url.to_lowercase();
    let title_lower = title.to_lowercase();

    let file_kind = extension_kind(&url_lower)
        .or_else(|| extension_kind(&title_lower))
        .or_else(|| {
            CLOUD_HOSTS
                .iter()
                .find(|(re, _)| re.is_match(&url_lower))
                .map(|(_, kind)| *kind)
        })
        .or_else(|| {
            TITLE_HINTS
                .iter()
                .any(|hint| title_lower.contains(hint))
                .then_some(FileKind::Unknown)
        });

    // Docs links count as drive links too; consumers rely on the overlap.
    let is_cloud_doc = url_lower.contains(CLOUD_DOC_HOST);
    let is_cloud_drive = is_cloud_doc || url_lower.contains(CLOUD_DRIVE_HOST);

    Classification {
        is_file: file_kind.is_some(),
        file_kind,
        is_cloud_doc,
        is_cloud_drive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_in_url() {
        let c = classify("https://example.com/Report.PDF", "Annual report");
        assert!(c.is_file);
        assert_eq!(c.file_kind, Some(FileKind::Pdf));
        assert!(!c.is_cloud_doc);
        assert!(!c.is_cloud_drive);

        let c = classify("https://example.com/notes.docx", "Notes");
        assert_eq!(c.file_kind, Some(FileKind::Document));

        let c = classify("https://example.com/deck.pptx?dl=1", "Deck");
        assert_eq!(c.file_kind, Some(FileKind::Presentation));
    }

    #[test]
    fn test_url_checked_before_title() {
        let c = classify("https://example.com/song.mp3", "lyrics.pdf");
        assert_eq!(c.file_kind, Some(FileKind::Audio));
    }

    #[test]
    fn test_extension_in_title() {
        let c = classify("https://example.com/view?id=9", "budget.xlsx - spreadsheet");
        assert_eq!(c.file_kind, Some(FileKind::Spreadsheet));
    }

    #[test]
    fn test_docs_host_sets_both_flags() {
        let c = classify("https://docs.google.com/document/d/abc/edit", "Meeting notes");
        assert!(c.is_file);
        assert_eq!(c.file_kind, Some(FileKind::GoogleDoc));
        assert!(c.is_cloud_doc);
        assert!(c.is_cloud_drive);
    }

    #[test]
    fn test_drive_host_only_drive_flag() {
        let c = classify("https://drive.google.com/file/d/xyz/view", "Shared folder");
        assert_eq!(c.file_kind, Some(FileKind::GoogleDrive));
        assert!(!c.is_cloud_doc);
        assert!(c.is_cloud_drive);
    }

    #[test]
    fn test_other_cloud_hosts() {
        let c = classify("https://sheets.google.com/x", "Sheet");
        assert_eq!(c.file_kind, Some(FileKind::GoogleSheet));
        assert!(!c.is_cloud_drive);

        let c = classify("https://forms.google.com/x", "Form");
        assert_eq!(c.file_kind, Some(FileKind::GoogleForm));
        assert!(!c.is_cloud_doc);
    }

    #[test]
    fn test_extension_beats_cloud_host() {
        let c = classify("https://docs.google.com/export/report.pdf", "Report");
        assert_eq!(c.file_kind, Some(FileKind::Pdf));
        assert!(c.is_cloud_doc);
        assert!(c.is_cloud_drive);
    }

    #[test]
    fn test_title_hints() {
        let c = classify("https://example.com/item/4", "[PDF] Service manual");
        assert_eq!(c.file_kind, Some(FileKind::Unknown));
        assert!(c.is_file);

        let c = classify("https://example.com/item/5", "Free Download of the week");
        assert_eq!(c.file_kind, Some(FileKind::Unknown));
    }

    #[test]
    fn test_not_a_file() {
        let c = classify("https://example.com/blog/post", "Thoughts on Rust");
        assert_eq!(c, Classification::default());

        let c = classify("::not a url::", "");
        assert!(!c.is_file);
        assert_eq!(c.file_kind, None);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FileKind::GoogleSlides).unwrap();
        assert_eq!(json, "\"google_slides\"");
        assert_eq!(FileKind::Pdf.to_string(), "pdf");
    }
}
