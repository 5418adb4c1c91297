//! Assembles the notes handed to the research agent.

/// Heading of the continuation section.
pub const PREVIOUS_SUMMARY_LABEL: &str = "Previously researched topics (do not repeat):";

/// Heading of the uploaded-document section.
pub const FILE_SUMMARY_LABEL: &str = "User-provided document context:";

/// Join the present summaries into one labeled context blob.
///
/// The previous-research section always precedes the document section;
/// sections are separated by a blank line. Absent or empty inputs contribute
/// nothing, so two absent inputs yield an empty string.
pub fn build_context(previous_summary: Option<&str>, file_summary: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(2);

    if let Some(previous) = previous_summary.filter(|s| !s.is_empty()) {
        parts.push(format!("{}\n{}", PREVIOUS_SUMMARY_LABEL, previous));
    }

    if let Some(file) = file_summary.filter(|s| !s.is_empty()) {
        parts.push(format!("{}\n{}", FILE_SUMMARY_LABEL, file));
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_absent_is_empty() {
        assert_eq!(build_context(None, None), "");
    }

    #[test]
    fn empty_strings_count_as_absent() {
        assert_eq!(build_context(Some(""), Some("")), "");
    }

    #[test]
    fn previous_only() {
        let ctx = build_context(Some("earlier findings"), None);
        assert!(ctx.contains("earlier findings"));
        assert!(ctx.starts_with(PREVIOUS_SUMMARY_LABEL));
        assert!(!ctx.contains(FILE_SUMMARY_LABEL));
    }

    #[test]
    fn file_only() {
        let ctx = build_context(None, Some("doc text"));
        assert_eq!(ctx, "User-provided document context:\ndoc text");
    }

    #[test]
    fn previous_precedes_file() {
        let ctx = build_context(Some("prev"), Some("file"));
        assert_eq!(
            ctx,
            "Previously researched topics (do not repeat):\nprev\n\nUser-provided document context:\nfile"
        );
        let prev_at = ctx.find(PREVIOUS_SUMMARY_LABEL).unwrap();
        let file_at = ctx.find(FILE_SUMMARY_LABEL).unwrap();
        assert!(prev_at < file_at);
    }
}
