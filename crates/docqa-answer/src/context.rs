use docqa_core::types::RetrievalResult;

pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Label each retrieved chunk with its rank and attribution and join them.
///
/// `[Document 1 - Source: report.pdf, Page: 4]` followed by the chunk text.
pub fn build_context(result: &RetrievalResult) -> String {
    result
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[Document {} - Source: {}, Page: {}]\n{}",
                i + 1,
                hit.chunk.source_file,
                hit.chunk.page_number,
                hit.chunk.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}
