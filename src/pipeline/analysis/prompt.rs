//! Analysis prompt assembly.

/// Verification clause appended when the caller supplied an application
/// company. Instructs the model to emit one of the two literal marker lines
/// the consistency checker looks for.
pub fn company_guard(expected_company: &str) -> String {
    if expected_company.is_empty() {
        return String::new();
    }
    format!(
        "\nCRITICAL - Company name verification (mandatory):\n\
         This document is being reviewed for an application submitted on behalf of the company: \"{expected_company}\".\n\
         - Extract ALL company names mentioned in the document (e.g. on certificates, letterheads, forms).\n\
         - If the document clearly refers to a DIFFERENT company (different name) than the application company above, \
         you MUST output exactly one line at the END of your analysis: COMPANY_MISMATCH: The document refers to \
         [company name(s) from document] which does not match the application company ({expected_company}). \
         This document does not belong to this application.\n\
         - If the document clearly refers to the SAME company (or the same legal entity) as the application company, \
         output at the END: COMPANY_MATCH: YES\n\
         - Do not approve or state that the document is compliant if there is a company name mismatch; \
         treat mismatch as a critical compliance failure.\n"
    )
}

/// Full analysis prompt: document type, prior-document history, optional
/// company guard and the retrieved context.
pub fn analysis_prompt(
    document_type: &str,
    history_preamble: &str,
    expected_company: Option<&str>,
    context: &str,
) -> String {
    let guard = company_guard(expected_company.unwrap_or_default());
    let previous_docs_block = if history_preamble.is_empty() {
        String::new()
    } else {
        format!("\n\n{history_preamble}\n\n")
    };

    format!(
        "Analyze this {document_type} document for completeness, accuracy, and compliance with ministry requirements.\n\
         {previous_docs_block}\n\
         {guard}\n\
         \n\
         Extract and verify:\n\
         - Company details (name, registration number, address)\n\
         - Registration dates and validity periods\n\
         - Required certifications and clearances\n\
         - Director information\n\
         - Any missing or incomplete information\n\
         - Compliance issues or discrepancies\n\
         \n\
         Document Content:\n\
         {context}\n\
         \n\
         Provide a comprehensive analysis focusing on compliance, completeness, and any issues that need attention. \
         At the end, you MUST output either COMPANY_MATCH: YES or COMPANY_MISMATCH: [reason] as specified above if \
         an application company name was provided."
    )
}

/// Retrieval query driving chunk selection.
pub fn analysis_query(document_type: &str) -> String {
    format!("Analyze this {document_type} document for compliance and completeness")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_embeds_company_and_markers() {
        let guard = company_guard("Acme Corp");
        assert!(guard.contains("on behalf of the company: \"Acme Corp\""));
        assert!(guard.contains("COMPANY_MISMATCH:"));
        assert!(guard.contains("COMPANY_MATCH: YES"));
        assert!(guard.contains("(Acme Corp)"));
    }

    #[test]
    fn guard_empty_without_company() {
        assert_eq!(company_guard(""), "");
    }

    #[test]
    fn prompt_contains_type_context_and_instructions() {
        let prompt = analysis_prompt("tax clearance", "", None, "Chunk one.\n\nChunk two.");
        assert!(prompt.starts_with("Analyze this tax clearance document"));
        assert!(prompt.contains("Document Content:\nChunk one."));
        assert!(prompt.contains("Extract and verify:"));
        assert!(!prompt.contains("CRITICAL - Company name verification"));
    }

    #[test]
    fn prompt_embeds_history_between_blank_lines() {
        let prompt = analysis_prompt(
            "license",
            "This application is for the company: \"Acme\".",
            None,
            "ctx",
        );
        assert!(prompt.contains("\n\nThis application is for the company: \"Acme\".\n\n"));
    }

    #[test]
    fn prompt_includes_guard_when_company_given() {
        let prompt = analysis_prompt("license", "", Some("Acme Corp"), "ctx");
        assert!(prompt.contains("CRITICAL - Company name verification"));
    }

    #[test]
    fn query_names_document_type() {
        assert_eq!(
            analysis_query("permit"),
            "Analyze this permit document for compliance and completeness"
        );
    }
}
