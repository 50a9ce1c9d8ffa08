//! Prompt construction for letter and argument generation.
//!
//! All prompts are plain text. Retrieved provisions are quoted as
//! `Section: ...` / `Content: ...` blocks so the model can cite them by title.

use crate::models::{CaseInput, Chunk, RetrievedChunk};

/// Query used to retrieve provisions for a case.
pub fn search_query(case: &CaseInput) -> String {
    format!(
        "{} {} {}",
        case.case_title,
        case.incident_summary,
        case.tags.join(" ")
    )
}

/// Excerpts of the retrieved provisions, each cut to `max_chars` characters.
pub fn format_context(chunks: &[RetrievedChunk], max_chars: usize) -> String {
    chunks
        .iter()
        .map(|c| {
            let excerpt: String = c.chunk.content.chars().take(max_chars).collect();
            format!("Section: {}\nContent: {}...", c.chunk.section_title, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full-text context wrapped around every generation request.
pub fn full_context(chunks: &[&Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("Section: {}\nContent: {}", c.section_title, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn response_prompt(query: &str, context: &str) -> String {
    format!(
        "Based on the following legal context, provide a detailed response to the query.\n\
         \n\
         Legal Context:\n\
         {context}\n\
         \n\
         Query: {query}\n\
         \n\
         Please provide a comprehensive legal analysis based on the provided context.\n"
    )
}

pub fn letter_prompt(case: &CaseInput, context: &str) -> String {
    format!(
        "Generate a formal legal letter based on the following case details and legal context:\n\
         \n\
         Case Title: {title}\n\
         Client Name: {client}\n\
         Advocate Name: {advocate}\n\
         Law Firm: {firm}\n\
         Incident Summary: {summary}\n\
         Tags: {tags}\n\
         \n\
         Legal Context:\n\
         {context}\n\
         \n\
         Please generate a formal legal letter that includes:\n\
         1. Clear statement of facts\n\
         2. Legal grounds based on the provided context\n\
         3. Demand/relief sought\n\
         4. Professional closing\n\
         \n\
         The letter should be formal, legally sound, and favor the employee's position.\n\
         Do not include letterhead formatting as that will be handled separately.\n",
        title = case.case_title,
        client = case.client_name,
        advocate = case.advocate_name,
        firm = case.law_firm_name,
        summary = case.incident_summary,
        tags = case.tags.join(", "),
    )
}

pub fn arguments_prompt(case: &CaseInput, context: &str) -> String {
    format!(
        "Based on the case details and legal context provided, generate detailed legal \
         arguments that support the employee's position:\n\
         \n\
         Case: {title}\n\
         Summary: {summary}\n\
         \n\
         Legal Context:\n\
         {context}\n\
         \n\
         Provide:\n\
         1. Key legal arguments\n\
         2. Relevant legal provisions\n\
         3. Precedent references\n\
         4. Strategic recommendations\n\
         5. Potential counterarguments and responses\n",
        title = case.case_title,
        summary = case.incident_summary,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_case;

    fn retrieved(title: &str, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk {
                content: content.into(),
                section_title: title.into(),
                page_number: 1,
                chunk_id: format!("{title}_0"),
                source: "ipc.pdf".into(),
            },
            score: 0.0,
        }
    }

    #[test]
    fn query_joins_title_summary_and_tags() {
        let case = sample_case();
        assert_eq!(
            search_query(&case),
            "Unpaid Salary - Jane Roe vs Acme Logistics \
             Salary for March and April was withheld without notice. \
             Unpaid Salary Retaliation"
        );
    }

    #[test]
    fn context_excerpts_are_truncated_by_chars() {
        let chunks = vec![retrieved("Section 1", "abcdef"), retrieved("Section 2", "xyz")];
        assert_eq!(
            format_context(&chunks, 4),
            "Section: Section 1\nContent: abcd...\n\nSection: Section 2\nContent: xyz..."
        );
    }

    #[test]
    fn letter_prompt_lists_case_facts_and_requirements() {
        let case = sample_case();
        let prompt = letter_prompt(&case, "Section: S\nContent: C...");
        assert!(prompt.contains("Client Name: Jane Roe"));
        assert!(prompt.contains("Tags: Unpaid Salary, Retaliation"));
        assert!(prompt.contains("3. Demand/relief sought"));
        assert!(prompt.contains("Section: S\nContent: C..."));
    }

    #[test]
    fn arguments_prompt_asks_for_counterarguments() {
        let prompt = arguments_prompt(&sample_case(), "");
        assert!(prompt.contains("Case: Unpaid Salary - Jane Roe vs Acme Logistics"));
        assert!(prompt.contains("5. Potential counterarguments and responses"));
    }

    #[test]
    fn response_prompt_embeds_query_and_context() {
        let chunk = retrieved("Section 9", "full body").chunk;
        let ctx = full_context(&[&chunk]);
        let prompt = response_prompt("What applies?", &ctx);
        assert!(prompt.contains("Legal Context:\nSection: Section 9\nContent: full body\n"));
        assert!(prompt.contains("Query: What applies?"));
    }
}
