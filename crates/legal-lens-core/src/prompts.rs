//! Prompt templates sent to the generative model.

use crate::clauses::ClauseCategory;

/// Prompt asking for a plain-language summary aimed at a non-lawyer.
pub fn summary_prompt(document: &str) -> String {
    format!(
        "You are an excellent paralegal in a large law firm.\n\
         Summarize the following legal document in an easily readable format, \
         so that a person with no legal background can understand what it says, \
         what each party must do, and what risks it carries.\n\
         The legal document is:\n\n{document}"
    )
}

/// Prompt asking for a bare JSON object of verbatim clauses per category.
pub fn clause_prompt(document: &str) -> String {
    let keys = ClauseCategory::ALL
        .iter()
        .map(|c| format!("\"{}\"", c.key()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an excellent paralegal. From the following legal document, extract the key clauses.
Categorize them under exactly these keys: {keys}.

Rules:
- Respond with a single, valid JSON object and nothing else.
- The object must have exactly the keys {keys}.
- Each value must be an array of strings; each string is a clause quoted verbatim from the document.
- If no clause fits a category, use an empty array for it.
- Do not add any explanation, commentary, or markdown code fences.

Example format:
{{
  "liability": ["Clause 1 text...", "Clause 2 text..."],
  "termination": ["Clause 3 text..."],
  "confidentiality": []
}}

Document Text:
---
{document}
---
"#
    )
}
