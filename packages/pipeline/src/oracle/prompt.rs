use charter_layout::Section;

const SYSTEM_ENUMERATION: &str = include_str!("../../prompts/system_enumeration.txt");
const SYSTEM_EXTRACTION: &str = include_str!("../../prompts/system_extraction.txt");

/// Build the system prompt for clause enumeration.
pub fn build_enumeration_system_prompt() -> &'static str {
    SYSTEM_ENUMERATION
}

/// Build the system prompt for clause extraction.
pub fn build_extraction_system_prompt() -> &'static str {
    SYSTEM_EXTRACTION
}

/// Build the user prompt asking for the top-level clause numbers of a section.
pub fn build_enumeration_prompt(section: &Section) -> String {
    let mut prompt = String::new();

    prompt.push_str("List every top-level clause NUMBER that appears in this text, ");
    prompt.push_str("in the order they appear.\n\n");
    prompt.push_str(&format!("DOCUMENT SECTION ({}):\n---\n", section.title));
    prompt.push_str(&section.text);
    prompt.push_str("\n---\n\n");
    prompt.push_str("Return ONLY the JSON array. Nothing else.");

    prompt
}

/// Build the user prompt asking for one clause of a section.
pub fn build_extraction_prompt(section: &Section, number: u32) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Extract clause number {number} ONLY. Do not include content from other clauses.\n\n"
    ));
    prompt.push_str(&format!("DOCUMENT SECTION ({}):\n---\n", section.title));
    prompt.push_str(&section.text);
    prompt.push_str("\n---\n\n");
    prompt.push_str(&format!(
        "Return ONLY the JSON object for clause {number}, with \"number\": {number}."
    ));

    prompt
}
