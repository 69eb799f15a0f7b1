//! The slide-formatting instruction sent with every request.

/// Formatting rules the model is asked to follow.
const RULES: &[&str] = &[
    "Use # for the title slide",
    "Use ## for each slide title",
    "Use - for bullet points",
    "Separate slides with ---",
    "Keep each slide concise (3-5 bullet points max)",
    "Use ** for emphasis",
    "Add a title slide at the beginning",
    "Add a \"Thank You\" slide at the end",
];

/// Wrap `content` in the slide-formatting instruction.
pub fn build_prompt(content: &str) -> String {
    let mut prompt = String::from(
        "Convert the following text into a presentation format using markdown.\n\
         Follow these specific rules:\n",
    );

    for (i, rule) in RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
    }

    prompt.push_str("\nText to convert:\n");
    prompt.push_str(content);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_source_text() {
        let prompt = build_prompt("Hello World");
        assert!(prompt.ends_with("Text to convert:\nHello World\n"));
    }

    #[test]
    fn test_prompt_lists_rules_in_order() {
        let prompt = build_prompt("x");
        assert!(prompt.contains("1. Use # for the title slide\n"));
        assert!(prompt.contains("4. Separate slides with ---\n"));
        assert!(prompt.contains("8. Add a \"Thank You\" slide at the end\n"));

        let title = prompt.find("title slide at the beginning").unwrap();
        let thanks = prompt.find("Thank You").unwrap();
        assert!(title < thanks);
    }
}
