// Prompt fragments for the ask flow.
// The delimiters below are part of the output contract requested from the model
// and are read back by `chat::parser`.

/// Introduces each of the four answer sections.
pub const SECTION_DELIMITER: &str = "::Section::";

/// Precedes the file name of every code file in the last section.
pub const FILENAME_DELIMITER: &str = "::filename::";

/// Markdown code fence wrapping each code file.
pub const CODE_FENCE: &str = "```";

/// Instruction suffix appended to the latest user message.
pub const INSTRUCTION_SUFFIX: &str = " I am product manager who wants to develop an app with you, \
    but have zero knowledge about the development. \
    You should format your response to four sections. \
    First, score the quality of my question in integer between 1 and 10. \
    You should give higher score if the question was useful and straightforward to implement the app. \
    You should give 1 when you cannot understand a request, and 10 when it is a perfect specification for a software. \
    Don't add any justification here; Just provide a score. \
    Second, recommend a better way of requesting, and clarify the request. \
    You may ask 'What is your app's UI?'. \
    Third, you should teach me about the basic knowledge of development. \
    For example, if you asked me about the UI in previous section, teach me what is UI. \
    Finally, write a code. You may write multiple codes. \
    If you think the request was insufficient to write a code, you may leave this section empty and give a low score. \
    You may always clarify the file name of the code right before the content of the code by the keyword '::filename::'. \
    Please use the keyword '::Section::' before starting section, and don't write any other section number or title. \
    Respond in Korean. (한국어)";

/// Appends the formatting instructions to a user prompt.
/// The prompt is not escaped: delimiter tokens inside it reach the model as-is.
pub fn add_instructions(prompt: &str) -> String {
    let mut out = String::with_capacity(prompt.len() + INSTRUCTION_SUFFIX.len());
    out.push_str(prompt);
    out.push_str(INSTRUCTION_SUFFIX);
    out
}
