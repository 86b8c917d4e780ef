// Shared prompt fragments. Each service that needs LLM calls defines its
// own prompts.rs alongside it; this file holds cross-cutting pieces.

/// Instruction that keeps answers scoped to the supplied candidate data.
pub const GROUNDING_INSTRUCTION: &str = "\
Answer questions about the candidate based ONLY on the provided data. \
If the information is not in the data, say \"I cannot find that information in the resume.\"";

/// Appended to prompts whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Return strictly JSON adhering to the schema.";
