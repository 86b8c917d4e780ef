// Pipeline LLM prompt templates: resume analysis and candidate chat.

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert Senior Technical Recruiter.
Analyze the attached resume against the Job Description below with extreme scrutiny.

JOB DESCRIPTION:
{job_description}

TASK:
1. Extract candidate details (Contact, Education, Experience).
2. Analyze skills and categorize them. Estimate years of experience per skill based on work history context.
3. Determine a 'matchScore' (0-100). Be strict. 90+ is perfect match, 70+ is good, below 50 is poor.
4. Identify GAPS (missingSkills).
5. Provide a specific, no-fluff reasoning for the score.

OUTPUT:
{json_only}"#;

pub const CHAT_PROMPT_TEMPLATE: &str = r#"Candidate Data: {candidate_json}

You are an AI Assistant helping a recruiter interview this candidate virtually.
{grounding}
Keep answers concise and professional.

Current Conversation:
{history}
MODEL:"#;

/// Fills `{name}` placeholders in a single pass. Inserted values are never
/// rescanned, so braces inside user text stay literal.
pub fn render_prompt(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find_map(|(name, value)| {
            tail.strip_prefix('{')
                .and_then(|t| t.strip_prefix(name))
                .and_then(|t| t.strip_prefix('}'))
                .map(|remaining| (*value, remaining))
        });
        match hit {
            Some((value, remaining)) => {
                out.push_str(value);
                rest = remaining;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
