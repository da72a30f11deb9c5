// All LLM prompt constants for the resume pipeline, plus the input caps
// applied before substitution into the templates.

/// Max bytes of raw resume text embedded in the generation prompt.
pub const RESUME_TEXT_CAP: usize = 2000;
/// Max bytes of job description embedded in generation/suggestion prompts.
pub const JD_CAP: usize = 1500;
/// Max bytes of job description in the refinement prompt (context only).
pub const REFINE_JD_CAP: usize = 1000;
/// Max bytes of diagnostic log fed back for a repair.
pub const LOG_CAP: usize = 2000;
/// Max bytes of the current document in the suggestion prompt.
pub const DOC_CAP: usize = 2000;

pub const GENERATION_SYSTEM: &str = "You are an expert resume writer and LaTeX specialist. \
    Generate professional, ATS-optimized resumes in LaTeX format. \
    Return ONLY valid LaTeX code.";

/// Generation prompt. Replace: {template}, {applicant_name}, {email},
/// {phone}, {resume_text}, {jd_text}
pub const GENERATION_PROMPT_TEMPLATE: &str = r"You are a professional resume writer and LaTeX specialist. Generate a complete, professional LaTeX resume that:

1. Uses the EXACT LaTeX template structure provided
2. Tailors the content to match the job description
3. Keeps all LaTeX formatting and commands intact
4. Creates compelling, ATS-friendly bullet points
5. Optimizes keywords for the target role

LATEX TEMPLATE TO USE (do not modify structure):
{template}

APPLICANT INFORMATION:
Name: {applicant_name}
Email: {email}
Phone: {phone}

CURRENT RESUME CONTENT:
{resume_text}

TARGET JOB DESCRIPTION:
{jd_text}

REQUIREMENTS:
- Replace ALL placeholder variables with actual content from the resume
- Create 3-4 compelling bullet points per work experience using strong action verbs
- Include relevant projects if applicable
- Optimize the technical skills section for the target role
- Maintain professional tone and quantify achievements where possible
- Return ONLY complete LaTeX code - no explanations, no markdown
- The code must start with \documentclass and end with \end{document}
- Do NOT wrap the code in triple backticks or add any additional text";

pub const REPAIR_SYSTEM: &str = "You are an expert LaTeX debugger. \
    Fix compilation errors in LaTeX code. \
    Return ONLY valid, compilable LaTeX code without any explanations or markdown formatting.";

/// Repair prompt. Replace: {error_log}, {latex_code}
pub const REPAIR_PROMPT_TEMPLATE: &str = r"This LaTeX code doesn't compile properly. Fix it.

ERROR LOG:
{error_log}

BROKEN LATEX CODE:
{latex_code}

INSTRUCTIONS:
1. Analyze the error messages carefully
2. Fix all syntax errors, undefined commands, and formatting issues
3. Ensure all LaTeX packages are properly used
4. Maintain the same content structure
5. Return ONLY the complete fixed LaTeX code
6. Do NOT wrap it in triple backticks or add explanations
7. The code must start with \documentclass and end with \end{document}

Return the corrected LaTeX code now:";

pub const REFINE_SYSTEM: &str = "You are an expert resume editor. \
    Modify LaTeX resumes based on user feedback while maintaining professional quality and ATS compatibility. \
    Return ONLY valid LaTeX code.";

/// Refinement prompt. Replace: {latex_code}, {feedback}, {jd_text}
pub const REFINE_PROMPT_TEMPLATE: &str = r"You are refining a LaTeX resume based on user feedback. Apply ONLY the requested change and preserve everything else verbatim:

1. Maintain the exact LaTeX structure and formatting
2. Keep it ATS-friendly and professional
3. Ensure changes align with the target job requirements
4. Preserve all working LaTeX commands and syntax

CURRENT LATEX RESUME:
{latex_code}

USER FEEDBACK/SUGGESTIONS:
{feedback}

JOB DESCRIPTION (for context):
{jd_text}

Return ONLY the complete updated LaTeX code with no explanations. The code must start with \documentclass and end with \end{document}.";

pub const SUGGEST_SYSTEM: &str = "You are a professional resume coach. \
    Provide specific, actionable feedback to improve resumes for target positions. \
    Be concise.";

/// Suggestion prompt. Replace: {latex_code}, {jd_text}
pub const SUGGEST_PROMPT_TEMPLATE: &str = r"Analyze this LaTeX resume against the job description and provide 4 specific, actionable improvement suggestions.

LATEX RESUME:
{latex_code}

JOB DESCRIPTION:
{jd_text}

Format your response as a numbered list with concise suggestions (one per line):
1. [Specific suggestion]
2. [Specific suggestion]
3. [Specific suggestion]
4. [Specific suggestion]

Be direct and actionable. Return only the numbered list.";
