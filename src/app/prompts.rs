use crate::core::prompt::PromptTemplate;

/// Bindings: `page_data`.
pub const EXTRACT_JOBS_PROMPT: PromptTemplate = PromptTemplate::from_static(
    r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}

### INSTRUCTIONS:
Extract ALL job postings from the scraped text and return them as a valid JSON array.
Each job posting must have exactly these keys: "role", "experience", "skills", "location", "description".

IMPORTANT:
- Return ONLY the JSON array, with no additional text, explanations or code.
- "skills" must be an array of strings.
- If no job postings are found, return an empty array [].
- Do not use markdown formatting or code blocks.

### VALID JSON OUTPUT FORMAT:
[
  {{
    "role": "Job Title",
    "experience": "Required experience",
    "skills": ["Skill1", "Skill2", "Skill3"],
    "location": "Job location",
    "description": "Job description"
  }}
]
"#,
);

/// Bindings: `role`, `experience`, `skills`, `location`, `description`,
/// `profile`, `techstack`, `links`.
pub const COLD_EMAIL_PROMPT: PromptTemplate = PromptTemplate::from_static(
    r#"### JOB DESCRIPTION:
Role: {role}
Experience: {experience}
Skills: {skills}
Location: {location}
Description: {description}

### ABOUT ME:
{profile}

### PORTFOLIO MATCH:
Tech stack from my portfolio: {techstack}
Relevant project links: {links}

### INSTRUCTIONS:
Write a professional cold email applying for the role above:
  - A subject line mentioning the role
  - Address it to the hiring manager (use "Dear Hiring Manager," if no name is known)
  - A short introduction about me
  - Highlight the skills and projects that align with the job
  - Include one or two portfolio highlights with their links
  - Polite, confident and enthusiastic
  - 150-200 words, easy to skim
  - End with a call to action
  - Sign off with my full name and contact information

### OUTPUT FORMAT:
Return only the final email text:
  - Subject line
  - Email body (greeting, paragraphs, sign-off)
  - NO PREAMBLE, no explanations, no markdown
"#,
);
