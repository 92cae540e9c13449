// Resume structuring prompt templates.
// `{resume_text}` and `{max_items}` are substituted at call time.

pub const RESUME_PARSE_SYSTEM: &str = "\
You are an expert resume parser. \
You turn free-form resume text into a fixed set of ten structured fields. \
Never invent facts that are not supported by the resume text.";

pub const RESUME_PARSE_PROMPT: &str = r#"Extract and organize the content of the following resume into structured fields.

FIELD RULES:
- name: the full name of the resume owner.
- designation: the job title or designation of the resume owner.
- nationality: the nationality of the resume owner.
- totalExperience: total years of professional experience, calculated from the employment dates (e.g. "13+ years").
- relevantExperience: years of experience whose skills and roles match the primary designation (e.g. "4+ years").
- education: the education history.
- keyCompetencies: identify the designation first, then list as one comma-separated string only the technical and soft skills most relevant to that designation.
- personalScorecard: at most {max_items} bullet points.
- professionalExperiences: at most {max_items} bullet points describing role and responsibilities. Do NOT mention company names or employment dates.
- projectExperiences: at most {max_items} bullet points on relevant projects.

OUTPUT SCHEMA (return exactly this structure, every key present):
{
  "name": "string",
  "designation": "string",
  "nationality": "string",
  "totalExperience": "string",
  "relevantExperience": "string",
  "education": "string",
  "keyCompetencies": "string",
  "personalScorecard": ["string"],
  "professionalExperiences": ["string"],
  "projectExperiences": ["string"]
}

personalScorecard, professionalExperiences and projectExperiences MUST be JSON arrays of strings.

MISSING INFORMATION:
- Every string value MUST be non-empty. Never return "" or a string of only whitespace.
- When the resume does not state a scalar field, use "Not specified".
- When the resume has nothing for a list field, return [] rather than [""]. Never put an empty string inside a list.

RESUME TEXT:
{resume_text}"#;
