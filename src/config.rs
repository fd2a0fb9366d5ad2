use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use std::fs;
use std::path::PathBuf;

/// Backend origin used while developing against a local API.
pub const DEVELOPMENT_API_URL: &str = "http://localhost:8000";

/// Example rubric sent as `old_rubric` with every new role. The backend asks
/// its model for a rubric "in the same format" tailored to the new description.
pub const DEFAULT_RUBRIC_GUIDANCE: &str = r#"Evaluation Rubric: Senior Software Engineer

Scoring scale (applies to every competency):
  4 - Exceptional: clear, repeated, quantified evidence well beyond the requirement
  3 - Strong: direct evidence that fully meets the requirement
  2 - Partial: indirect or limited evidence, some gaps
  1 - Weak: little or no evidence in the CV

Competencies (weight):
1. Technical Depth (30%)
   4: Designed and owned complex systems end to end; deep expertise in the core stack
   3: Built production features independently in the core stack
   2: Exposure to the stack, mostly under supervision
   1: No relevant technical experience
2. Problem Solving (20%)
   4: Led resolution of ambiguous, high-impact problems with measurable results
   3: Solved non-trivial problems with clear outcomes
   2: Solved well-scoped problems
   1: No evidence
3. Delivery & Ownership (20%)
   4: Drove multi-quarter initiatives to completion across teams
   3: Reliably shipped features from design to production
   2: Contributed to delivery of others' plans
   1: No evidence
4. Collaboration & Communication (15%)
   4: Mentored others, influenced technical direction, wrote widely used docs
   3: Worked effectively across functions, clear written communication
   2: Worked within a single team
   1: No evidence
5. Domain Fit (15%)
   4: Several years in the same domain with directly transferable outcomes
   3: Relevant adjacent domain experience
   2: Some transferable experience
   1: Unrelated background

Overall: weighted average mapped to 1-100. Pass requires an overall score of 70
or more and no competency scored 1."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiTarget {
    Development,
    Production,
}

/// Command-line / environment settings, resolved into a [`Config`].
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Which backend to talk to
    #[arg(long, env = "SCREENER_ENV", value_enum, default_value_t = ApiTarget::Development)]
    pub target: ApiTarget,

    /// Backend origin (required for production, overrides the local host in development)
    #[arg(long, env = "SCREENER_API_URL")]
    pub api_url: Option<String>,

    /// File holding the rubric guidance sent with new roles
    #[arg(long, env = "SCREENER_RUBRIC_TEMPLATE")]
    pub rubric_template: Option<PathBuf>,

    /// Directory CSV exports are written to
    #[arg(long, env = "SCREENER_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Log file (the terminal belongs to the dashboard)
    #[arg(long, env = "SCREENER_LOG_FILE", default_value = "resume-screener.log")]
    pub log_file: PathBuf,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub rubric_guidance: String,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    pub fn resolve(args: ConfigArgs) -> Result<Self> {
        let api_base_url = match (args.target, args.api_url) {
            (_, Some(url)) if !url.trim().is_empty() => url.trim().to_string(),
            (ApiTarget::Development, _) => DEVELOPMENT_API_URL.to_string(),
            (ApiTarget::Production, _) => {
                bail!("SCREENER_API_URL (or --api-url) must be set when targeting production")
            }
        };

        let rubric_guidance = match &args.rubric_template {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading rubric template {}", path.display()))?;
                if text.trim().is_empty() {
                    bail!("rubric template {} is empty", path.display());
                }
                text
            }
            None => DEFAULT_RUBRIC_GUIDANCE.to_string(),
        };

        Ok(Config {
            api_base_url,
            rubric_guidance,
            export_dir: args.export_dir,
            log_file: args.log_file,
        })
    }
}
