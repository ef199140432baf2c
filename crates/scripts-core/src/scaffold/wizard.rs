//! Interactive scaffold wizard
//!
//! The wizard is a fixed sequence of [`WizardStep`]s. Each step has a
//! precondition (`applies`), a prompt with its default and validator, and a
//! recorder that folds the answer into the collected [`Answers`]. Prompts go
//! through the [`Prompter`] trait so the sequence runs against cliclack in
//! a terminal and against scripted answers in tests.

use super::params::{
    package_name_from, resolve_registry_config, unscoped_name, validate_repository_url,
    RegistryType, ScaffoldPlan, LICENSES,
};
use super::resolve::CreateOptions;
use crate::config::resolver::normalize;
use crate::runtime::{CiProvider, PackageManager};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Validates a text answer; `Err` carries the message shown to the user
pub type Validator = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// One entry of a select prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Terminal prompt backend
pub trait Prompter: Send {
    fn intro(&mut self, title: &str) -> Result<()>;

    fn input(
        &mut self,
        message: &str,
        default: &str,
        required: bool,
        validator: Option<Validator>,
    ) -> Result<String>;

    /// Returns the `value` of the chosen entry
    fn select(&mut self, message: &str, choices: &[Choice], default: &str) -> Result<String>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;
}

pub enum Prompt {
    Input {
        message: String,
        default: String,
        required: bool,
        validator: Option<Validator>,
    },
    Select {
        message: String,
        choices: Vec<Choice>,
        default: String,
    },
    Confirm {
        message: String,
        default: bool,
    },
}

pub enum Answer {
    Text(String),
    Flag(bool),
}

impl Answer {
    fn text(self) -> String {
        match self {
            Answer::Text(text) => text.trim().to_string(),
            Answer::Flag(flag) => flag.to_string(),
        }
    }

    fn flag(self) -> bool {
        match self {
            Answer::Flag(flag) => flag,
            Answer::Text(text) => text == "true",
        }
    }
}

/// Everything the wizard needs besides the prompts themselves
#[derive(Debug, Clone)]
pub struct WizardSeed {
    pub cwd: PathBuf,
    pub options: CreateOptions,
    pub detected_manager: PackageManager,
    /// Template names available under the template root
    pub templates: Vec<String>,
}

/// Answers collected so far
#[derive(Debug, Clone)]
pub struct Answers {
    pub package_name: String,
    pub description: String,
    pub directory: String,
    pub overwrite: bool,
    pub template: String,
    pub package_manager: PackageManager,
    pub ci: CiProvider,
    pub repository_url: String,
    pub registry_type: RegistryType,
    pub gitlab_project_registry: bool,
    pub registry_url: String,
    pub license: String,
    pub install: bool,
}

impl Default for Answers {
    fn default() -> Self {
        Self {
            package_name: String::new(),
            description: String::new(),
            directory: String::new(),
            overwrite: false,
            template: "default".to_string(),
            package_manager: PackageManager::Npm,
            ci: CiProvider::Github,
            repository_url: String::new(),
            registry_type: RegistryType::Public,
            gitlab_project_registry: false,
            registry_url: String::new(),
            license: String::new(),
            install: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    PackageName,
    Description,
    Directory,
    Overwrite,
    Template,
    PackageManager,
    Ci,
    RepositoryUrl,
    RegistryType,
    GitlabProjectRegistry,
    RegistryUrl,
    License,
    Install,
}

/// Prompt order
pub const WIZARD_STEPS: &[WizardStep] = &[
    WizardStep::PackageName,
    WizardStep::Description,
    WizardStep::Directory,
    WizardStep::Overwrite,
    WizardStep::Template,
    WizardStep::PackageManager,
    WizardStep::Ci,
    WizardStep::RepositoryUrl,
    WizardStep::RegistryType,
    WizardStep::GitlabProjectRegistry,
    WizardStep::RegistryUrl,
    WizardStep::License,
    WizardStep::Install,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Cancel,
}

fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_some())
}

fn text_default(value: Option<&String>, fallback: &str) -> String {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

impl WizardStep {
    /// Precondition: whether the step is asked given earlier answers
    pub fn applies(self, answers: &Answers, seed: &WizardSeed) -> bool {
        match self {
            WizardStep::Overwrite => {
                let target = normalize(&seed.cwd.join(&answers.directory));
                !seed.options.force && is_non_empty_dir(&target)
            }
            WizardStep::RepositoryUrl => answers.ci != CiProvider::None,
            WizardStep::GitlabProjectRegistry => {
                answers.ci == CiProvider::Gitlab && answers.registry_type == RegistryType::Private
            }
            WizardStep::RegistryUrl => {
                answers.registry_type == RegistryType::Private && !answers.gitlab_project_registry
            }
            _ => true,
        }
    }

    pub fn prompt(self, answers: &Answers, seed: &WizardSeed) -> Prompt {
        let options = &seed.options;

        match self {
            WizardStep::PackageName => Prompt::Input {
                message: "Package name:".to_string(),
                default: text_default(options.name.as_ref(), "my-boostpack-lib"),
                required: true,
                validator: Some(Arc::new(|value: &str| {
                    package_name_from(value).map(|_| ()).map_err(|e| e.to_string())
                })),
            },
            WizardStep::Description => Prompt::Input {
                message: "Package description (optional):".to_string(),
                default: String::new(),
                required: false,
                validator: None,
            },
            WizardStep::Directory => Prompt::Input {
                message: "Project directory:".to_string(),
                default: text_default(
                    options.directory.as_ref(),
                    unscoped_name(&answers.package_name),
                ),
                required: true,
                validator: Some(Arc::new(|value: &str| {
                    if value.trim().is_empty() {
                        Err("Directory name is required".to_string())
                    } else {
                        Ok(())
                    }
                })),
            },
            WizardStep::Overwrite => Prompt::Confirm {
                message: format!(
                    "Directory {} is not empty. Overwrite existing files?",
                    answers.directory
                ),
                default: false,
            },
            WizardStep::Template => Prompt::Select {
                message: "Template:".to_string(),
                choices: seed
                    .templates
                    .iter()
                    .map(|name| Choice::new(name.clone(), name.clone()))
                    .collect(),
                default: text_default(options.template.as_ref(), "default"),
            },
            WizardStep::PackageManager => Prompt::Select {
                message: "Package manager:".to_string(),
                choices: PackageManager::ALL
                    .iter()
                    .map(|pm| {
                        let label = if *pm == seed.detected_manager {
                            format!("{} (detected)", pm)
                        } else {
                            pm.to_string()
                        };
                        Choice::new(pm.as_str(), label)
                    })
                    .collect(),
                default: text_default(
                    options.package_manager.as_ref(),
                    seed.detected_manager.as_str(),
                ),
            },
            WizardStep::Ci => Prompt::Select {
                message: "CI/CD provider:".to_string(),
                choices: vec![
                    Choice::new("github", "GitHub Actions"),
                    Choice::new("gitlab", "GitLab CI"),
                    Choice::new("none", "None"),
                ],
                default: text_default(options.ci.as_ref(), "github"),
            },
            WizardStep::RepositoryUrl => {
                let ci = answers.ci;
                let example = if ci == CiProvider::Github {
                    "github.com/owner/repo"
                } else {
                    "gitlab.com/namespace/project"
                };
                Prompt::Input {
                    message: format!("Repository URL ({}):", example),
                    default: String::new(),
                    required: false,
                    validator: Some(Arc::new(move |value: &str| {
                        validate_repository_url(ci, value)
                    })),
                }
            }
            WizardStep::RegistryType => Prompt::Select {
                message: "NPM registry:".to_string(),
                choices: vec![
                    Choice::new("public", "Public (npmjs.com)"),
                    Choice::new("private", "Private"),
                ],
                default: text_default(options.npm_registry.as_ref(), "public"),
            },
            WizardStep::GitlabProjectRegistry => Prompt::Confirm {
                message: "Use GitLab project registry?".to_string(),
                default: options.gitlab_project_registry.unwrap_or(false),
            },
            WizardStep::RegistryUrl => Prompt::Input {
                message: "Private registry URL:".to_string(),
                default: text_default(options.npm_registry_url.as_ref(), ""),
                required: true,
                validator: Some(Arc::new(|value: &str| {
                    if value.trim().is_empty() {
                        Err("Registry URL is required for private registries".to_string())
                    } else {
                        Ok(())
                    }
                })),
            },
            WizardStep::License => Prompt::Select {
                message: "License (optional):".to_string(),
                choices: LICENSES
                    .iter()
                    .map(|(value, label)| Choice::new(*value, *label))
                    .collect(),
                default: "MIT".to_string(),
            },
            WizardStep::Install => Prompt::Confirm {
                message: "Install dependencies?".to_string(),
                default: !options.skip_install.unwrap_or(false),
            },
        }
    }

    fn record(self, answers: &mut Answers, answer: Answer) -> Result<Flow> {
        match self {
            WizardStep::PackageName => answers.package_name = package_name_from(&answer.text())?,
            WizardStep::Description => answers.description = answer.text(),
            WizardStep::Directory => answers.directory = answer.text(),
            WizardStep::Overwrite => {
                if !answer.flag() {
                    return Ok(Flow::Cancel);
                }
                answers.overwrite = true;
            }
            WizardStep::Template => answers.template = answer.text(),
            WizardStep::PackageManager => answers.package_manager = answer.text().parse()?,
            WizardStep::Ci => answers.ci = answer.text().parse()?,
            WizardStep::RepositoryUrl => answers.repository_url = answer.text(),
            WizardStep::RegistryType => answers.registry_type = answer.text().parse()?,
            WizardStep::GitlabProjectRegistry => answers.gitlab_project_registry = answer.flag(),
            WizardStep::RegistryUrl => answers.registry_url = answer.text(),
            WizardStep::License => answers.license = answer.text(),
            WizardStep::Install => answers.install = answer.flag(),
        }
        Ok(Flow::Continue)
    }
}

fn ask(prompter: &mut dyn Prompter, prompt: Prompt) -> Result<Answer> {
    Ok(match prompt {
        Prompt::Input {
            message,
            default,
            required,
            validator,
        } => Answer::Text(prompter.input(&message, &default, required, validator)?),
        Prompt::Select {
            message,
            choices,
            default,
        } => Answer::Text(prompter.select(&message, &choices, &default)?),
        Prompt::Confirm { message, default } => Answer::Flag(prompter.confirm(&message, default)?),
    })
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Run the prompt sequence. `Ok(None)` means the user cancelled.
pub fn run_wizard(
    prompter: &mut dyn Prompter,
    seed: &WizardSeed,
    title: &str,
) -> Result<Option<ScaffoldPlan>> {
    prompter.intro(title)?;

    let mut answers = Answers::default();
    for step in WIZARD_STEPS {
        if !step.applies(&answers, seed) {
            continue;
        }

        let answer = ask(prompter, step.prompt(&answers, seed))?;
        if step.record(&mut answers, answer)? == Flow::Cancel {
            tracing::debug!(?step, "wizard cancelled");
            return Ok(None);
        }
    }

    let registry_url = optional(answers.registry_url.clone());
    let npm_registry = resolve_registry_config(
        answers.ci,
        Some(answers.registry_type.as_str()),
        registry_url.as_deref(),
        answers.gitlab_project_registry,
    )?;

    Ok(Some(ScaffoldPlan {
        package_name: answers.package_name,
        directory: normalize(&seed.cwd.join(&answers.directory)),
        template: answers.template,
        package_manager: answers.package_manager,
        ci: answers.ci,
        npm_registry,
        install_dependencies: answers.install,
        overwrite: seed.options.force || answers.overwrite,
        repository_url: optional(answers.repository_url),
        license: optional(answers.license),
        description: optional(answers.description),
    }))
}
