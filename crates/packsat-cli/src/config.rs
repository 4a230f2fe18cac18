use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use packsat_core::{DpllSolver, ExternalSolver, SatSolver, SolveOptions};

/// Configuration file name searched for from the working directory upward
pub const CONFIG_FILE: &str = "packsat.toml";

/// The main packsat configuration file structure (packsat.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PacksatConfig {
    /// Solver selection and limits
    pub solver: SolverConfig,

    /// Where the configuration was read from
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

/// Which SAT backend answers the formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process DPLL solver
    #[default]
    Builtin,
    /// External DIMACS solver binary
    External,
}

/// Solver configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: Option<Backend>,

    /// Binary for the external backend, e.g. "kissat"
    pub command: Option<String>,

    /// Arguments passed to the external binary
    pub args: Vec<String>,

    /// Time limit per instance
    pub timeout_secs: Option<u64>,
}

/// Solver flags shared by the commands that solve
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SolverArgs {
    /// Time limit per instance in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// SAT backend to use
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// External solver binary (implies --backend external)
    #[arg(long, value_name = "CMD")]
    pub solver_cmd: Option<String>,
}

impl PacksatConfig {
    /// Load configuration from packsat.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE);

            if config_path.exists() {
                let content = std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                let mut config: PacksatConfig = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?;
                log::debug!("Loaded configuration from {}", config_path.display());
                config.path = Some(config_path);
                return Ok(Some(config));
            }

            // Move to parent directory
            if !current.pop() {
                // Reached filesystem root, no config found
                return Ok(None);
            }
        }
    }

    /// Load configuration by searching upward from the current working directory
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }
}

/// Solver choice after merging flags over the configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverSettings {
    pub backend: Backend,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl SolverSettings {
    /// Merge CLI flags with config file settings (CLI takes precedence)
    pub fn resolve(config: Option<&PacksatConfig>, flags: &SolverArgs) -> Self {
        let file = config.map(|c| &c.solver);

        let command = flags
            .solver_cmd
            .clone()
            .or_else(|| file.and_then(|f| f.command.clone()));
        let backend = flags
            .backend
            .or(flags.solver_cmd.as_ref().map(|_| Backend::External))
            .or_else(|| file.and_then(|f| f.backend))
            .unwrap_or_default();
        let timeout = flags
            .timeout
            .or_else(|| file.and_then(|f| f.timeout_secs))
            .map(Duration::from_secs);

        Self {
            backend,
            command,
            args: file.map(|f| f.args.clone()).unwrap_or_default(),
            timeout,
        }
    }

    /// Instantiate the selected backend
    pub fn solver(&self) -> Result<Box<dyn SatSolver>> {
        match self.backend {
            Backend::Builtin => Ok(Box::new(DpllSolver::new())),
            Backend::External => {
                let Some(command) = &self.command else {
                    bail!(
                        "The external backend needs a solver binary: pass --solver-cmd or set solver.command in {}",
                        CONFIG_FILE
                    );
                };
                Ok(Box::new(
                    ExternalSolver::new(command.clone()).with_args(self.args.clone()),
                ))
            }
        }
    }

    pub fn options(&self) -> SolveOptions {
        match self.timeout {
            Some(timeout) => SolveOptions::new().with_timeout(timeout),
            None => SolveOptions::new(),
        }
    }
}
