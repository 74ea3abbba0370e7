//! Subcommands of the `kel` binary.
//!
//! Each command runs against a [`KelService`] and renders plain text, so the
//! binary only has to print [`Outcome::output`] and pick an exit code.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use kel::{
    CompletionItem, Diagnostic, DiagnosticFormatter, KelService, LocationInfo, ServiceConfig,
    ServiceError, SourceText,
};
use tracing::{debug, info};

/// Where the domain model comes from, plus policy overrides.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Type registry payload (JSON)
    #[arg(long, value_name = "FILE")]
    pub registry: PathBuf,

    /// Evaluation scope payload (JSON)
    #[arg(long, value_name = "FILE")]
    pub scope: PathBuf,

    /// Service configuration (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the loop/filter nesting limit
    #[arg(long, value_name = "N")]
    pub complexity_limit: Option<usize>,
}

impl ServiceArgs {
    pub fn config(&self) -> Result<ServiceConfig, ServiceError> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(limit) = self.complexity_limit {
            config.complexity_limit = limit;
        }
        Ok(config)
    }

    pub fn build(&self) -> Result<KelService, ServiceError> {
        let config = self.config()?;
        debug!(?config, "loading domain model");
        KelService::from_files(&self.registry, &self.scope, config)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate an expression and report diagnostics
    Check {
        expression: String,
        /// Show the offending source line under each diagnostic
        #[arg(long)]
        verbose: bool,
    },
    /// List completions at a cursor offset
    Complete {
        expression: String,
        /// Byte offset; defaults to the end of the expression
        #[arg(long)]
        cursor: Option<u32>,
        /// Print items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the type or function under a cursor offset
    Hover {
        expression: String,
        #[arg(long)]
        cursor: u32,
    },
    /// Print the inferred type of an expression
    TypeOf { expression: String },
    /// Resolve a type name such as `Vehicle[]`
    ResolveType { name: String },
}

/// Rendered result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    /// Whether the process should exit non-zero
    pub failed: bool,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            failed: false,
        }
    }
}

pub fn run(service: &KelService, command: &Command) -> Result<Outcome, ServiceError> {
    match command {
        Command::Check {
            expression,
            verbose,
        } => {
            let diagnostics = service.provide_validation(expression)?;
            let failed = diagnostics.iter().any(Diagnostic::is_error);
            info!(count = diagnostics.len(), failed, "checked expression");
            let output = if *verbose {
                let source = SourceText::new(expression.as_str());
                DiagnosticFormatter::new(&source, "expression").format_all(&diagnostics)
            } else {
                render_diagnostics(expression, &diagnostics)
            };
            Ok(Outcome { output, failed })
        }
        Command::Complete {
            expression,
            cursor,
            json,
        } => {
            let cursor = cursor.unwrap_or(expression.len() as u32);
            let items = service.provide_completion(expression, cursor)?;
            let output = if *json {
                serde_json::to_string_pretty(&items).map_err(ServiceError::Serialize)?
            } else {
                render_completions(&items)
            };
            Ok(Outcome::ok(output))
        }
        Command::Hover { expression, cursor } => {
            let info = service.provide_info_at_location(expression, *cursor)?;
            Ok(Outcome::ok(render_info(expression, info.as_ref())))
        }
        Command::TypeOf { expression } => {
            let ty = service.resolve_expression_evaluation_type(expression)?;
            Ok(Outcome::ok(ty.to_string()))
        }
        Command::ResolveType { name } => Ok(match service.resolve_type(name) {
            Some(ty) => Outcome::ok(ty.to_string()),
            None => Outcome {
                output: format!("unknown type '{}'", name),
                failed: true,
            },
        }),
    }
}

/// One line per diagnostic: `line:col: severity[code]: message`.
pub fn render_diagnostics(expression: &str, diagnostics: &[Diagnostic]) -> String {
    let source = SourceText::new(expression);
    let mut output = String::new();
    for diagnostic in diagnostics {
        match diagnostic.span {
            Some(span) => {
                let (line, col) = source.line_col(span.start);
                output.push_str(&format!("{}:{}: {}\n", line, col, diagnostic));
            }
            None => output.push_str(&format!("{}\n", diagnostic)),
        }
        for note in &diagnostic.notes {
            output.push_str(&format!("    note: {}\n", note));
        }
    }
    output
}

pub fn render_completions(items: &[CompletionItem]) -> String {
    items
        .iter()
        .map(|item| {
            let line = format!("{} {:<9} {}", item.rank, item.kind.to_string(), item.text);
            if item.detail.is_empty() {
                line
            } else {
                format!("{}  {}", line, item.detail)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_info(expression: &str, info: Option<&LocationInfo>) -> String {
    let Some(info) = info else {
        return "nothing at cursor".to_string();
    };
    let source = SourceText::new(expression);
    let span = match info {
        LocationInfo::Type { span, .. } | LocationInfo::Function { span, .. } => span,
    };
    format!("{}  ({})", info, source.snippet(span))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"{
        "@class": "TypeRegistry",
        "types": [{
            "@class": "Type",
            "name": "Policy",
            "properties": {
                "@class": "SymbolTable",
                "references": [
                    {
                        "@class": "VariableSymbol",
                        "name": "premium",
                        "type": {"@class": "TypeRef", "name": "Money"}
                    },
                    {
                        "@class": "VariableSymbol",
                        "name": "state",
                        "type": {"@class": "TypeRef", "name": "String"}
                    }
                ],
                "functions": []
            }
        }]
    }"#;

    const SCOPE: &str = r#"{
        "@class": "Scope",
        "name": "Policy",
        "scopeType": "GLOBAL",
        "type": {"@class": "TypeRef", "name": "Policy"}
    }"#;

    fn service() -> KelService {
        KelService::from_payloads(REGISTRY, SCOPE, ServiceConfig::default()).unwrap()
    }

    fn run_str(command: Command) -> Outcome {
        run(&service(), &command).unwrap()
    }

    #[test]
    fn test_check_reports_and_fails() {
        let outcome = run_str(Command::Check {
            expression: "premium +\n state".into(),
            verbose: false,
        });
        assert!(outcome.failed);
        assert!(
            outcome.output.starts_with("2:2: error[KEL201]:"),
            "unexpected output: {}",
            outcome.output
        );
    }

    #[test]
    fn test_check_clean() {
        let outcome = run_str(Command::Check {
            expression: "premium > 10".into(),
            verbose: true,
        });
        assert!(!outcome.failed);
        assert!(outcome.output.is_empty());
    }

    #[test]
    fn test_complete_defaults_to_end() {
        let outcome = run_str(Command::Complete {
            expression: "".into(),
            cursor: None,
            json: false,
        });
        assert!(outcome.output.lines().any(|line| line.ends_with("premium  Money")));

        let outcome = run_str(Command::Complete {
            expression: "".into(),
            cursor: None,
            json: true,
        });
        let items: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        let items = items.as_array().unwrap();
        assert!(!items.is_empty());
        assert!(items.iter().any(|item| item["text"] == "premium"));
        assert!(outcome.output.contains(r#""kind": "reference""#));
    }

    #[test]
    fn test_hover_and_type_of() {
        let outcome = run_str(Command::Hover {
            expression: "premium".into(),
            cursor: 3,
        });
        assert_eq!(outcome.output, "Money  (premium)");

        let outcome = run_str(Command::TypeOf {
            expression: "state = 'CA'".into(),
        });
        assert_eq!(outcome.output, "Boolean");
    }

    #[test]
    fn test_resolve_type_unknown_fails() {
        assert_eq!(
            run_str(Command::ResolveType { name: "Policy[]".into() }).output,
            "Policy[]"
        );
        assert!(run_str(Command::ResolveType { name: "Nope".into() }).failed);
    }

    #[test]
    fn test_complexity_flag_overrides_config() {
        let args = ServiceArgs {
            registry: PathBuf::from("registry.json"),
            scope: PathBuf::from("scope.json"),
            config: None,
            complexity_limit: Some(7),
        };
        assert_eq!(args.config().unwrap().complexity_limit, 7);
    }
}
