//! Subcommand implementations.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use schemaform::{
    Diagnostic, FieldPlan, FormConfig, FormController, FormEvent, FormProps, Severity, Submission,
};
use serde_json::Value;

use crate::files::{load_config, read_optional, read_value, write_value};

/// Inputs shared by the form commands.
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// JSON Schema file (`.json` or `.toml`).
    #[arg(short, long)]
    pub schema: PathBuf,
    /// UI hints file.
    #[arg(short, long)]
    pub ui: Option<PathBuf>,
    /// Initial form data.
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// Form config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl FormArgs {
    async fn props(&self) -> anyhow::Result<FormProps> {
        let schema = read_value(&self.schema).await?;
        let mut props = FormProps::new(schema);
        if let Some(ui) = read_optional(self.ui.as_deref()).await? {
            props = props.with_ui(ui);
        }
        if let Some(data) = read_optional(self.data.as_deref()).await? {
            props = props.with_data(data);
        }
        Ok(props)
    }

    /// A controller that has received the props, printing schema
    /// diagnostics as they are raised.
    pub async fn controller(&self) -> anyhow::Result<FormController> {
        let config = load_config(self.config.as_deref()).await?;
        let props = self.props().await?;
        let mut controller = FormController::new(config);
        controller.subscribe(|event| {
            if let FormEvent::Warning(diagnostic) = event {
                print_diagnostic(diagnostic);
            }
        });
        controller.receive(props);
        Ok(controller)
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let label = match diagnostic.severity {
        Severity::Warning => "warning".yellow(),
        Severity::Error => "error".red(),
    };
    eprintln!("{label}: {}: {}", display_path(&diagnostic.path), diagnostic.message);
}

fn display_path(path: &schemaform::DataPath) -> String {
    if path.is_root() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

/// Prints the defaulted data, or writes it to `output`.
pub async fn defaults(args: &FormArgs, output: Option<PathBuf>) -> anyhow::Result<()> {
    let data = defaulted(args).await?;
    match output {
        Some(path) => write_value(&path, &data).await?,
        None => println!("{}", serde_json::to_string_pretty(&data)?),
    }
    Ok(())
}

/// Prints the field plan as an outline, or the render tree as JSON.
pub async fn plan(args: &FormArgs, json: bool) -> anyhow::Result<()> {
    let mut controller = args.controller().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&controller.render())?);
        return Ok(());
    }
    let plan = controller.plan();
    print_outline(&plan.root, 0);
    Ok(())
}

fn print_outline(plan: &FieldPlan, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = plan
        .title
        .clone()
        .or_else(|| plan.name.clone())
        .unwrap_or_default();
    let mut line = format!("{indent}{} {} {}", plan.id.bold(), plan.renderer.name().cyan(), label);
    if let Some(widget) = &plan.widget {
        line.push_str(&format!(" [{widget}]"));
    }
    if plan.required {
        line.push_str(&format!(" {}", "*".red()));
    }
    if plan.readonly || plan.disabled {
        line.push_str(&format!(" {}", "(locked)".dimmed()));
    }
    if let Some(branch) = &plan.branch {
        let title = branch.titles.get(branch.selected).cloned().unwrap_or_default();
        line.push_str(&format!(" {} {title}", "->".dimmed()));
    }
    if plan.array.as_ref().is_some_and(|a| a.can_add) {
        line.push_str(&format!(" {}", "+".green()));
    }
    println!("{line}");
    for child in &plan.children {
        print_outline(child, depth + 1);
    }
}

/// Validates the data as a submit would. Returns whether it was accepted.
pub async fn validate(args: &FormArgs, json: bool) -> anyhow::Result<bool> {
    let mut controller = args.controller().await?;
    let errors = match controller.submit() {
        Submission::Accepted(_) => None,
        Submission::Rejected(errors) => Some(errors),
        Submission::Pending(pending) => {
            let errors = pending.future.await;
            controller.complete_validation(pending.ticket, errors.clone());
            (!errors.is_empty()).then_some(errors)
        }
    };
    let Some(errors) = errors else {
        if json {
            println!("[]");
        } else {
            println!("{}", "valid".green());
        }
        return Ok(true);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&errors)?);
    } else {
        for entry in errors.iter() {
            println!("{}: {}", display_path(&entry.path).red(), entry.message);
        }
        println!("{}", format!("{} error(s)", errors.len()).red().bold());
    }
    Ok(false)
}

pub fn config_schema() -> anyhow::Result<()> {
    let schema = FormProps::for_type::<FormConfig>().schema;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// The data of a freshly received form: the input with defaults filled in.
pub async fn defaulted(args: &FormArgs) -> anyhow::Result<Value> {
    let controller = args.controller().await?;
    Ok((**controller.data()).clone())
}
