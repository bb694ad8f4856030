//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `inputkit_core` linkage.
//! - Run a demo form over `field=value` arguments and print one line per
//!   handler.
//! - Start file logging when `--log-dir=<absolute path>` is given.

use inputkit_core::{FormRequest, HandlerRegistry, InputHandler, RecordModel, WidgetView};
use std::collections::BTreeMap;
use std::process::ExitCode;

const LOG_DIR_FLAG: &str = "--log-dir=";

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    log_dir: Option<String>,
    pairs: Vec<(String, String)>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut parsed = CliArgs::default();
    for arg in args {
        if let Some(dir) = arg.strip_prefix(LOG_DIR_FLAG) {
            parsed.log_dir = Some(dir.to_string());
        } else if let Some((field, value)) = arg.split_once('=') {
            parsed.pairs.push((field.to_string(), value.to_string()));
        }
    }
    parsed
}

fn demo_registry() -> Result<HandlerRegistry, inputkit_core::RegistryError> {
    let mut registry = HandlerRegistry::new();
    registry.register(InputHandler::anything("title"))?;
    registry.register(InputHandler::integer("age"))?;
    registry.register(InputHandler::float("ratio"))?;
    registry.register(InputHandler::list("tags"))?;
    Ok(registry)
}

fn main() -> ExitCode {
    println!("inputkit_core ping={}", inputkit_core::ping());
    println!("inputkit_core version={}", inputkit_core::core_version());

    let args = parse_args(std::env::args().skip(1));
    if let Some(log_dir) = args.log_dir.as_deref() {
        if let Err(err) = inputkit_core::init_logging(inputkit_core::default_log_level(), log_dir)
        {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }

    let request = FormRequest::from_pairs(args.pairs);

    let registry = match demo_registry() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut views: BTreeMap<String, WidgetView> = registry
        .fields()
        .into_iter()
        .map(|field| (field.to_string(), WidgetView::new()))
        .collect();
    let mut model = RecordModel::new();

    let report = match registry.process(&request, &mut model, &mut views) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    for handled in &report.reports {
        let value = handled
            .value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let error = views
            .get(&handled.field)
            .and_then(WidgetView::error)
            .unwrap_or("");
        println!(
            "{} outcome={} value={:?} error={:?}",
            handled.field,
            handled.outcome.as_str(),
            value,
            error
        );
    }

    if report.all_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
