use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    config::{load_settings_from, DEFAULT_CONFIG_FILE},
    DisplayTargets, MemoryPage, SubmissionController, SubmitEvent,
};
use shared::{
    domain::{
        FormData, AGE_FIELD, FAILURES_FIELD, NAME_FIELD, STUDY_TIME_FIELD, YEAR1_MARKS_FIELD,
        YEAR2_MARKS_FIELD,
    },
    protocol::PayloadEncoding,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Submit one student record to a marks prediction endpoint.
#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the prediction service; overrides config and environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// `multipart` or `json`.
    #[arg(long)]
    encoding: Option<PayloadEncoding>,
    /// Text placed before the predicted value.
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    year1_marks: Option<String>,
    #[arg(long)]
    year2_marks: Option<String>,
    #[arg(long)]
    study_time: Option<String>,
    #[arg(long)]
    failures: Option<String>,
    /// Extra form field as `key=value`; may repeat.
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

impl Args {
    fn form(&self) -> Result<FormData> {
        let mut form = FormData::new();
        let named = [
            (NAME_FIELD, &self.name),
            (AGE_FIELD, &self.age),
            (YEAR1_MARKS_FIELD, &self.year1_marks),
            (YEAR2_MARKS_FIELD, &self.year2_marks),
            (STUDY_TIME_FIELD, &self.study_time),
            (FAILURES_FIELD, &self.failures),
        ];
        for (field, value) in named {
            if let Some(value) = value {
                form.push(field, value.as_str());
            }
        }
        for (key, value) in &self.fields {
            form.set(key.as_str(), value.as_str());
        }
        if form.is_empty() {
            bail!("no form fields given; pass --name, --age, ... or --field key=value");
        }
        Ok(form)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config, |key| std::env::var(key).ok());
    if let Some(server_url) = &args.server_url {
        settings.server_url = server_url.clone();
    }
    if let Some(encoding) = args.encoding {
        settings.encoding = encoding;
    }
    if let Some(label) = &args.label {
        settings.result_label = label.clone();
    }

    info!(
        server_url = %settings.server_url,
        encoding = %settings.encoding,
        "using prediction endpoint"
    );

    let targets = DisplayTargets::default();
    let page = Arc::new(MemoryPage::for_targets(&targets));
    page.set_form(&targets.form, args.form()?);

    let controller = SubmissionController::connect(Arc::clone(&page), targets, &settings)?;
    let outcome = controller.handle_submit(&mut SubmitEvent::new()).await;

    let result = page
        .text(&controller.targets().result)
        .unwrap_or_default();
    println!("{result}");

    Ok(if outcome.is_failure() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_flags_override_named_flags() {
        let args = Args::parse_from([
            "predict_cli",
            "--name",
            "Alice",
            "--age",
            "17",
            "--field",
            "age=18",
            "--field",
            "school=GP",
        ]);
        let form = args.form().expect("form");
        let fields: Vec<_> = form.iter().collect();
        assert_eq!(
            fields,
            vec![("name", "Alice"), ("age", "18"), ("school", "GP")]
        );
    }

    #[test]
    fn rejects_field_without_separator() {
        assert!(parse_field("age").is_err());
        assert!(parse_field("=17").is_err());
        assert_eq!(
            parse_field("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
    }

    #[test]
    fn empty_form_is_an_error() {
        let args = Args::parse_from(["predict_cli", "--encoding", "json"]);
        assert_eq!(args.encoding, Some(PayloadEncoding::Json));
        assert!(args.form().is_err());
    }
}
