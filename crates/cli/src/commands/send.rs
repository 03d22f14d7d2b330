use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use courier_dispatch::{DispatchConfig, DispatchReport, MessageDispatcher, RecipientOutcome};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Sender address.
    #[arg(long)]
    pub from: String,
    /// Sender display name.
    #[arg(long)]
    pub from_name: Option<String>,
    /// Recipient address (repeatable).
    #[arg(long, required = true)]
    pub to: Vec<String>,
    /// CC address.
    #[arg(long)]
    pub cc: Option<String>,
    /// BCC address.
    #[arg(long)]
    pub bcc: Option<String>,
    /// Subject line.
    #[arg(long)]
    pub subject: String,
    /// Message body (string or @file path).
    #[arg(long)]
    pub body: String,
    /// Send the body as plain text instead of HTML.
    #[arg(long)]
    pub plain: bool,
    /// Plain-text alternative for HTML bodies (string or @file path).
    #[arg(long)]
    pub alt_body: Option<String>,
    /// File to attach (repeatable).
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
    /// Override the configured message language.
    #[arg(long)]
    pub language: Option<String>,
}

/// Resolve a `@path` argument to the file's content.
fn read_text(arg: &str) -> anyhow::Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}")),
        None => Ok(arg.to_owned()),
    }
}

fn populate(dispatcher: &mut MessageDispatcher, args: &SendArgs) -> anyhow::Result<()> {
    dispatcher.set_from(&args.from, args.from_name.clone());
    dispatcher.set_recipients(args.to.iter().cloned());
    if let Some(ref cc) = args.cc {
        dispatcher.set_cc(cc);
    }
    if let Some(ref bcc) = args.bcc {
        dispatcher.set_bcc(bcc);
    }
    dispatcher.set_subject(&args.subject);
    dispatcher.set_message(read_text(&args.body)?);
    dispatcher.set_is_html(!args.plain);
    if let Some(ref alt) = args.alt_body {
        dispatcher.set_alt_message(read_text(alt)?);
    }
    dispatcher.set_attachments(args.attachments.iter().cloned());
    Ok(())
}

fn render(report: &DispatchReport, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
        OutputFormat::Text => {
            let mut out = format!("status: {}\n", report.status.as_str());
            if !report.message.is_empty() {
                writeln!(out, "message: {}", report.message)?;
            }
            for outcome in &report.outcomes {
                match outcome {
                    RecipientOutcome::Sent { address, .. } => {
                        writeln!(out, "  sent      {address}")?;
                    }
                    RecipientOutcome::Rejected { address, reason } => {
                        writeln!(out, "  rejected  {address}: {reason}")?;
                    }
                    RecipientOutcome::Failed { address, error } => {
                        writeln!(out, "  failed    {address}: {error}")?;
                    }
                }
            }
            Ok(out)
        }
    }
}

pub async fn run(
    config: DispatchConfig,
    args: &SendArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let config = match args.language {
        Some(ref language) => config.with_language(language),
        None => config,
    };

    let mut dispatcher = MessageDispatcher::smtp(&config)?;
    populate(&mut dispatcher, args)?;

    let report = dispatcher.send().await;
    print!("{}", render(&report, format)?);

    if !report.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
