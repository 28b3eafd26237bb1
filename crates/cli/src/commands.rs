use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use tillscan_core::{Config, ExtractionEngine, Money, ReceiptItem};
use tillscan_llm::{GeminiClient, LlmExtractor};
use tillscan_ocr::{Extractor, OcrBackend, ReceiptPipeline, ReceiptSummary, TotalCheck};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON array of {name, price}
    Json,
    /// Aligned item list with a total
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    /// Regular-expression line templates
    Regex,
    /// Hosted text-generation model
    Llm,
}

impl From<EngineArg> for ExtractionEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Regex => ExtractionEngine::Regex,
            EngineArg::Llm => ExtractionEngine::Llm,
        }
    }
}

#[derive(Args)]
pub struct ScanArgs {
    /// Receipt image (PNG, JPEG, TIFF, …)
    image: PathBuf,

    /// Override the configured extraction engine
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Drop lines no template matched instead of guessing
    #[arg(long)]
    no_fallback: bool,

    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Args)]
pub struct ParseArgs {
    /// OCR text file; reads stdin when absent or "-"
    input: Option<PathBuf>,

    /// Drop lines no template matched instead of guessing
    #[arg(long)]
    no_fallback: bool,

    /// Emit match diagnostics: full records and printed amounts in JSON,
    /// the matching template per line in text
    #[arg(long)]
    detail: bool,

    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

pub async fn scan(args: ScanArgs, config: &Config) -> anyhow::Result<String> {
    let engine = args.engine.map(ExtractionEngine::from).unwrap_or(config.extraction.engine);
    let fallback = config.extraction.fallback && !args.no_fallback;
    info!(image = %args.image.display(), %engine, "scanning receipt");

    let pipeline = ReceiptPipeline::from_config(config)?.with_fallback(fallback);
    let (items, summary) = match engine {
        ExtractionEngine::Regex => scan_with_templates(&pipeline, &args.image).await,
        ExtractionEngine::Llm => scan_with_model(&pipeline, &args.image, config).await,
    };

    match args.format {
        OutputFormat::Json => Ok(serde_json::to_string(&items)?),
        OutputFormat::Text => {
            let check = summary.check(&items);
            let rows: Vec<Row> = items.into_iter().map(|item| (item, None)).collect();
            Ok(render_text(&rows, false, &summary, check.as_ref()))
        }
    }
}

async fn scan_with_templates<R: OcrBackend>(
    pipeline: &ReceiptPipeline<R>,
    image: &Path,
) -> (Vec<ReceiptItem>, ReceiptSummary) {
    match pipeline.process_file(image).await {
        Ok(result) => (result.items(), result.summary),
        Err(e) => {
            warn!(image = %image.display(), error = %e, "receipt extraction failed");
            (Vec::new(), ReceiptSummary::default())
        }
    }
}

async fn scan_with_model<R: OcrBackend>(
    pipeline: &ReceiptPipeline<R>,
    image: &Path,
    config: &Config,
) -> (Vec<ReceiptItem>, ReceiptSummary) {
    let recognition = match pipeline.recognize_file(image).await {
        Ok(recognition) => recognition,
        Err(e) => {
            warn!(image = %image.display(), error = %e, "receipt recognition failed");
            return (Vec::new(), ReceiptSummary::default());
        }
    };
    let summary = ReceiptSummary::from_text(&recognition.text);
    let client = match GeminiClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "model client unavailable");
            return (Vec::new(), summary);
        }
    };
    (LlmExtractor::new(client).extract(&recognition.text).await, summary)
}

pub fn parse(args: ParseArgs, config: &Config) -> anyhow::Result<String> {
    let text = read_input(args.input.as_deref())?;
    let fallback = config.extraction.fallback && !args.no_fallback;
    let receipt = Extractor::default().with_fallback(fallback).extract_receipt(&text);

    match args.format {
        OutputFormat::Json if args.detail => Ok(serde_json::to_string_pretty(&receipt)?),
        OutputFormat::Json => Ok(serde_json::to_string(&receipt.into_items())?),
        OutputFormat::Text => {
            let rows: Vec<Row> =
                receipt.lines.iter().map(|m| (m.item(), m.template_used())).collect();
            Ok(render_text(&rows, args.detail, &receipt.summary, receipt.check.as_ref()))
        }
    }
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// An item and, for classified lines, the template that matched it.
type Row<'a> = (ReceiptItem, Option<&'a str>);

fn amount_row(label: &str, amount: Money) -> String {
    format!("{:<32} {:>10}", label, amount.to_string())
}

/// Items, their sum, then whatever the receipt printed about itself. With
/// `detail`, each item line also names its template.
fn render_text(
    rows: &[Row<'_>],
    detail: bool,
    summary: &ReceiptSummary,
    check: Option<&TotalCheck>,
) -> String {
    let mut out: Vec<String> = rows
        .iter()
        .map(|(item, template)| {
            let row = amount_row(&item.name, item.money());
            if detail {
                format!("{row}  {}", template.unwrap_or("fallback"))
            } else {
                row
            }
        })
        .collect();

    out.push(amount_row("TOTAL", rows.iter().map(|(item, _)| item.money()).sum()));
    let printed = [
        ("PRINTED SUBTOTAL", summary.subtotal),
        ("PRINTED TAX", summary.tax),
        ("PRINTED TOTAL", summary.total),
    ];
    for (label, amount) in printed {
        if let Some(amount) = amount {
            out.push(amount_row(label, amount));
        }
    }
    if let Some(check) = check.filter(|c| !c.balanced()) {
        warn!(printed = %check.printed, computed = %check.computed, "items do not add up");
        out.push(amount_row("UNACCOUNTED", check.difference));
    }
    out.join("\n")
}
