use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::classifier::Classifier;
use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::model::{AnalysisEnvelope, CodeCategory, CodeLimits, InputDigest};
use crate::util::{now_utc_string, opaque_id, sha256_text, write_json_pretty};

const MIN_DESCRIPTION_CHARS: usize = 10;
const MAX_DESCRIPTION_CHARS: usize = 10_000;
const ENGINE_MODEL: &str = "medcoder-keyword-v1";

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let text = read_description(&args)?;
    validate_description(&text)?;

    let character_count = text.chars().count();
    info!(character_count, "analysis request received");

    let limits = CodeLimits {
        cpt: args.max_cpt_codes,
        icd10: args.max_icd10_codes,
        hcpcs: args.max_hcpcs_codes,
    };

    let report = Classifier::new().analyze(&text, limits);
    info!(
        report_id = %report.report_id,
        overall_confidence = report.overall_confidence,
        matched_codes = report.matched_code_count(),
        "analysis completed"
    );

    let envelope = AnalysisEnvelope {
        status: "success".to_string(),
        model: ENGINE_MODEL.to_string(),
        response_id: opaque_id("analysis", 12),
        generated_at: now_utc_string(),
        warnings: Vec::new(),
        input: InputDigest {
            content_hash: sha256_text(&text),
            character_count,
        },
        report,
    };

    if let Some(output_path) = &args.output_path {
        write_json_pretty(output_path, &envelope)?;
        info!(path = %output_path.display(), "wrote analysis envelope");
        return Ok(());
    }

    match args.format {
        OutputFormat::Json => write_json_response(&envelope),
        OutputFormat::Text => write_text_response(&envelope),
    }
}

fn read_description(args: &AnalyzeArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }

    if let Some(input_path) = &args.input_path {
        return fs::read_to_string(input_path)
            .with_context(|| format!("failed to read {}", input_path.display()));
    }

    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("failed to read patient description from stdin")?;
    Ok(text)
}

fn validate_description(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("patient description is required");
    }

    let character_count = text.chars().count();
    if character_count < MIN_DESCRIPTION_CHARS {
        bail!(
            "patient description too short (minimum {MIN_DESCRIPTION_CHARS} characters required)"
        );
    }
    if character_count > MAX_DESCRIPTION_CHARS {
        bail!("patient description too long (maximum {MAX_DESCRIPTION_CHARS} characters)");
    }

    Ok(())
}

fn write_json_response(envelope: &AnalysisEnvelope) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, envelope)
        .context("failed to serialize analysis envelope")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(envelope: &AnalysisEnvelope) -> Result<()> {
    let report = &envelope.report;
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Report: {}", report.report_id)?;
    writeln!(output, "Summary: {}", report.report_summary)?;
    writeln!(output, "Overall confidence: {:.2}", report.overall_confidence)?;
    if !report.flags.is_empty() {
        let flags = report
            .flags
            .iter()
            .map(|flag| flag.as_str())
            .collect::<Vec<_>>();
        writeln!(output, "Flags: {}", flags.join(", "))?;
    }

    for category in CodeCategory::ALL {
        let entries = report.codes_for(category);
        if entries.is_empty() {
            continue;
        }

        writeln!(output, "{}:", category.label())?;
        for entry in entries {
            writeln!(
                output,
                "  {}\t{:.2}\t{}",
                entry.code, entry.confidence, entry.description
            )?;
            writeln!(output, "\trationale: {}", entry.rationale)?;
            if !entry.sources.is_empty() {
                writeln!(output, "\tsources: {}", entry.sources.join(", "))?;
            }
        }
    }

    writeln!(
        output,
        "Medical necessity: validated={} ({})",
        report.medical_necessity.validated, report.medical_necessity.comments
    )?;
    writeln!(output, "Recommendations:")?;
    for recommendation in &report.recommendations {
        writeln!(output, "  - {recommendation}")?;
    }

    output.flush()?;
    Ok(())
}
