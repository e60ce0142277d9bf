use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::{CategoryFilter, RulesArgs};
use crate::model::CodeCategory;
use crate::rules::{RuleCode, RuleTable};
use crate::util::now_utc_string;

#[derive(Debug, Serialize)]
struct RuleListing {
    generated_at: String,
    condition_count: usize,
    bundle_count: usize,
    conditions: Vec<ConditionListing>,
    bundles: Vec<BundleListing>,
}

#[derive(Debug, Serialize)]
struct ConditionListing {
    condition: String,
    phrase: String,
    codes: Vec<CodeListing>,
}

#[derive(Debug, Serialize)]
struct BundleListing {
    name: String,
    triggers: Vec<String>,
    overall_confidence: f64,
    codes: Vec<CodeListing>,
}

#[derive(Debug, Serialize)]
struct CodeListing {
    code: String,
    category: CodeCategory,
    description: String,
    confidence: f64,
}

pub fn run(args: RulesArgs) -> Result<()> {
    let listing = build_listing(RuleTable::standard(), args.category);
    info!(
        conditions = listing.condition_count,
        bundles = listing.bundle_count,
        "rule table listed"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());

    if args.json {
        serde_json::to_writer_pretty(&mut output, &listing)
            .context("failed to serialize rule listing")?;
        writeln!(output)?;
        output.flush()?;
        return Ok(());
    }

    for condition in &listing.conditions {
        writeln!(output, "{} (\"{}\")", condition.condition, condition.phrase)?;
        for code in &condition.codes {
            writeln!(
                output,
                "  {}\t{}\t{:.2}\t{}",
                code.category.label(),
                code.code,
                code.confidence,
                code.description
            )?;
        }
    }

    for bundle in &listing.bundles {
        writeln!(
            output,
            "bundle {} [{}] overall={:.2}",
            bundle.name,
            bundle.triggers.join(", "),
            bundle.overall_confidence
        )?;
        for code in &bundle.codes {
            writeln!(
                output,
                "  {}\t{}\t{:.2}\t{}",
                code.category.label(),
                code.code,
                code.confidence,
                code.description
            )?;
        }
    }

    output.flush()?;
    Ok(())
}

fn build_listing(table: &'static RuleTable, filter: Option<CategoryFilter>) -> RuleListing {
    let category_filter = filter.map(|value| match value {
        CategoryFilter::Cpt => CodeCategory::Cpt,
        CategoryFilter::Icd10 => CodeCategory::Icd10,
        CategoryFilter::Hcpcs => CodeCategory::Hcpcs,
    });

    let keep = |code: &&RuleCode| {
        category_filter
            .map(|category| code.category == category)
            .unwrap_or(true)
    };

    let conditions: Vec<ConditionListing> = table
        .conditions()
        .iter()
        .filter_map(|rule| {
            let codes: Vec<CodeListing> =
                rule.codes.iter().filter(keep).map(code_listing).collect();
            if codes.is_empty() {
                return None;
            }
            Some(ConditionListing {
                condition: rule.condition.to_string(),
                phrase: rule.phrase(),
                codes,
            })
        })
        .collect();

    let bundles: Vec<BundleListing> = table
        .bundles()
        .iter()
        .filter_map(|bundle| {
            let codes: Vec<CodeListing> =
                bundle.codes.iter().filter(keep).map(code_listing).collect();
            if codes.is_empty() {
                return None;
            }
            Some(BundleListing {
                name: bundle.name.to_string(),
                triggers: bundle
                    .triggers
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                overall_confidence: bundle.overall_confidence,
                codes,
            })
        })
        .collect();

    RuleListing {
        generated_at: now_utc_string(),
        condition_count: conditions.len(),
        bundle_count: bundles.len(),
        conditions,
        bundles,
    }
}

fn code_listing(code: &RuleCode) -> CodeListing {
    CodeListing {
        code: code.code.to_string(),
        category: code.category,
        description: code.description.to_string(),
        confidence: code.confidence,
    }
}
