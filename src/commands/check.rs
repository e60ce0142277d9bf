use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::CheckArgs;
use crate::model::CodeCategory;
use crate::rules::{GENERAL_EXAM_FALLBACK, PNEUMONIA_COOCCURRENCE, RuleCode, RuleTable};

pub fn category_pattern(category: CodeCategory) -> &'static str {
    match category {
        // ICD-10-CM allows up to 4 trailing alphanumerics (e.g. J45.909)
        CodeCategory::Cpt => r"^\d{5}$",
        CodeCategory::Icd10 => r"^[A-Z]\d{2}(?:\.[A-Z0-9]{1,4})?$",
        CodeCategory::Hcpcs => r"^[A-Z]\d{4}$",
    }
}

struct SyntaxPatterns {
    cpt: Regex,
    icd10: Regex,
    hcpcs: Regex,
}

impl SyntaxPatterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            cpt: Regex::new(category_pattern(CodeCategory::Cpt))
                .context("failed to compile CPT pattern")?,
            icd10: Regex::new(category_pattern(CodeCategory::Icd10))
                .context("failed to compile ICD-10 pattern")?,
            hcpcs: Regex::new(category_pattern(CodeCategory::Hcpcs))
                .context("failed to compile HCPCS pattern")?,
        })
    }

    fn matches(&self, category: CodeCategory, code: &str) -> bool {
        match category {
            CodeCategory::Cpt => self.cpt.is_match(code),
            CodeCategory::Icd10 => self.icd10.is_match(code),
            CodeCategory::Hcpcs => self.hcpcs.is_match(code),
        }
    }

    fn classify(&self, code: &str) -> Vec<CodeCategory> {
        CodeCategory::ALL
            .into_iter()
            .filter(|category| self.matches(*category, code))
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct CheckOutcome {
    checked_codes: usize,
    violations: Vec<String>,
    probes: Vec<ProbeOutcome>,
}

#[derive(Debug, Serialize)]
struct ProbeOutcome {
    code: String,
    categories: Vec<CodeCategory>,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let patterns = SyntaxPatterns::compile()?;
    let outcome = check_table(RuleTable::standard(), &patterns, &args.codes);

    for violation in &outcome.violations {
        warn!(violation = %violation, "rule table violation");
    }

    if args.json {
        let mut output = io::BufWriter::new(io::stdout().lock());
        serde_json::to_writer_pretty(&mut output, &outcome)
            .context("failed to serialize check outcome")?;
        writeln!(output)?;
        output.flush()?;
    } else {
        for probe in &outcome.probes {
            let categories = probe
                .categories
                .iter()
                .map(|category| category.label())
                .collect::<Vec<_>>();
            let rendered = if categories.is_empty() {
                "no category".to_string()
            } else {
                categories.join(", ")
            };
            info!(code = %probe.code, categories = %rendered, "code probe");
        }
    }

    if !outcome.violations.is_empty() {
        bail!(
            "rule table validation failed: {} violation(s)",
            outcome.violations.len()
        );
    }

    info!(checked_codes = outcome.checked_codes, "rule table validated");
    Ok(())
}

fn check_table(
    table: &'static RuleTable,
    patterns: &SyntaxPatterns,
    probe_codes: &[String],
) -> CheckOutcome {
    let mut checked_codes = 0;
    let mut violations = Vec::new();

    let table_codes = table
        .conditions()
        .iter()
        .flat_map(|rule| rule.codes.iter())
        .chain(table.bundles().iter().flat_map(|bundle| bundle.codes.iter()))
        .chain([&GENERAL_EXAM_FALLBACK, &PNEUMONIA_COOCCURRENCE]);

    for entry in table_codes {
        checked_codes += 1;
        check_entry(entry, patterns, &mut violations);
    }

    let probes = probe_codes
        .iter()
        .map(|code| ProbeOutcome {
            code: code.clone(),
            categories: patterns.classify(code),
        })
        .collect();

    CheckOutcome {
        checked_codes,
        violations,
        probes,
    }
}

fn check_entry(entry: &RuleCode, patterns: &SyntaxPatterns, violations: &mut Vec<String>) {
    if !patterns.matches(entry.category, entry.code) {
        violations.push(format!(
            "{} code {} does not match the {} syntax pattern",
            entry.category.label(),
            entry.code,
            entry.category.as_str()
        ));
    }

    if !(0.0..=1.0).contains(&entry.confidence) {
        violations.push(format!(
            "{} code {} has out-of-range confidence {}",
            entry.category.label(),
            entry.code,
            entry.confidence
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_no_violations() {
        let patterns = SyntaxPatterns::compile().unwrap();
        let outcome = check_table(RuleTable::standard(), &patterns, &[]);
        assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
        assert!(outcome.checked_codes > 25);
    }

    #[test]
    fn cpt_pattern_accepts_five_digits_only() {
        let patterns = SyntaxPatterns::compile().unwrap();
        assert!(patterns.matches(CodeCategory::Cpt, "99213"));
        assert!(!patterns.matches(CodeCategory::Cpt, "9921"));
        assert!(!patterns.matches(CodeCategory::Cpt, "99213A"));
    }

    #[test]
    fn icd10_pattern_accepts_dotted_and_undotted_forms() {
        let patterns = SyntaxPatterns::compile().unwrap();
        assert!(patterns.matches(CodeCategory::Icd10, "I10"));
        assert!(patterns.matches(CodeCategory::Icd10, "R06.02"));
        assert!(patterns.matches(CodeCategory::Icd10, "J45.909"));
        assert!(!patterns.matches(CodeCategory::Icd10, "I1"));
        assert!(!patterns.matches(CodeCategory::Icd10, "I10."));
        assert!(!patterns.matches(CodeCategory::Icd10, "i10"));
    }

    #[test]
    fn hcpcs_pattern_requires_letter_and_four_digits() {
        let patterns = SyntaxPatterns::compile().unwrap();
        assert!(patterns.matches(CodeCategory::Hcpcs, "J0696"));
        assert!(patterns.matches(CodeCategory::Hcpcs, "A4230"));
        assert!(!patterns.matches(CodeCategory::Hcpcs, "0696"));
        assert!(!patterns.matches(CodeCategory::Hcpcs, "J069"));
    }

    #[test]
    fn classify_reports_every_matching_category() {
        let patterns = SyntaxPatterns::compile().unwrap();
        assert_eq!(patterns.classify("99213"), vec![CodeCategory::Cpt]);
        assert_eq!(patterns.classify("J0696"), vec![CodeCategory::Hcpcs]);
        assert_eq!(patterns.classify("K35.9"), vec![CodeCategory::Icd10]);
        assert!(patterns.classify("not-a-code").is_empty());
    }

    #[test]
    fn out_of_range_confidence_is_flagged() {
        let patterns = SyntaxPatterns::compile().unwrap();
        let entry = RuleCode {
            code: "I10",
            category: CodeCategory::Icd10,
            description: "Essential (primary) hypertension",
            confidence: 1.2,
            rationale: "test",
            flags: &[],
            sources: &[],
        };

        let mut violations = Vec::new();
        check_entry(&entry, &patterns, &mut violations);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("out-of-range"));
    }
}
