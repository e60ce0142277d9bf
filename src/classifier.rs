use std::collections::HashSet;

use tracing::debug;

use crate::model::{
    AdvisoryFlag, CodeCategory, CodeEntry, CodeLimits, CodingReport, MedicalNecessity,
};
use crate::rules::{
    BundleRule, EMPTY_INPUT_CONFIDENCE, GENERAL_EXAM_FALLBACK, PNEUMONIA_COOCCURRENCE, RuleCode,
    RuleTable,
};
use crate::util::opaque_id;

const OVERALL_BASE: f64 = 0.3;
const OVERALL_PER_MATCH: f64 = 0.15;
const OVERALL_CEILING: f64 = 0.95;
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

const BASE_RECOMMENDATIONS: &[&str] = &[
    "Provide more specific clinical details for accurate coding",
    "Include duration and severity of symptoms",
    "Specify any diagnostic test results",
];
const LOW_CONFIDENCE_RECOMMENDATION: &str =
    "Low confidence analysis; recommend manual coding review";
const CARDIAC_RECOMMENDATION: &str =
    "Cardiac-related symptoms detected; correlate with ECG and cardiac history";
const NECESSITY_COMMENTS: &str =
    "Services appear medically necessary based on available documentation";

/// Stateless classification engine over the immutable rule table. Each
/// call is self-contained; concurrent calls need no coordination.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    table: &'static RuleTable,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            table: RuleTable::standard(),
        }
    }

    /// Produce a report for one case description. Never fails: empty or
    /// unmatched text takes the fallback path rather than erroring.
    pub fn analyze(&self, text: &str, limits: CodeLimits) -> CodingReport {
        let folded = text.to_lowercase();
        let folded = folded.trim();

        if let Some(bundle) = self
            .table
            .bundles()
            .iter()
            .find(|bundle| bundle.triggered_by(folded))
        {
            debug!(bundle = bundle.name, "bundle rule triggered");
            return self.bundle_report(bundle, limits);
        }

        let mut matched_conditions: HashSet<&'static str> = HashSet::new();
        let mut seen: HashSet<(CodeCategory, &'static str)> = HashSet::new();
        let mut entries: Vec<(CodeCategory, CodeEntry)> = Vec::new();

        if !folded.is_empty() {
            for rule in self.table.conditions() {
                if folded.contains(rule.phrase().as_str()) {
                    matched_conditions.insert(rule.condition);
                    for code in rule.codes {
                        push_unique_entry(&mut entries, &mut seen, code, code.confidence);
                    }
                }
            }
        }

        if matched_conditions.contains("fever") && matched_conditions.contains("cough") {
            push_unique_entry(
                &mut entries,
                &mut seen,
                &PNEUMONIA_COOCCURRENCE,
                PNEUMONIA_COOCCURRENCE.confidence,
            );
        }
        let cardiac_symptoms = matched_conditions.contains("chest_pain")
            && matched_conditions.contains("shortness_of_breath");

        if entries.is_empty() {
            return self.fallback_report(text, folded.is_empty(), limits);
        }

        let matched_count = entries.len();
        let overall = round2(
            (OVERALL_BASE + OVERALL_PER_MATCH * matched_count as f64).min(OVERALL_CEILING),
        );

        let mut flags = Vec::new();
        for (_, entry) in &entries {
            for flag in &entry.flags {
                push_unique_flag(&mut flags, *flag);
            }
        }
        if cardiac_symptoms {
            push_unique_flag(&mut flags, AdvisoryFlag::CardiacSymptoms);
        }

        let mut recommendations: Vec<String> = BASE_RECOMMENDATIONS
            .iter()
            .map(ToString::to_string)
            .collect();
        if cardiac_symptoms {
            recommendations.push(CARDIAC_RECOMMENDATION.to_string());
        }
        if overall < LOW_CONFIDENCE_THRESHOLD {
            recommendations.push(LOW_CONFIDENCE_RECOMMENDATION.to_string());
        }

        let category_count = CodeCategory::ALL
            .iter()
            .filter(|category| entries.iter().any(|(entry_category, _)| entry_category == *category))
            .count();

        let mut report = CodingReport {
            report_id: opaque_id("report", 8),
            report_summary: format!(
                "Keyword analysis identified {matched_count} candidate billing codes across {category_count} categories."
            ),
            cpt_codes: Vec::new(),
            icd10_codes: Vec::new(),
            hcpcs_codes: Vec::new(),
            medical_necessity: MedicalNecessity {
                validated: true,
                comments: NECESSITY_COMMENTS.to_string(),
            },
            overall_confidence: overall,
            flags,
            recommendations,
        };

        for (category, entry) in entries {
            report.codes_for_mut(category).push(entry);
        }
        sort_and_truncate(&mut report, limits);

        debug!(
            matched = matched_count,
            overall = report.overall_confidence,
            "keyword analysis complete"
        );
        report
    }

    fn bundle_report(&self, bundle: &BundleRule, limits: CodeLimits) -> CodingReport {
        let mut report = CodingReport {
            report_id: opaque_id("report", 8),
            report_summary: bundle.summary.to_string(),
            cpt_codes: Vec::new(),
            icd10_codes: Vec::new(),
            hcpcs_codes: Vec::new(),
            medical_necessity: MedicalNecessity {
                validated: true,
                comments: bundle.necessity_comments.to_string(),
            },
            overall_confidence: bundle.overall_confidence,
            flags: bundle.flags.to_vec(),
            recommendations: bundle
                .recommendations
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        for code in bundle.codes {
            report
                .codes_for_mut(code.category)
                .push(entry_from(code, code.confidence));
        }
        sort_and_truncate(&mut report, limits);

        report
    }

    fn fallback_report(&self, text: &str, empty_input: bool, limits: CodeLimits) -> CodingReport {
        let confidence = if empty_input {
            EMPTY_INPUT_CONFIDENCE
        } else {
            GENERAL_EXAM_FALLBACK.confidence
        };
        let overall = if empty_input { 0.0 } else { confidence };

        let mut flags = vec![AdvisoryFlag::GeneralAnalysis];
        if empty_input {
            flags.push(AdvisoryFlag::NoInput);
        }

        let summary = if empty_input {
            "No clinical text supplied; general examination fallback returned.".to_string()
        } else {
            format!(
                "General medical case analysis: {}...",
                text.trim().chars().take(100).collect::<String>()
            )
        };

        let mut recommendations: Vec<String> = BASE_RECOMMENDATIONS
            .iter()
            .map(ToString::to_string)
            .collect();
        if overall < LOW_CONFIDENCE_THRESHOLD {
            recommendations.push(LOW_CONFIDENCE_RECOMMENDATION.to_string());
        }

        let mut report = CodingReport {
            report_id: opaque_id("report", 8),
            report_summary: summary,
            cpt_codes: Vec::new(),
            icd10_codes: vec![entry_from(&GENERAL_EXAM_FALLBACK, confidence)],
            hcpcs_codes: Vec::new(),
            medical_necessity: MedicalNecessity {
                validated: true,
                comments: NECESSITY_COMMENTS.to_string(),
            },
            overall_confidence: overall,
            flags,
            recommendations,
        };
        sort_and_truncate(&mut report, limits);

        debug!(empty_input, overall, "fallback analysis returned");
        report
    }
}

fn entry_from(code: &RuleCode, confidence: f64) -> CodeEntry {
    CodeEntry {
        code: code.code.to_string(),
        description: code.description.to_string(),
        confidence,
        rationale: code.rationale.to_string(),
        flags: code.flags.to_vec(),
        sources: code.sources.iter().map(ToString::to_string).collect(),
    }
}

fn push_unique_entry(
    entries: &mut Vec<(CodeCategory, CodeEntry)>,
    seen: &mut HashSet<(CodeCategory, &'static str)>,
    code: &'static RuleCode,
    confidence: f64,
) {
    if !seen.insert((code.category, code.code)) {
        return;
    }
    entries.push((code.category, entry_from(code, confidence)));
}

fn push_unique_flag(flags: &mut Vec<AdvisoryFlag>, flag: AdvisoryFlag) {
    if !flags.contains(&flag) {
        flags.push(flag);
    }
}

// Stable sort keeps rule-table declaration order on confidence ties.
fn sort_and_truncate(report: &mut CodingReport, limits: CodeLimits) {
    for category in CodeCategory::ALL {
        let limit = limits.limit_for(category);
        let codes = report.codes_for_mut(category);
        codes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        codes.truncate(limit);
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> CodingReport {
        Classifier::new().analyze(text, CodeLimits::default())
    }

    fn codes(entries: &[CodeEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.code.as_str()).collect()
    }

    #[test]
    fn hypertension_text_yields_i10() {
        let report = analyze("Follow-up visit for hypertension management.");
        assert!(codes(&report.icd10_codes).contains(&"I10"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let report = analyze("HYPERTENSION noted on intake, BP elevated.");
        assert!(codes(&report.icd10_codes).contains(&"I10"));
    }

    #[test]
    fn fever_and_cough_infer_pneumonia_once() {
        let report = analyze("Three days of fever and productive cough.");

        let pneumonia: Vec<&CodeEntry> = report
            .icd10_codes
            .iter()
            .filter(|entry| entry.code == "J18.9")
            .collect();
        assert_eq!(pneumonia.len(), 1);
        assert!(
            pneumonia[0]
                .rationale
                .to_lowercase()
                .contains("respiratory infection")
        );
        assert_eq!(pneumonia[0].confidence, PNEUMONIA_COOCCURRENCE.confidence);

        // fever (R50.9) + cough (R05) + inferred J18.9
        assert_eq!(report.matched_code_count(), 3);
        assert_eq!(report.overall_confidence, 0.75);
    }

    #[test]
    fn direct_pneumonia_match_suppresses_cooccurrence_duplicate() {
        let report = analyze("Fever and cough, chest x-ray confirms pneumonia.");

        let pneumonia: Vec<&CodeEntry> = report
            .icd10_codes
            .iter()
            .filter(|entry| entry.code == "J18.9")
            .collect();
        assert_eq!(pneumonia.len(), 1);
        // the direct rule wins the slot; its base confidence applies
        assert_eq!(pneumonia[0].confidence, 0.76);
        assert_eq!(pneumonia[0].rationale, "Documented pneumonia diagnosis");
    }

    #[test]
    fn cardiac_cooccurrence_sets_case_flag() {
        let report = analyze("Acute chest pain with shortness of breath on exertion.");

        assert!(report.flags.contains(&AdvisoryFlag::CardiacSymptoms));
        assert!(codes(&report.icd10_codes).contains(&"R07.9"));
        assert!(codes(&report.icd10_codes).contains(&"R06.02"));
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.to_lowercase().contains("cardiac"))
        );
    }

    #[test]
    fn appendicitis_bundle_is_exclusive() {
        let report = analyze("Patient with fever, nausea and rlq pain, likely appendicitis.");

        let mut cpt = codes(&report.cpt_codes);
        cpt.sort_unstable();
        assert_eq!(cpt, vec!["44970", "99283"]);

        let mut icd10 = codes(&report.icd10_codes);
        icd10.sort_unstable();
        assert_eq!(icd10, vec!["K35.9", "R10.31"]);

        assert_eq!(codes(&report.hcpcs_codes), vec!["J0696"]);
        assert_eq!(report.overall_confidence, 0.78);
        assert_eq!(report.flags, vec![AdvisoryFlag::ConfirmationNeeded]);
        assert_eq!(report.recommendations.len(), 3);
    }

    #[test]
    fn empty_input_returns_single_fallback() {
        let report = analyze("");

        assert_eq!(report.overall_confidence, 0.0);
        assert_eq!(report.matched_code_count(), 1);
        assert_eq!(report.icd10_codes[0].code, "Z00.00");
        assert_eq!(report.icd10_codes[0].confidence, EMPTY_INPUT_CONFIDENCE);
        assert!(report.flags.contains(&AdvisoryFlag::NoInput));
        assert!(report.flags.contains(&AdvisoryFlag::GeneralAnalysis));
    }

    #[test]
    fn whitespace_only_input_counts_as_empty() {
        let report = analyze("   \n\t  ");
        assert_eq!(report.overall_confidence, 0.0);
        assert!(report.flags.contains(&AdvisoryFlag::NoInput));
    }

    #[test]
    fn unmatched_text_returns_general_analysis_fallback() {
        let report = analyze("Patient discussed travel plans and dietary preferences.");

        assert_eq!(report.matched_code_count(), 1);
        assert_eq!(report.icd10_codes[0].code, "Z00.00");
        assert_eq!(report.icd10_codes[0].confidence, 0.65);
        assert_eq!(report.overall_confidence, 0.65);
        assert_eq!(report.flags, vec![AdvisoryFlag::GeneralAnalysis]);
        assert!(
            !report
                .recommendations
                .iter()
                .any(|r| r.contains("Low confidence"))
        );
    }

    #[test]
    fn overall_confidence_follows_match_count_formula() {
        for (text, expected_matches) in [
            ("Reports occasional dizziness.", 1),
            ("Chronic back pain and fatigue.", 2),
            ("History of copd, asthma and anxiety.", 3),
        ] {
            let report = analyze(text);
            assert_eq!(report.matched_code_count(), expected_matches, "{text}");

            let expected =
                ((0.3 + 0.15 * expected_matches as f64).min(0.95) * 100.0).round() / 100.0;
            assert!(
                (report.overall_confidence - expected).abs() < 0.01,
                "{text}: {} != {expected}",
                report.overall_confidence
            );
        }
    }

    #[test]
    fn overall_confidence_is_capped() {
        let report = analyze(
            "Diabetes and hypertension, with fever, cough, headache, nausea and back pain.",
        );
        assert!(report.matched_code_count() > 5);
        assert_eq!(report.overall_confidence, 0.95);
    }

    #[test]
    fn low_confidence_adds_manual_review_recommendation() {
        let report = analyze("Reports occasional dizziness.");
        assert!(report.overall_confidence < 0.5);
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.contains("manual coding review"))
        );
    }

    #[test]
    fn analysis_is_idempotent_up_to_report_id() {
        let classifier = Classifier::new();
        let text = "Diabetes follow-up, fever and cough this week.";
        let first = classifier.analyze(text, CodeLimits::default());
        let second = classifier.analyze(text, CodeLimits::default());

        assert_ne!(first.report_id, second.report_id);
        assert_eq!(first.cpt_codes, second.cpt_codes);
        assert_eq!(first.icd10_codes, second.icd10_codes);
        assert_eq!(first.hcpcs_codes, second.hcpcs_codes);
        assert_eq!(first.overall_confidence, second.overall_confidence);
        assert_eq!(first.flags, second.flags);
        assert_eq!(first.recommendations, second.recommendations);
        assert_eq!(first.report_summary, second.report_summary);
    }

    #[test]
    fn cpt_limit_keeps_highest_confidence_entry() {
        let limits = CodeLimits {
            cpt: 1,
            ..CodeLimits::default()
        };
        let report =
            Classifier::new().analyze("Diabetes and hypertension, meds reviewed.", limits);

        // 83036 (0.85) outranks 99213 (0.80) and 99214 (0.78)
        assert_eq!(codes(&report.cpt_codes), vec!["83036"]);
    }

    #[test]
    fn categories_are_sorted_by_descending_confidence() {
        let report = analyze("Diabetes and hypertension, fatigue reported.");

        for entries in [&report.cpt_codes, &report.icd10_codes, &report.hcpcs_codes] {
            for pair in entries.windows(2) {
                assert!(pair[0].confidence >= pair[1].confidence);
            }
        }
    }

    #[test]
    fn entry_flags_union_into_case_flags() {
        let report = analyze("Type 2 diabetes, insulin dependent.");
        // A4230 and Z79.4 both carry CONFIRMATION_NEEDED
        assert!(report.flags.contains(&AdvisoryFlag::ConfirmationNeeded));
        assert!(codes(&report.icd10_codes).contains(&"Z79.4"));
    }

    #[test]
    fn multi_word_conditions_match_spaced_phrases() {
        let report = analyze("Dysuria consistent with urinary tract infection.");
        assert!(codes(&report.icd10_codes).contains(&"N39.0"));
    }

    #[test]
    fn medical_necessity_is_always_validated() {
        for text in ["", "hypertension", "rlq pain", "nothing clinical here"] {
            let report = analyze(text);
            assert!(report.medical_necessity.validated, "{text}");
        }
    }

    #[test]
    fn report_ids_carry_prefix() {
        let report = analyze("hypertension");
        assert!(report.report_id.starts_with("report-"));
    }
}
