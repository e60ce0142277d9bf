use crate::model::{AdvisoryFlag, CodeCategory};

/// One billing code emitted by a rule: the code itself plus the metadata
/// that flows into the report entry unchanged.
#[derive(Debug, Clone, Copy)]
pub struct RuleCode {
    pub code: &'static str,
    pub category: CodeCategory,
    pub description: &'static str,
    pub confidence: f64,
    pub rationale: &'static str,
    pub flags: &'static [AdvisoryFlag],
    pub sources: &'static [&'static str],
}

/// A keyword rule: matches when the condition phrase (underscores read as
/// spaces) occurs as a literal substring of the case-folded input.
#[derive(Debug, Clone, Copy)]
pub struct ConditionRule {
    pub condition: &'static str,
    pub codes: &'static [RuleCode],
}

impl ConditionRule {
    pub fn phrase(&self) -> String {
        self.condition.replace('_', " ")
    }
}

/// A curated multi-code group emitted atomically. When triggered it
/// supersedes the keyword pass entirely.
#[derive(Debug, Clone, Copy)]
pub struct BundleRule {
    pub name: &'static str,
    pub triggers: &'static [&'static str],
    pub summary: &'static str,
    pub codes: &'static [RuleCode],
    pub overall_confidence: f64,
    pub flags: &'static [AdvisoryFlag],
    pub necessity_comments: &'static str,
    pub recommendations: &'static [&'static str],
}

impl BundleRule {
    pub fn triggered_by(&self, folded_text: &str) -> bool {
        self.triggers
            .iter()
            .any(|trigger| folded_text.contains(trigger))
    }
}

#[derive(Debug)]
pub struct RuleTable {
    conditions: &'static [ConditionRule],
    bundles: &'static [BundleRule],
}

impl RuleTable {
    /// The process-wide table. Immutable static data; declaration order is
    /// significant as the tie-break for result ordering.
    pub fn standard() -> &'static RuleTable {
        &STANDARD_TABLE
    }

    pub fn conditions(&self) -> &'static [ConditionRule] {
        self.conditions
    }

    pub fn bundles(&self) -> &'static [BundleRule] {
        self.bundles
    }

    pub fn condition(&self, key: &str) -> Option<&'static ConditionRule> {
        self.conditions.iter().find(|rule| rule.condition == key)
    }
}

static STANDARD_TABLE: RuleTable = RuleTable {
    conditions: CONDITION_RULES,
    bundles: BUNDLE_RULES,
};

const NO_FLAGS: &[AdvisoryFlag] = &[];
const CONFIRM: &[AdvisoryFlag] = &[AdvisoryFlag::ConfirmationNeeded];

/// Fallback entry emitted when nothing matched. Confidence here is the
/// non-empty-but-unmatched default; empty input lowers it to
/// [`EMPTY_INPUT_CONFIDENCE`].
pub static GENERAL_EXAM_FALLBACK: RuleCode = RuleCode {
    code: "Z00.00",
    category: CodeCategory::Icd10,
    description: "Encounter for general adult medical examination",
    confidence: 0.65,
    rationale: "No specific condition keywords matched; general examination assumed",
    flags: NO_FLAGS,
    sources: &["ICD-10-CM"],
};

pub const EMPTY_INPUT_CONFIDENCE: f64 = 0.30;

/// Inferred pneumonia entry for the fever + cough co-occurrence. Skipped
/// when J18.9 already matched directly.
pub static PNEUMONIA_COOCCURRENCE: RuleCode = RuleCode {
    code: "J18.9",
    category: CodeCategory::Icd10,
    description: "Pneumonia, unspecified organism",
    confidence: 0.72,
    rationale: "Respiratory infection symptoms (fever with cough)",
    flags: CONFIRM,
    sources: &["ICD-10-CM"],
};

static CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        condition: "fever",
        codes: &[RuleCode {
            code: "R50.9",
            category: CodeCategory::Icd10,
            description: "Fever, unspecified",
            confidence: 0.72,
            rationale: "Documented fever symptom",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "cough",
        codes: &[RuleCode {
            code: "R05",
            category: CodeCategory::Icd10,
            description: "Cough",
            confidence: 0.70,
            rationale: "Documented cough symptom",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "headache",
        codes: &[RuleCode {
            code: "R51",
            category: CodeCategory::Icd10,
            description: "Headache",
            confidence: 0.70,
            rationale: "Documented headache symptom",
            flags: NO_FLAGS,
            sources: &[],
        }],
    },
    ConditionRule {
        condition: "hypertension",
        codes: &[
            RuleCode {
                code: "I10",
                category: CodeCategory::Icd10,
                description: "Essential (primary) hypertension",
                confidence: 0.85,
                rationale: "Primary hypertension diagnosis",
                flags: NO_FLAGS,
                sources: &["ICD-10-CM"],
            },
            RuleCode {
                code: "99214",
                category: CodeCategory::Cpt,
                description: "Office/outpatient visit, established patient",
                confidence: 0.78,
                rationale: "Moderate complexity office visit",
                flags: NO_FLAGS,
                sources: &["CPT E/M Guidelines"],
            },
        ],
    },
    ConditionRule {
        condition: "diabetes",
        codes: &[
            RuleCode {
                code: "E11.9",
                category: CodeCategory::Icd10,
                description: "Type 2 diabetes mellitus without complications",
                confidence: 0.75,
                rationale: "Primary diabetes diagnosis",
                flags: NO_FLAGS,
                sources: &["ICD-10-CM"],
            },
            RuleCode {
                code: "99213",
                category: CodeCategory::Cpt,
                description: "Office/outpatient visit, established patient",
                confidence: 0.80,
                rationale: "Established patient office visit",
                flags: NO_FLAGS,
                sources: &["CPT E/M Guidelines"],
            },
            RuleCode {
                code: "83036",
                category: CodeCategory::Cpt,
                description: "Hemoglobin A1c test",
                confidence: 0.85,
                rationale: "Diabetes monitoring lab test",
                flags: NO_FLAGS,
                sources: &["CPT Laboratory Codes"],
            },
            RuleCode {
                code: "A4230",
                category: CodeCategory::Hcpcs,
                description: "Insulin syringe with needle, 1cc or less",
                confidence: 0.50,
                rationale: "Diabetes supplies",
                flags: CONFIRM,
                sources: &["HCPCS Diabetes Supplies"],
            },
        ],
    },
    ConditionRule {
        condition: "insulin",
        codes: &[RuleCode {
            code: "Z79.4",
            category: CodeCategory::Icd10,
            description: "Long-term (current) use of insulin",
            confidence: 0.60,
            rationale: "Diabetes medication management",
            flags: CONFIRM,
            sources: &[],
        }],
    },
    ConditionRule {
        condition: "chest_pain",
        codes: &[RuleCode {
            code: "R07.9",
            category: CodeCategory::Icd10,
            description: "Chest pain, unspecified",
            confidence: 0.74,
            rationale: "Documented chest pain symptom",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "shortness_of_breath",
        codes: &[RuleCode {
            code: "R06.02",
            category: CodeCategory::Icd10,
            description: "Shortness of breath",
            confidence: 0.73,
            rationale: "Documented dyspnea symptom",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "nausea",
        codes: &[RuleCode {
            code: "R11.0",
            category: CodeCategory::Icd10,
            description: "Nausea",
            confidence: 0.68,
            rationale: "Documented nausea symptom",
            flags: NO_FLAGS,
            sources: &[],
        }],
    },
    ConditionRule {
        condition: "vomiting",
        codes: &[RuleCode {
            code: "R11.10",
            category: CodeCategory::Icd10,
            description: "Vomiting, unspecified",
            confidence: 0.68,
            rationale: "Documented vomiting symptom",
            flags: NO_FLAGS,
            sources: &[],
        }],
    },
    ConditionRule {
        condition: "abdominal_pain",
        codes: &[RuleCode {
            code: "R10.9",
            category: CodeCategory::Icd10,
            description: "Unspecified abdominal pain",
            confidence: 0.71,
            rationale: "Documented abdominal pain symptom",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "fatigue",
        codes: &[RuleCode {
            code: "R53.83",
            category: CodeCategory::Icd10,
            description: "Other fatigue",
            confidence: 0.66,
            rationale: "Documented fatigue symptom",
            flags: NO_FLAGS,
            sources: &[],
        }],
    },
    ConditionRule {
        condition: "dizziness",
        codes: &[RuleCode {
            code: "R42",
            category: CodeCategory::Icd10,
            description: "Dizziness and giddiness",
            confidence: 0.67,
            rationale: "Documented dizziness symptom",
            flags: NO_FLAGS,
            sources: &[],
        }],
    },
    ConditionRule {
        condition: "back_pain",
        codes: &[RuleCode {
            code: "M54.9",
            category: CodeCategory::Icd10,
            description: "Dorsalgia, unspecified",
            confidence: 0.69,
            rationale: "Documented back pain symptom",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "urinary_tract_infection",
        codes: &[RuleCode {
            code: "N39.0",
            category: CodeCategory::Icd10,
            description: "Urinary tract infection, site not specified",
            confidence: 0.78,
            rationale: "Documented urinary tract infection",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "pneumonia",
        codes: &[RuleCode {
            code: "J18.9",
            category: CodeCategory::Icd10,
            description: "Pneumonia, unspecified organism",
            confidence: 0.76,
            rationale: "Documented pneumonia diagnosis",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "asthma",
        codes: &[RuleCode {
            code: "J45.909",
            category: CodeCategory::Icd10,
            description: "Unspecified asthma, uncomplicated",
            confidence: 0.77,
            rationale: "Documented asthma diagnosis",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "copd",
        codes: &[RuleCode {
            code: "J44.9",
            category: CodeCategory::Icd10,
            description: "Chronic obstructive pulmonary disease, unspecified",
            confidence: 0.76,
            rationale: "Documented COPD diagnosis",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "myocardial_infarction",
        codes: &[RuleCode {
            code: "I21.9",
            category: CodeCategory::Icd10,
            description: "Acute myocardial infarction, unspecified",
            confidence: 0.82,
            rationale: "Documented myocardial infarction",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "stroke",
        codes: &[RuleCode {
            code: "I63.9",
            category: CodeCategory::Icd10,
            description: "Cerebral infarction, unspecified",
            confidence: 0.81,
            rationale: "Documented cerebrovascular event",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM"],
        }],
    },
    ConditionRule {
        condition: "anxiety",
        codes: &[RuleCode {
            code: "F41.9",
            category: CodeCategory::Icd10,
            description: "Anxiety disorder, unspecified",
            confidence: 0.70,
            rationale: "Documented anxiety presentation",
            flags: NO_FLAGS,
            sources: &[],
        }],
    },
    ConditionRule {
        condition: "depression",
        codes: &[RuleCode {
            code: "F32.9",
            category: CodeCategory::Icd10,
            description: "Major depressive disorder, single episode, unspecified",
            confidence: 0.70,
            rationale: "Documented depressive presentation",
            flags: NO_FLAGS,
            sources: &[],
        }],
    },
];

static BUNDLE_RULES: &[BundleRule] = &[BundleRule {
    name: "appendicitis",
    triggers: &["appendectomy", "appendicitis", "rlq pain"],
    summary: "Patient presents with signs suggestive of acute appendicitis requiring surgical evaluation.",
    codes: &[
        RuleCode {
            code: "99283",
            category: CodeCategory::Cpt,
            description: "Emergency department visit, low severity",
            confidence: 0.85,
            rationale: "ED evaluation for acute abdominal pain",
            flags: NO_FLAGS,
            sources: &["AMA CPT Guidelines 2025"],
        },
        RuleCode {
            code: "44970",
            category: CodeCategory::Cpt,
            description: "Laparoscopy, surgical, appendectomy",
            confidence: 0.75,
            rationale: "Laparoscopic appendectomy procedure",
            flags: CONFIRM,
            sources: &["CPT Surgical Codes"],
        },
        RuleCode {
            code: "K35.9",
            category: CodeCategory::Icd10,
            description: "Acute appendicitis, unspecified",
            confidence: 0.80,
            rationale: "Primary diagnosis of acute appendicitis",
            flags: NO_FLAGS,
            sources: &["ICD-10-CM 2025"],
        },
        RuleCode {
            code: "R10.31",
            category: CodeCategory::Icd10,
            description: "Right lower quadrant pain",
            confidence: 0.90,
            rationale: "Localized abdominal pain symptom",
            flags: NO_FLAGS,
            sources: &[],
        },
        RuleCode {
            code: "J0696",
            category: CodeCategory::Hcpcs,
            description: "Injection, ceftriaxone sodium, per 250 mg",
            confidence: 0.60,
            rationale: "Prophylactic antibiotic administration",
            flags: CONFIRM,
            sources: &["HCPCS Level II"],
        },
    ],
    overall_confidence: 0.78,
    flags: CONFIRM,
    necessity_comments: "Emergency evaluation and potential surgery medically necessary",
    recommendations: &[
        "Confirm operative report details",
        "Document antibiotic administration",
        "Include imaging results if available",
    ],
}];
