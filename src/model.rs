use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeCategory {
    Cpt,
    Icd10,
    Hcpcs,
}

impl CodeCategory {
    pub const ALL: [CodeCategory; 3] = [CodeCategory::Cpt, CodeCategory::Icd10, CodeCategory::Hcpcs];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpt => "cpt",
            Self::Icd10 => "icd10",
            Self::Hcpcs => "hcpcs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cpt => "CPT",
            Self::Icd10 => "ICD-10",
            Self::Hcpcs => "HCPCS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryFlag {
    ConfirmationNeeded,
    GeneralAnalysis,
    NoInput,
    CardiacSymptoms,
}

impl AdvisoryFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfirmationNeeded => "CONFIRMATION_NEEDED",
            Self::GeneralAnalysis => "GENERAL_ANALYSIS",
            Self::NoInput => "NO_INPUT",
            Self::CardiacSymptoms => "CARDIAC_SYMPTOMS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub description: String,
    pub confidence: f64,
    pub rationale: String,
    pub flags: Vec<AdvisoryFlag>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalNecessity {
    pub validated: bool,
    pub comments: String,
}

/// The classification result for one request. Field names are the wire
/// shape consumed by downstream clients; the core builds this value
/// directly and never mutates it after assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingReport {
    pub report_id: String,
    pub report_summary: String,
    pub cpt_codes: Vec<CodeEntry>,
    pub icd10_codes: Vec<CodeEntry>,
    pub hcpcs_codes: Vec<CodeEntry>,
    pub medical_necessity: MedicalNecessity,
    pub overall_confidence: f64,
    pub flags: Vec<AdvisoryFlag>,
    pub recommendations: Vec<String>,
}

impl CodingReport {
    pub fn codes_for(&self, category: CodeCategory) -> &[CodeEntry] {
        match category {
            CodeCategory::Cpt => &self.cpt_codes,
            CodeCategory::Icd10 => &self.icd10_codes,
            CodeCategory::Hcpcs => &self.hcpcs_codes,
        }
    }

    pub(crate) fn codes_for_mut(&mut self, category: CodeCategory) -> &mut Vec<CodeEntry> {
        match category {
            CodeCategory::Cpt => &mut self.cpt_codes,
            CodeCategory::Icd10 => &mut self.icd10_codes,
            CodeCategory::Hcpcs => &mut self.hcpcs_codes,
        }
    }

    pub fn matched_code_count(&self) -> usize {
        self.cpt_codes.len() + self.icd10_codes.len() + self.hcpcs_codes.len()
    }
}

/// Per-category result caps supplied by the caller. Defaults mirror the
/// request contract: 8 CPT, 8 ICD-10, 6 HCPCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLimits {
    pub cpt: usize,
    pub icd10: usize,
    pub hcpcs: usize,
}

impl CodeLimits {
    pub fn limit_for(self, category: CodeCategory) -> usize {
        match category {
            CodeCategory::Cpt => self.cpt,
            CodeCategory::Icd10 => self.icd10,
            CodeCategory::Hcpcs => self.hcpcs,
        }
    }
}

impl Default for CodeLimits {
    fn default() -> Self {
        Self {
            cpt: 8,
            icd10: 8,
            hcpcs: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputDigest {
    pub content_hash: String,
    pub character_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisEnvelope {
    pub status: String,
    pub model: String,
    pub response_id: String,
    pub generated_at: String,
    pub warnings: Vec<String>,
    pub input: InputDigest,
    pub report: CodingReport,
}
