//! # Ingestion Pipeline
//!
//! Turns a source file (typically a PDF of a standard) into a layer 1
//! guidance document through four stages supplied by the host:
//!
//! ```text
//! parse(file) -> StructuredDocument
//!   segment(StructuredDocument) -> CategorizedDocument
//!     convert(CategorizedDocument) -> GuidanceDocument
//!       validate_structure(&GuidanceDocument) -> StructureReport
//! ```
//!
//! The stage implementations are outside this crate. [`IngestPipeline`]
//! runs them in order, times each one, then serializes the converted
//! guidance to YAML and validates it against the layer 1 schema.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use gemara_core::{GuidanceDocument, Layer};
use serde::Serialize;
use thiserror::Error;

use crate::error::SchemaError;
use crate::validate::{ValidationReport, Validator};

/// Raw text blocks extracted from a source file, grouped by page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructuredDocument {
    pub source: PathBuf,
    pub parser: String,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    pub number: u32,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    /// Block type reported by the parser (`heading`, `paragraph`, `table`, ...).
    pub kind: String,
    pub text: String,
}

impl StructuredDocument {
    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }
}

/// Blocks regrouped into titled sections.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorizedDocument {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// Result of the host's own structural checks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureReport {
    pub valid: bool,
    pub errors: Vec<StructureIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureIssue {
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A stage failed and the pipeline stopped.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {message}")]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("cannot serialize converted guidance: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Segment,
    Convert,
    Validate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Segment => "segment",
            Stage::Convert => "convert",
            Stage::Validate => "validate",
        };
        f.write_str(name)
    }
}

pub trait DocumentParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<StructuredDocument, StageError>;
}

pub trait Segmenter: Send + Sync {
    fn segment(&self, doc: StructuredDocument) -> Result<CategorizedDocument, StageError>;
}

pub trait Converter: Send + Sync {
    fn convert(&self, doc: CategorizedDocument) -> Result<GuidanceDocument, StageError>;
}

pub trait StructureValidator: Send + Sync {
    fn validate_structure(&self, doc: &GuidanceDocument) -> StructureReport;
}

#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration_ms: u128,
}

/// Everything the pipeline produced for one source file.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: PathBuf,
    pub timings: Vec<StageTiming>,
    pub pages: usize,
    pub blocks: usize,
    pub sections: usize,
    pub categories: usize,
    pub guidelines: usize,
    pub structure: StructureReport,
    pub schema: ValidationReport,
    pub document: GuidanceDocument,
}

impl IngestReport {
    pub fn total_duration(&self) -> Duration {
        let ms: u128 = self.timings.iter().map(|t| t.duration_ms).sum();
        Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
    }

    /// Both the structural checks and the schema accepted the document.
    pub fn is_valid(&self) -> bool {
        self.structure.valid && self.schema.valid
    }
}

pub struct IngestPipeline<'a> {
    pub parser: &'a dyn DocumentParser,
    pub segmenter: &'a dyn Segmenter,
    pub converter: &'a dyn Converter,
    pub structure: &'a dyn StructureValidator,
    pub validator: &'a Validator,
}

fn timed<T>(stage: Stage, timings: &mut Vec<StageTiming>, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    tracing::debug!(%stage, elapsed_ms = elapsed.as_millis() as u64, "pipeline stage done");
    timings.push(StageTiming {
        stage,
        duration_ms: elapsed.as_millis(),
    });
    out
}

impl IngestPipeline<'_> {
    /// Run every stage on `path`. Stops at the first failing stage.
    pub async fn run(&self, path: &Path) -> Result<IngestReport, PipelineError> {
        let mut timings = Vec::with_capacity(4);

        let parsed = timed(Stage::Parse, &mut timings, || self.parser.parse(path))?;
        let pages = parsed.pages.len();
        let blocks = parsed.block_count();

        let segmented = timed(Stage::Segment, &mut timings, || self.segmenter.segment(parsed))?;
        let sections = segmented.sections.len();

        let document = timed(Stage::Convert, &mut timings, || self.converter.convert(segmented))?;

        let structure = timed(Stage::Validate, &mut timings, || {
            self.structure.validate_structure(&document)
        });

        let yaml = serde_yaml::to_string(&document)?;
        let schema = self.validator.validate(&yaml, Layer::Guidance).await?;

        tracing::info!(
            source = %path.display(),
            guidelines = document.guideline_count(),
            structure_valid = structure.valid,
            schema_valid = schema.valid,
            "ingestion finished"
        );

        Ok(IngestReport {
            source: path.to_path_buf(),
            timings,
            pages,
            blocks,
            sections,
            categories: document.categories.len(),
            guidelines: document.guideline_count(),
            structure,
            schema,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SchemaSource;
    use gemara_core::{Category, Guideline, Metadata};
    use std::sync::Arc;

    struct LinesParser;
    impl DocumentParser for LinesParser {
        fn parse(&self, path: &Path) -> Result<StructuredDocument, StageError> {
            let text = std::fs::read_to_string(path)
                .map_err(|e| StageError::new(Stage::Parse, e.to_string()))?;
            let blocks = text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| Block {
                    kind: if l.starts_with('#') { "heading" } else { "paragraph" }.into(),
                    text: l.trim_start_matches('#').trim().to_string(),
                })
                .collect();
            Ok(StructuredDocument {
                source: path.to_path_buf(),
                parser: "lines".into(),
                pages: vec![Page { number: 1, blocks }],
            })
        }
    }

    struct HeadingSegmenter;
    impl Segmenter for HeadingSegmenter {
        fn segment(&self, doc: StructuredDocument) -> Result<CategorizedDocument, StageError> {
            let mut sections: Vec<Section> = Vec::new();
            for block in doc.pages.into_iter().flat_map(|p| p.blocks) {
                if block.kind == "heading" {
                    sections.push(Section {
                        id: format!("S{}", sections.len() + 1),
                        title: block.text,
                        paragraphs: Vec::new(),
                    });
                } else if let Some(last) = sections.last_mut() {
                    last.paragraphs.push(block.text);
                } else {
                    return Err(StageError::new(Stage::Segment, "text before first heading"));
                }
            }
            Ok(CategorizedDocument {
                title: "Sample Standard".into(),
                sections,
            })
        }
    }

    struct SectionConverter;
    impl Converter for SectionConverter {
        fn convert(&self, doc: CategorizedDocument) -> Result<GuidanceDocument, StageError> {
            let categories = doc
                .sections
                .into_iter()
                .map(|s| Category {
                    guidelines: s
                        .paragraphs
                        .iter()
                        .enumerate()
                        .map(|(i, p)| Guideline {
                            id: format!("{}.{}", s.id, i + 1),
                            title: p.clone(),
                            ..Guideline::default()
                        })
                        .collect(),
                    id: s.id,
                    title: s.title,
                    description: String::new(),
                })
                .collect();
            Ok(GuidanceDocument {
                metadata: Metadata {
                    id: "sample-standard".into(),
                    title: doc.title,
                    ..Metadata::default()
                },
                front_matter: None,
                categories,
            })
        }
    }

    struct AlwaysValid;
    impl StructureValidator for AlwaysValid {
        fn validate_structure(&self, _doc: &GuidanceDocument) -> StructureReport {
            StructureReport {
                valid: true,
                errors: Vec::new(),
            }
        }
    }

    fn validator() -> Validator {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop();
        dir.pop();
        Validator::new(Arc::new(SchemaSource::from_dir(dir.join("schemas")).unwrap()))
    }

    #[tokio::test]
    async fn runs_all_stages_and_validates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("standard.txt");
        std::fs::write(&src, "# Identify\nInventory assets\nInventory software\n# Protect\nManage identities\n").unwrap();

        let v = validator();
        let pipeline = IngestPipeline {
            parser: &LinesParser,
            segmenter: &HeadingSegmenter,
            converter: &SectionConverter,
            structure: &AlwaysValid,
            validator: &v,
        };
        let report = pipeline.run(&src).await.unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.blocks, 5);
        assert_eq!(report.sections, 2);
        assert_eq!(report.guidelines, 3);
        assert_eq!(report.timings.len(), 4);
        assert!(report.schema.valid, "schema: {:?}", report.schema.details);
        assert!(report.is_valid());
    }

    #[tokio::test]
    async fn empty_section_fails_schema_not_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("standard.txt");
        std::fs::write(&src, "# Lonely heading\n").unwrap();

        let v = validator();
        let pipeline = IngestPipeline {
            parser: &LinesParser,
            segmenter: &HeadingSegmenter,
            converter: &SectionConverter,
            structure: &AlwaysValid,
            validator: &v,
        };
        let report = pipeline.run(&src).await.unwrap();
        assert!(!report.schema.valid);
        assert!(!report.is_valid());
    }

    #[tokio::test]
    async fn stage_failure_stops_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("standard.txt");
        std::fs::write(&src, "orphan paragraph\n").unwrap();

        let v = validator();
        let pipeline = IngestPipeline {
            parser: &LinesParser,
            segmenter: &HeadingSegmenter,
            converter: &SectionConverter,
            structure: &AlwaysValid,
            validator: &v,
        };
        let err = pipeline.run(&src).await.unwrap_err();
        match err {
            PipelineError::Stage(e) => assert_eq!(e.stage, Stage::Segment),
            other => panic!("expected stage error, got: {other}"),
        }
    }
}
