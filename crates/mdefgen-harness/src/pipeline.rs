//! End-to-end generation pipeline.
//!
//! ```text
//! Init -> FoldersReady -> DiffComputed -> BaselineWritten -> BaselineExecuted
//!      -> SamplesExtracted -> RemainingWritten -> Done
//! ```
//!
//! Any fatal error moves the pipeline to `Aborted` and is returned to the
//! caller. Files written by earlier stages are left in place. A category
//! whose synthesis fails only marks that category as failed.

use crate::layout::OutputLayout;
use crate::revision::RevisionSource;
use crate::runner::SuiteRunner;
use crate::{HarnessError, Result};
use mdefgen_config::{MdefgenConfig, RevisionSelector, SuiteConfig};
use mdefgen_mdef::{Schema, SchemaDiff};
use mdefgen_synth::{
    ProcedureCall, QuerySynthesizer, ResultDocument, SampleMap, SynthError, SynthRng, SynthesisInput,
    TestCategory, TestSetDocument,
};
use std::fmt;
use tracing::{debug, info, info_span, warn};

/// Pipeline progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    FoldersReady,
    DiffComputed,
    BaselineWritten,
    BaselineExecuted,
    SamplesExtracted,
    RemainingWritten,
    Done,
    Aborted,
}

/// How far a run goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Stop once every test set is written.
    Generate,
    /// Additionally run every configured suite once.
    Results,
}

/// Outcome of one configured test set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    Written { queries: usize },
    /// The generator produced no statement; an empty test set was written.
    Empty,
    Failed(String),
    /// The test-set name matches no category.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub suite: String,
    pub test_set: String,
    pub outcome: CategoryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRun {
    pub suite: String,
    pub produced_results: bool,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub seed: u64,
    pub new_tables: Vec<String>,
    pub new_procedures: Vec<String>,
    pub categories: Vec<CategoryReport>,
    pub suite_runs: Vec<SuiteRun>,
}

impl PipelineReport {
    /// Test sets that did not produce any query.
    pub fn failures(&self) -> impl Iterator<Item = &CategoryReport> {
        self.categories
            .iter()
            .filter(|c| matches!(c.outcome, CategoryOutcome::Empty | CategoryOutcome::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none() && self.suite_runs.iter().all(|r| r.produced_results)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The compared schemas add no table; nothing was generated.
    NoDifference,
    Completed(PipelineReport),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Computes the schema difference selected by `selector`.
pub fn compute_diff<S: RevisionSource>(
    source: &S,
    config: &MdefgenConfig,
    selector: &RevisionSelector,
) -> Result<Option<SchemaDiff>> {
    let diff = match selector {
        RevisionSelector::Explicit { older, newer } => {
            let path = config.source.mdef_path()?;
            let older = Schema::load(source.fetch(&path, Some(*older))?)?;
            let newer = Schema::load(source.fetch(&path, Some(*newer))?)?;
            newer.difference(&older)
        }
        RevisionSelector::LatestVsPrevious => {
            let path = config.source.mdef_path()?;
            let head = source.latest_revision(&path)?;
            let latest = Schema::load(source.fetch(&path, None)?)?;
            if head <= 1 {
                info!(head, "no previous revision; every table is new");
                SchemaDiff::everything(&latest)
            } else {
                let previous = Schema::load(source.fetch(&path, Some(head - 1))?)?;
                latest.difference(&previous)
            }
        }
        RevisionSelector::ModifiedFile { path, first_revision } => {
            let modified = Schema::load(path)?;
            if *first_revision {
                SchemaDiff::everything(&modified)
            } else {
                let head = Schema::load(source.fetch(&config.source.mdef_path()?, None)?)?;
                modified.difference(&head)
            }
        }
    };
    Ok(diff)
}

/// Loads the baseline `SELECT *` results of `diff` and samples them.
///
/// Result `i` is expected at ID `starting_id + i`.
pub fn extract_baseline_samples(
    layout: &OutputLayout,
    suite: &str,
    starting_id: u32,
    diff: &SchemaDiff,
) -> Result<SampleMap> {
    let results = (starting_id..)
        .take(diff.tables.len())
        .map(|id| {
            let path = layout.baseline_result_file(suite, id);
            ResultDocument::load(&path).map_err(|e| match e {
                SynthError::NotFound(p) => HarnessError::NotFound(p.display().to_string()),
                other => HarnessError::Synth(other),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SampleMap::extract(&diff.tables, &results)?)
}

/// Drives one generation run.
pub struct Pipeline<S, R> {
    config: MdefgenConfig,
    layout: OutputLayout,
    source: S,
    runner: R,
    rng: SynthRng,
    state: PipelineState,
}

impl<S: RevisionSource, R: SuiteRunner> Pipeline<S, R> {
    /// Builds a pipeline. The seed comes from `config.synthesis.seed` or is
    /// drawn at random.
    pub fn new(config: MdefgenConfig, source: S, runner: R) -> Self {
        let rng = config.synthesis.seed.map_or_else(SynthRng::from_entropy, SynthRng::new);
        let layout = OutputLayout::new(config.runner.output_dir.clone());
        Self {
            config,
            layout,
            source,
            runner,
            rng,
            state: PipelineState::Init,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
    }

    /// Runs the pipeline. Errors leave it in [`PipelineState::Aborted`].
    pub fn run(&mut self, mode: RunMode) -> Result<PipelineOutcome> {
        info!(seed = self.seed(), ?mode, "starting pipeline");
        let outcome = self.run_stages(mode);
        if let Err(e) = &outcome {
            warn!(state = %self.state, error = %e, "pipeline aborted");
            self.state = PipelineState::Aborted;
        }
        outcome
    }

    fn run_stages(&mut self, mode: RunMode) -> Result<PipelineOutcome> {
        let selector = self.config.validate()?;
        let first_revision = self.config.revisions.is_first_revision();

        {
            let _span = info_span!("stage", name = "folders").entered();
            self.prepare_folders()?;
        }
        self.advance(PipelineState::FoldersReady);

        let diff = {
            let _span = info_span!("stage", name = "diff").entered();
            compute_diff(&self.source, &self.config, &selector)?
        };
        let Some(diff) = diff else {
            warn!("compared metadata versions are identical; no new test cases to generate");
            self.advance(PipelineState::Done);
            return Ok(PipelineOutcome::NoDifference);
        };
        info!(
            tables = diff.tables.len(),
            procedures = diff.procedures.len(),
            "computed metadata difference"
        );
        self.advance(PipelineState::DiffComputed);

        let baseline_suite = self.config.runner.baseline_suite.clone();
        let baseline_set = TestCategory::SelectAll.test_set_name();
        let baseline_start = self
            .config
            .suite(&baseline_suite)
            .and_then(|s| s.test_set(baseline_set))
            .map_or(1, |t| t.effective_starting_id(first_revision));

        let mut categories = Vec::new();
        {
            let _span = info_span!("stage", name = "baseline").entered();
            let document = TestSetDocument::new(baseline_set, baseline_start, mdefgen_synth::generators::select_all(&diff));
            self.layout.write_test_set(&baseline_suite, &document)?;
            categories.push(CategoryReport {
                suite: baseline_suite.clone(),
                test_set: baseline_set.to_string(),
                outcome: outcome_for(document.queries.len()),
            });
            self.advance(PipelineState::BaselineWritten);

            if !self.runner.run(&baseline_suite, Some(baseline_set))? {
                return Err(HarnessError::RunnerFailed {
                    suite: baseline_suite,
                    reason: "baseline run produced no result sets".to_string(),
                });
            }
            self.advance(PipelineState::BaselineExecuted);
        }

        let samples = {
            let _span = info_span!("stage", name = "samples").entered();
            extract_baseline_samples(&self.layout, &baseline_suite, baseline_start, &diff)?
        };
        if samples.is_empty() {
            return Err(SynthError::MissingSamples.into());
        }
        self.advance(PipelineState::SamplesExtracted);

        {
            let _span = info_span!("stage", name = "synthesis").entered();
            let suites = self.config.suites.clone();
            let mut synth = QuerySynthesizer::new(&mut self.rng);
            for suite in &suites {
                for test_set in &suite.test_sets {
                    if suite.name == baseline_suite && test_set.name == baseline_set {
                        continue;
                    }
                    let outcome = write_category(
                        &mut synth,
                        &self.layout,
                        suite,
                        &test_set.name,
                        test_set.effective_starting_id(first_revision),
                        &diff,
                        &samples,
                    )?;
                    categories.push(CategoryReport {
                        suite: suite.name.clone(),
                        test_set: test_set.name.clone(),
                        outcome,
                    });
                }
            }
        }
        self.advance(PipelineState::RemainingWritten);

        let mut suite_runs = Vec::new();
        if mode == RunMode::Results {
            let _span = info_span!("stage", name = "results").entered();
            for suite in &self.config.suites {
                let produced_results = self.runner.run(&suite.name, None)?;
                if !produced_results {
                    warn!(suite = %suite.name, "suite produced no result sets");
                }
                suite_runs.push(SuiteRun {
                    suite: suite.name.clone(),
                    produced_results,
                });
            }
        }
        self.advance(PipelineState::Done);

        Ok(PipelineOutcome::Completed(PipelineReport {
            seed: self.seed(),
            new_tables: diff.table_names().map(str::to_string).collect(),
            new_procedures: diff.procedures.iter().map(|p| p.name.clone()).collect(),
            categories,
            suite_runs,
        }))
    }

    fn prepare_folders(&self) -> Result<()> {
        self.layout
            .prepare_output(self.config.runner.tool_dir.as_deref(), &self.config.runner.assets)?;
        self.layout.write_test_env(&self.config.connection_string)?;
        for suite in &self.config.suites {
            self.layout.reset_suite(&suite.name, &suite.test_set_names())?;
        }
        Ok(())
    }
}

fn outcome_for(queries: usize) -> CategoryOutcome {
    if queries == 0 {
        CategoryOutcome::Empty
    } else {
        CategoryOutcome::Written { queries }
    }
}

/// Synthesizes and writes one test set. Synthesis errors become a failed
/// outcome; write errors are fatal.
fn write_category<G: mdefgen_synth::Rng>(
    synth: &mut QuerySynthesizer<G>,
    layout: &OutputLayout,
    suite: &SuiteConfig,
    test_set: &str,
    starting_id: u32,
    diff: &SchemaDiff,
    samples: &SampleMap,
) -> Result<CategoryOutcome> {
    let Some(category) = TestCategory::from_test_set_name(test_set) else {
        warn!(suite = %suite.name, test_set, "unknown test set; skipping");
        return Ok(CategoryOutcome::Skipped);
    };

    let procedures: Vec<ProcedureCall> = suite
        .procedures
        .iter()
        .map(|p| ProcedureCall::new(p.name.clone(), p.args.clone()))
        .collect();
    let input = SynthesisInput {
        diff,
        samples: Some(samples),
        suite: &suite.name,
        procedures: &procedures,
    };

    match synth.generate(category, &input) {
        Ok(queries) => {
            let document = TestSetDocument::new(test_set, starting_id, queries);
            layout.write_test_set(&suite.name, &document)?;
            let outcome = outcome_for(document.queries.len());
            if outcome == CategoryOutcome::Empty {
                warn!(suite = %suite.name, %category, "no queries generated");
            }
            Ok(outcome)
        }
        Err(e) => {
            warn!(suite = %suite.name, %category, error = %e, "test set generation failed");
            Ok(CategoryOutcome::Failed(e.to_string()))
        }
    }
}
