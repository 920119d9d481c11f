use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver};
use log::{error, info, warn};

use crate::analyte::{AnalyteError, AnalyteSpec, ReferenceTable};
use crate::blocks::BlockSet;
use crate::chromatography::{align_run, AlignmentFeature, RunAlignment};
use crate::mzxml::{
    has_prefix, list_mzxml_files, write_aligned, write_unaligned_marker, MzXmlError, MzXmlRun,
    ALIGNED_PREFIX, UNALIGNED_PREFIX,
};
use crate::quantitation::{build_quantitation_table, QuantitationRow};
use crate::report::{
    batch_stamp, BatchReport, CsvReportSink, Figure, FigureDocument, ReportError, ReportSink,
};
use crate::spectrum::{create_sum_spectrum, CalibrantTarget, CalibrationStatus, MassSpectrum};

use super::{
    percent, resolve_sum_spectrum_settings, BatchConfig, BatchError, BatchEvent, BatchState,
    CancellationToken, EventSink, ResultSpill, Severity, SumSpectrumSetting,
};

/// Inputs of one batch run.
///
/// Reference generation and quantitation run when `analytes` is set,
/// alignment when `alignment_features` is set.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub config: BatchConfig,
    pub blocks: BlockSet,
    pub analytes: Option<Vec<AnalyteSpec>>,
    pub alignment_features: Option<Vec<AlignmentFeature>>,
    /// Folder holding the mzXML files; also receives every output
    pub directory: Option<PathBuf>,
    /// Calibration settings per retention time window; missing windows are derived
    pub sum_spectra: Vec<SumSpectrumSetting>,
    /// Prefix of every artifact
    pub stamp: String,
}

impl BatchJob {
    pub fn new(config: BatchConfig, blocks: BlockSet) -> Self {
        Self {
            config,
            blocks,
            analytes: None,
            alignment_features: None,
            directory: None,
            sum_spectra: Vec::new(),
            stamp: batch_stamp(Local::now()),
        }
    }

    pub fn with_analytes(mut self, analytes: Vec<AnalyteSpec>) -> Self {
        self.analytes = Some(analytes);
        self
    }

    pub fn with_alignment_features(mut self, features: Vec<AlignmentFeature>) -> Self {
        self.alignment_features = Some(features);
        self
    }

    pub fn with_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }

    pub fn with_sum_spectra(mut self, settings: Vec<SumSpectrumSetting>) -> Self {
        self.sum_spectra = settings;
        self
    }

    pub fn with_stamp(mut self, stamp: &str) -> Self {
        self.stamp = stamp.to_string();
        self
    }

    /// Where artifacts go: the batch folder, else the working directory
    pub fn output_dir(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// What a finished run left behind
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// `Done`, `Cancelled` or `Errored`
    pub state: BatchState,
    pub reference: Option<PathBuf>,
    /// Files written by alignment, `aligned_` and `unaligned_` alike
    pub aligned: Vec<PathBuf>,
    pub figures: Vec<PathBuf>,
    pub exported: Vec<PathBuf>,
}

impl BatchOutcome {
    fn new() -> Self {
        Self {
            state: BatchState::Idle,
            reference: None,
            aligned: Vec::new(),
            figures: Vec::new(),
            exported: Vec::new(),
        }
    }
}

enum Flow<T> {
    Continue(T),
    Cancelled,
}

/// Runs a [`BatchJob`] step by step, reporting through an [`EventSink`]
pub struct BatchRunner {
    job: BatchJob,
    sink: Box<dyn ReportSink + Send>,
    token: CancellationToken,
}

/// A batch running on its own thread
pub struct BatchHandle {
    pub events: Receiver<BatchEvent>,
    token: CancellationToken,
    handle: JoinHandle<BatchOutcome>,
}

impl BatchHandle {
    /// Ask the batch to stop after the current file
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the batch to end
    pub fn join(self) -> thread::Result<BatchOutcome> {
        self.handle.join()
    }
}

fn mzxml_error(step: BatchState) -> impl Fn(MzXmlError) -> BatchError {
    move |source| BatchError::MzXml { step, source }
}

fn report_error(step: BatchState) -> impl Fn(ReportError) -> BatchError {
    move |source| BatchError::Report { step, source }
}

fn io_error(step: BatchState) -> impl Fn(std::io::Error) -> BatchError {
    move |source| BatchError::Io { step, source }
}

fn csv_error(step: BatchState) -> impl Fn(csv::Error) -> BatchError {
    move |source| BatchError::Report {
        step,
        source: ReportError::CsvError(source),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn empty_directory() -> BatchError {
    BatchError::configuration(
        "Empty directory",
        "The specified folder contains no mzXML files.",
        "",
    )
}

/// Original runs to align; outputs of earlier alignments are skipped
fn alignment_inputs(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    Ok(list_mzxml_files(dir)
        .map_err(io_error(BatchState::Aligning))?
        .into_iter()
        .filter(|p| !has_prefix(p, ALIGNED_PREFIX) && !has_prefix(p, UNALIGNED_PREFIX))
        .collect())
}

/// Runs to quantify; alignment failure markers hold no scans
fn quantitation_inputs(dir: &Path, aligned_only: bool) -> Result<Vec<PathBuf>, BatchError> {
    let files: Vec<PathBuf> = list_mzxml_files(dir)
        .map_err(io_error(BatchState::Quantitating))?
        .into_iter()
        .filter(|p| !has_prefix(p, UNALIGNED_PREFIX))
        .collect();
    if files.is_empty() {
        return Err(empty_directory());
    }
    if !aligned_only {
        return Ok(files);
    }
    let aligned: Vec<PathBuf> = files
        .into_iter()
        .filter(|p| has_prefix(p, ALIGNED_PREFIX))
        .collect();
    if aligned.is_empty() {
        return Err(BatchError::configuration(
            "No aligned files",
            "No aligned files were detected for quantitation.",
            "",
        ));
    }
    Ok(aligned)
}

impl BatchRunner {
    /// Runner writing CSV/JSON artifacts into the job's output folder
    pub fn new(job: BatchJob) -> Self {
        let sink = CsvReportSink::new(job.output_dir(), &job.stamp);
        Self {
            job,
            sink: Box::new(sink),
            token: CancellationToken::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ReportSink + Send>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run the batch on a background thread named `mzquant-batch`
    pub fn spawn(mut self) -> std::io::Result<BatchHandle> {
        let (sender, receiver) = unbounded::<BatchEvent>();
        let token = self.token.clone();
        let handle = thread::Builder::new()
            .name("mzquant-batch".to_string())
            .spawn(move || self.run(sender))?;
        Ok(BatchHandle {
            events: receiver,
            token,
            handle,
        })
    }

    /// Run the batch on the calling thread
    pub fn run<E: EventSink>(&mut self, mut events: E) -> BatchOutcome {
        info!("Batch {} started", self.job.stamp);
        let mut outcome = BatchOutcome::new();

        let state = match self.execute(&mut events, &mut outcome) {
            Ok(Flow::Continue(())) => {
                info!("Batch {} finished", self.job.stamp);
                events.emit(BatchEvent::Finished { success: true });
                BatchState::Done
            }
            Ok(Flow::Cancelled) => {
                info!("Batch {} aborted", self.job.stamp);
                events.emit(BatchEvent::Aborted);
                BatchState::Cancelled
            }
            Err(e) => {
                match e.severity() {
                    Severity::Warning => warn!("{}", e),
                    Severity::Critical => error!("{}", e),
                }
                events.emit(BatchEvent::Error {
                    notification: e.notification(),
                });
                events.emit(BatchEvent::Finished { success: false });
                BatchState::Errored
            }
        };

        events.emit(BatchEvent::StateChanged { state });
        outcome.state = state;
        outcome
    }

    fn enter<E: EventSink>(&self, events: &mut E, state: BatchState) {
        info!("Batch step: {}", state);
        events.emit(BatchEvent::StateChanged { state });
    }

    fn cancelled(&self, after: &str) -> bool {
        let cancelled = self.token.is_cancelled();
        if cancelled {
            info!("Batch stop requested {}", after);
        }
        cancelled
    }

    fn execute<E: EventSink>(
        &mut self,
        events: &mut E,
        outcome: &mut BatchOutcome,
    ) -> Result<Flow<()>, BatchError> {
        if let Some(dir) = &self.job.directory {
            if !dir.is_dir() {
                return Err(BatchError::configuration(
                    "Non-existing directory",
                    "The specified batch directory could not be found.",
                    &dir.display().to_string(),
                ));
            }
        }

        let reference = match self.job.analytes.clone() {
            Some(specs) => Some(self.generate_reference(&specs, events, outcome)?),
            None => {
                info!("No analyte list provided, skipping reference generation");
                None
            }
        };
        if self.cancelled("after reference generation") {
            return Ok(Flow::Cancelled);
        }

        let dir = match self.job.directory.clone() {
            Some(dir) => dir,
            None => {
                let detail = outcome
                    .reference
                    .as_ref()
                    .map(|p| format!("Analytes reference file was created at {}", p.display()))
                    .unwrap_or_default();
                return Err(BatchError::configuration(
                    "Missing batch directory",
                    "Select a folder containing mzXML files.",
                    &detail,
                ));
            }
        };

        let aligned = match self.job.alignment_features.clone() {
            Some(features) => {
                let files = alignment_inputs(&dir)?;
                if files.is_empty() {
                    return Err(empty_directory());
                }
                self.enter(events, BatchState::Aligning);
                info!("Found {} mzXML files for alignment", files.len());
                match self.align(&files, &features, events, outcome)? {
                    Flow::Continue(()) => Some(features),
                    Flow::Cancelled => return Ok(Flow::Cancelled),
                }
            }
            None => None,
        };
        if self.cancelled("after alignment") {
            return Ok(Flow::Cancelled);
        }

        let quantified = match &reference {
            Some(reference) => {
                self.enter(events, BatchState::Quantitating);
                let files = quantitation_inputs(&dir, self.job.config.quantitate_aligned_only)?;
                info!("Starting quantitation of {} mzXML files", files.len());
                match self.quantitate(&files, reference, &dir, events, outcome)? {
                    Flow::Continue(result) => Some(result),
                    Flow::Cancelled => return Ok(Flow::Cancelled),
                }
            }
            None => None,
        };

        self.enter(events, BatchState::Exporting);
        let (results, sum_spectrum_settings) = match quantified {
            Some((rows, settings)) => (Some(rows), Some(settings)),
            None => (None, None),
        };
        let report = BatchReport {
            results,
            settings: self.job.config.settings_table(&self.job.stamp),
            alignment_features: aligned,
            sum_spectrum_settings,
        };
        outcome.exported = self
            .sink
            .export(&report)
            .map_err(report_error(BatchState::Exporting))?;

        Ok(Flow::Continue(()))
    }

    fn generate_reference<E: EventSink>(
        &mut self,
        specs: &[AnalyteSpec],
        events: &mut E,
        outcome: &mut BatchOutcome,
    ) -> Result<ReferenceTable, BatchError> {
        const STEP: BatchState = BatchState::GeneratingReference;
        self.enter(events, STEP);

        let table = ReferenceTable::build(specs, &self.job.blocks, |done, total| {
            events.emit(BatchEvent::ReferenceProgress {
                percent: percent(done, total),
            })
        })
        .map_err(|source| match source {
            AnalyteError::MissingChargeCarrier(name) => BatchError::configuration(
                "Unknown charge carrier block",
                &format!("The block file '{}' could not be found.", name),
                "",
            ),
            source => BatchError::DataFormat { step: STEP, source },
        })?;

        let path = self
            .sink
            .write_reference(&table)
            .map_err(report_error(STEP))?;
        outcome.reference = Some(path);
        Ok(table)
    }

    fn align<E: EventSink>(
        &mut self,
        files: &[PathBuf],
        features: &[AlignmentFeature],
        events: &mut E,
        outcome: &mut BatchOutcome,
    ) -> Result<Flow<()>, BatchError> {
        const STEP: BatchState = BatchState::Aligning;
        let mut figures = FigureDocument::new("Retention time alignment");

        for (i, path) in files.iter().enumerate() {
            if self.cancelled("during alignment") {
                return Ok(Flow::Cancelled);
            }

            let run = MzXmlRun::from_path(path).map_err(mzxml_error(STEP))?;
            // Empty runs still get a marker so every input has an output
            let alignment = if run.is_empty() {
                warn!("Alignment skipped for empty file {}", file_name(path));
                None
            } else {
                Some(align_run(&run, features, self.job.config.alignment_min_peaks))
            };
            let written = match alignment {
                Some(RunAlignment { fit: Some(fit), .. }) => {
                    info!("Alignment fit successful for {}: {}", file_name(path), fit.label());
                    if let Some(figure) = alignment.as_ref().and_then(RunAlignment::figure) {
                        figures.push(Figure::Alignment(figure));
                    }
                    write_aligned(path, &fit.apply_all(&run.retention_times()))
                }
                Some(_) => {
                    info!("Alignment fit failed for {}", file_name(path));
                    write_unaligned_marker(path)
                }
                None => write_unaligned_marker(path),
            }
            .map_err(mzxml_error(STEP))?;
            outcome.aligned.push(written);

            events.emit(BatchEvent::AlignmentProgress {
                percent: percent(i + 1, files.len()),
            });
        }

        let path = self
            .sink
            .write_figures("alignment", &figures)
            .map_err(report_error(STEP))?;
        outcome.figures.push(path);
        Ok(Flow::Continue(()))
    }

    /// Calibrated (or raw) sum spectrum of `run` at one retention time window
    fn mass_spectrum(
        &self,
        run: &MzXmlRun,
        setting: &SumSpectrumSetting,
        reference: &ReferenceTable,
    ) -> MassSpectrum {
        let config = &self.job.config;
        let sum = create_sum_spectrum(
            run,
            setting.time,
            setting.time_window,
            config.sum_spectrum_resolution,
        );
        let targets: Vec<CalibrantTarget> = if setting.calibrate {
            reference
                .in_window(setting.time, setting.time_window)
                .filter(|p| p.calibrant)
                .map(|p| CalibrantTarget {
                    mz: p.mz,
                    charge: p.charge,
                    mz_window: p.mz_window,
                })
                .collect()
        } else {
            Vec::new()
        };

        let spectrum = MassSpectrum::from_sum_spectrum(
            sum,
            &targets,
            &config.calibration_settings(setting.sn_cutoff),
        );
        let verb = match spectrum.status {
            CalibrationStatus::Calibrated => "Calibrated",
            CalibrationStatus::Failed => "Failed calibrating",
            CalibrationStatus::Skipped => "Skipped calibration of",
        };
        info!(
            "{} sum spectrum ({} ± {} seconds) for {}",
            verb, setting.time, setting.time_window, run.name
        );
        spectrum
    }

    fn quantitate<E: EventSink>(
        &mut self,
        files: &[PathBuf],
        reference: &ReferenceTable,
        dir: &Path,
        events: &mut E,
        outcome: &mut BatchOutcome,
    ) -> Result<Flow<(Vec<QuantitationRow>, Vec<SumSpectrumSetting>)>, BatchError> {
        const STEP: BatchState = BatchState::Quantitating;
        let settings = resolve_sum_spectrum_settings(&self.job.sum_spectra, reference);
        let mut spill = ResultSpill::new_in(dir).map_err(io_error(STEP))?;
        let mut figures = FigureDocument::new("Mass calibration");

        for (i, path) in files.iter().enumerate() {
            if self.cancelled("during quantitation") {
                return Ok(Flow::Cancelled);
            }

            let run = MzXmlRun::from_path(path).map_err(mzxml_error(STEP))?;
            let spectra: Vec<MassSpectrum> = settings
                .iter()
                .map(|setting| self.mass_spectrum(&run, setting, reference))
                .collect();
            figures
                .pages
                .extend(spectra.iter().filter_map(|s| s.calibration_figure()).map(Figure::Calibration));

            let rows = build_quantitation_table(
                &run.name,
                &spectra,
                reference,
                self.job.config.background_mass_window,
            )
            .map_err(|source| BatchError::DataFormat { step: STEP, source })?;
            spill.append(&rows).map_err(csv_error(STEP))?;

            events.emit(BatchEvent::QuantitationProgress {
                percent: percent(i + 1, files.len()),
            });
        }

        let path = self
            .sink
            .write_figures("calibration", &figures)
            .map_err(report_error(STEP))?;
        outcome.figures.push(path);

        let rows = spill.finish().map_err(csv_error(STEP))?;
        Ok(Flow::Continue((rows, settings)))
    }
}
