use std::path::{Path, PathBuf};

use chrono::Local;

use crate::accessions::{load_accessions, plan_run};
use crate::config::{Config, RowPolicy};
use crate::parse::parse_page;
use crate::progress::{Progress, TerminalProgress};
use crate::request::{FetchOutcome, NcbiClient, PageSource};
use crate::store::{ensure_output_dir, write_failure_report, write_table};
use crate::{checkpoint, info_time, warn_time, Result};

/// Everything the batch loop needs, independent of how it was configured.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub accessions: PathBuf,
    pub output: PathBuf,
    /// Accession to restart from, inclusive.
    pub first_acc: Option<String>,
    /// Fall back to the checkpoint when `first_acc` is `None`.
    pub resume: bool,
    pub row_policy: RowPolicy,
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            accessions: config.accessions.clone(),
            output: config.output.clone(),
            first_acc: config.first_accession().map(String::from),
            resume: config.resume,
            row_policy: config.irregular_rows,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Length of the whole accession list.
    pub total: usize,
    /// Index the run started from.
    pub start_index: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    /// Set when at least one accession failed.
    pub failure_report: Option<PathBuf>,
}

/// Entry point for the binary: builds the HTTP client and the stdout bar from `config` and runs the batch.
pub async fn process_accessions(config: &Config) -> Result<RunSummary> {
    let client = NcbiClient::new(config.base_url.clone(), config.timeout())?;
    let progress = TerminalProgress::new(1, 100)?;
    run_batch(&RunOptions::from(config), &client, &progress).await
}

/// Fetches every pending accession one after the other and writes its table.
///
/// Setup problems (unreadable list, unusable output dir, unknown resume
/// accession) abort before the first request. Anything going wrong with a
/// single accession afterwards, fetch or write, only lands it in `unsuccessful.txt`.
pub async fn run_batch<S: PageSource, P: Progress>(
    opts: &RunOptions,
    source: &S,
    progress: &P,
) -> Result<RunSummary> {
    let start_time = Local::now();

    let accessions = load_accessions(&opts.accessions).await?;
    ensure_output_dir(&opts.output).await?;

    let first = match &opts.first_acc {
        Some(acc) => Some(acc.clone()),
        None if opts.resume => {
            let saved = checkpoint::load(&opts.output).await?;
            if saved.is_none() {
                info_time!("No checkpoint in {}, starting from the top", opts.output.display());
            }
            saved
        }
        None => None,
    };
    let plan = plan_run(accessions, first.as_deref(), &opts.accessions)?;

    info_time!(
        "Started downloading {} of {} accessions from {} into {}",
        plan.pending.len(),
        plan.total,
        opts.accessions.display(),
        opts.output.display()
    );
    if plan.start_index > 0 {
        info_time!("Resuming at position {}", plan.start_index + 1);
    }

    let mut summary = RunSummary {
        total: plan.total,
        start_index: plan.start_index,
        ..RunSummary::default()
    };

    progress.update(plan.start_index, plan.total, "Initializing");
    for (i, accession) in (plan.start_index + 1..).zip(plan.pending) {
        let outcome = match source.fetch_page(&accession).await {
            FetchOutcome::Page(html) => save_page(opts, &accession, html)
                .await
                .map_err(|e| format!("couldn't save: {e}")),
            FetchOutcome::Failed(reason) => Err(format!("couldn't fetch: {reason}")),
        };

        match outcome {
            Ok(()) => {
                progress.update(i, plan.total, &format!("Completed {accession}"));
                summary.succeeded.push(accession);
            }
            Err(reason) => {
                warn_time!("{} {}", accession, reason);
                progress.update(i, plan.total, &format!("Failed {accession}"));
                summary.failed.push(accession);
            }
        }
    }

    if !summary.failed.is_empty() {
        let path = write_failure_report(&opts.output, &summary.failed).await?;
        println!(
            "Some samples were not retrieved, check {} for the accessions",
            path.display()
        );
        summary.failure_report = Some(path);
    }

    info_time!(
        start_time,
        "Finished: {} written, {} failed",
        summary.succeeded.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// Parses one page and writes its table, then moves the checkpoint.
async fn save_page(opts: &RunOptions, accession: &str, html: String) -> Result<()> {
    let records = parse_page(html, opts.row_policy).await?;
    write_table(&opts.output, accession, &records).await?;
    update_checkpoint(&opts.output, accession).await;
    Ok(())
}

/// Logs instead of failing, the table is already written.
async fn update_checkpoint(output: &Path, accession: &str) {
    if let Err(e) = checkpoint::save(output, accession).await {
        warn_time!("Couldn't update the checkpoint to {}: {}", accession, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::{cell::RefCell, collections::HashMap, path::Path};
    use tempfile::TempDir;

    const AMP_PAGE: &str = "<html><body><table><caption>Antibiogram</caption>\
        <tr><th>Antibiotic</th><th>Result</th></tr>\
        <tr><td>Ampicillin</td><td>Resistant</td></tr></table></body></html>";
    const NO_TABLE_PAGE: &str = "<html><body><p>No antibiogram here</p></body></html>";

    /// Serves pages from memory and remembers what was asked for.
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, FetchOutcome>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, accession: &str, outcome: FetchOutcome) -> Self {
            self.pages.insert(accession.to_string(), outcome);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.borrow().clone()
        }
    }

    impl PageSource for FakeSource {
        async fn fetch_page(&self, accession: &str) -> FetchOutcome {
            self.requested.borrow_mut().push(accession.to_string());
            self.pages
                .get(accession)
                .cloned()
                .unwrap_or_else(|| FetchOutcome::Failed("404 Not Found".into()))
        }
    }

    /// Remembers every progress frame as `(iteration, total, label)`.
    #[derive(Default)]
    struct Frames(RefCell<Vec<(usize, usize, String)>>);

    impl Progress for Frames {
        fn update(&self, iteration: usize, total: usize, label: &str) {
            self.0.borrow_mut().push((iteration, total, label.to_string()));
        }
    }

    impl Frames {
        fn seen(&self) -> Vec<(usize, usize, String)> {
            self.0.borrow().clone()
        }
    }

    fn frame(iteration: usize, total: usize, label: &str) -> (usize, usize, String) {
        (iteration, total, label.to_string())
    }

    fn setup(accessions: &[&str]) -> (TempDir, RunOptions) {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("ncbi_accessions.txt");
        std::fs::write(&input, accessions.join("\n")).unwrap();
        let opts = RunOptions {
            accessions: input,
            output: tmp.path().join("files"),
            first_acc: None,
            resume: false,
            row_policy: RowPolicy::Truncate,
        };
        (tmp, opts)
    }

    fn page(html: &str) -> FetchOutcome {
        FetchOutcome::Page(html.to_string())
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn failed_fetch_is_recorded_and_run_continues() {
        let (_tmp, opts) = setup(&["A1", "A2", "A3"]);
        let source = FakeSource::default()
            .with("A1", page(AMP_PAGE))
            .with("A2", FetchOutcome::Failed("503 Service Unavailable".into()))
            .with("A3", page(NO_TABLE_PAGE));

        let frames = Frames::default();

        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(summary.succeeded, ["A1", "A3"]);
        assert_eq!(summary.failed, ["A2"]);
        assert_eq!(source.requested(), ["A1", "A2", "A3"]);

        assert_eq!(
            read(&opts.output.join("A1_table.json")),
            r#"[{"antibiotic":"Ampicillin","result":"Resistant"}]"#
        );
        assert!(!opts.output.join("A2_table.json").exists());
        assert_eq!(read(&opts.output.join("A3_table.json")), "[]");

        let report = summary.failure_report.unwrap();
        assert_eq!(report, opts.output.join("unsuccessful.txt"));
        assert_eq!(read(&report), "A2\n");
    }

    #[tokio::test]
    async fn clean_run_writes_no_failure_report() {
        let (_tmp, opts) = setup(&["A1", "A2"]);
        let source = FakeSource::default()
            .with("A1", page(AMP_PAGE))
            .with("A2", page(AMP_PAGE));

        let frames = Frames::default();

        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert!(summary.failed.is_empty());
        assert_eq!(summary.failure_report, None);
        assert!(!opts.output.join("unsuccessful.txt").exists());
        assert_eq!(checkpoint::load(&opts.output).await.unwrap().as_deref(), Some("A2"));
    }

    #[tokio::test]
    async fn resume_reprocesses_from_accession_and_keeps_total() {
        let (_tmp, mut opts) = setup(&["A1", "A2", "A3", "A4"]);
        opts.first_acc = Some("A3".into());
        let source = FakeSource::default()
            .with("A3", page(AMP_PAGE))
            .with("A4", page(AMP_PAGE));

        let frames = Frames::default();

        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(source.requested(), ["A3", "A4"]);
        assert_eq!(summary.start_index, 2);
        assert_eq!(summary.total, 4);
        assert!(!opts.output.join("A1_table.json").exists());
        assert!(opts.output.join("A3_table.json").exists());
    }

    #[tokio::test]
    async fn progress_after_resume_counts_against_the_full_list() {
        let (_tmp, mut opts) = setup(&["A1", "A2", "A3", "A4", "A5"]);
        opts.first_acc = Some("A3".into());
        let source = FakeSource::default()
            .with("A3", page(AMP_PAGE))
            .with("A4", FetchOutcome::Failed("500 Internal Server Error".into()))
            .with("A5", page(NO_TABLE_PAGE));

        let frames = Frames::default();
        run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(
            frames.seen(),
            [
                frame(2, 5, "Initializing"),
                frame(3, 5, "Completed A3"),
                frame(4, 5, "Failed A4"),
                frame(5, 5, "Completed A5"),
            ]
        );
    }

    #[tokio::test]
    async fn path_like_accession_is_recorded_and_run_continues() {
        let (tmp, opts) = setup(&["A1", "A2", "sub/A3", "../A4", "A5"]);
        let source = FakeSource::default()
            .with("A1", page(AMP_PAGE))
            .with("A2", FetchOutcome::Failed("503 Service Unavailable".into()))
            .with("sub/A3", page(AMP_PAGE))
            .with("../A4", page(AMP_PAGE))
            .with("A5", page(AMP_PAGE));

        let frames = Frames::default();
        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(source.requested(), ["A1", "A2", "sub/A3", "../A4", "A5"]);
        assert_eq!(summary.succeeded, ["A1", "A5"]);
        assert_eq!(summary.failed, ["A2", "sub/A3", "../A4"]);
        assert!(opts.output.join("A5_table.json").exists());
        assert!(!tmp.path().join("A4_table.json").exists());
        assert_eq!(read(&opts.output.join("unsuccessful.txt")), "A2\nsub/A3\n../A4\n");
    }

    #[tokio::test]
    async fn write_error_is_recorded_and_earlier_failures_survive() {
        let (_tmp, opts) = setup(&["A1", "A2", "A3", "A4"]);
        // A directory squatting on A3's table file makes the write fail.
        std::fs::create_dir_all(opts.output.join("A3_table.json")).unwrap();
        let source = FakeSource::default()
            .with("A1", page(AMP_PAGE))
            .with("A2", FetchOutcome::Failed("503 Service Unavailable".into()))
            .with("A3", page(AMP_PAGE))
            .with("A4", page(AMP_PAGE));

        let frames = Frames::default();
        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(summary.succeeded, ["A1", "A4"]);
        assert_eq!(summary.failed, ["A2", "A3"]);
        assert_eq!(read(&opts.output.join("unsuccessful.txt")), "A2\nA3\n");
        assert_eq!(checkpoint::load(&opts.output).await.unwrap().as_deref(), Some("A4"));
        assert_eq!(frames.seen().last(), Some(&frame(4, 4, "Completed A4")));
    }

    #[tokio::test]
    async fn unknown_resume_accession_fails_before_any_fetch() {
        let (_tmp, mut opts) = setup(&["A1", "A2"]);
        opts.first_acc = Some("B9".into());
        let source = FakeSource::default().with("A1", page(AMP_PAGE));

        let frames = Frames::default();

        let err = run_batch(&opts, &source, &frames).await.unwrap_err();

        assert!(matches!(err, Error::ResumeAccessionNotFound { ref accession, .. } if accession == "B9"));
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn resume_flag_picks_up_the_checkpoint() {
        let (_tmp, mut opts) = setup(&["A1", "A2", "A3"]);
        std::fs::create_dir_all(&opts.output).unwrap();
        checkpoint::save(&opts.output, "A2").await.unwrap();
        opts.resume = true;
        let source = FakeSource::default()
            .with("A2", page(AMP_PAGE))
            .with("A3", page(AMP_PAGE));

        let frames = Frames::default();

        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(source.requested(), ["A2", "A3"]);
        assert_eq!(summary.start_index, 1);
    }

    #[tokio::test]
    async fn explicit_first_acc_beats_the_checkpoint() {
        let (_tmp, mut opts) = setup(&["A1", "A2", "A3"]);
        std::fs::create_dir_all(&opts.output).unwrap();
        checkpoint::save(&opts.output, "A3").await.unwrap();
        opts.resume = true;
        opts.first_acc = Some("A1".into());
        let source = FakeSource::default();

        let frames = Frames::default();

        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(source.requested(), ["A1", "A2", "A3"]);
        assert_eq!(summary.failed.len(), 3);
    }

    #[tokio::test]
    async fn resume_without_checkpoint_starts_from_the_top() {
        let (_tmp, mut opts) = setup(&["A1", "A2"]);
        opts.resume = true;
        let source = FakeSource::default().with("A1", page(AMP_PAGE)).with("A2", page(AMP_PAGE));

        let frames = Frames::default();

        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(summary.start_index, 0);
        assert_eq!(summary.succeeded, ["A1", "A2"]);
    }

    #[tokio::test]
    async fn missing_accession_list_is_fatal() {
        let (tmp, mut opts) = setup(&[]);
        opts.accessions = tmp.path().join("missing.txt");
        let source = FakeSource::default();

        let frames = Frames::default();

        let err = run_batch(&opts, &source, &frames).await.unwrap_err();

        assert!(matches!(err, Error::InputFile { .. }));
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn empty_list_is_a_no_op() {
        let (_tmp, opts) = setup(&[]);
        let source = FakeSource::default();

        let frames = Frames::default();

        let summary = run_batch(&opts, &source, &frames).await.unwrap();

        assert_eq!(summary.total, 0);
        assert!(opts.output.is_dir());
        assert!(source.requested().is_empty());
    }
}
