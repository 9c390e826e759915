//! Shared job plumbing: common options, input/output setup, the event loop.

use std::ops::Range;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use gg_core::RunConfig;
use gg_hist::{HistConfig, HistManager, Histogram};
use gg_tree::{EventSource, Tree, TreeFile};
use rayon::prelude::*;

/// Options shared by every event-loop analyzer.
#[derive(Debug, Clone, Args)]
pub struct JobArgs {
    /// Input ntuple (JSON tree file)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output histogram file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Event tree path inside the input file
    #[arg(short, long, default_value = "ggNtuplizer/EventTree")]
    pub tree: String,

    /// Histogram configuration (name -> [n, lo, hi] or [nx, xlo, xhi, ny, ylo, yhi])
    #[arg(short = 'j', long = "hists", default_value = "test.json")]
    pub hists: PathBuf,

    /// Report progress every 10% of the event loop
    #[arg(short, long)]
    pub verbose: bool,

    /// Input is collision data: unit weights, no generator branches
    #[arg(long)]
    pub data: bool,

    /// Data-taking year used for the luminosity lookup
    #[arg(long, default_value = "2017")]
    pub year: String,

    /// Run configuration JSON (luminosities, cross sections, aliases). Defaults to the built-in table.
    #[arg(long)]
    pub run_config: Option<PathBuf>,

    /// Worker threads. Events are split into contiguous chunks, one histogram shard per chunk.
    #[arg(long, default_value = "1")]
    pub threads: usize,
}

/// An event-loop analyzer.
///
/// `bind` attaches factories to the tree (once per worker); `process` runs the
/// selection for one event and fills histograms.
pub trait Analysis: Sync {
    /// Per-worker state, typically the bound factories.
    type Worker<'t>;

    /// Short name for log lines.
    fn name(&self) -> &'static str;

    /// Bind every branch the analyzer reads.
    fn bind<'t>(&self, tree: &'t Tree, is_data: bool) -> gg_core::Result<Self::Worker<'t>>;

    /// Process `event` with base weight `weight`.
    fn process(
        &self,
        worker: &mut Self::Worker<'_>,
        event: usize,
        weight: f64,
        hists: &mut HistManager,
    ) -> gg_core::Result<()>;
}

/// Open inputs, run `analysis` over every event and write the histograms.
pub fn run<A: Analysis>(args: &JobArgs, analysis: &A) -> Result<()> {
    let config = HistConfig::from_path(&args.hists)?;
    let file = TreeFile::open(&args.input)?;
    let tree = file.get_tree(&args.tree)?;
    let run_config = match &args.run_config {
        Some(path) => RunConfig::from_path(path)?,
        None => RunConfig::builtin(),
    };
    let weight = event_weight(args, &file, &run_config);

    // Fail on missing branches before the output is created.
    let worker = analysis.bind(tree, args.data)?;
    let mut hists = HistManager::from_config(&args.output, &config)?;

    let n = tree.entries();
    let threads = args.threads.max(1);
    tracing::info!(
        analysis = analysis.name(),
        input = %args.input.display(),
        events = n,
        weight,
        threads,
        "starting event loop"
    );

    if threads == 1 {
        process_range(analysis, worker, 0..n, weight, args.verbose, &mut hists)?;
    } else {
        drop(worker);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        let template = hists.shard();
        let shards = pool.install(|| {
            chunks(n, threads)
                .into_par_iter()
                .map(|range| -> gg_core::Result<HistManager> {
                    let mut shard = template.shard();
                    let worker = analysis.bind(tree, args.data)?;
                    process_range(analysis, worker, range, weight, args.verbose, &mut shard)?;
                    Ok(shard)
                })
                .collect::<gg_core::Result<Vec<_>>>()
        })?;
        for shard in shards {
            hists.merge(shard)?;
        }
    }

    hists.write()?;
    Ok(())
}

fn process_range<A: Analysis>(
    analysis: &A,
    mut worker: A::Worker<'_>,
    range: Range<usize>,
    weight: f64,
    verbose: bool,
    hists: &mut HistManager,
) -> gg_core::Result<()> {
    let (first, total) = (range.start, range.len());
    let step = (total / 10).max(1);
    for event in range {
        analysis.process(&mut worker, event, weight, hists)?;
        let done = event + 1 - first;
        if verbose && done % step == 0 {
            tracing::info!(first, done, total, "{}% complete", done * 100 / total);
        }
    }
    Ok(())
}

/// Weight applied to every event of the job.
///
/// Data weighs 1. Simulation uses `lumi * xs / n_generated` with
/// `n_generated` taken from bin 2 of the `hcount` histogram stored in the input.
/// Samples without a usable normalization fall back to 1.
fn event_weight(args: &JobArgs, file: &TreeFile, run_config: &RunConfig) -> f64 {
    if args.data {
        return 1.0;
    }
    let sample = run_config.sample_name(&args.input);
    let weight = file
        .get_object::<Histogram>("hcount")
        .and_then(|h| Ok(h.as_1d()?.bin_content(2)))
        .and_then(|n_generated| run_config.event_weight(&sample, &args.year, n_generated, false));
    match weight {
        Ok(w) => {
            tracing::debug!(sample = %sample, year = %args.year, weight = w, "event weight");
            w
        }
        Err(e) => {
            tracing::warn!(sample = %sample, error = %e, "no normalization for sample; using weight 1");
            1.0
        }
    }
}

/// Split `0..n` into at most `parts` contiguous, non-empty ranges.
pub(crate) fn chunks(n: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, n.max(1));
    let (base, extra) = (n / parts, n % parts);
    let mut start = 0;
    (0..parts)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .filter(|r| !r.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_range_in_order() {
        let c = chunks(10, 3);
        assert_eq!(c, vec![0..4, 4..7, 7..10]);
        assert_eq!(chunks(2, 8), vec![0..1, 1..2]);
        assert!(chunks(0, 4).is_empty());
    }

    #[test]
    fn chunks_are_contiguous() {
        for n in [1, 7, 100, 101] {
            for parts in 1..6 {
                let c = chunks(n, parts);
                assert_eq!(c.first().map(|r| r.start), Some(0));
                assert_eq!(c.last().map(|r| r.end), Some(n));
                assert!(c.windows(2).all(|w| w[0].end == w[1].start));
            }
        }
    }
}
