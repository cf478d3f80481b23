use clap::Parser;
use spaneval::{
    classification_report, read_tagged, score_batch, DivByZeroStrat, EvalConfigBuilder,
    PaddedBatch, TaggedSentence,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Parser)]
struct Args {
    /// Token/tag file holding the gold tags.
    gold: PathBuf,
    /// Token/tag file holding the predicted tags.
    pred: PathBuf,
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    #[arg(short, long, default_value_t = DivByZeroStrat::ReplaceBy0, value_parser = parse_strat)]
    zero_division: DivByZeroStrat,
    /// Also time the classification report.
    #[arg(short, long)]
    report: bool,
    #[arg(short, long)]
    parallel: bool,
}

fn parse_strat(raw: &str) -> Result<DivByZeroStrat, String> {
    raw.parse::<DivByZeroStrat>().map_err(|e| e.to_string())
}

fn load_tags<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let sentences = read_tagged(path)?;
    Ok(sentences
        .into_iter()
        .map(|s: TaggedSentence| s.into_iter().map(|t| t.tag).collect())
        .collect())
}

/// Pads the gold and predicted sentences to a shared width, so that both buffers follow the same
/// lengths.
fn pad_pair(
    gold: Vec<Vec<String>>,
    pred: Vec<Vec<String>>,
) -> Result<(PaddedBatch<String>, PaddedBatch<String>), Box<dyn Error>> {
    let width = gold.iter().chain(pred.iter()).map(Vec::len).max().unwrap_or(0);
    let gold = PaddedBatch::with_width(gold, String::from("O"), width)?;
    let pred = PaddedBatch::with_width(pred, String::from("O"), width)?;
    if gold.true_lens() != pred.true_lens() {
        return Err("The gold and predicted files do not have the same sentence lengths".into());
    }
    Ok((gold, pred))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let config = EvalConfigBuilder::new()
        .division_by_zero(args.zero_division)
        .parallel(args.parallel)
        .build();
    info!(%config, "loading files");
    let (gold, pred) = pad_pair(load_tags(&args.gold)?, load_tags(&args.pred)?)?;
    let mut total_duration = Duration::ZERO;
    for _ in 0..args.n_samples {
        let now = Instant::now();
        let scores = score_batch(
            gold.tokens(),
            pred.tokens(),
            gold.padded_lens(),
            gold.true_lens(),
            &config,
        )?;
        if args.report {
            classification_report(
                gold.tokens(),
                pred.tokens(),
                gold.padded_lens(),
                gold.true_lens(),
                &config,
            )?;
        }
        total_duration += now.elapsed();
        info!(
            precision = scores.precision,
            recall = scores.recall,
            fscore = scores.fscore
        );
    }
    println!(
        "Total duration: {} with {} samples",
        total_duration.as_secs_f64(),
        args.n_samples
    );
    Ok(())
}
