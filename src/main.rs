use std::env;

use anyhow::{anyhow, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let assessment_id = parse_args()?;

    match gradebook_annotations::run_rescore(assessment_id).await {
        Ok(summary) => {
            println!(
                "updated={} autograded={} failed={}",
                summary.updated, summary.autograded, summary.failed
            );
            if summary.failed > 0 {
                std::process::exit(2);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("gradebook-rescore fatal: {e:#}");
            std::process::exit(1);
        }
    }
}

fn parse_args() -> Result<Option<i64>> {
    let mut assessment_id = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--assessment" => {
                let value = args.next().ok_or_else(|| anyhow!("--assessment missing value"))?;
                let id = value
                    .parse::<i64>()
                    .map_err(|_| anyhow!("--assessment expects a numeric id, got {value}"))?;
                assessment_id = Some(id);
            }
            _ => return Err(anyhow!("Unknown argument: {arg}")),
        }
    }

    Ok(assessment_id)
}
