use clap::Parser;

use absorption_times::{run_coalescent, CoalescentParams};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let params = CoalescentParams::parse();
    let summary = run_coalescent(&params)?;
    print!("{summary}");
    Ok(())
}
