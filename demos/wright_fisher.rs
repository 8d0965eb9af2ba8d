use clap::Parser;

use absorption_times::{run_wright_fisher, WrightFisherParams};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let params = WrightFisherParams::parse();
    let summary = run_wright_fisher(&params)?;
    print!("{summary}");
    Ok(())
}
