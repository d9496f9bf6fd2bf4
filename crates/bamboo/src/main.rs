mod cli;
mod run;
mod scene;
mod still;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
