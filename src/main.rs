use clap::Parser;
use color_eyre::Result;
use nanograph_config::Args;
use nanograph_tui::{
    init_errors,
    logging,
    App,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let args = Args::parse();
    logging::log_init(args.debug)?;

    App::new(args)?.run().await
}
