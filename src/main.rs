use cid::cli::Cli;
use clap::Parser;
use miette::Result;

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let pause = cli.pause;

    let result = cid::cli::commands::extract::run(cli.extract);

    if pause {
        cid::cli::helpers::wait_for_enter();
    }
    result
}
