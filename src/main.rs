use clap::Parser;
use edm::cli::{Cli, Commands, GlobalOpts};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior so piping into `head` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Extract(args) => edm::cli::commands::extract::run(args, &global),
        Commands::Show(args) => edm::cli::commands::show::run(args, &global),
        Commands::Devices(args) => edm::cli::commands::devices::run(args, &global),
        Commands::Mods(args) => edm::cli::commands::mods::run(args, &global),
        Commands::Completions(args) => edm::cli::commands::completions::run(args),
    }
}

/// `RUST_LOG` wins over the verbosity flags
fn init_logging(global: &GlobalOpts) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
