/// Society website server.
#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Default)]
pub(crate) enum Command {
    /// Runs the web server (default)
    #[default]
    Run,
    /// Drops all tables
    Reset,
    /// Migrates the database to the latest schema
    Migrate,
    /// Creates the CMS pages that the public views bind to
    InitPages,
}
