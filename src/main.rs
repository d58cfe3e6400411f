use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sporlplay::{
    cli, config, error,
    session::DEFAULT_TOP_TRACKS_LIMIT,
    types::TimeRange,
    utils,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in with Spotify
    Auth,

    /// Forget the cached Spotify login
    Logout,

    /// Show login status
    Status,

    /// List playback devices
    Devices,

    /// List your top tracks
    Top(TopOptions),

    /// Play one of your top tracks
    Play(PlayOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TopOptions {
    /// Time frame: short (4 weeks), medium (6 months) or long (about a year)
    #[clap(long, default_value = "short", value_parser = utils::parse_time_range)]
    pub time_range: TimeRange,

    /// Index of the first track to return
    #[clap(long, default_value_t = 0)]
    pub offset: u32,

    /// Number of tracks to return (1-50)
    #[clap(long, default_value_t = DEFAULT_TOP_TRACKS_LIMIT)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    /// Rank of the track in your top tracks, starting at 1
    #[clap(long, default_value_t = 1)]
    pub rank: u32,

    /// Time frame the rank refers to
    #[clap(long, default_value = "short", value_parser = utils::parse_time_range)]
    pub time_range: TimeRange,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Logout => cli::logout().await,
        Command::Status => cli::status().await,
        Command::Devices => cli::devices().await,
        Command::Top(opt) => cli::top(opt.time_range, opt.offset, opt.limit).await,
        Command::Play(opt) => cli::play(opt.rank, opt.time_range).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
