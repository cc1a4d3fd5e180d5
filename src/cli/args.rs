use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "waqt", version, author, about = "Daily prayer times and a live countdown to the next prayer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the day's prayer times with the current and next prayer
    Times {
        /// Day to show (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the next prayer and the time left until it
    Next,
    /// Start a session as the given user
    Signin {
        /// User name
        name: String,
    },
    /// End the current session
    Signout,
    /// Show the signed-in user
    Whoami,
    /// Profile (name, location, calculation method)
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },
    /// List the calculation methods the provider accepts
    Methods,
    /// Prayer times cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the current profile
    Show,
    /// Update profile fields; omitted fields are left alone
    Set {
        /// Full name
        #[arg(long)]
        name: Option<String>,
        /// Location label, e.g. "Istanbul"
        #[arg(long)]
        location: Option<String>,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Calculation method code (see `waqt methods`)
        #[arg(long)]
        method: Option<String>,
        /// Forget the stored coordinates
        #[arg(long, conflicts_with_all = ["location", "lat", "lng"])]
        clear_location: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Remove every cached schedule
    Clear,
    /// Remove schedules older than the configured TTL
    Purge,
}
