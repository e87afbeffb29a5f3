use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mealhub", about = "MealHub: meals and restaurants by area", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server on in-memory stores
    Serve(ServeArgs),
    /// Print the slug derived from some text
    Slug(SlugArgs),
    /// Print the record key for an area and name
    Key(KeyArgs),
    /// Print the object path an image upload would get
    Address(AddressArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML file with hub settings and a `[server]` table
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides `server.bind_addr`
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct SlugArgs {
    pub text: String,
}

#[derive(Args)]
pub struct KeyArgs {
    pub area: String,
    pub name: String,
}

#[derive(Args)]
pub struct AddressArgs {
    /// `meal-images` or `restaurant-logos`
    pub container: String,
    pub area: String,
    pub item: String,
    pub file: String,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}
