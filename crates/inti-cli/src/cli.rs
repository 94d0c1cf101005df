use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "inti")]
#[command(about = "Inti CLI: profiles, products and events from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides config and INTI_URL env var)
    #[arg(short, long, global = true, env = "INTI_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "INTI_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level filter (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password
    Login(LoginArgs),
    /// Create an account and log in
    Register(RegisterArgs),
    /// Log out (remove the stored session)
    Logout,
    /// Show the logged-in identity
    Whoami,
    /// Show a profile (your own when no username is given)
    Profile(ProfileArgs),
    /// Edit your profile: name, username, bio, picture
    EditProfile(EditProfileArgs),
    /// Search profiles by name or username
    Search(SearchArgs),
    /// Follow a profile
    Follow(UsernameArgs),
    /// Stop following a profile
    Unfollow(UsernameArgs),
    /// Show the home feed
    Feed(PageArgs),
    /// Posts: create, show, delete, like, unlike
    Post(PostArgs),
    /// Products: list, create, show, delete
    Products(ProductsArgs),
    /// Events: list, show, attend, organization events
    Events(EventsArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: Option<String>,
    /// Password
    #[arg(long, env = "INTI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum AccountKind {
    #[default]
    User,
    Organization,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
        }
    }
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    /// Display name
    #[arg(long)]
    pub name: String,
    /// Username (a leading @ is ignored)
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long)]
    pub email: String,
    #[arg(long, env = "INTI_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Account type
    #[arg(long = "type", default_value = "user")]
    pub kind: AccountKind,
}

#[derive(clap::Args)]
pub struct ProfileArgs {
    /// Username (e.g. @ana); omit for your own profile
    pub username: Option<String>,
    /// Also list the profile's posts
    #[arg(long)]
    pub posts: bool,
}

#[derive(clap::Args)]
pub struct EditProfileArgs {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,
    /// New username (a leading @ is ignored)
    #[arg(short, long)]
    pub username: Option<String>,
    /// New bio
    #[arg(long)]
    pub bio: Option<String>,
    /// Image file to use as profile picture
    #[arg(long)]
    pub picture: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Search text
    pub query: String,
    /// Maximum results (1-20)
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

#[derive(clap::Args)]
pub struct UsernameArgs {
    /// Username (e.g. @ana)
    pub username: String,
}

#[derive(clap::Args)]
pub struct PageArgs {
    /// Page number, starting at 0
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    /// Page size
    #[arg(long, default_value_t = 20)]
    pub size: u32,
}

#[derive(clap::Args)]
pub struct PostArgs {
    #[command(subcommand)]
    pub command: PostCommands,
}

#[derive(Subcommand)]
pub enum PostCommands {
    /// Publish a post
    Create(CreatePostArgs),
    /// Show a post
    Show(IdArgs),
    /// Delete one of your posts
    Delete(DeleteArgs),
    /// Like a post
    Like(IdArgs),
    /// Remove your like from a post
    Unlike(IdArgs),
}

#[derive(clap::Args)]
pub struct CreatePostArgs {
    /// Post text
    #[arg(short, long, default_value = "")]
    pub description: String,
    /// Image file to attach
    #[arg(short, long)]
    pub image: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommands,
}

#[derive(Subcommand)]
pub enum ProductsCommands {
    /// List a profile's products (your own when no username is given)
    List(OptionalUsernameArgs),
    /// List a new product
    Create(CreateProductArgs),
    /// Show a product
    Show(IdArgs),
    /// Delete one of your products
    Delete(DeleteArgs),
}

#[derive(clap::Args)]
pub struct CreateProductArgs {
    #[arg(short, long)]
    pub title: String,
    #[arg(short, long, default_value = "")]
    pub description: String,
    /// Price in reais (e.g. 35.90)
    #[arg(long)]
    pub price: Option<String>,
    /// Image file to attach
    #[arg(short, long)]
    pub image: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommands,
}

#[derive(Subcommand)]
pub enum EventsCommands {
    /// List upcoming events
    List,
    /// List events you are attending
    Mine,
    /// List an organization's events (your own when no username is given)
    Org(OptionalUsernameArgs),
    /// Show an event
    Show(IdArgs),
    /// Confirm attendance
    Attend(IdArgs),
    /// Cancel attendance
    Leave(IdArgs),
    /// List attendees you follow
    Attendees(IdArgs),
}

#[derive(clap::Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    pub id: String,
    /// Skip the ownership check
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct OptionalUsernameArgs {
    /// Username (e.g. @ana)
    pub username: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}
