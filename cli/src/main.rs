mod client;
mod commands;
mod remote;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use client::DEFAULT_SERVER;
use commands::Context;

#[derive(Parser)]
#[command(name = "kochbuch")]
#[command(about = "Kochbuch CLI: recipes, favorites and the shop prototype", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, global = true, env = "KOCHBUCH_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Where the login session is kept (default: ~/.kochbuch/session.json)
    #[arg(long, global = true, env = "KOCHBUCH_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ping the server (unauthenticated)
    Ping,
    /// Create an account and log in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List recipe categories
    Categories,
    /// Browse and edit recipes
    #[command(subcommand)]
    Recipes(RecipeCommand),
    /// Manage favorite recipes
    #[command(subcommand)]
    Favorites(FavoriteCommand),
    /// Show or edit the profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Upload a recipe image and print its signed URL
    Upload {
        file: PathBuf,
        /// Recipe the image belongs to
        #[arg(long)]
        recipe: Option<Uuid>,
    },
    /// List shop products
    Products {
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show or change the shopping cart
    #[command(subcommand)]
    Cart(CartCommand),
}

#[derive(Subcommand)]
enum RecipeCommand {
    /// List all recipes
    List {
        /// Only recipes created by the logged-in user
        #[arg(long)]
        mine: bool,
    },
    /// Show one recipe with its ingredients
    Show { id: Uuid },
    /// Create a recipe
    Create(RecipeArgs),
    /// Replace a recipe you own; omitted fields keep their value
    Edit {
        id: Uuid,
        #[command(flatten)]
        args: RecipeArgs,
    },
    /// Delete a recipe you own
    Delete { id: Uuid },
}

#[derive(Args, Debug, Default)]
pub struct RecipeArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub servings: Option<i32>,
    #[arg(long)]
    pub instructions: Option<String>,
    /// Free-text notes
    #[arg(long)]
    pub info: Option<String>,
    /// Category name or id (default: the first category)
    #[arg(long)]
    pub category: Option<String>,
    /// `name;quantity;unit;info`, repeatable. Replaces all rows when editing.
    #[arg(long = "ingredient")]
    pub ingredients: Vec<String>,
    /// Image file to upload and attach
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum FavoriteCommand {
    /// List favorite recipes, most recent first
    List,
    /// Mark a recipe as favorite
    Add { recipe: Uuid },
    /// Remove a recipe from the favorites
    Remove { recipe: Uuid },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    /// Change the username
    SetUsername { username: String },
    /// Upload a new profile photo
    Photo { file: PathBuf },
}

#[derive(Subcommand)]
enum CartCommand {
    Show,
    /// Add one unit of a product
    Add { product: Uuid },
    /// Remove a cart line
    Remove { item: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session_file = cli
        .session_file
        .unwrap_or_else(remote::default_session_file);
    let ctx = Context::new(&cli.server, session_file);

    match cli.command {
        Commands::Ping => commands::ping(&ctx).await?,
        Commands::Signup {
            email,
            password,
            username,
            first_name,
            last_name,
        } => {
            let form = kochbuch_core::forms::SignUpForm {
                email,
                password,
                username,
                first_name,
                last_name,
            };
            commands::signup(&ctx, form).await?
        }
        Commands::Login { email, password } => commands::login(&ctx, email, password).await?,
        Commands::Logout => commands::logout(&ctx).await?,
        Commands::Whoami => commands::whoami(&ctx).await?,
        Commands::Categories => commands::categories(&ctx).await?,
        Commands::Recipes(command) => match command {
            RecipeCommand::List { mine } => commands::list_recipes(&ctx, mine).await?,
            RecipeCommand::Show { id } => commands::show_recipe(&ctx, id).await?,
            RecipeCommand::Create(args) => commands::create_recipe(&ctx, args).await?,
            RecipeCommand::Edit { id, args } => commands::edit_recipe(&ctx, id, args).await?,
            RecipeCommand::Delete { id } => commands::delete_recipe(&ctx, id).await?,
        },
        Commands::Favorites(command) => match command {
            FavoriteCommand::List => commands::list_favorites(&ctx).await?,
            FavoriteCommand::Add { recipe } => commands::add_favorite(&ctx, recipe).await?,
            FavoriteCommand::Remove { recipe } => commands::remove_favorite(&ctx, recipe).await?,
        },
        Commands::Profile(command) => match command {
            ProfileCommand::Show => commands::show_profile(&ctx).await?,
            ProfileCommand::SetUsername { username } => {
                commands::set_username(&ctx, username).await?
            }
            ProfileCommand::Photo { file } => commands::profile_photo(&ctx, &file).await?,
        },
        Commands::Upload { file, recipe } => commands::upload(&ctx, &file, recipe).await?,
        Commands::Products { search } => commands::products(&ctx, search.as_deref()).await?,
        Commands::Cart(command) => match command {
            CartCommand::Show => commands::show_cart(&ctx).await?,
            CartCommand::Add { product } => commands::add_to_cart(&ctx, product).await?,
            CartCommand::Remove { item } => commands::remove_from_cart(&ctx, item).await?,
        },
    }

    Ok(())
}
