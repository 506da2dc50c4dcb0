use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use kochbuch_core::cart::cart_total;
use kochbuch_core::forms::{IngredientRow, LoginForm, ProfileForm, RecipeForm, SignUpForm};
use kochbuch_core::{
    Access, CartView, Category, Identity, Recipe, Route, SessionClient, SessionHolder,
};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::remote::RemoteSession;
use crate::RecipeArgs;

pub struct Context {
    api: ApiClient,
    remote: Arc<RemoteSession>,
}

impl Context {
    pub fn new(server: &str, session_file: PathBuf) -> Self {
        let api = ApiClient::new(server);
        let remote = Arc::new(RemoteSession::new(api.clone(), session_file));
        Self { api, remote }
    }

    fn holder(&self) -> SessionHolder {
        SessionHolder::new(self.remote.clone(), Arc::new(self.api.clone()))
    }

    /// Check the stored session against `route`'s guard and return a client
    /// carrying its token.
    async fn signed_in(&self, route: Route) -> Result<(ApiClient, Identity)> {
        let holder = self.holder();
        holder.start().await;
        let access = holder.navigate(route);
        let user = holder.current_user();
        holder.shutdown().await;

        match access {
            Access::Render => {}
            Access::Redirect(target) => {
                bail!("Please log in first (`kochbuch login`, {})", target)
            }
            Access::Placeholder => bail!("Session check did not finish"),
        }

        let user = user.map_err(|_| anyhow!("Please log in first (`kochbuch login`)"))?;
        let token = self
            .remote
            .access_token()
            .ok_or_else(|| anyhow!("Please log in first (`kochbuch login`)"))?;
        Ok((self.api.with_token(token), user))
    }
}

pub async fn ping(ctx: &Context) -> Result<()> {
    println!("{}", ctx.api.ping().await?);
    Ok(())
}

pub async fn signup(ctx: &Context, form: SignUpForm) -> Result<()> {
    let request = form.to_request()?;
    let holder = ctx.holder();
    let user = holder.sign_up(request).await?;
    println!("Welcome, {}! You are logged in.", user.username);
    Ok(())
}

pub async fn login(ctx: &Context, email: String, password: String) -> Result<()> {
    let (email, password) = LoginForm { email, password }.credentials()?;
    let holder = ctx.holder();
    let user = holder.sign_in(&email, &password).await?;
    println!("Logged in as {}", user.username);
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let holder = ctx.holder();
    holder.sign_out().await?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    match ctx.remote.current_session().await? {
        Some(session) => {
            let user = session.user;
            println!(
                "{} ({} {}, {})",
                user.username, user.first_name, user.last_name, user.email
            );
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

pub async fn categories(ctx: &Context) -> Result<()> {
    for category in ctx.api.categories().await? {
        println!("{}  {}", category.id, category.name);
    }
    Ok(())
}

pub async fn list_recipes(ctx: &Context, mine: bool) -> Result<()> {
    let recipes = if mine {
        let (api, _) = ctx.signed_in(Route::MyRecipes).await?;
        api.my_recipes().await?
    } else {
        let holder = ctx.holder();
        holder.start().await;
        let snapshot = holder.ready().await;
        holder.shutdown().await;
        if let Some(error) = snapshot.last_error {
            bail!("Failed to load recipes: {}", error);
        }
        snapshot.recipes
    };

    if recipes.is_empty() {
        println!("No recipes yet");
    }
    for recipe in &recipes {
        println!("{}", recipe_line(recipe));
    }
    Ok(())
}

pub async fn show_recipe(ctx: &Context, id: Uuid) -> Result<()> {
    let recipe = ctx.api.recipe(id).await?;
    print!("{}", render_recipe(&recipe));

    // Favorite state only makes sense with a session.
    if let Some(token) = ctx.remote.access_token() {
        if let Ok(favorite) = ctx.api.with_token(token).is_favorite(id).await {
            println!("Favorite: {}", if favorite { "yes" } else { "no" });
        }
    }
    Ok(())
}

pub async fn create_recipe(ctx: &Context, args: RecipeArgs) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::CreateRecipe).await?;
    let categories = api.categories().await?;

    let mut form = RecipeForm::new(&categories);
    apply_args(&mut form, &args, &categories)?;
    // Validate before uploading anything.
    form.to_draft()?;

    if let Some(path) = &args.image {
        let (name, data) = read_file(path)?;
        form.image_url = Some(api.upload_recipe_image(None, &name, data).await?);
    }

    let recipe = api.create_recipe(&form.to_draft()?).await?;
    println!("Created {}", Route::RecipeDetail(recipe.id));
    print!("{}", render_recipe(&recipe));
    Ok(())
}

pub async fn edit_recipe(ctx: &Context, id: Uuid, args: RecipeArgs) -> Result<()> {
    let (api, user) = ctx.signed_in(Route::EditRecipe(id)).await?;
    let recipe = api.recipe(id).await?;
    if recipe.user_id != user.id {
        bail!("Only the creator can edit this recipe");
    }
    let categories = api.categories().await?;

    let mut form = RecipeForm::from_recipe(&recipe);
    apply_args(&mut form, &args, &categories)?;
    form.to_draft()?;

    if let Some(path) = &args.image {
        let (name, data) = read_file(path)?;
        form.image_url = Some(api.upload_recipe_image(Some(id), &name, data).await?);
    }

    let recipe = api.update_recipe(id, &form.to_draft()?).await?;
    println!("Updated {}", Route::RecipeDetail(recipe.id));
    print!("{}", render_recipe(&recipe));
    Ok(())
}

pub async fn delete_recipe(ctx: &Context, id: Uuid) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::MyRecipes).await?;
    api.delete_recipe(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

pub async fn list_favorites(ctx: &Context) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Favorites).await?;
    let recipes = api.favorites().await?;
    if recipes.is_empty() {
        println!("No favorites yet");
    }
    for recipe in &recipes {
        println!("{}", recipe_line(recipe));
    }
    Ok(())
}

pub async fn add_favorite(ctx: &Context, recipe: Uuid) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Favorites).await?;
    api.add_favorite(recipe).await?;
    println!("Added {} to favorites", recipe);
    Ok(())
}

pub async fn remove_favorite(ctx: &Context, recipe: Uuid) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Favorites).await?;
    api.remove_favorite(recipe).await?;
    println!("Removed {} from favorites", recipe);
    Ok(())
}

pub async fn show_profile(ctx: &Context) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Profile).await?;
    let profile = api.profile().await?;
    println!("Username: {}", profile.username);
    println!("Name:     {} {}", profile.first_name, profile.last_name);
    println!("Email:    {}", profile.email);
    if let Some(url) = &profile.image_url {
        println!("Photo:    {}", url);
    }
    Ok(())
}

pub async fn set_username(ctx: &Context, username: String) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Profile).await?;
    let current = api.profile().await?;
    let form = ProfileForm { username };
    match form.changes(&current)? {
        Some(changes) => {
            let profile = api.update_profile(&changes).await?;
            ctx.remote.refresh_user().await?;
            println!("Username changed to {}", profile.username);
        }
        None => println!("Username unchanged"),
    }
    Ok(())
}

pub async fn profile_photo(ctx: &Context, file: &Path) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Profile).await?;
    let (name, data) = read_file(file)?;
    let profile = api.upload_profile_photo(&name, data).await?;
    ctx.remote.refresh_user().await?;
    println!(
        "Photo updated: {}",
        profile.image_url.as_deref().unwrap_or_default()
    );
    Ok(())
}

pub async fn upload(ctx: &Context, file: &Path, recipe: Option<Uuid>) -> Result<()> {
    let route = match recipe {
        Some(id) => Route::EditRecipe(id),
        None => Route::CreateRecipe,
    };
    let (api, _) = ctx.signed_in(route).await?;
    let (name, data) = read_file(file)?;
    println!("{}", api.upload_recipe_image(recipe, &name, data).await?);
    Ok(())
}

pub async fn products(ctx: &Context, search: Option<&str>) -> Result<()> {
    let products = ctx.api.products(search).await?;
    if products.is_empty() {
        println!("No products found");
    }
    for product in products {
        println!(
            "{}  {:<30} {:>8}  {}",
            product.id,
            product.title,
            format_price(product.price),
            product.category.unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn show_cart(ctx: &Context) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Home).await?;
    print!("{}", render_cart(&api.cart().await?));
    Ok(())
}

pub async fn add_to_cart(ctx: &Context, product: Uuid) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Home).await?;
    print!("{}", render_cart(&api.add_to_cart(product).await?));
    Ok(())
}

pub async fn remove_from_cart(ctx: &Context, item: Uuid) -> Result<()> {
    let (api, _) = ctx.signed_in(Route::Home).await?;
    print!("{}", render_cart(&api.remove_cart_item(item).await?));
    Ok(())
}

fn read_file(path: &Path) -> Result<(String, Vec<u8>)> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok((name, data))
}

fn apply_args(form: &mut RecipeForm, args: &RecipeArgs, categories: &[Category]) -> Result<()> {
    if let Some(name) = &args.name {
        form.name = name.clone();
    }
    if let Some(description) = &args.description {
        form.description = description.clone();
    }
    if let Some(servings) = args.servings {
        form.servings = servings;
    }
    if let Some(instructions) = &args.instructions {
        form.instructions = instructions.clone();
    }
    if let Some(info) = &args.info {
        form.additional_info = info.clone();
    }
    if let Some(category) = &args.category {
        form.category_id = Some(resolve_category(category, categories)?);
    }
    if !args.ingredients.is_empty() {
        form.ingredients = args.ingredients.iter().map(|s| ingredient_row(s)).collect();
    }
    Ok(())
}

/// Match a category by id or by case-insensitive name.
fn resolve_category(input: &str, categories: &[Category]) -> Result<Uuid> {
    let input = input.trim();
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(input))
        .map(|c| c.id)
        .ok_or_else(|| anyhow!("Unknown category: {}", input))
}

/// `name;quantity;unit;info` with trailing parts optional.
fn ingredient_row(text: &str) -> IngredientRow {
    let mut parts = text.splitn(4, ';').map(str::trim);
    IngredientRow {
        name: parts.next().unwrap_or_default().to_string(),
        quantity: parts.next().unwrap_or_default().to_string(),
        unit: parts.next().unwrap_or_default().to_string(),
        additional_info: parts.next().unwrap_or_default().to_string(),
    }
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("{:.2} €", price),
        None => "-".to_string(),
    }
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}

fn recipe_line(recipe: &Recipe) -> String {
    format!(
        "{}  {}  [{}]",
        recipe.id,
        recipe.name,
        recipe.category.as_deref().unwrap_or("ohne Kategorie")
    )
}

fn render_recipe(recipe: &Recipe) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", recipe.name));
    if let Some(category) = &recipe.category {
        out.push_str(&format!("Kategorie: {}\n", category));
    }
    if let Some(creator) = &recipe.creator {
        out.push_str(&format!("Von: {}\n", creator.username));
    }
    out.push_str(&format!("Portionen: {}\n", recipe.servings));
    if !recipe.description.is_empty() {
        out.push_str(&format!("\n{}\n", recipe.description));
    }

    out.push_str("\nZutaten:\n");
    for ingredient in &recipe.ingredients {
        let amount = [
            ingredient.quantity.map(format_quantity),
            ingredient.unit.clone(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
        let mut line = if amount.is_empty() {
            format!("  - {}", ingredient.name)
        } else {
            format!("  - {} {}", amount, ingredient.name)
        };
        if let Some(info) = &ingredient.additional_info {
            line.push_str(&format!(" ({})", info));
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!("\nZubereitung:\n{}\n", recipe.instructions));
    if let Some(info) = &recipe.additional_info {
        out.push_str(&format!("\nHinweise: {}\n", info));
    }
    if let Some(url) = &recipe.image_url {
        out.push_str(&format!("Bild: {}\n", url));
    }
    out
}

fn render_cart(cart: &CartView) -> String {
    if cart.items.is_empty() {
        return "Cart is empty\n".to_string();
    }
    let mut out = String::new();
    for line in &cart.items {
        out.push_str(&format!(
            "{}  {} x {:<30} {:>8}\n",
            line.id,
            line.quantity,
            line.product.title,
            format_price(line.product.price)
        ));
    }
    out.push_str(&format!(
        "Total: {}\n",
        format_price(Some(cart_total(&cart.items)))
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kochbuch_core::{CartLine, Ingredient, Product};

    fn category(name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ingredient_row_parts() {
        let row = ingredient_row("Mehl; 0,5 ; kg; Type 405");
        assert_eq!(row.name, "Mehl");
        assert_eq!(row.quantity, "0,5");
        assert_eq!(row.unit, "kg");
        assert_eq!(row.additional_info, "Type 405");

        let row = ingredient_row("Salz");
        assert_eq!(row.name, "Salz");
        assert!(row.quantity.is_empty());
    }

    #[test]
    fn test_resolve_category() {
        let categories = vec![category("Suppen"), category("Desserts")];
        assert_eq!(
            resolve_category("desserts", &categories).unwrap(),
            categories[1].id
        );
        let id = Uuid::new_v4();
        assert_eq!(resolve_category(&id.to_string(), &categories).unwrap(), id);
        assert!(resolve_category("Salate", &categories).is_err());
    }

    #[test]
    fn test_args_build_a_valid_draft() {
        let categories = vec![category("Suppen")];
        let mut form = RecipeForm::new(&categories);
        let args = RecipeArgs {
            name: Some("Soup".into()),
            instructions: Some("Boil".into()),
            ingredients: vec!["Water;1,5;l".into()],
            ..Default::default()
        };
        apply_args(&mut form, &args, &categories).unwrap();

        let draft = form.to_draft().unwrap();
        assert_eq!(draft.servings, 4);
        assert_eq!(draft.category_id, categories[0].id);
        assert_eq!(draft.ingredients[0].quantity, Some(1.5));
    }

    #[test]
    fn test_render_recipe() {
        let recipe_id = Uuid::new_v4();
        let recipe = Recipe {
            id: recipe_id,
            name: "Soup".into(),
            description: String::new(),
            servings: 2,
            instructions: "Boil".into(),
            image_url: None,
            additional_info: None,
            category_id: Uuid::new_v4(),
            category: Some("Suppen".into()),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            ingredients: vec![Ingredient {
                id: Uuid::new_v4(),
                recipe_id,
                name: "Water".into(),
                quantity: Some(1.0),
                unit: Some("l".into()),
                additional_info: None,
                created_at: Utc::now(),
            }],
            creator: None,
        };
        let text = render_recipe(&recipe);
        assert!(text.contains("Kategorie: Suppen"));
        assert!(text.contains("  - 1 l Water\n"));
        assert!(recipe_line(&recipe).ends_with("[Suppen]"));
    }

    #[test]
    fn test_render_cart_total() {
        let cart = CartView {
            cart_id: Some(Uuid::new_v4()),
            items: vec![CartLine {
                id: Uuid::new_v4(),
                quantity: 2,
                product: Product {
                    id: Uuid::new_v4(),
                    title: "Mehl".into(),
                    price: Some(1.25),
                    quality: None,
                    category: None,
                },
            }],
            total: 2.5,
        };
        assert!(render_cart(&cart).ends_with("Total: 2.50 €\n"));
        assert_eq!(render_cart(&CartView::default()), "Cart is empty\n");
    }
}
