//! Client routes and the identity guard in front of the gated ones.

use std::fmt;

use uuid::Uuid;

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    About,
    SignUp,
    Login,
    RecipeDetail(Uuid),
    Favorites,
    MyRecipes,
    Profile,
    CreateRecipe,
    EditRecipe(Uuid),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::About => "/ueber-uns".to_string(),
            Route::SignUp => "/signup".to_string(),
            Route::Login => "/login".to_string(),
            Route::RecipeDetail(id) => format!("/recipe/{}", id),
            Route::Favorites => "/favorites".to_string(),
            Route::MyRecipes => "/my-recipes".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::CreateRecipe => "/create-recipe".to_string(),
            Route::EditRecipe(id) => format!("/edit-recipe/{}", id),
        }
    }

    /// Parse a path; unknown paths and malformed ids yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let route = match trimmed {
            "" => Route::Home,
            "/ueber-uns" => Route::About,
            "/signup" => Route::SignUp,
            "/login" => Route::Login,
            "/favorites" => Route::Favorites,
            "/my-recipes" => Route::MyRecipes,
            "/profile" => Route::Profile,
            "/create-recipe" => Route::CreateRecipe,
            other => {
                if let Some(id) = other.strip_prefix("/recipe/") {
                    Route::RecipeDetail(Uuid::parse_str(id).ok()?)
                } else if let Some(id) = other.strip_prefix("/edit-recipe/") {
                    Route::EditRecipe(Uuid::parse_str(id).ok()?)
                } else {
                    return None;
                }
            }
        };
        Some(route)
    }

    /// Gated routes need an authenticated identity.
    pub fn is_gated(&self) -> bool {
        matches!(
            self,
            Route::Favorites
                | Route::MyRecipes
                | Route::Profile
                | Route::CreateRecipe
                | Route::EditRecipe(_)
        )
    }

    /// Decide what to show for this route in the given session state.
    pub fn access(&self, state: &SessionState) -> Access {
        if !self.is_gated() {
            return Access::Render;
        }
        match state {
            SessionState::Loading => Access::Placeholder,
            SessionState::Anonymous => Access::Redirect(Route::Login),
            SessionState::Authenticated(_) => Access::Render,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Render,
    /// Session check still running.
    Placeholder,
    Redirect(Route),
}
