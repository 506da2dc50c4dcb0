//! Form state for recipe editing, sign-up, login and profile edits.
//!
//! Forms hold raw text as typed by the user and turn it into validated
//! requests. Any problem is reported as a single [`DataError::Validation`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::SignUp;
use crate::error::DataError;
use crate::kitchen::Kitchen;
use crate::routes::Route;
use crate::types::{
    Category, Identity, IngredientDraft, Profile, ProfileChanges, Recipe, RecipeDraft,
};

pub const DEFAULT_SERVINGS: i32 = 4;

/// One ingredient row; the quantity is kept as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRow {
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub additional_info: String,
}

impl IngredientRow {
    fn to_draft(&self) -> Result<IngredientDraft, DataError> {
        Ok(IngredientDraft {
            name: self.name.trim().to_string(),
            quantity: parse_quantity(&self.quantity)?,
            unit: optional(&self.unit),
            additional_info: optional(&self.additional_info),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeForm {
    pub name: String,
    pub description: String,
    pub servings: i32,
    pub instructions: String,
    pub additional_info: String,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub ingredients: Vec<IngredientRow>,
}

impl RecipeForm {
    /// Empty create form: four servings, first category, one blank ingredient row.
    pub fn new(categories: &[Category]) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            servings: DEFAULT_SERVINGS,
            instructions: String::new(),
            additional_info: String::new(),
            image_url: None,
            category_id: categories.first().map(|c| c.id),
            ingredients: vec![IngredientRow::default()],
        }
    }

    /// Edit form pre-populated from a stored recipe.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let mut ingredients: Vec<IngredientRow> = recipe
            .ingredients
            .iter()
            .map(|i| IngredientRow {
                name: i.name.clone(),
                quantity: i.quantity.map(|q| q.to_string()).unwrap_or_default(),
                unit: i.unit.clone().unwrap_or_default(),
                additional_info: i.additional_info.clone().unwrap_or_default(),
            })
            .collect();
        if ingredients.is_empty() {
            ingredients.push(IngredientRow::default());
        }

        Self {
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            servings: recipe.servings,
            instructions: recipe.instructions.clone(),
            additional_info: recipe.additional_info.clone().unwrap_or_default(),
            image_url: recipe.image_url.clone(),
            category_id: Some(recipe.category_id),
            ingredients,
        }
    }

    pub fn add_ingredient_row(&mut self) {
        self.ingredients.push(IngredientRow::default());
    }

    /// Remove a row, always keeping at least one.
    pub fn remove_ingredient_row(&mut self, index: usize) {
        if index < self.ingredients.len() {
            self.ingredients.remove(index);
        }
        if self.ingredients.is_empty() {
            self.ingredients.push(IngredientRow::default());
        }
    }

    pub fn to_draft(&self) -> Result<RecipeDraft, DataError> {
        let category_id = self
            .category_id
            .ok_or_else(|| DataError::validation("Category is required"))?;

        let ingredients = self
            .ingredients
            .iter()
            .filter(|row| !row.name.trim().is_empty())
            .map(IngredientRow::to_draft)
            .collect::<Result<Vec<_>, _>>()?;

        let draft = RecipeDraft {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            servings: self.servings,
            instructions: self.instructions.trim().to_string(),
            image_url: self.image_url.clone().filter(|u| !u.trim().is_empty()),
            additional_info: optional(&self.additional_info),
            category_id,
            ingredients,
        };
        crate::recipes::validate_draft(&draft)?;
        Ok(draft)
    }

    /// Create or update the recipe and return the detail route to show next.
    pub async fn submit(
        &self,
        kitchen: &Kitchen,
        user: &Identity,
        editing: Option<Uuid>,
    ) -> Result<Route, DataError> {
        let draft = self.to_draft()?;
        let recipe = match editing {
            Some(id) => kitchen.update_recipe(user, id, draft).await?,
            None => kitchen.create_recipe(user, draft).await?,
        };
        Ok(Route::RecipeDetail(recipe.id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignUpForm {
    pub fn to_request(&self) -> Result<SignUp, DataError> {
        let email = required(&self.email, "Email")?;
        if !email.contains('@') {
            return Err(DataError::validation("Email address is invalid"));
        }
        if self.password.is_empty() {
            return Err(DataError::validation("Password is required"));
        }
        Ok(SignUp {
            email,
            password: self.password.clone(),
            username: required(&self.username, "Username")?,
            first_name: required(&self.first_name, "First name")?,
            last_name: required(&self.last_name, "Last name")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Trimmed email and the password as entered.
    pub fn credentials(&self) -> Result<(String, String), DataError> {
        let email = required(&self.email, "Email")?;
        if self.password.is_empty() {
            return Err(DataError::validation("Password is required"));
        }
        Ok((email, self.password.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub username: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone(),
        }
    }

    /// Changes to save, or `None` when the username is unchanged.
    pub fn changes(&self, current: &Profile) -> Result<Option<ProfileChanges>, DataError> {
        let username = required(&self.username, "Username")?;
        if username == current.username {
            return Ok(None);
        }
        Ok(Some(ProfileChanges {
            username: Some(username),
            ..Default::default()
        }))
    }
}

/// Parse a decimal quantity; accepts a comma as decimal separator.
pub fn parse_quantity(text: &str) -> Result<Option<f64>, DataError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let value: f64 = text
        .replace(',', ".")
        .parse()
        .map_err(|_| DataError::validation(format!("Invalid quantity: {}", text)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(DataError::validation(format!("Invalid quantity: {}", text)));
    }
    Ok(Some(value))
}

fn optional(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn required(text: &str, field: &str) -> Result<String, DataError> {
    optional(text).ok_or_else(|| DataError::validation(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn categories() -> Vec<Category> {
        ["Dessert", "Suppe"]
            .iter()
            .map(|n| Category {
                id: Uuid::new_v4(),
                name: n.to_string(),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_new_form_defaults() {
        let cats = categories();
        let form = RecipeForm::new(&cats);
        assert_eq!(form.servings, 4);
        assert_eq!(form.category_id, Some(cats[0].id));
        assert_eq!(form.ingredients, vec![IngredientRow::default()]);
    }

    #[test]
    fn test_to_draft_drops_unnamed_rows() {
        let mut form = RecipeForm::new(&categories());
        form.name = "Soup".to_string();
        form.ingredients = vec![
            IngredientRow {
                name: "Water".to_string(),
                quantity: "1,5".to_string(),
                unit: "l".to_string(),
                additional_info: String::new(),
            },
            IngredientRow {
                quantity: "3".to_string(),
                ..Default::default()
            },
        ];

        let draft = form.to_draft().unwrap();
        assert_eq!(draft.ingredients.len(), 1);
        assert_eq!(draft.ingredients[0].quantity, Some(1.5));
        assert_eq!(draft.ingredients[0].unit.as_deref(), Some("l"));
        assert_eq!(draft.ingredients[0].additional_info, None);
        assert_eq!(draft.additional_info, None);
    }

    #[test]
    fn test_to_draft_rejects_bad_quantity() {
        let mut form = RecipeForm::new(&categories());
        form.name = "Soup".to_string();
        form.ingredients[0].name = "Salt".to_string();
        form.ingredients[0].quantity = "a pinch".to_string();
        assert!(matches!(form.to_draft(), Err(DataError::Validation(_))));
    }

    #[test]
    fn test_to_draft_needs_category_and_ingredient() {
        let mut form = RecipeForm::new(&[]);
        form.name = "Soup".to_string();
        form.ingredients[0].name = "Water".to_string();
        assert!(form.to_draft().is_err());

        let mut form = RecipeForm::new(&categories());
        form.name = "Soup".to_string();
        assert!(form.to_draft().is_err());
    }

    #[test]
    fn test_remove_keeps_one_row() {
        let mut form = RecipeForm::new(&categories());
        form.add_ingredient_row();
        form.remove_ingredient_row(0);
        form.remove_ingredient_row(0);
        assert_eq!(form.ingredients.len(), 1);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("").unwrap(), None);
        assert_eq!(parse_quantity(" 2 ").unwrap(), Some(2.0));
        assert_eq!(parse_quantity("0.25").unwrap(), Some(0.25));
        assert!(parse_quantity("-1").is_err());
        assert!(parse_quantity("NaN").is_err());
    }

    #[test]
    fn test_sign_up_requires_all_fields() {
        let mut form = SignUpForm {
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            username: "ada".to_string(),
            first_name: "Ada".to_string(),
            last_name: String::new(),
        };
        assert!(form.to_request().is_err());
        form.last_name = "Lovelace".to_string();
        assert_eq!(form.to_request().unwrap().username, "ada");
        form.email = "not-an-email".to_string();
        assert!(form.to_request().is_err());
    }

    #[test]
    fn test_login_requires_both() {
        let form = LoginForm {
            email: "ada@example.com".to_string(),
            password: String::new(),
        };
        assert!(form.credentials().is_err());
    }

    #[test]
    fn test_profile_unchanged_username_is_noop() {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        let mut form = ProfileForm::from_profile(&profile);
        assert_eq!(form.changes(&profile).unwrap(), None);
        form.username = "countess".to_string();
        assert_eq!(
            form.changes(&profile).unwrap().and_then(|c| c.username),
            Some("countess".to_string())
        );
        form.username = " ".to_string();
        assert!(form.changes(&profile).is_err());
    }
}
