#![allow(dead_code)]

use std::io::Cursor;

use kochbuch_core::{
    Category, Identity, IdentityProvider, IngredientDraft, Kitchen, MemoryBackend, RecipeDraft,
    SignUp,
};

pub struct Fixture {
    pub backend: MemoryBackend,
    pub kitchen: Kitchen,
    pub soups: Category,
    pub desserts: Category,
}

impl Fixture {
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        let soups = backend.store.add_category("Suppen");
        let desserts = backend.store.add_category("Desserts");
        let kitchen = backend.kitchen();
        Self {
            backend,
            kitchen,
            soups,
            desserts,
        }
    }

    pub async fn user(&self, username: &str) -> Identity {
        self.backend
            .identity
            .sign_up(sign_up(username))
            .await
            .expect("sign up")
            .user
    }
}

pub fn sign_up(username: &str) -> SignUp {
    SignUp {
        email: format!("{}@example.com", username),
        password: "hunter22".to_string(),
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

pub fn ingredient(name: &str, quantity: Option<f64>, unit: Option<&str>) -> IngredientDraft {
    IngredientDraft {
        name: name.to_string(),
        quantity,
        unit: unit.map(str::to_string),
        additional_info: None,
    }
}

pub fn soup(category: &Category) -> RecipeDraft {
    RecipeDraft {
        name: "Soup".to_string(),
        description: "Hot water".to_string(),
        servings: 2,
        instructions: "Boil it.".to_string(),
        image_url: None,
        additional_info: None,
        category_id: category.id,
        ingredients: vec![ingredient("Water", Some(1.0), Some("l"))],
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 120, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}
